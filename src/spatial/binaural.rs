/// Largest interaural time difference, reached at ±180° azimuth.
pub const MAX_INTERAURAL_DELAY_SECONDS: f32 = 0.001;

/// Largest interaural level difference, reached at ±90° azimuth.
const MAX_LEVEL_DIFFERENCE: f32 = 0.5;

/// Approximate head-related cue for one source direction.
///
/// Stands in for a real HRTF: the level difference attenuates the ear facing
/// away from the source by up to half. The time difference is computed and
/// exposed but no delay line consumes it yet, so the cue is level-only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinauralCue {
    pub left_gain: f32,
    pub right_gain: f32,
    /// Interaural delay in frames; positive when the source is on the right
    pub delay_frames: i32,
}

impl BinauralCue {
    pub fn from_azimuth(azimuth_degrees: f32, sample_rate: u32) -> Self {
        let itd = (azimuth_degrees / 180.0) * MAX_INTERAURAL_DELAY_SECONDS;
        let delay_frames = (itd * sample_rate as f32) as i32;

        let level_difference = ((azimuth_degrees / 90.0) * MAX_LEVEL_DIFFERENCE)
            .clamp(-MAX_LEVEL_DIFFERENCE, MAX_LEVEL_DIFFERENCE);

        Self {
            left_gain: 1.0 - level_difference.max(0.0),
            right_gain: 1.0 + level_difference.min(0.0),
            delay_frames,
        }
    }

    /// Scale each channel of an interleaved stereo buffer.
    pub fn apply(&self, buffer: &mut [f32]) {
        for frame in buffer.chunks_exact_mut(2) {
            frame[0] *= self.left_gain;
            frame[1] *= self.right_gain;
        }
    }
}

/// Multiply every sample by `gain`.
pub fn apply_gain(buffer: &mut [f32], gain: f32) {
    for sample in buffer.iter_mut() {
        *sample *= gain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_ahead_is_neutral() {
        let cue = BinauralCue::from_azimuth(0.0, 48000);
        assert_eq!(cue.left_gain, 1.0);
        assert_eq!(cue.right_gain, 1.0);
        assert_eq!(cue.delay_frames, 0);
    }

    #[test]
    fn test_right_side_attenuates_left_ear() {
        let cue = BinauralCue::from_azimuth(90.0, 48000);
        assert_eq!(cue.left_gain, 0.5);
        assert_eq!(cue.right_gain, 1.0);
        assert_eq!(cue.delay_frames, 24);
    }

    #[test]
    fn test_left_side_attenuates_right_ear() {
        let cue = BinauralCue::from_azimuth(-45.0, 48000);
        assert_eq!(cue.left_gain, 1.0);
        assert!((cue.right_gain - 0.75).abs() < 1e-6);
        assert_eq!(cue.delay_frames, -12);
    }

    #[test]
    fn test_level_difference_saturates_past_ninety() {
        let cue = BinauralCue::from_azimuth(170.0, 48000);
        assert_eq!(cue.left_gain, 0.5);
        assert_eq!(cue.right_gain, 1.0);
        assert!(cue.delay_frames > 24);
    }

    #[test]
    fn test_apply() {
        let cue = BinauralCue::from_azimuth(90.0, 48000);
        let mut buffer = vec![1.0, 1.0, 0.5, 0.5];
        cue.apply(&mut buffer);
        assert_eq!(buffer, vec![0.5, 1.0, 0.25, 0.5]);

        apply_gain(&mut buffer, 2.0);
        assert_eq!(buffer, vec![1.0, 2.0, 0.5, 1.0]);
    }
}
