use crate::audio_data::SoundId;
use crate::error::{ChimeSonicError, Result};
use crate::math::{Vec3, azimuth_degrees};
use crate::mixer::VoicePool;
use crate::spatial::binaural::{BinauralCue, apply_gain};

/// Inverse-distance rolloff factor: `gain / (1 + distance * DISTANCE_ROLLOFF)`.
pub const DISTANCE_ROLLOFF: f32 = 0.1;

/// Entries at or below this attenuation are considered silent and culled.
pub const CULL_THRESHOLD: f32 = 0.01;

/// Attenuation of a source `distance` away, clamped to [0, 1].
///
/// Zero at or beyond `max_distance`.
pub fn distance_attenuation(distance: f32, gain: f32, max_distance: f32) -> f32 {
    if distance >= max_distance {
        return 0.0;
    }
    (gain / (1.0 + distance * DISTANCE_ROLLOFF)).clamp(0.0, 1.0)
}

/// Reject ranges that would make culling meaningless.
pub fn validate_max_distance(max_distance: f32) -> Result<()> {
    if max_distance.is_nan() || max_distance <= 0.0 {
        return Err(ChimeSonicError::Configuration(format!(
            "max_distance must be positive, got {}",
            max_distance
        )));
    }
    Ok(())
}

/// One active 3D source known to the spatializer
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialEntry {
    pub sound_id: SoundId,
    pub position: Vec3,
    pub gain: f32,
    pub max_distance: f32,
    /// Attenuation applied during the last processed buffer
    pub attenuation: f32,
    /// Azimuth in degrees during the last processed buffer
    pub azimuth: f32,
    /// Interaural delay computed for the last processed buffer (not applied)
    pub interaural_delay_frames: i32,
    active: bool,
}

/// Result of one spatialization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpatialReport {
    /// Entries that shaped the buffer
    pub processed: usize,
    /// Entries culled for being out of range or inaudible
    pub culled: usize,
}

/// Post-processes the mixed buffer for every active 3D voice.
///
/// Each audible entry multiplies the whole buffer by its distance attenuation
/// and then applies its binaural cue. Entries act on the shared bus, so with
/// several entries the effects compound.
#[derive(Debug)]
pub struct Spatializer {
    listener: Vec3,
    sample_rate: u32,
    capacity: usize,
    entries: Vec<SpatialEntry>,
    culled_last_process: Vec<SoundId>,
}

impl Spatializer {
    pub fn new(sample_rate: u32, capacity: usize) -> Self {
        Self {
            listener: Vec3::ZERO,
            sample_rate,
            capacity,
            entries: Vec::with_capacity(capacity),
            culled_last_process: Vec::with_capacity(capacity),
        }
    }

    /// Takes effect on the next processed buffer.
    pub fn set_listener_position(&mut self, position: Vec3) {
        self.listener = position;
    }

    pub fn listener_position(&self) -> Vec3 {
        self.listener
    }

    /// Registers a 3D source. Re-registering a sound id replaces its entry.
    pub fn play_3d(
        &mut self,
        sound_id: SoundId,
        position: Vec3,
        gain: f32,
        max_distance: f32,
    ) -> Result<()> {
        validate_max_distance(max_distance)?;

        let entry = SpatialEntry {
            sound_id,
            position,
            gain: gain.max(0.0),
            max_distance,
            attenuation: 0.0,
            azimuth: 0.0,
            interaural_delay_frames: 0,
            active: true,
        };

        if let Some(existing) = self.entries.iter_mut().find(|e| e.sound_id == sound_id) {
            *existing = entry;
            return Ok(());
        }

        if self.entries.len() >= self.capacity {
            return Err(ChimeSonicError::VoicePoolExhausted {
                max_voices: self.capacity,
            });
        }

        self.entries.push(entry);
        Ok(())
    }

    pub fn stop(&mut self, sound_id: SoundId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.sound_id != sound_id);
        before != self.entries.len()
    }

    pub fn stop_all(&mut self) {
        self.entries.clear();
    }

    pub fn entry(&self, sound_id: SoundId) -> Option<&SpatialEntry> {
        self.entries.iter().find(|e| e.sound_id == sound_id)
    }

    pub fn active_count(&self) -> usize {
        self.entries.len()
    }

    /// Sound ids culled by the most recent [`cull_inaudible`](Self::cull_inaudible).
    pub fn culled_last_process(&self) -> &[SoundId] {
        &self.culled_last_process
    }

    /// Drop every entry whose attenuation against the current listener is at
    /// or below [`CULL_THRESHOLD`], returning how many were dropped.
    ///
    /// Run this before the pool is mixed and stop the voices listed in
    /// [`culled_last_process`](Self::culled_last_process), so an inaudible
    /// source contributes nothing to the buffer.
    pub fn cull_inaudible(&mut self) -> usize {
        self.culled_last_process.clear();

        for entry in self.entries.iter_mut() {
            let distance = self.listener.distance(entry.position);
            entry.attenuation = distance_attenuation(distance, entry.gain, entry.max_distance);
            if entry.attenuation <= CULL_THRESHOLD {
                log::debug!(
                    "Culling spatial voice {} (distance: {:.2}, max: {:.2})",
                    entry.sound_id,
                    distance,
                    entry.max_distance
                );
                entry.active = false;
                self.culled_last_process.push(entry.sound_id);
            }
        }

        if !self.culled_last_process.is_empty() {
            self.entries.retain(|e| e.active);
        }
        self.culled_last_process.len()
    }

    /// Spatialize an interleaved stereo buffer that `pool` has just mixed.
    ///
    /// Starts with a [`cull_inaudible`](Self::cull_inaudible) pass; in the
    /// engine that pass already ran before mixing, so nothing is left to cull.
    /// Entries whose voice ended during the mix are still processed so their
    /// last buffer is shaped correctly, then pruned once the whole buffer is
    /// done.
    pub fn process(&mut self, buffer: &mut [f32], pool: &VoicePool) -> SpatialReport {
        let mut report = SpatialReport {
            culled: self.cull_inaudible(),
            ..Default::default()
        };

        for entry in self.entries.iter_mut() {
            let audible_this_buffer =
                pool.is_active(entry.sound_id) || pool.finished_last_mix().contains(&entry.sound_id);
            if !audible_this_buffer {
                entry.active = false;
                continue;
            }

            entry.azimuth = azimuth_degrees(self.listener, entry.position);
            let cue = BinauralCue::from_azimuth(entry.azimuth, self.sample_rate);
            entry.interaural_delay_frames = cue.delay_frames;

            apply_gain(buffer, entry.attenuation);
            cue.apply(buffer);
            report.processed += 1;
        }

        self.entries
            .retain(|e| e.active && pool.is_active(e.sound_id));

        report
    }
}
