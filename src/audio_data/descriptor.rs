use super::SoundId;
use crate::error::{ChimeSonicError, Result};

/// Synthesis parameters describing a waveform to produce.
///
/// Durations are in seconds, frequencies in Hz.
#[derive(Debug, Clone, PartialEq)]
pub enum SoundDescriptor {
    /// Sine tone with a 10% linear attack and a decay over the last 30%
    Tone { frequency: f32, duration: f32 },
    /// Uniform white noise at half amplitude, 10% attack, decay over the last 20%
    Noise { duration: f32, seed: u64 },
    /// 50 ms exponentially decaying click
    Click,
    /// 150 ms noise burst under a half-sine envelope
    Whoosh { seed: u64 },
    /// Linear chirp between two frequencies with the tone envelope
    Sweep {
        start_frequency: f32,
        end_frequency: f32,
        duration: f32,
    },
}

impl SoundDescriptor {
    pub fn tone(frequency: f32, duration: f32) -> Self {
        Self::Tone {
            frequency,
            duration,
        }
    }

    pub fn noise(duration: f32) -> Self {
        Self::Noise { duration, seed: 0 }
    }

    pub fn click() -> Self {
        Self::Click
    }

    pub fn whoosh() -> Self {
        Self::Whoosh { seed: 0 }
    }

    pub fn sweep(start_frequency: f32, end_frequency: f32, duration: f32) -> Self {
        Self::Sweep {
            start_frequency,
            end_frequency,
            duration,
        }
    }

    /// Placeholder sound table used by the card game front-end.
    ///
    /// | id | sound        | waveform            |
    /// |----|--------------|---------------------|
    /// | 1  | card deal    | click               |
    /// | 2  | card flip    | whoosh              |
    /// | 3  | card place   | click               |
    /// | 4  | button click | click               |
    /// | 5  | shuffle      | noise, 0.3 s        |
    /// | 6  | coin         | tone 1200 Hz, 0.1 s |
    /// | 7  | win          | tone 880 Hz, 0.5 s  |
    /// | 8  | lose         | tone 440 Hz, 0.5 s  |
    ///
    /// Any other id maps to a click. Noise seeds are the sound id so the
    /// table is reproducible.
    pub fn builtin(id: SoundId) -> Self {
        match id.0 {
            2 => Self::Whoosh {
                seed: u64::from(id.0),
            },
            5 => Self::Noise {
                duration: 0.3,
                seed: u64::from(id.0),
            },
            6 => Self::tone(1200.0, 0.1),
            7 => Self::tone(880.0, 0.5),
            8 => Self::tone(440.0, 0.5),
            _ => Self::Click,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Tone {
                frequency,
                duration,
            } => {
                check_positive("frequency", frequency)?;
                check_positive("duration", duration)
            }
            Self::Noise { duration, .. } => check_positive("duration", duration),
            Self::Click | Self::Whoosh { .. } => Ok(()),
            Self::Sweep {
                start_frequency,
                end_frequency,
                duration,
            } => {
                check_positive("start_frequency", start_frequency)?;
                check_positive("end_frequency", end_frequency)?;
                check_positive("duration", duration)
            }
        }
    }
}

fn check_positive(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ChimeSonicError::Synthesis(format!(
            "{} must be a positive finite number, got {}",
            name, value
        )))
    }
}
