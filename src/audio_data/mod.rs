//! Waveform assets and the producers that create them.
//!
//! - [`WaveformAsset`]: immutable interleaved stereo sample data owned by the registry
//! - [`SoundDescriptor`]: opaque synthesis parameters describing a waveform
//! - [`AssetProducer`]: trait turning a descriptor into an asset
//! - [`Synthesizer`]: default procedural producer (tone, noise, click, whoosh, sweep)

mod descriptor;
mod producer;
mod synthesizer;

pub use descriptor::SoundDescriptor;
pub use producer::AssetProducer;
pub use synthesizer::Synthesizer;

use crate::error::{ChimeSonicError, Result};
use std::time::Duration;

/// Integer key identifying a loaded sound.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundId(pub u32);

impl std::fmt::Display for SoundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SoundId({})", self.0)
    }
}

impl From<u32> for SoundId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Immutable sample data for one loaded sound.
///
/// Samples are interleaved; with the engine's stereo layout frame `n` is
/// `samples[2n]` (left) and `samples[2n + 1]` (right).
#[derive(Debug)]
pub struct WaveformAsset {
    id: SoundId,
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    duration: Duration,
    total_frames: usize,
}

impl WaveformAsset {
    pub fn new(id: SoundId, samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self> {
        if channels == 0 {
            return Err(ChimeSonicError::AudioFormat(
                "Channel count must be greater than 0".to_string(),
            ));
        }

        if sample_rate == 0 {
            return Err(ChimeSonicError::AudioFormat(
                "Sample rate must be greater than 0".to_string(),
            ));
        }

        if samples.len() % channels as usize != 0 {
            return Err(ChimeSonicError::AudioFormat(format!(
                "{} samples do not divide into {}-channel frames",
                samples.len(),
                channels
            )));
        }

        let total_frames = samples.len() / channels as usize;
        let duration = Duration::from_secs_f64(total_frames as f64 / sample_rate as f64);

        Ok(Self {
            id,
            samples,
            sample_rate,
            channels,
            duration,
            total_frames,
        })
    }

    pub fn id(&self) -> SoundId {
        self.id
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn frame_count(&self) -> usize {
        self.total_frames
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
