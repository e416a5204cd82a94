//! Configuration for ChimeSonic

use crate::error::{ChimeSonicError, Result};

/// Sample rate every asset and stream in the engine runs at.
pub const ENGINE_SAMPLE_RATE: u32 = 48000;

/// Interleaved stereo.
pub const ENGINE_CHANNELS: u16 = 2;

/// Configuration descriptor for a ChimeSonic engine
#[derive(Debug, Clone)]
pub struct ChimeSonicEngineDesc {
    /// Output sample rate. Only 48000 Hz is supported; there is no resampling.
    pub sample_rate: u32,
    /// Output channel count. Only stereo is supported.
    pub channels: u16,
    /// Upper bound on simultaneously active voices. The voice pool and the
    /// spatial set are pre-sized to this so the audio callback never allocates.
    pub max_voices: usize,
    /// Initial capacity of the sound registry
    pub registry_capacity: usize,
    /// Cutoff distance used by `play_sound_3d` when no explicit range is given
    pub default_max_distance: f32,
    /// Capacity of the event queue; events beyond it are dropped
    pub event_capacity: usize,
    /// Ask the stream provider for its low-latency performance mode
    pub low_latency: bool,
    /// Ask the stream provider for exclusive device access
    pub exclusive: bool,
}

impl Default for ChimeSonicEngineDesc {
    fn default() -> Self {
        Self {
            sample_rate: ENGINE_SAMPLE_RATE,
            channels: ENGINE_CHANNELS,
            max_voices: 64,
            registry_capacity: 32,
            default_max_distance: 100.0,
            event_capacity: 64,
            low_latency: true,
            exclusive: true,
        }
    }
}

impl ChimeSonicEngineDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_voices(mut self, max: usize) -> Self {
        self.max_voices = max;
        self
    }

    pub fn registry_capacity(mut self, capacity: usize) -> Self {
        self.registry_capacity = capacity;
        self
    }

    pub fn default_max_distance(mut self, distance: f32) -> Self {
        self.default_max_distance = distance;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn low_latency(mut self, enable: bool) -> Self {
        self.low_latency = enable;
        self
    }

    pub fn exclusive(mut self, enable: bool) -> Self {
        self.exclusive = enable;
        self
    }

    /// Reject descriptors the engine cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate != ENGINE_SAMPLE_RATE {
            return Err(ChimeSonicError::Configuration(format!(
                "Sample rate {} Hz is not supported (expected {} Hz)",
                self.sample_rate, ENGINE_SAMPLE_RATE
            )));
        }

        if self.channels != ENGINE_CHANNELS {
            return Err(ChimeSonicError::Configuration(format!(
                "Channel count {} is not supported (expected {})",
                self.channels, ENGINE_CHANNELS
            )));
        }

        if self.max_voices == 0 {
            return Err(ChimeSonicError::Configuration(
                "max_voices must be greater than 0".to_string(),
            ));
        }

        if self.default_max_distance.is_nan() || self.default_max_distance <= 0.0 {
            return Err(ChimeSonicError::Configuration(format!(
                "default_max_distance must be positive, got {}",
                self.default_max_distance
            )));
        }

        Ok(())
    }
}
