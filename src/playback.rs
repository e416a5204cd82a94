//! Voices: in-progress playback instances of loaded sounds.
//!
//! - [`SoundCategory`]: which global volume a voice is scaled by
//! - [`PlayRequest`]: gain, pan, position and looping captured at play time
//! - [`Voice`]: one active instance with its own playback cursor
//! - [`VoiceHandle`]: key returned to callers for stopping a voice
//!
//! Most users go through [`ChimeSonicEngine`](crate::ChimeSonicEngine) rather
//! than touching voices directly.

use crate::audio_data::{SoundId, WaveformAsset};
use crate::math::Vec3;
use std::sync::{Arc, Weak};

/// Volume category a voice belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoundCategory {
    #[default]
    Sfx,
    Music,
}

/// Handle to an active voice.
///
/// Voices are keyed by sound id, so at most one voice per sound plays at a
/// time and the handle for a sound is always the same value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VoiceHandle(SoundId);

impl VoiceHandle {
    pub fn new(sound_id: SoundId) -> Self {
        Self(sound_id)
    }

    pub fn sound_id(&self) -> SoundId {
        self.0
    }
}

impl std::fmt::Display for VoiceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VoiceHandle({})", self.0.0)
    }
}

/// Parameters copied into a voice when it starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayRequest {
    /// Effective linear gain, already scaled by the category and master volumes
    pub gain: f32,
    /// -1 = full left, 0 = centre, +1 = full right
    pub pan: f32,
    pub position: Option<Vec3>,
    pub looping: bool,
    pub category: SoundCategory,
}

impl Default for PlayRequest {
    fn default() -> Self {
        Self {
            gain: 1.0,
            pan: 0.0,
            position: None,
            looping: false,
            category: SoundCategory::Sfx,
        }
    }
}

impl PlayRequest {
    pub fn new(gain: f32, pan: f32) -> Self {
        Self {
            gain,
            pan,
            ..Default::default()
        }
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn category(mut self, category: SoundCategory) -> Self {
        self.category = category;
        self
    }
}

/// What happened to a voice during one mix call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixOutcome {
    /// Still inside the asset
    Playing { frames: usize },
    /// Hit the end of a looping asset and rewound to frame 0
    Looped { frames: usize },
    /// Hit the end of a one-shot asset; the voice is terminal
    Finished { frames: usize },
    /// The asset was unloaded; nothing was mixed
    AssetGone,
}

impl MixOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished { .. } | Self::AssetGone)
    }
}

/// Active playback instance
#[derive(Debug)]
pub struct Voice {
    sound_id: SoundId,
    asset: Weak<WaveformAsset>,
    cursor: usize,
    gain: f32,
    pan: f32,
    position: Option<Vec3>,
    looping: bool,
    category: SoundCategory,
}

impl Voice {
    pub fn new(asset: &Arc<WaveformAsset>, request: PlayRequest) -> Self {
        Self {
            sound_id: asset.id(),
            asset: Arc::downgrade(asset),
            cursor: 0,
            gain: request.gain.max(0.0),
            pan: request.pan.clamp(-1.0, 1.0),
            position: request.position,
            looping: request.looping,
            category: request.category,
        }
    }

    pub fn sound_id(&self) -> SoundId {
        self.sound_id
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    pub fn position(&self) -> Option<Vec3> {
        self.position
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn category(&self) -> SoundCategory {
        self.category
    }

    /// Left and right channel gains for the linear pan law.
    pub fn channel_gains(&self) -> (f32, f32) {
        let left = if self.pan < 0.0 { 1.0 } else { 1.0 - self.pan };
        let right = if self.pan > 0.0 { 1.0 } else { 1.0 + self.pan };
        (self.gain * left, self.gain * right)
    }

    /// Accumulate this voice into an interleaved stereo buffer.
    ///
    /// Mixes up to `buffer.len() / 2` frames starting at the cursor and
    /// advances the cursor by the frames actually mixed. Reaching the end of a
    /// looping asset rewinds to 0 without back-filling the rest of `buffer`.
    /// No clamping happens here; the pool clamps once after every voice.
    pub fn mix_into(&mut self, buffer: &mut [f32]) -> MixOutcome {
        let Some(asset) = self.asset.upgrade() else {
            return MixOutcome::AssetGone;
        };

        let total_frames = asset.frame_count();
        if self.cursor >= total_frames {
            return self.reach_end(0, total_frames);
        }

        let frames = (buffer.len() / 2).min(total_frames - self.cursor);
        let (left_gain, right_gain) = self.channel_gains();
        let source = &asset.samples()[self.cursor * 2..(self.cursor + frames) * 2];

        for (out, input) in buffer.chunks_exact_mut(2).zip(source.chunks_exact(2)) {
            out[0] += input[0] * left_gain;
            out[1] += input[1] * right_gain;
        }

        self.cursor += frames;
        if self.cursor >= total_frames {
            self.reach_end(frames, total_frames)
        } else {
            MixOutcome::Playing { frames }
        }
    }

    fn reach_end(&mut self, frames: usize, total_frames: usize) -> MixOutcome {
        if self.looping && total_frames > 0 {
            self.cursor = 0;
            MixOutcome::Looped { frames }
        } else {
            MixOutcome::Finished { frames }
        }
    }
}
