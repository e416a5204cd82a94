// Mixer module - the active voice set and the per-buffer mix
//
// Every structure touched by `mix` is sized up front, so mixing a buffer never
// allocates. Voices are kept sorted by sound id and summed in that order, so
// the same set of voices always produces bit-identical output.

use crate::audio_data::{SoundId, WaveformAsset};
use crate::error::{ChimeSonicError, Result};
use crate::playback::{MixOutcome, PlayRequest, SoundCategory, Voice, VoiceHandle};
use std::sync::Arc;

/// Summary of one mix call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MixReport {
    /// Largest number of frames any voice contributed
    pub frames_filled: usize,
    /// Voices that reached their end and were removed
    pub completed: usize,
    /// Looping voices that rewound
    pub looped: usize,
    /// Voices dropped because their asset was unloaded
    pub orphaned: usize,
}

/// Set of currently playing voices, keyed by sound id.
#[derive(Debug)]
pub struct VoicePool {
    /// Sorted by `Voice::sound_id`, capacity `max_voices`
    voices: Vec<Voice>,
    max_voices: usize,
    finished_last_mix: Vec<SoundId>,
    looped_last_mix: Vec<SoundId>,
    orphaned_last_mix: Vec<SoundId>,
}

impl VoicePool {
    pub fn new(max_voices: usize) -> Self {
        Self {
            voices: Vec::with_capacity(max_voices),
            max_voices,
            finished_last_mix: Vec::with_capacity(max_voices),
            looped_last_mix: Vec::with_capacity(max_voices),
            orphaned_last_mix: Vec::with_capacity(max_voices),
        }
    }

    pub fn max_voices(&self) -> usize {
        self.max_voices
    }

    fn slot(&self, id: SoundId) -> std::result::Result<usize, usize> {
        self.voices.binary_search_by_key(&id, |voice| voice.sound_id())
    }

    /// Starts `asset` from frame 0.
    ///
    /// A sound that is already playing is restarted with the new parameters
    /// instead of layering a second instance.
    pub fn play(
        &mut self,
        asset: &Arc<WaveformAsset>,
        request: PlayRequest,
    ) -> Result<VoiceHandle> {
        let id = asset.id();
        let slot = self.slot(id);
        let restarting = slot.is_ok();
        if !restarting && self.voices.len() >= self.max_voices {
            return Err(ChimeSonicError::VoicePoolExhausted {
                max_voices: self.max_voices,
            });
        }

        let voice = Voice::new(asset, request);
        log::debug!(
            "{} voice {} (gain: {:.3}, pan: {:.2}, looping: {})",
            if restarting { "Restarting" } else { "Starting" },
            id,
            voice.gain(),
            voice.pan(),
            voice.is_looping()
        );
        match slot {
            Ok(index) => self.voices[index] = voice,
            Err(index) => self.voices.insert(index, voice),
        }
        Ok(VoiceHandle::new(id))
    }

    /// Removes the voice, returning whether one was playing.
    pub fn stop(&mut self, handle: VoiceHandle) -> bool {
        match self.slot(handle.sound_id()) {
            Ok(index) => {
                self.voices.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    pub fn stop_all(&mut self) {
        self.voices.clear();
    }

    /// Stops every voice of `category`, returning how many were removed.
    pub fn stop_category(&mut self, category: SoundCategory) -> usize {
        let before = self.voices.len();
        self.voices.retain(|voice| voice.category() != category);
        before - self.voices.len()
    }

    pub fn is_active(&self, id: SoundId) -> bool {
        self.slot(id).is_ok()
    }

    pub fn voice(&self, id: SoundId) -> Option<&Voice> {
        self.slot(id).ok().map(|index| &self.voices[index])
    }

    pub fn active_count(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Sound ids whose voice ended during the most recent mix.
    pub fn finished_last_mix(&self) -> &[SoundId] {
        &self.finished_last_mix
    }

    /// Sound ids whose looping voice rewound during the most recent mix.
    pub fn looped_last_mix(&self) -> &[SoundId] {
        &self.looped_last_mix
    }

    /// Subset of `finished_last_mix` dropped because the asset was unloaded.
    pub fn orphaned_last_mix(&self) -> &[SoundId] {
        &self.orphaned_last_mix
    }

    /// Mix every active voice into an interleaved stereo buffer.
    ///
    /// The buffer is accumulated into, not overwritten; callers zero it first.
    /// Every sample is clamped to [-1, 1] once after all voices have been added,
    /// so the result does not depend on play order. Voices that finished or
    /// lost their asset are removed before returning.
    pub fn mix(&mut self, output: &mut [f32]) -> MixReport {
        self.finished_last_mix.clear();
        self.looped_last_mix.clear();
        self.orphaned_last_mix.clear();

        let mut report = MixReport::default();

        for voice in self.voices.iter_mut() {
            let id = voice.sound_id();
            match voice.mix_into(output) {
                MixOutcome::Playing { frames } => {
                    report.frames_filled = report.frames_filled.max(frames);
                }
                MixOutcome::Looped { frames } => {
                    report.frames_filled = report.frames_filled.max(frames);
                    report.looped += 1;
                    self.looped_last_mix.push(id);
                }
                MixOutcome::Finished { frames } => {
                    report.frames_filled = report.frames_filled.max(frames);
                    report.completed += 1;
                    self.finished_last_mix.push(id);
                }
                MixOutcome::AssetGone => {
                    report.orphaned += 1;
                    self.finished_last_mix.push(id);
                    self.orphaned_last_mix.push(id);
                }
            }
        }

        for sample in output.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }

        if !self.finished_last_mix.is_empty() {
            let finished = &self.finished_last_mix;
            self.voices.retain(|voice| !finished.contains(&voice.sound_id()));
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_asset(id: u32, value: f32, frames: usize) -> Arc<WaveformAsset> {
        Arc::new(WaveformAsset::new(SoundId(id), vec![value; frames * 2], 48000, 2).unwrap())
    }

    #[test]
    fn test_retrigger_restarts_single_voice() {
        let asset = constant_asset(1, 0.1, 100);
        let mut pool = VoicePool::new(4);
        pool.play(&asset, PlayRequest::default()).unwrap();

        let mut buffer = vec![0.0; 20];
        pool.mix(&mut buffer);
        assert_eq!(pool.voice(SoundId(1)).unwrap().cursor(), 10);

        let handle = pool.play(&asset, PlayRequest::new(0.5, 0.0)).unwrap();
        assert_eq!(handle.sound_id(), SoundId(1));
        assert_eq!(pool.active_count(), 1);
        assert_eq!(pool.voice(SoundId(1)).unwrap().cursor(), 0);
        assert_eq!(pool.voice(SoundId(1)).unwrap().gain(), 0.5);
    }

    #[test]
    fn test_pool_capacity() {
        let mut pool = VoicePool::new(2);
        let a = constant_asset(1, 0.1, 10);
        let b = constant_asset(2, 0.1, 10);
        let c = constant_asset(3, 0.1, 10);
        pool.play(&a, PlayRequest::default()).unwrap();
        pool.play(&b, PlayRequest::default()).unwrap();
        assert!(matches!(
            pool.play(&c, PlayRequest::default()),
            Err(ChimeSonicError::VoicePoolExhausted { max_voices: 2 })
        ));
        // Restarting an active id is still allowed at capacity.
        assert!(pool.play(&a, PlayRequest::default()).is_ok());
    }

    #[test]
    fn test_finished_voice_is_removed_by_mix() {
        let asset = constant_asset(1, 0.1, 5);
        let mut pool = VoicePool::new(4);
        pool.play(&asset, PlayRequest::default()).unwrap();

        let mut buffer = vec![0.0; 20];
        let report = pool.mix(&mut buffer);
        assert_eq!(report.completed, 1);
        assert_eq!(report.frames_filled, 5);
        assert!(!pool.is_active(SoundId(1)));
        assert_eq!(pool.finished_last_mix(), &[SoundId(1)]);
    }

    #[test]
    fn test_output_is_clamped_after_accumulation() {
        let assets: Vec<_> = (1..=3).map(|id| constant_asset(id, 0.6, 8)).collect();
        let mut pool = VoicePool::new(4);
        for asset in &assets {
            pool.play(asset, PlayRequest::default()).unwrap();
        }
        let mut buffer = vec![0.0; 16];
        pool.mix(&mut buffer);
        assert!(buffer.iter().all(|s| *s == 1.0));
    }

    #[test]
    fn test_loud_then_quiet_is_clamped_once() {
        // +0.9 +0.9 -0.9 accumulates to 0.9; clamping per voice would give 0.1.
        let loud_a = constant_asset(1, 0.9, 4);
        let loud_b = constant_asset(2, 0.9, 4);
        let quiet = constant_asset(3, -0.9, 4);
        let mut pool = VoicePool::new(4);
        pool.play(&loud_a, PlayRequest::default()).unwrap();
        pool.play(&loud_b, PlayRequest::default()).unwrap();
        pool.play(&quiet, PlayRequest::default()).unwrap();
        let mut buffer = vec![0.0; 8];
        let report = pool.mix(&mut buffer);
        assert_eq!(report.orphaned, 0);
        assert!(buffer.iter().all(|s| (*s - 0.9).abs() < 1e-6));
    }

    #[test]
    fn test_unloaded_asset_orphans_voice() {
        let asset = constant_asset(1, 0.4, 8);
        let mut pool = VoicePool::new(4);
        pool.play(&asset, PlayRequest::default()).unwrap();
        drop(asset);

        let mut buffer = vec![0.0; 8];
        let report = pool.mix(&mut buffer);
        assert_eq!(report.orphaned, 1);
        assert_eq!(pool.orphaned_last_mix(), &[SoundId(1)]);
        assert!(pool.is_empty());
        assert!(buffer.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_mix_order_ignores_play_order() {
        let assets: Vec<_> = [0.1, 0.2, 0.3, 0.7]
            .iter()
            .enumerate()
            .map(|(i, value)| constant_asset(i as u32 + 1, *value, 4))
            .collect();

        let render = |order: &[usize]| {
            let mut pool = VoicePool::new(4);
            for &index in order {
                pool.play(&assets[index], PlayRequest::new(0.3, 0.1)).unwrap();
            }
            let mut buffer = vec![0.0; 8];
            pool.mix(&mut buffer);
            buffer
        };

        let forward = render(&[0, 1, 2, 3]);
        assert!(forward.iter().all(|s| *s != 0.0));
        assert_eq!(forward, render(&[3, 2, 1, 0]));
        assert_eq!(forward, render(&[2, 0, 3, 1]));
    }

    #[test]
    fn test_stop_category() {
        let mut pool = VoicePool::new(4);
        pool.play(&constant_asset(1, 0.1, 8), PlayRequest::default())
            .unwrap();
        pool.play(
            &constant_asset(2, 0.1, 8),
            PlayRequest::default().category(SoundCategory::Music),
        )
        .unwrap();

        assert_eq!(pool.stop_category(SoundCategory::Music), 1);
        assert!(pool.is_active(SoundId(1)));
        assert!(!pool.is_active(SoundId(2)));
    }

    #[test]
    fn test_stop_and_stop_all() {
        let mut pool = VoicePool::new(4);
        pool.play(&constant_asset(1, 0.1, 8), PlayRequest::default())
            .unwrap();
        pool.play(&constant_asset(2, 0.1, 8), PlayRequest::default())
            .unwrap();

        assert!(pool.stop(VoiceHandle::new(SoundId(1))));
        assert!(!pool.stop(VoiceHandle::new(SoundId(1))));
        pool.stop_all();
        assert!(pool.is_empty());
    }
}
