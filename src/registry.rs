//! Sound registry: the owner of every loaded waveform.
//!
//! The registry holds the only strong reference to each [`WaveformAsset`].
//! Voices keep a `Weak` handle, so unloading an asset silently retires every
//! voice still playing it on the next mix.
//!
//! Loading is split in two phases so the caller can keep synthesis outside the
//! engine lock: [`SoundRegistry::get`] to short-circuit an existing id, then
//! [`SoundRegistry::insert`] with an asset produced elsewhere.
//! [`SoundRegistry::load`] runs both phases back to back for single-threaded use.

use crate::audio_data::{AssetProducer, SoundDescriptor, SoundId, WaveformAsset};
use crate::config::{ENGINE_CHANNELS, ENGINE_SAMPLE_RATE};
use crate::error::{ChimeSonicError, Result};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct SoundRegistry {
    assets: HashMap<SoundId, Arc<WaveformAsset>>,
}

impl SoundRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            assets: HashMap::with_capacity(capacity),
        }
    }

    /// Loads `id` using `producer`, or returns the already loaded asset.
    ///
    /// Loading an id that is present performs no work and never overwrites.
    pub fn load(
        &mut self,
        id: SoundId,
        descriptor: &SoundDescriptor,
        producer: &dyn AssetProducer,
    ) -> Result<Arc<WaveformAsset>> {
        if let Some(existing) = self.get(id) {
            log::debug!("Sound {} already loaded", id);
            return Ok(existing);
        }

        let asset = producer.produce(id, descriptor)?;
        self.insert(asset)
    }

    /// Inserts a freshly produced asset.
    ///
    /// If the id is already present the existing asset wins and is returned;
    /// `asset` is dropped. Assets that are not 48 kHz stereo are rejected.
    pub fn insert(&mut self, asset: WaveformAsset) -> Result<Arc<WaveformAsset>> {
        if asset.sample_rate() != ENGINE_SAMPLE_RATE || asset.channels() != ENGINE_CHANNELS {
            return Err(ChimeSonicError::AudioFormat(format!(
                "{} is {} Hz / {} ch, engine requires {} Hz / {} ch",
                asset.id(),
                asset.sample_rate(),
                asset.channels(),
                ENGINE_SAMPLE_RATE,
                ENGINE_CHANNELS
            )));
        }

        let id = asset.id();
        if let Some(existing) = self.assets.get(&id) {
            log::debug!("Sound {} was loaded concurrently, keeping first", id);
            return Ok(Arc::clone(existing));
        }

        log::info!(
            "Loaded sound {} ({} frames, {:?})",
            id,
            asset.frame_count(),
            asset.duration()
        );
        let asset = Arc::new(asset);
        self.assets.insert(id, Arc::clone(&asset));
        Ok(asset)
    }

    /// Removes `id` and hands back the strong reference so the caller decides
    /// where the sample memory is released. No-op if absent.
    pub fn unload(&mut self, id: SoundId) -> Option<Arc<WaveformAsset>> {
        let removed = self.assets.remove(&id);
        if removed.is_some() {
            log::info!("Unloaded sound {}", id);
        }
        removed
    }

    /// Removes every asset, returning them for deferred release.
    pub fn unload_all(&mut self) -> Vec<Arc<WaveformAsset>> {
        let removed: Vec<_> = self.assets.drain().map(|(_, asset)| asset).collect();
        log::info!("Unloaded all sounds ({})", removed.len());
        removed
    }

    pub fn get(&self, id: SoundId) -> Option<Arc<WaveformAsset>> {
        self.assets.get(&id).cloned()
    }

    pub fn contains(&self, id: SoundId) -> bool {
        self.assets.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<SoundId> {
        self.assets.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_data::Synthesizer;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProducer {
        calls: AtomicUsize,
    }

    impl AssetProducer for CountingProducer {
        fn produce(&self, id: SoundId, descriptor: &SoundDescriptor) -> Result<WaveformAsset> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Synthesizer.produce(id, descriptor)
        }
    }

    #[test]
    fn test_load_is_idempotent() {
        let producer = CountingProducer {
            calls: AtomicUsize::new(0),
        };
        let mut registry = SoundRegistry::new();

        let first = registry
            .load(SoundId(6), &SoundDescriptor::tone(1200.0, 0.1), &producer)
            .unwrap();
        let second = registry
            .load(SoundId(6), &SoundDescriptor::click(), &producer)
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(producer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.frame_count(), 4800);
    }

    #[test]
    fn test_insert_keeps_first_asset() {
        let mut registry = SoundRegistry::new();
        let first = registry
            .insert(WaveformAsset::new(SoundId(1), vec![0.5; 4], 48000, 2).unwrap())
            .unwrap();
        let second = registry
            .insert(WaveformAsset::new(SoundId(1), vec![0.1; 8], 48000, 2).unwrap())
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_insert_rejects_foreign_format() {
        let mut registry = SoundRegistry::new();
        let mono = WaveformAsset::new(SoundId(1), vec![0.0; 4], 48000, 1).unwrap();
        let slow = WaveformAsset::new(SoundId(2), vec![0.0; 4], 44100, 2).unwrap();
        assert!(matches!(
            registry.insert(mono),
            Err(ChimeSonicError::AudioFormat(_))
        ));
        assert!(registry.insert(slow).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unload_invalidates_weak_handles() {
        let mut registry = SoundRegistry::new();
        let asset = registry
            .load(SoundId(4), &SoundDescriptor::click(), &Synthesizer)
            .unwrap();
        let weak = Arc::downgrade(&asset);
        drop(asset);

        let removed = registry.unload(SoundId(4));
        assert!(removed.is_some());
        drop(removed);
        assert!(weak.upgrade().is_none());
        assert!(!registry.contains(SoundId(4)));
    }

    #[test]
    fn test_unload_missing_is_noop() {
        let mut registry = SoundRegistry::new();
        assert!(registry.unload(SoundId(99)).is_none());
    }

    #[test]
    fn test_unload_all() {
        let mut registry = SoundRegistry::new();
        for id in 1..=3 {
            registry
                .load(SoundId(id), &SoundDescriptor::click(), &Synthesizer)
                .unwrap();
        }
        let mut ids = registry.ids();
        ids.sort();
        assert_eq!(ids, vec![SoundId(1), SoundId(2), SoundId(3)]);

        assert_eq!(registry.unload_all().len(), 3);
        assert!(registry.is_empty());
        assert!(registry.get(SoundId(1)).is_none());
    }
}
