use crate::audio_data::{AssetProducer, SoundDescriptor, SoundId, Synthesizer, WaveformAsset};
use crate::config::ChimeSonicEngineDesc;
use crate::error::{ChimeSonicError, Result};
use crate::events::ChimeSonicEvent;
use crate::math::Vec3;
use crate::mixer::VoicePool;
use crate::playback::{PlayRequest, SoundCategory, VoiceHandle};
use crate::registry::SoundRegistry;
use crate::spatial::{Spatializer, validate_max_distance};
use crate::stream::{
    AudioCallback, CallbackResult, CpalStreamProvider, OutputStream, StreamDesc, StreamProvider,
};
use crossbeam_channel::{Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

/// Lifecycle of the engine and its output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No stream is open; control calls are ignored
    Uninitialized,
    /// Stream open but not running
    Initialized,
    Playing,
    Paused,
}

impl EngineState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Playing => "playing",
            Self::Paused => "paused",
        }
    }
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Stored reverb parameters. No reverb is rendered yet.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReverbSettings {
    pub enabled: bool,
    pub level: f32,
}

/// Everything the audio callback and the control surface share.
#[derive(Debug)]
struct MixState {
    registry: SoundRegistry,
    voices: VoicePool,
    spatializer: Spatializer,
    master_volume: f32,
    music_volume: f32,
    sfx_volume: f32,
    reverb: ReverbSettings,
}

impl MixState {
    fn category_volume(&self, category: SoundCategory) -> f32 {
        match category {
            SoundCategory::Sfx => self.sfx_volume,
            SoundCategory::Music => self.music_volume,
        }
    }

    fn effective_gain(&self, volume: f32, category: SoundCategory) -> f32 {
        volume * self.category_volume(category) * self.master_volume
    }

    fn play(&mut self, id: SoundId, request: PlayRequest) -> Result<VoiceHandle> {
        let asset = self
            .registry
            .get(id)
            .ok_or(ChimeSonicError::AssetNotFound(id))?;
        let handle = self.voices.play(&asset, request)?;
        // A plain retrigger turns a 3D voice back into a flat one.
        if request.position.is_none() {
            self.spatializer.stop(id);
        }
        Ok(handle)
    }
}

/// The part of the engine the stream provider calls into.
struct EngineCore {
    state: Mutex<MixState>,
    events: Sender<ChimeSonicEvent>,
}

impl EngineCore {
    fn lock(&self) -> MutexGuard<'_, MixState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            log::warn!("Mix state lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn emit(&self, event: ChimeSonicEvent) {
        let _ = self.events.try_send(event);
    }

    fn render(&self, buffer: &mut [f32]) {
        let mut guard = self.lock();
        let state = &mut *guard;

        buffer.fill(0.0);

        // Out-of-range 3D voices are stopped before they reach the mix.
        state.spatializer.cull_inaudible();
        for &sound_id in state.spatializer.culled_last_process() {
            state.voices.stop(VoiceHandle::new(sound_id));
            self.emit(ChimeSonicEvent::SpatialVoiceCulled { sound_id });
        }

        state.voices.mix(buffer);
        state.spatializer.process(buffer, &state.voices);

        for &sound_id in state.voices.orphaned_last_mix() {
            self.emit(ChimeSonicEvent::SoundOrphaned { sound_id });
        }
        for &sound_id in state.voices.finished_last_mix() {
            if !state.voices.orphaned_last_mix().contains(&sound_id) {
                self.emit(ChimeSonicEvent::SoundCompleted { sound_id });
            }
        }
        for &sound_id in state.voices.looped_last_mix() {
            self.emit(ChimeSonicEvent::SoundLooped { sound_id });
        }
    }
}

impl AudioCallback for EngineCore {
    fn on_buffer_ready(&self, buffer: &mut [f32]) -> CallbackResult {
        self.render(buffer);
        CallbackResult::Continue
    }
}

struct Lifecycle {
    state: EngineState,
    stream: Option<Box<dyn OutputStream>>,
}

/// The audio engine: one hardware stream, one mixer, one listener.
///
/// Construct exactly one per process in the application's composition root
/// and share it (e.g. as `Arc<ChimeSonicEngine>`). Every method takes `&self`
/// and is safe to call from any thread.
///
/// Control calls made before a successful [`initialize`](Self::initialize)
/// are logged and ignored. Lifecycle calls that the current state does not
/// allow are ignored silently.
///
/// # Example
///
/// ```no_run
/// use chimesonic::*;
///
/// let engine = ChimeSonicEngine::with_default_device(ChimeSonicEngineDesc::default())?;
/// engine.initialize()?;
/// engine.start();
///
/// engine.load_sound(SoundId(6), SoundDescriptor::tone(1200.0, 0.1));
/// engine.play_sound(SoundId(6), 1.0, 0.0);
/// # Ok::<(), ChimeSonicError>(())
/// ```
pub struct ChimeSonicEngine {
    desc: ChimeSonicEngineDesc,
    core: Arc<EngineCore>,
    lifecycle: Mutex<Lifecycle>,
    provider: Box<dyn StreamProvider>,
    producer: Box<dyn AssetProducer>,
    event_receiver: Receiver<ChimeSonicEvent>,
}

impl ChimeSonicEngine {
    /// Create an engine that opens its stream through `provider`
    pub fn new(desc: ChimeSonicEngineDesc, provider: impl StreamProvider + 'static) -> Result<Self> {
        Self::with_producer(desc, provider, Synthesizer)
    }

    /// Create an engine on the default cpal output device
    pub fn with_default_device(desc: ChimeSonicEngineDesc) -> Result<Self> {
        Self::new(desc, CpalStreamProvider::new())
    }

    /// Create an engine with a custom asset producer
    pub fn with_producer(
        desc: ChimeSonicEngineDesc,
        provider: impl StreamProvider + 'static,
        producer: impl AssetProducer + 'static,
    ) -> Result<Self> {
        desc.validate()?;

        let (events, event_receiver) = crossbeam_channel::bounded(desc.event_capacity);
        let state = MixState {
            registry: SoundRegistry::with_capacity(desc.registry_capacity),
            voices: VoicePool::new(desc.max_voices),
            spatializer: Spatializer::new(desc.sample_rate, desc.max_voices),
            master_volume: 1.0,
            music_volume: 1.0,
            sfx_volume: 1.0,
            reverb: ReverbSettings::default(),
        };

        Ok(Self {
            desc,
            core: Arc::new(EngineCore {
                state: Mutex::new(state),
                events,
            }),
            lifecycle: Mutex::new(Lifecycle {
                state: EngineState::Uninitialized,
                stream: None,
            }),
            provider: Box::new(provider),
            producer: Box::new(producer),
            event_receiver,
        })
    }

    /// Get the engine configuration
    pub fn config(&self) -> &ChimeSonicEngineDesc {
        &self.desc
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|poisoned| {
            log::warn!("Lifecycle lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn state(&self) -> EngineState {
        self.lock_lifecycle().state
    }

    pub fn is_initialized(&self) -> bool {
        self.state() != EngineState::Uninitialized
    }

    fn set_state(&self, lifecycle: &mut Lifecycle, to: EngineState) {
        let from = lifecycle.state;
        if from == to {
            return;
        }
        lifecycle.state = to;
        log::info!("Audio engine {} -> {}", from, to);
        self.core.emit(ChimeSonicEvent::StateChanged { from, to });
    }

    /// Open the output stream. Calling it again once initialized does nothing.
    ///
    /// # Errors
    ///
    /// Returns `StreamOpenFailure` if the provider cannot open a stream; the
    /// engine then stays uninitialized.
    pub fn initialize(&self) -> Result<()> {
        let mut lifecycle = self.lock_lifecycle();
        if lifecycle.state != EngineState::Uninitialized {
            log::info!("Audio engine already initialized");
            return Ok(());
        }

        let stream_desc = StreamDesc::from_engine_desc(&self.desc);
        let callback: Arc<dyn AudioCallback> = self.core.clone();
        match self.provider.open(&stream_desc, callback) {
            Ok(stream) => {
                lifecycle.stream = Some(stream);
                self.set_state(&mut lifecycle, EngineState::Initialized);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to open audio stream: {}", e);
                self.core.emit(ChimeSonicEvent::StreamOpenFailed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn request_transition(
        &self,
        lifecycle: &mut Lifecycle,
        action: &'static str,
        allowed_from: &[EngineState],
        to: EngineState,
        request: impl FnOnce(&mut dyn OutputStream) -> Result<()>,
    ) {
        if !allowed_from.contains(&lifecycle.state) {
            let ignored = ChimeSonicError::InvalidStateTransition {
                from: lifecycle.state.name(),
                action,
            };
            log::debug!("Ignoring request: {}", ignored);
            return;
        }

        let Some(stream) = lifecycle.stream.as_mut() else {
            return;
        };

        match request(&mut **stream) {
            Ok(()) => self.set_state(lifecycle, to),
            Err(e) => log::error!("Failed to {} audio stream: {}", action, e),
        }
    }

    /// Initialized -> Playing
    pub fn start(&self) {
        let mut lifecycle = self.lock_lifecycle();
        self.request_transition(
            &mut lifecycle,
            "start",
            &[EngineState::Initialized],
            EngineState::Playing,
            |stream| stream.request_start(),
        );
    }

    /// Playing | Paused -> Initialized
    pub fn stop(&self) {
        let mut lifecycle = self.lock_lifecycle();
        self.stop_locked(&mut lifecycle);
    }

    fn stop_locked(&self, lifecycle: &mut Lifecycle) {
        self.request_transition(
            lifecycle,
            "stop",
            &[EngineState::Playing, EngineState::Paused],
            EngineState::Initialized,
            |stream| stream.request_stop(),
        );
    }

    /// Playing -> Paused
    pub fn pause(&self) {
        let mut lifecycle = self.lock_lifecycle();
        self.request_transition(
            &mut lifecycle,
            "pause",
            &[EngineState::Playing],
            EngineState::Paused,
            |stream| stream.request_pause(),
        );
    }

    /// Paused -> Playing
    pub fn resume(&self) {
        let mut lifecycle = self.lock_lifecycle();
        self.request_transition(
            &mut lifecycle,
            "resume",
            &[EngineState::Paused],
            EngineState::Playing,
            |stream| stream.request_start(),
        );
    }

    /// Stop, close the stream and drop every voice. Loaded sounds are kept.
    pub fn release(&self) {
        let mut lifecycle = self.lock_lifecycle();
        if lifecycle.state == EngineState::Uninitialized {
            return;
        }

        self.stop_locked(&mut lifecycle);
        if let Some(mut stream) = lifecycle.stream.take() {
            stream.close();
        }

        {
            let mut state = self.core.lock();
            state.voices.stop_all();
            state.spatializer.stop_all();
        }
        self.set_state(&mut lifecycle, EngineState::Uninitialized);
    }

    /// Real-time entry point: fill `buffer` (interleaved stereo) with the next
    /// period of audio.
    ///
    /// Zeroes the buffer, mixes every active voice, spatializes the result and
    /// always asks the stream to continue.
    pub fn on_buffer_ready(&self, buffer: &mut [f32]) -> CallbackResult {
        self.core.on_buffer_ready(buffer)
    }

    fn accepts_control(&self, action: &str) -> bool {
        if self.is_initialized() {
            return true;
        }
        log::warn!("Ignoring {}: {}", action, ChimeSonicError::NotInitialized);
        false
    }

    /// Load a sound, or return the one already loaded under `id`.
    ///
    /// Synthesis runs without holding the engine lock.
    pub fn load_sound(
        &self,
        id: SoundId,
        descriptor: SoundDescriptor,
    ) -> Option<Arc<WaveformAsset>> {
        if !self.accepts_control("load_sound") {
            return None;
        }

        if let Some(existing) = self.core.lock().registry.get(id) {
            log::debug!("Sound {} already loaded", id);
            return Some(existing);
        }

        let asset = match self.producer.produce(id, &descriptor) {
            Ok(asset) => asset,
            Err(e) => {
                log::error!("Failed to load sound {}: {}", id, e);
                return None;
            }
        };

        let inserted = self.core.lock().registry.insert(asset);
        match inserted {
            Ok(asset) => Some(asset),
            Err(e) => {
                log::error!("Failed to load sound {}: {}", id, e);
                None
            }
        }
    }

    /// Music shares the sound registry; only playback differs.
    pub fn load_music(
        &self,
        id: SoundId,
        descriptor: SoundDescriptor,
    ) -> Option<Arc<WaveformAsset>> {
        log::info!("Loading music {}", id);
        self.load_sound(id, descriptor)
    }

    /// Unload a sound. Voices still playing it go silent on the next buffer.
    pub fn unload_sound(&self, id: SoundId) {
        if !self.accepts_control("unload_sound") {
            return;
        }
        let removed = self.core.lock().registry.unload(id);
        // Sample memory is released here, outside the lock.
        drop(removed);
    }

    pub fn unload_all_sounds(&self) {
        if !self.accepts_control("unload_all_sounds") {
            return;
        }
        let removed = self.core.lock().registry.unload_all();
        drop(removed);
    }

    fn play_with(
        &self,
        id: SoundId,
        build: impl FnOnce(&MixState) -> PlayRequest,
    ) -> Option<VoiceHandle> {
        let mut state = self.core.lock();
        let request = build(&*state);
        match state.play(id, request) {
            Ok(handle) => {
                log::info!(
                    "Playing sound {} (gain: {:.3}, pan: {:.2})",
                    id,
                    request.gain,
                    request.pan
                );
                Some(handle)
            }
            Err(e) => {
                log::error!("Cannot play sound {}: {}", id, e);
                None
            }
        }
    }

    /// Play a sound effect. Gain is `volume * sfx_volume * master_volume`,
    /// fixed at this moment.
    pub fn play_sound(&self, id: SoundId, volume: f32, pan: f32) -> Option<VoiceHandle> {
        if !self.accepts_control("play_sound") {
            return None;
        }
        self.play_with(id, |state| {
            PlayRequest::new(state.effective_gain(volume, SoundCategory::Sfx), pan)
        })
    }

    /// Play a music track, centred. Gain uses the music volume.
    pub fn play_music(&self, id: SoundId, volume: f32, looping: bool) -> Option<VoiceHandle> {
        if !self.accepts_control("play_music") {
            return None;
        }
        self.play_with(id, |state| {
            PlayRequest::new(state.effective_gain(volume, SoundCategory::Music), 0.0)
                .looping(looping)
                .category(SoundCategory::Music)
        })
    }

    /// Stop every music voice
    pub fn stop_music(&self) {
        if !self.accepts_control("stop_music") {
            return;
        }
        let stopped = self.core.lock().voices.stop_category(SoundCategory::Music);
        log::info!("Stopped {} music voice(s)", stopped);
    }

    /// Play a sound at a 3D position using the configured default range.
    pub fn play_sound_3d(&self, id: SoundId, position: Vec3, volume: f32) -> Option<VoiceHandle> {
        self.play_sound_3d_with_range(id, position, volume, self.desc.default_max_distance)
    }

    /// Play a sound at a 3D position, silent at or beyond `max_distance`.
    ///
    /// The voice itself mixes at unity gain and centre pan; the effective gain
    /// feeds the spatializer's distance attenuation instead.
    pub fn play_sound_3d_with_range(
        &self,
        id: SoundId,
        position: Vec3,
        volume: f32,
        max_distance: f32,
    ) -> Option<VoiceHandle> {
        if !self.accepts_control("play_sound_3d") {
            return None;
        }
        if let Err(e) = validate_max_distance(max_distance) {
            log::error!("Cannot play 3D sound {}: {}", id, e);
            return None;
        }

        let mut state = self.core.lock();
        let gain = state.effective_gain(volume, SoundCategory::Sfx);
        let handle = match state.play(id, PlayRequest::new(1.0, 0.0).position(position)) {
            Ok(handle) => handle,
            Err(e) => {
                log::error!("Cannot play 3D sound {}: {}", id, e);
                return None;
            }
        };

        if let Err(e) = state.spatializer.play_3d(id, position, gain, max_distance) {
            state.voices.stop(handle);
            log::error!("Cannot play 3D sound {}: {}", id, e);
            return None;
        }

        log::info!(
            "Playing 3D sound {} at ({:.2}, {:.2}, {:.2}), gain: {:.3}",
            id,
            position.x,
            position.y,
            position.z,
            gain
        );
        Some(handle)
    }

    pub fn stop_sound(&self, id: SoundId) {
        if !self.accepts_control("stop_sound") {
            return;
        }
        let mut state = self.core.lock();
        state.voices.stop(VoiceHandle::new(id));
        state.spatializer.stop(id);
    }

    pub fn stop_all_sounds(&self) {
        if !self.accepts_control("stop_all_sounds") {
            return;
        }
        let mut state = self.core.lock();
        state.voices.stop_all();
        state.spatializer.stop_all();
        log::info!("Stopped all sounds");
    }

    fn set_volume(&self, action: &str, volume: f32, slot: impl FnOnce(&mut MixState) -> &mut f32) {
        if !self.accepts_control(action) {
            return;
        }
        if volume.is_nan() {
            log::warn!("Ignoring {}: volume is NaN", action);
            return;
        }
        let mut state = self.core.lock();
        *slot(&mut *state) = volume.clamp(0.0, 1.0);
    }

    /// Applies to sounds started after this call.
    pub fn set_master_volume(&self, volume: f32) {
        self.set_volume("set_master_volume", volume, |s| &mut s.master_volume);
    }

    /// Applies to music started after this call.
    pub fn set_music_volume(&self, volume: f32) {
        self.set_volume("set_music_volume", volume, |s| &mut s.music_volume);
    }

    /// Applies to sound effects started after this call.
    pub fn set_sfx_volume(&self, volume: f32) {
        self.set_volume("set_sfx_volume", volume, |s| &mut s.sfx_volume);
    }

    pub fn master_volume(&self) -> f32 {
        self.core.lock().master_volume
    }

    pub fn music_volume(&self) -> f32 {
        self.core.lock().music_volume
    }

    pub fn sfx_volume(&self) -> f32 {
        self.core.lock().sfx_volume
    }

    /// Takes effect on the next buffer.
    pub fn set_listener_position(&self, position: Vec3) {
        if !self.accepts_control("set_listener_position") {
            return;
        }
        self.core.lock().spatializer.set_listener_position(position);
    }

    pub fn listener_position(&self) -> Vec3 {
        self.core.lock().spatializer.listener_position()
    }

    pub fn enable_reverb(&self, enable: bool) {
        if !self.accepts_control("enable_reverb") {
            return;
        }
        self.core.lock().reverb.enabled = enable;
        log::debug!("Reverb {} (not rendered)", if enable { "enabled" } else { "disabled" });
    }

    pub fn set_reverb_level(&self, level: f32) {
        if !self.accepts_control("set_reverb_level") {
            return;
        }
        self.core.lock().reverb.level = level.clamp(0.0, 1.0);
    }

    pub fn reverb(&self) -> ReverbSettings {
        self.core.lock().reverb
    }

    pub fn is_playing(&self, id: SoundId) -> bool {
        self.core.lock().voices.is_active(id)
    }

    pub fn active_voice_count(&self) -> usize {
        self.core.lock().voices.active_count()
    }

    pub fn active_spatial_count(&self) -> usize {
        self.core.lock().spatializer.active_count()
    }

    pub fn is_sound_loaded(&self, id: SoundId) -> bool {
        self.core.lock().registry.contains(id)
    }

    /// Drain events produced since the last poll
    pub fn poll_events(&self) -> Vec<ChimeSonicEvent> {
        self.event_receiver.try_iter().collect()
    }
}

impl Drop for ChimeSonicEngine {
    fn drop(&mut self) {
        self.release();
    }
}
