//! ChimeSonic: a small real-time audio engine for game sound effects.
//!
//! Sounds are synthesized procedurally into 48 kHz interleaved stereo
//! [`WaveformAsset`]s and kept in a [`SoundRegistry`]. Playing a sound starts a
//! voice in the [`VoicePool`]; once per hardware period the pool is mixed into
//! the output buffer and the [`Spatializer`] shapes it for every positioned
//! voice. [`ChimeSonicEngine`] ties these together behind one thread-safe
//! facade and drives them from a [`StreamProvider`].

pub mod audio_data;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod math;
pub mod mixer;
pub mod playback;
pub mod registry;
pub mod spatial;
pub mod stream;

pub use audio_data::{AssetProducer, SoundDescriptor, SoundId, Synthesizer, WaveformAsset};
pub use config::ChimeSonicEngineDesc;
pub use engine::{ChimeSonicEngine, EngineState, ReverbSettings};
pub use error::{ChimeSonicError, Result};
pub use events::ChimeSonicEvent;
pub use math::Vec3;
pub use mixer::{MixReport, VoicePool};
pub use playback::{PlayRequest, SoundCategory, Voice, VoiceHandle};
pub use registry::SoundRegistry;
pub use spatial::{SpatialEntry, Spatializer};
pub use stream::{
    AudioCallback, CallbackResult, CpalStreamProvider, OutputStream, StreamDesc, StreamProvider,
};
