use crate::audio_data::{SoundDescriptor, SoundId, WaveformAsset};
use crate::error::Result;

/// Trait for producing waveform assets from descriptors.
///
/// The registry calls the producer outside its lock, so implementations are
/// free to allocate and take their time. ChimeSonic ships [`Synthesizer`], a
/// procedural generator; a real decoder can be plugged in without touching the
/// mixer or the spatializer.
///
/// Assets must be 48 kHz interleaved stereo. The registry rejects anything else.
///
/// # Example
///
/// ```ignore
/// use chimesonic::audio_data::{AssetProducer, SoundDescriptor, SoundId, WaveformAsset};
/// use chimesonic::error::Result;
///
/// struct Silence;
///
/// impl AssetProducer for Silence {
///     fn produce(&self, id: SoundId, _descriptor: &SoundDescriptor) -> Result<WaveformAsset> {
///         WaveformAsset::new(id, vec![0.0; 960], 48000, 2)
///     }
/// }
/// ```
///
/// [`Synthesizer`]: crate::audio_data::Synthesizer
pub trait AssetProducer: Send + Sync {
    /// Produces the asset that `descriptor` describes, stamped with `id`.
    ///
    /// # Errors
    ///
    /// Returns a `ChimeSonicError` if the descriptor cannot be realised.
    fn produce(&self, id: SoundId, descriptor: &SoundDescriptor) -> Result<WaveformAsset>;
}
