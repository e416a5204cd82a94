//! Event types for ChimeSonic
//!
//! Events are produced on the audio thread into a bounded queue and drained
//! with [`ChimeSonicEngine::poll_events`](crate::ChimeSonicEngine::poll_events).
//! When the queue is full new events are dropped rather than blocking.

use crate::audio_data::SoundId;
use crate::engine::EngineState;

#[derive(Debug, Clone, PartialEq)]
pub enum ChimeSonicEvent {
    /// A one-shot voice played to its end
    SoundCompleted { sound_id: SoundId },
    /// A looping voice wrapped around to its first frame
    SoundLooped { sound_id: SoundId },
    /// A voice was dropped because its sound was unloaded while playing
    SoundOrphaned { sound_id: SoundId },
    /// A 3D voice moved out of range and was stopped
    SpatialVoiceCulled { sound_id: SoundId },
    /// The engine lifecycle changed
    StateChanged { from: EngineState, to: EngineState },
    /// The output stream could not be opened
    StreamOpenFailed { error: String },
}

impl ChimeSonicEvent {
    pub fn sound_id(&self) -> Option<SoundId> {
        match self {
            Self::SoundCompleted { sound_id }
            | Self::SoundLooped { sound_id }
            | Self::SoundOrphaned { sound_id }
            | Self::SpatialVoiceCulled { sound_id } => Some(*sound_id),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::StreamOpenFailed { .. } | Self::SoundOrphaned { .. })
    }
}
