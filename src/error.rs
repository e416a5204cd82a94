//! Error types for ChimeSonic

use crate::audio_data::SoundId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChimeSonicError {
    #[error("Failed to open output stream: {0}")]
    StreamOpenFailure(String),

    #[error("Output stream request failed: {0}")]
    StreamControl(String),

    #[error("Sound {0} is not loaded")]
    AssetNotFound(SoundId),

    #[error("Voice pool exhausted (max voices: {max_voices})")]
    VoicePoolExhausted { max_voices: usize },

    #[error("Audio format error: {0}")]
    AudioFormat(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Engine is not initialized")]
    NotInitialized,

    #[error("Cannot {action} while engine is {from}")]
    InvalidStateTransition {
        from: &'static str,
        action: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, ChimeSonicError>;
