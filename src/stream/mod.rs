//! Boundary to the platform audio stream.
//!
//! The engine never talks to an audio API directly. A [`StreamProvider`] opens
//! an [`OutputStream`] and drives an [`AudioCallback`] from its own real-time
//! thread. [`CpalStreamProvider`] is the implementation used on desktop; tests
//! and embedders can supply their own.

mod cpal_backend;

pub use cpal_backend::CpalStreamProvider;

use crate::config::ChimeSonicEngineDesc;
use crate::error::Result;
use std::sync::Arc;

/// What the callback asks of the stream after filling a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackResult {
    Continue,
    Stop,
}

/// Observer invoked by the stream provider once per hardware period.
///
/// `buffer` is interleaved stereo `f32`; its frame count is `buffer.len() / 2`.
/// Implementations must not block for unbounded time or allocate.
pub trait AudioCallback: Send + Sync {
    fn on_buffer_ready(&self, buffer: &mut [f32]) -> CallbackResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamDirection {
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    F32,
}

/// Parameters the engine requests when opening its stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDesc {
    pub direction: StreamDirection,
    pub format: SampleFormat,
    pub channels: u16,
    pub sample_rate: u32,
    pub low_latency: bool,
    pub exclusive: bool,
}

impl StreamDesc {
    pub fn from_engine_desc(desc: &ChimeSonicEngineDesc) -> Self {
        Self {
            direction: StreamDirection::Output,
            format: SampleFormat::F32,
            channels: desc.channels,
            sample_rate: desc.sample_rate,
            low_latency: desc.low_latency,
            exclusive: desc.exclusive,
        }
    }
}

/// An opened hardware stream.
///
/// Requests are asynchronous in spirit: a successful return only means the
/// platform accepted the request.
pub trait OutputStream: Send {
    fn request_start(&mut self) -> Result<()>;
    fn request_stop(&mut self) -> Result<()>;
    fn request_pause(&mut self) -> Result<()>;
    /// Releases the stream. No callback runs after this returns.
    fn close(&mut self);
}

/// Factory for output streams.
pub trait StreamProvider: Send + Sync {
    /// Opens a stream that will call `callback` once started.
    ///
    /// # Errors
    ///
    /// Returns `ChimeSonicError::StreamOpenFailure` when no stream matching
    /// `desc` can be opened.
    fn open(
        &self,
        desc: &StreamDesc,
        callback: Arc<dyn AudioCallback>,
    ) -> Result<Box<dyn OutputStream>>;
}
