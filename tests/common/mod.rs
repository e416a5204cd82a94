#![allow(dead_code)]

use chimesonic::{
    AudioCallback, CallbackResult, ChimeSonicEngine, ChimeSonicEngineDesc, ChimeSonicError,
    OutputStream, Result, StreamDesc, StreamProvider,
};
use std::sync::{Arc, Mutex};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamCall {
    Start,
    Stop,
    Pause,
    Close,
}

/// Provider whose "hardware" is driven by hand from the test.
#[derive(Clone, Default)]
pub struct ManualStreamProvider {
    calls: Arc<Mutex<Vec<StreamCall>>>,
    opened: Arc<Mutex<Vec<StreamDesc>>>,
    callback: Arc<Mutex<Option<Arc<dyn AudioCallback>>>>,
}

impl ManualStreamProvider {
    pub fn calls(&self) -> Vec<StreamCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    pub fn last_desc(&self) -> Option<StreamDesc> {
        self.opened.lock().unwrap().last().cloned()
    }

    /// Run the registered callback for `frames` stereo frames.
    pub fn render(&self, frames: usize) -> Vec<f32> {
        let callback = self
            .callback
            .lock()
            .unwrap()
            .clone()
            .expect("stream was never opened");
        let mut buffer = vec![0.0; frames * 2];
        assert_eq!(callback.on_buffer_ready(&mut buffer), CallbackResult::Continue);
        buffer
    }
}

impl StreamProvider for ManualStreamProvider {
    fn open(
        &self,
        desc: &StreamDesc,
        callback: Arc<dyn AudioCallback>,
    ) -> Result<Box<dyn OutputStream>> {
        self.opened.lock().unwrap().push(desc.clone());
        *self.callback.lock().unwrap() = Some(callback);
        Ok(Box::new(ManualStream {
            calls: self.calls.clone(),
        }))
    }
}

struct ManualStream {
    calls: Arc<Mutex<Vec<StreamCall>>>,
}

impl ManualStream {
    fn record(&self, call: StreamCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl OutputStream for ManualStream {
    fn request_start(&mut self) -> Result<()> {
        self.record(StreamCall::Start)
    }

    fn request_stop(&mut self) -> Result<()> {
        self.record(StreamCall::Stop)
    }

    fn request_pause(&mut self) -> Result<()> {
        self.record(StreamCall::Pause)
    }

    fn close(&mut self) {
        let _ = self.record(StreamCall::Close);
    }
}

/// Provider with no usable device.
pub struct FailingProvider;

impl StreamProvider for FailingProvider {
    fn open(
        &self,
        _desc: &StreamDesc,
        _callback: Arc<dyn AudioCallback>,
    ) -> Result<Box<dyn OutputStream>> {
        Err(ChimeSonicError::StreamOpenFailure(
            "no output device".to_string(),
        ))
    }
}

/// An initialized engine plus the provider driving it.
pub fn engine() -> (ChimeSonicEngine, ManualStreamProvider) {
    engine_with(ChimeSonicEngineDesc::default())
}

pub fn engine_with(desc: ChimeSonicEngineDesc) -> (ChimeSonicEngine, ManualStreamProvider) {
    init_logging();
    let provider = ManualStreamProvider::default();
    let engine = ChimeSonicEngine::new(desc, provider.clone()).unwrap();
    engine.initialize().unwrap();
    (engine, provider)
}

pub fn frames(buffer: &[f32]) -> impl Iterator<Item = (f32, f32)> + '_ {
    buffer.chunks_exact(2).map(|frame| (frame[0], frame[1]))
}

pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
}
