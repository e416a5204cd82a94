use crate::error::{ChimeSonicError, Result};
use crate::stream::{AudioCallback, CallbackResult, OutputStream, StreamDesc, StreamProvider};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Samples reserved up front for format conversion; grows only if the device
/// hands over a larger buffer.
const INITIAL_SCRATCH_SAMPLES: usize = 8192;

/// Stream provider backed by the default cpal output device.
///
/// `cpal::Stream` cannot move between threads, so each opened stream lives on
/// its own `chimesonic-stream` thread and control requests are forwarded to it
/// over a channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalStreamProvider;

impl CpalStreamProvider {
    pub fn new() -> Self {
        Self
    }
}

impl StreamProvider for CpalStreamProvider {
    fn open(
        &self,
        desc: &StreamDesc,
        callback: Arc<dyn AudioCallback>,
    ) -> Result<Box<dyn OutputStream>> {
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<()>>(1);
        let (request_tx, request_rx) = crossbeam_channel::unbounded();
        let desc = desc.clone();

        let worker = std::thread::Builder::new()
            .name("chimesonic-stream".to_string())
            .spawn(move || {
                let stream = match build_stream(&desc, callback) {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                serve_requests(&stream, request_rx);
            })
            .map_err(|e| {
                ChimeSonicError::StreamOpenFailure(format!("Failed to spawn stream thread: {}", e))
            })?;

        let opened = ready_rx.recv().unwrap_or_else(|_| {
            Err(ChimeSonicError::StreamOpenFailure(
                "Stream thread exited before reporting".to_string(),
            ))
        });

        if let Err(e) = opened {
            let _ = worker.join();
            return Err(e);
        }

        Ok(Box::new(CpalOutputStream {
            requests: request_tx,
            worker: Some(worker),
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamRequest {
    Start,
    Stop,
    Pause,
    Close,
}

type Reply = Sender<Result<()>>;

fn serve_requests(stream: &cpal::Stream, requests: Receiver<(StreamRequest, Reply)>) {
    for (request, reply) in requests.iter() {
        let result = match request {
            StreamRequest::Start => stream.play().map_err(|e| {
                ChimeSonicError::StreamControl(format!("Failed to start stream: {}", e))
            }),
            // cpal has no separate stop; a paused stream stops calling back.
            StreamRequest::Stop | StreamRequest::Pause => stream.pause().map_err(|e| {
                ChimeSonicError::StreamControl(format!("Failed to pause stream: {}", e))
            }),
            StreamRequest::Close => Ok(()),
        };
        let _ = reply.send(result);

        if request == StreamRequest::Close {
            break;
        }
    }
    log::debug!("Stream thread shutting down");
}

struct CpalOutputStream {
    requests: Sender<(StreamRequest, Reply)>,
    worker: Option<JoinHandle<()>>,
}

impl CpalOutputStream {
    fn send(&self, request: StreamRequest) -> Result<()> {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        self.requests.send((request, reply_tx)).map_err(|e| {
            ChimeSonicError::StreamControl(format!("Stream thread is gone: {}", e))
        })?;
        reply_rx.recv().map_err(|e| {
            ChimeSonicError::StreamControl(format!("No reply from stream thread: {}", e))
        })?
    }
}

impl OutputStream for CpalOutputStream {
    fn request_start(&mut self) -> Result<()> {
        self.send(StreamRequest::Start)
    }

    fn request_stop(&mut self) -> Result<()> {
        self.send(StreamRequest::Stop)
    }

    fn request_pause(&mut self) -> Result<()> {
        self.send(StreamRequest::Pause)
    }

    fn close(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        if let Err(e) = self.send(StreamRequest::Close) {
            log::warn!("Closing stream: {}", e);
        }
        if worker.join().is_err() {
            log::error!("Stream thread panicked");
        }
    }
}

impl Drop for CpalOutputStream {
    fn drop(&mut self) {
        self.close();
    }
}

fn build_stream(desc: &StreamDesc, callback: Arc<dyn AudioCallback>) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or_else(|| {
        ChimeSonicError::StreamOpenFailure("No default output device available".into())
    })?;

    log::info!(
        "Opening output stream on {} ({} Hz, {} ch, low_latency: {}, exclusive: {})",
        device.name().unwrap_or_else(|_| "unknown device".to_string()),
        desc.sample_rate,
        desc.channels,
        desc.low_latency,
        desc.exclusive
    );

    // Performance mode and sharing mode have no cpal equivalent and are
    // treated as hints.
    let config = cpal::StreamConfig {
        channels: desc.channels,
        sample_rate: cpal::SampleRate(desc.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let default_config = device.default_output_config().map_err(|e| {
        ChimeSonicError::StreamOpenFailure(format!("Failed to get default config: {}", e))
    })?;

    match default_config.sample_format() {
        cpal::SampleFormat::F32 => create_stream::<f32>(&device, &config, callback),
        cpal::SampleFormat::I16 => create_stream::<i16>(&device, &config, callback),
        cpal::SampleFormat::U16 => create_stream::<u16>(&device, &config, callback),
        other => Err(ChimeSonicError::StreamOpenFailure(format!(
            "Unsupported sample format {:?}",
            other
        ))),
    }
}

fn create_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    callback: Arc<dyn AudioCallback>,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let mut scratch = vec![0.0f32; INITIAL_SCRATCH_SAMPLES];
    let mut halted = false;

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if scratch.len() < data.len() {
                    scratch.resize(data.len(), 0.0);
                }
                let buffer = &mut scratch[..data.len()];

                if halted {
                    buffer.fill(0.0);
                } else if callback.on_buffer_ready(buffer) == CallbackResult::Stop {
                    halted = true;
                }

                for (out, sample) in data.iter_mut().zip(buffer.iter()) {
                    *out = T::from_sample(*sample);
                }
            },
            move |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| ChimeSonicError::StreamOpenFailure(format!("Failed to build stream: {}", e)))
}
