use crate::audio_data::{AssetProducer, SoundDescriptor, SoundId, WaveformAsset};
use crate::config::{ENGINE_CHANNELS, ENGINE_SAMPLE_RATE};
use crate::error::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

const CLICK_SECONDS: f32 = 0.05;
const WHOOSH_SECONDS: f32 = 0.15;

/// Procedural asset producer.
///
/// Generates placeholder sounds at 48 kHz stereo with identical left and right
/// channels. Noise based sounds draw from a seeded `StdRng`, so the same
/// descriptor always yields the same samples.
#[derive(Debug, Default, Clone, Copy)]
pub struct Synthesizer;

impl AssetProducer for Synthesizer {
    fn produce(&self, id: SoundId, descriptor: &SoundDescriptor) -> Result<WaveformAsset> {
        descriptor.validate()?;

        let mono = match *descriptor {
            SoundDescriptor::Tone {
                frequency,
                duration,
            } => tone(frequency, duration),
            SoundDescriptor::Noise { duration, seed } => noise(duration, seed),
            SoundDescriptor::Click => click(),
            SoundDescriptor::Whoosh { seed } => whoosh(seed),
            SoundDescriptor::Sweep {
                start_frequency,
                end_frequency,
                duration,
            } => sweep(start_frequency, end_frequency, duration),
        };

        log::debug!(
            "Synthesized {} ({:?}): {} frames",
            id,
            descriptor,
            mono.len()
        );

        WaveformAsset::new(id, to_stereo(&mono), ENGINE_SAMPLE_RATE, ENGINE_CHANNELS)
    }
}

fn frame_count(duration: f32) -> usize {
    (ENGINE_SAMPLE_RATE as f32 * duration) as usize
}

/// Linear attack over the first `attack` fraction, linear decay after `decay_start`.
fn envelope(i: usize, frames: usize, attack: f32, decay_start: f32) -> f32 {
    let i = i as f32;
    let n = frames as f32;
    if i < n * attack {
        i / (n * attack)
    } else if i > n * decay_start {
        1.0 - (i - n * decay_start) / (n * (1.0 - decay_start))
    } else {
        1.0
    }
}

fn tone(frequency: f32, duration: f32) -> Vec<f32> {
    let frames = frame_count(duration);
    (0..frames)
        .map(|i| {
            let t = i as f32 / ENGINE_SAMPLE_RATE as f32;
            (2.0 * PI * frequency * t).sin() * envelope(i, frames, 0.1, 0.7)
        })
        .collect()
}

fn noise(duration: f32, seed: u64) -> Vec<f32> {
    let frames = frame_count(duration);
    let mut rng = StdRng::seed_from_u64(seed);
    (0..frames)
        .map(|i| rng.gen_range(-1.0f32..1.0) * envelope(i, frames, 0.1, 0.8) * 0.5)
        .collect()
}

fn click() -> Vec<f32> {
    (0..frame_count(CLICK_SECONDS))
        .map(|i| {
            let t = i as f32 / ENGINE_SAMPLE_RATE as f32;
            (-t * 50.0).exp() * 0.7
        })
        .collect()
}

fn whoosh(seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..frame_count(WHOOSH_SECONDS))
        .map(|i| {
            let t = i as f32 / ENGINE_SAMPLE_RATE as f32;
            let envelope = (PI * t / WHOOSH_SECONDS).sin() * 0.5;
            rng.gen_range(-0.5f32..0.5) * envelope
        })
        .collect()
}

fn sweep(start_frequency: f32, end_frequency: f32, duration: f32) -> Vec<f32> {
    let frames = frame_count(duration);
    let mut phase = 0.0f32;
    (0..frames)
        .map(|i| {
            let progress = i as f32 / frames as f32;
            let frequency = start_frequency + (end_frequency - start_frequency) * progress;
            let sample = phase.sin() * envelope(i, frames, 0.1, 0.7);
            phase = (phase + 2.0 * PI * frequency / ENGINE_SAMPLE_RATE as f32) % (2.0 * PI);
            sample
        })
        .collect()
}

fn to_stereo(mono: &[f32]) -> Vec<f32> {
    mono.iter().flat_map(|&sample| [sample, sample]).collect()
}
