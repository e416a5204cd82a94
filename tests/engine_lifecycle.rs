mod common;

use chimesonic::*;
use common::{FailingProvider, ManualStreamProvider, StreamCall, init_logging};

#[test]
fn test_lifecycle_transitions() {
    init_logging();
    let provider = ManualStreamProvider::default();
    let engine = ChimeSonicEngine::new(ChimeSonicEngineDesc::default(), provider.clone()).unwrap();
    assert_eq!(engine.state(), EngineState::Uninitialized);

    // Nothing to start yet.
    engine.start();
    assert_eq!(engine.state(), EngineState::Uninitialized);

    engine.initialize().unwrap();
    assert_eq!(engine.state(), EngineState::Initialized);

    engine.pause();
    assert_eq!(engine.state(), EngineState::Initialized);

    engine.start();
    assert_eq!(engine.state(), EngineState::Playing);

    engine.pause();
    assert_eq!(engine.state(), EngineState::Paused);

    // start is only valid from Initialized
    engine.start();
    assert_eq!(engine.state(), EngineState::Paused);

    engine.resume();
    assert_eq!(engine.state(), EngineState::Playing);

    engine.stop();
    assert_eq!(engine.state(), EngineState::Initialized);

    engine.release();
    assert_eq!(engine.state(), EngineState::Uninitialized);

    assert_eq!(
        provider.calls(),
        vec![
            StreamCall::Start,
            StreamCall::Pause,
            StreamCall::Start,
            StreamCall::Stop,
            StreamCall::Close
        ]
    );
}

#[test]
fn test_initialize_is_idempotent() {
    let (engine, provider) = common::engine();
    engine.initialize().unwrap();
    assert_eq!(provider.open_count(), 1);
    assert!(engine.is_initialized());
}

#[test]
fn test_stream_requests_low_latency_stereo_output() {
    let (_engine, provider) = common::engine();
    let desc = provider.last_desc().unwrap();
    assert_eq!(desc.direction, chimesonic::stream::StreamDirection::Output);
    assert_eq!(desc.format, chimesonic::stream::SampleFormat::F32);
    assert_eq!(desc.channels, 2);
    assert_eq!(desc.sample_rate, 48000);
    assert!(desc.low_latency);
    assert!(desc.exclusive);
}

#[test]
fn test_release_stops_a_playing_stream() {
    let (engine, provider) = common::engine();
    engine.start();
    engine.load_sound(SoundId(1), SoundDescriptor::click()).unwrap();
    engine.play_sound(SoundId(1), 1.0, 0.0).unwrap();

    engine.release();
    assert_eq!(engine.active_voice_count(), 0);
    assert_eq!(
        provider.calls(),
        vec![StreamCall::Start, StreamCall::Stop, StreamCall::Close]
    );

    // Loaded sounds survive a release.
    assert!(engine.is_sound_loaded(SoundId(1)));
}

#[test]
fn test_drop_closes_stream() {
    let (engine, provider) = common::engine();
    engine.start();
    drop(engine);
    assert_eq!(provider.calls().last(), Some(&StreamCall::Close));
}

#[test]
fn test_open_failure_leaves_engine_uninitialized() {
    init_logging();
    let engine = ChimeSonicEngine::new(ChimeSonicEngineDesc::default(), FailingProvider).unwrap();

    let result = engine.initialize();
    assert!(matches!(result, Err(ChimeSonicError::StreamOpenFailure(_))));
    assert_eq!(engine.state(), EngineState::Uninitialized);

    // Every control call is a no-op now.
    assert!(engine.load_sound(SoundId(1), SoundDescriptor::click()).is_none());
    assert!(engine.play_sound(SoundId(1), 1.0, 0.0).is_none());
    assert!(
        engine
            .play_sound_3d(SoundId(1), Vec3::new(1.0, 0.0, 0.0), 1.0)
            .is_none()
    );
    engine.set_master_volume(0.2);
    engine.start();

    assert_eq!(engine.master_volume(), 1.0);
    assert_eq!(engine.active_voice_count(), 0);
    assert!(!engine.is_sound_loaded(SoundId(1)));
    assert_eq!(engine.state(), EngineState::Uninitialized);

    let events = engine.poll_events();
    assert_eq!(events.len(), 1);
    assert!(events[0].is_error());
}

#[test]
fn test_state_changes_are_reported() {
    let (engine, _provider) = common::engine();
    engine.start();
    engine.pause();

    let changes: Vec<_> = engine
        .poll_events()
        .into_iter()
        .filter_map(|event| match event {
            ChimeSonicEvent::StateChanged { from, to } => Some((from, to)),
            _ => None,
        })
        .collect();

    assert_eq!(
        changes,
        vec![
            (EngineState::Uninitialized, EngineState::Initialized),
            (EngineState::Initialized, EngineState::Playing),
            (EngineState::Playing, EngineState::Paused),
        ]
    );
}

#[test]
fn test_invalid_configuration_is_rejected() {
    init_logging();
    let desc = ChimeSonicEngineDesc {
        sample_rate: 44100,
        ..Default::default()
    };
    assert!(matches!(
        ChimeSonicEngine::new(desc, ManualStreamProvider::default()),
        Err(ChimeSonicError::Configuration(_))
    ));
}
