use chimesonic::{ChimeSonicEngine, ChimeSonicEngineDesc, SoundDescriptor, SoundId, Vec3};
use std::thread;
use std::time::Duration;

/// Plays the built-in sound table on the default output device, then circles
/// a 3D source around the listener.
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let engine = ChimeSonicEngine::with_default_device(ChimeSonicEngineDesc::default())?;
    engine.initialize()?;
    engine.start();

    for id in 1..=8 {
        engine.load_sound(SoundId(id), SoundDescriptor::builtin(SoundId(id)));
    }

    println!("Playing built-in sounds 1-8...");
    for id in 1..=8 {
        engine.play_sound(SoundId(id), 0.8, 0.0);
        thread::sleep(Duration::from_millis(600));
    }

    println!("Panning the coin sound left to right...");
    for step in 0..=4 {
        let pan = -1.0 + step as f32 * 0.5;
        engine.play_sound(SoundId(6), 0.8, pan);
        thread::sleep(Duration::from_millis(300));
    }

    println!("Circling a 3D source around the listener...");
    engine.load_sound(SoundId(20), SoundDescriptor::sweep(300.0, 900.0, 0.4));
    for step in 0..16 {
        let angle = step as f32 / 16.0 * std::f32::consts::TAU;
        let position = Vec3::new(angle.sin() * 5.0, 0.0, angle.cos() * 5.0);
        engine.play_sound_3d(SoundId(20), position, 1.0);
        thread::sleep(Duration::from_millis(450));
    }

    for event in engine.poll_events() {
        log::debug!("{:?}", event);
    }

    engine.stop();
    engine.release();
    println!("Done.");
    Ok(())
}
