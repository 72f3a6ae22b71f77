//! Play one sound file through the engine, looping it for a few seconds.
//!
//! cargo run -p soundy_engine --example sample -- path/to/horn.wav

use std::path::PathBuf;
use std::time::Duration;

use soundy_transport::AudioBackend;

fn main() -> anyhow::Result<()> {
    let path: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("usage: sample <audio file>"))?;

    let mut engine = soundy_engine::start()?;
    println!("Output sample rate: {} Hz", engine.sample_rate());

    let clip = engine.load_clip(&path)?;

    println!("One-shot...");
    engine.play(clip);
    while engine.is_playing(clip) {
        engine.poll();
        std::thread::sleep(Duration::from_millis(20));
    }

    println!("Looping for 3 seconds...");
    engine.set_repeat(clip, true);
    engine.play(clip);
    std::thread::sleep(Duration::from_secs(3));
    engine.stop(clip);
    engine.unload(clip);
    engine.poll();

    Ok(())
}
