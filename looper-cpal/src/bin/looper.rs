//! Smoke run: record track "a" for five seconds, loop it for ten, close.
//!
//! Usage: `looper [config.yml]`. A missing config file means defaults.

use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};

use looper_core::{LooperSession, RecordingState, StreamConfiguration};
use looper_cpal::CpalTransport;

const RECORD_TIME: Duration = Duration::from_secs(5);
const LOOP_TIME: Duration = Duration::from_secs(10);

fn main() -> Result<()> {
    // Set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "config.yml".into());
    let config = load_config(Path::new(&path))?;

    let session = LooperSession::new(CpalTransport::new());
    session.open_stream(&config).context("failed to open stream")?;

    session.set_recording_state("a", RecordingState::Recording)?;
    log::info!("Recording 'a' for {:?}", RECORD_TIME);
    thread::sleep(RECORD_TIME);

    session.set_recording_state("a", RecordingState::Looping)?;
    let info = session.recording_info("a")?;
    log::info!("Looping 'a' ({} frames) for {:?}", info.length, LOOP_TIME);
    thread::sleep(LOOP_TIME);

    let stats = session.stream_info();
    log::info!(
        "Callback durations: mean {:.6}s, max {:.6}s, std {:.6}s, 99p {:.6}s ({} notices)",
        stats.duration_stats.mean,
        stats.duration_stats.max,
        stats.duration_stats.std,
        stats.duration_stats.p99,
        stats.notices
    );

    session.close_stream();
    Ok(())
}

fn load_config(path: &Path) -> Result<StreamConfiguration> {
    if !path.exists() {
        log::info!("No config at {:?}, using defaults", path);
        return Ok(StreamConfiguration::default());
    }

    let contents =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;
    let config: StreamConfiguration =
        serde_yaml::from_str(&contents).with_context(|| format!("failed to parse {:?}", path))?;
    log::info!("Loaded config from {:?}", path);
    Ok(config)
}
