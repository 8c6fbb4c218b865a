use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::{Mutex, MutexGuard};

use crate::models::audio_models::{BlockStatus, DurationStats};
use crate::processing::value_stats::ValueStats;
use crate::session::recording_set::RecordingSet;

/// State shared between the audio callback and the control plane for the
/// lifetime of one stream.
///
/// ```text
/// [control plane] ──lock──┐
///                         ├→ Mutex<RecordingSet>
/// [audio callback] ─lock──┘        │
///        │                         ▼
///        └── try_lock → Mutex<ValueStats> (callback durations)
/// ```
///
/// The recording lock is the only synchronization for recordings. Critical
/// sections on both sides must stay short: a control operation holding it
/// delays the next block.
#[derive(Debug)]
pub struct LooperContext {
    recordings: Mutex<RecordingSet>,
    duration_stats: Mutex<ValueStats>,
    notices: AtomicU64,
}

impl LooperContext {
    pub fn new(channels: usize, stats_capacity: usize) -> Self {
        Self {
            recordings: Mutex::new(RecordingSet::new(channels)),
            duration_stats: Mutex::new(ValueStats::new(stats_capacity)),
            notices: AtomicU64::new(0),
        }
    }

    /// Take the shared lock. Released when the guard drops.
    pub fn lock(&self) -> MutexGuard<'_, RecordingSet> {
        self.recordings.lock()
    }

    /// The per-block callback body.
    ///
    /// 1. Zero `output`.
    /// 2. Under the shared lock, let every recording record, loop or skip.
    /// 3. Record how long the locked section took.
    ///
    /// Transport notices are logged and counted, never raised.
    pub fn process(&self, input: &[f32], output: &mut [f32], status: BlockStatus) {
        if !status.is_clean() {
            self.notices.fetch_add(1, Ordering::Relaxed);
            log::warn!("Audio block status: {}", status);
        }

        output.fill(0.0);

        let start = Instant::now();
        self.recordings.lock().process_block(input, output);
        let elapsed = start.elapsed();

        // A stats reader must never hold up the audio thread; skip the sample instead.
        if let Some(mut stats) = self.duration_stats.try_lock() {
            stats.insert(elapsed.as_secs_f64());
        }
    }

    pub fn duration_stats(&self) -> DurationStats {
        self.duration_stats.lock().stats()
    }

    /// Transport notices seen so far.
    pub fn notices(&self) -> u64 {
        self.notices.load(Ordering::Relaxed)
    }
}
