//! # looper-core
//!
//! Platform-agnostic core of a multi-track audio looper.
//!
//! Provides loop buffers, mixing, callback statistics, WAV export, and the
//! control-plane session. Audio backends (cpal) implement the
//! `AudioTransport` trait and plug into the generic `LooperSession`.
//!
//! ## Architecture
//!
//! ```text
//! looper-core (this crate)
//! ├── traits/       ← RingAccess, AudioTransport, StreamHandle
//! ├── models/       ← LooperError, RecordingState, StreamConfiguration, RecordingInfo, etc.
//! ├── processing/   ← SegmentList, GrowingArray, ValueStats, WAV encoding
//! └── session/      ← Recording, RecordingSet, LooperContext, LooperSession
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{
    BlockStatus, DeviceInfo, DurationStats, RecordingInfo, RecordingsSnapshot, StreamInfo,
};
pub use models::config::{DeviceSelection, ExportFormat, Latency, StreamConfiguration};
pub use models::error::LooperError;
pub use models::state::RecordingState;
pub use processing::growing_array::GrowingArray;
pub use processing::segment_list::SegmentList;
pub use processing::value_stats::ValueStats;
pub use session::context::LooperContext;
pub use session::looper::{LooperSession, RecordingExport};
pub use session::recording::Recording;
pub use session::recording_set::RecordingSet;
pub use traits::ring_access::{BufferSnapshot, RingAccess};
pub use traits::transport::{AudioTransport, BlockCallback, StreamHandle};
