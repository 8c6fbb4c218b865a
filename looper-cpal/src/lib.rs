//! # looper-cpal
//!
//! cpal backend for looper-core.
//!
//! Provides:
//! - `CpalTransport`: duplex input/output stream implementing `AudioTransport`
//! - `DeviceEnumerator`: device listing and name search with timeout
//!
//! ## Usage
//! ```ignore
//! use looper_core::{LooperSession, RecordingState, StreamConfiguration};
//! use looper_cpal::CpalTransport;
//!
//! let session = LooperSession::new(CpalTransport::new());
//! session.open_stream(&StreamConfiguration::default())?;
//! session.set_recording_state("a", RecordingState::Recording)?;
//! ```

pub mod cpal_transport;
pub mod device_enumerator;

pub use cpal_transport::{CpalStream, CpalTransport};
pub use device_enumerator::{DeviceEnumerator, DeviceKind};
