use std::sync::Arc;

use crate::models::audio_models::{BlockStatus, DeviceInfo};
use crate::models::config::StreamConfiguration;
use crate::models::error::LooperError;

/// Per-block entry point handed to a transport.
///
/// Parameters:
/// - `input`: Interleaved input samples for this block.
/// - `output`: Interleaved output samples to fill; same frame count as `input`.
/// - `status`: Transport notices for this block.
pub type BlockCallback = Arc<dyn Fn(&[f32], &mut [f32], BlockStatus) + Send + Sync + 'static>;

/// A source of periodic duplex audio blocks.
///
/// Implemented by:
/// - `CpalTransport` (looper-cpal)
pub trait AudioTransport: Send + Sync {
    type Stream: StreamHandle;

    /// Open the configured devices and start invoking `callback` once per block.
    ///
    /// The callback runs on the transport's real-time thread.
    fn open(
        &self,
        config: &StreamConfiguration,
        callback: BlockCallback,
    ) -> Result<Self::Stream, LooperError>;

    /// Human-readable list of the devices the host currently reports.
    fn list_devices(&self) -> Vec<String>;
}

/// A running stream. Stopping (or dropping) it ends the callbacks.
pub trait StreamHandle: Send {
    fn is_active(&self) -> bool;

    fn sample_rate(&self) -> u32;

    fn device(&self) -> DeviceInfo;

    /// Stop the callbacks and release the devices.
    fn stop(&mut self) -> Result<(), LooperError>;
}
