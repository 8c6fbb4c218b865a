//! In-process transport for driving the callback by hand in tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::{BlockStatus, DeviceInfo};
use crate::models::config::StreamConfiguration;
use crate::models::error::LooperError;
use crate::traits::transport::{AudioTransport, BlockCallback, StreamHandle};

pub struct ManualTransport {
    default_rate: u32,
    callback: Mutex<Option<BlockCallback>>,
    running: Arc<AtomicBool>,
    opens: AtomicUsize,
    fail_next: AtomicBool,
}

impl ManualTransport {
    pub fn new(default_rate: u32) -> Self {
        Self {
            default_rate,
            callback: Mutex::new(None),
            running: Arc::new(AtomicBool::new(false)),
            opens: AtomicUsize::new(0),
            fail_next: AtomicBool::new(false),
        }
    }

    pub fn fail_next_open(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Stop delivering blocks without closing, like a device that went away.
    pub fn drop_device(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Deliver one block and return what the callback wrote. Silence once stopped.
    pub fn run_block(&self, input: &[f32]) -> Vec<f32> {
        self.run_block_with_status(input, BlockStatus::default())
    }

    pub fn run_block_with_status(&self, input: &[f32], status: BlockStatus) -> Vec<f32> {
        let mut output = vec![0.0; input.len()];
        if !self.is_running() {
            return output;
        }
        let callback = self.callback.lock().clone();
        if let Some(callback) = callback {
            callback(input, &mut output, status);
        }
        output
    }
}

impl AudioTransport for ManualTransport {
    type Stream = ManualStream;

    fn open(
        &self,
        config: &StreamConfiguration,
        callback: BlockCallback,
    ) -> Result<ManualStream, LooperError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(LooperError::StreamFailed("manual failure".into()));
        }

        self.opens.fetch_add(1, Ordering::SeqCst);
        *self.callback.lock() = Some(callback);
        self.running.store(true, Ordering::SeqCst);

        Ok(ManualStream {
            running: Arc::clone(&self.running),
            sample_rate: config.sample_rate.unwrap_or(self.default_rate),
        })
    }

    fn list_devices(&self) -> Vec<String> {
        vec!["manual".to_string()]
    }
}

pub struct ManualStream {
    running: Arc<AtomicBool>,
    sample_rate: u32,
}

impl StreamHandle for ManualStream {
    fn is_active(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn device(&self) -> DeviceInfo {
        DeviceInfo {
            input: "manual".to_string(),
            output: "manual".to_string(),
        }
    }

    fn stop(&mut self) -> Result<(), LooperError> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }
}
