use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::{RecordingInfo, RecordingsSnapshot, StreamInfo};
use crate::models::config::{ExportFormat, StreamConfiguration};
use crate::models::error::LooperError;
use crate::models::state::RecordingState;
use crate::processing::wav_format;
use crate::session::context::LooperContext;
use crate::session::recording::Recording;
use crate::session::recording_set::RecordingSet;
use crate::traits::transport::{AudioTransport, BlockCallback, StreamHandle};

/// An open stream and the context its callback mixes.
struct ActiveStream<H> {
    handle: H,
    context: Arc<LooperContext>,
    channels: u16,
    export_format: ExportFormat,
}

/// An encoded recording ready to hand out as a download.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingExport {
    /// Suggested name, e.g. `2024_05_01-18_30-a.wav`.
    pub file_name: String,
    pub mime_type: &'static str,
    pub data: Vec<u8>,
}

/// Control-plane entry point of the looper.
///
/// Generic over the audio transport. Owns at most one stream at a time; each
/// stream gets a fresh [`LooperContext`] holding its recordings, and closing
/// the stream drops them.
///
/// Every recording operation runs under the context's shared lock and fails
/// with [`LooperError::NoStream`] while no stream is open.
///
/// ```text
/// [transport thread] → callback → LooperContext::process ─┐
///                                                         ├→ Mutex<RecordingSet>
/// [control threads]  → LooperSession::set_* / export ─────┘
/// ```
pub struct LooperSession<T: AudioTransport> {
    transport: T,
    stream: Mutex<Option<ActiveStream<T::Stream>>>,
}

impl<T: AudioTransport> LooperSession<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            stream: Mutex::new(None),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_open(&self) -> bool {
        self.stream.lock().is_some()
    }

    /// Open the audio stream and start mixing. No-op if a stream is already open.
    pub fn open_stream(&self, config: &StreamConfiguration) -> Result<(), LooperError> {
        let mut stream = self.stream.lock();
        if stream.is_some() {
            return Ok(());
        }

        config.validate().map_err(LooperError::ConfigurationFailed)?;

        let context = Arc::new(LooperContext::new(
            config.channels as usize,
            config.stats_capacity,
        ));
        let callback_context = Arc::clone(&context);
        let callback: BlockCallback = Arc::new(move |input, output, status| {
            callback_context.process(input, output, status);
        });

        let handle = self.transport.open(config, callback)?;
        let device = handle.device();
        log::info!("Using devices");
        log::info!("> Input: {}", device.input);
        log::info!("> Output: {}", device.output);
        log::info!("Started stream at {} Hz", handle.sample_rate());

        *stream = Some(ActiveStream {
            handle,
            context,
            channels: config.channels,
            export_format: config.export_format,
        });
        Ok(())
    }

    /// Like [`open_stream`](Self::open_stream), but logs failures and reports
    /// whether a stream is open afterwards.
    pub fn ensure_stream_open(&self, config: &StreamConfiguration) -> bool {
        match self.open_stream(config) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to open stream: {}", e);
                false
            }
        }
    }

    /// Stop the callback and drop every recording. No-op without a stream.
    pub fn close_stream(&self) {
        let Some(mut active) = self.stream.lock().take() else {
            return;
        };

        if let Err(e) = active.handle.stop() {
            log::error!("Failed to stop stream: {}", e);
        }
        active.context.lock().clear();
        log::info!("Closed stream");
    }

    /// Run `f` on the recordings of the open stream.
    ///
    /// The stream lock stays held while the recordings lock is taken, so a
    /// concurrent `close_stream` either completes first (and this fails with
    /// [`LooperError::NoStream`]) or waits until `f` returns.
    fn with_recordings<R>(
        &self,
        f: impl FnOnce(&mut RecordingSet) -> Result<R, LooperError>,
    ) -> Result<R, LooperError> {
        let stream = self.stream.lock();
        let active = stream.as_ref().ok_or(LooperError::NoStream)?;
        let mut set = active.context.lock();
        f(&mut set)
    }

    /// Run `f` on the recording under `key` while holding the shared lock.
    ///
    /// With `create` set, a missing recording is created paused and empty;
    /// otherwise a missing key fails with [`LooperError::UnknownKey`].
    pub fn with_recording<R>(
        &self,
        key: &str,
        create: bool,
        f: impl FnOnce(&mut Recording) -> R,
    ) -> Result<R, LooperError> {
        self.with_recordings(|set| {
            let recording = if create {
                set.get_or_create(key)
            } else {
                set.get_mut(key)
                    .ok_or_else(|| LooperError::UnknownKey(key.to_string()))?
            };
            Ok(f(recording))
        })
    }

    pub fn get_or_create_recording(&self, key: &str) -> Result<RecordingInfo, LooperError> {
        self.with_recording(key, true, |r| r.info())
    }

    pub fn recording_info(&self, key: &str) -> Result<RecordingInfo, LooperError> {
        self.with_recording(key, false, |r| r.info())
    }

    /// Remove a recording. `Ok(false)` if `key` did not exist.
    pub fn delete_recording(&self, key: &str) -> Result<bool, LooperError> {
        let removed = self.with_recordings(|set| Ok(set.remove(key)))?;
        if removed {
            log::debug!("Deleted recording '{}'", key);
        }
        Ok(removed)
    }

    /// Assign a state. Switching to recording creates the recording if needed.
    pub fn set_recording_state(&self, key: &str, state: RecordingState) -> Result<(), LooperError> {
        let create = state.is_recording();
        self.with_recording(key, create, |r| r.set_state(state))
    }

    pub fn set_recording_volume(&self, key: &str, volume: f32) -> Result<(), LooperError> {
        if !volume.is_finite() {
            return Err(LooperError::InvalidParameter(format!("volume {}", volume)));
        }
        self.with_recording(key, false, |r| r.set_volume(volume))
    }

    pub fn set_recording_name(&self, key: &str, name: &str) -> Result<(), LooperError> {
        self.with_recording(key, false, |r| r.set_name(name))
    }

    /// Seek a recording. `Ok(false)` when `frame` is negative or past the end.
    pub fn set_recording_frame(&self, key: &str, frame: i64) -> Result<bool, LooperError> {
        self.with_recording(key, false, |r| match usize::try_from(frame) {
            Ok(frame) => r.set_frame(frame),
            Err(_) => {
                log::warn!("Could not set position to {} for '{}'", frame, key);
                false
            }
        })
    }

    pub fn pause_all(&self) -> Result<(), LooperError> {
        self.with_recordings(|set| {
            set.pause_all();
            Ok(())
        })
    }

    pub fn snapshot_all(&self) -> Result<RecordingsSnapshot, LooperError> {
        self.with_recordings(|set| Ok(set.snapshot()))
    }

    /// Encode a recording for download.
    ///
    /// Only the segment list is copied under the shared lock; concatenation
    /// and encoding run after it is released, so a long recording does not
    /// stall the callback. Deleting the recording meanwhile does not affect
    /// the export.
    pub fn export_recording(&self, key: &str) -> Result<RecordingExport, LooperError> {
        let (snapshot, created_at, sample_rate, channels, format) = {
            let stream = self.stream.lock();
            let active = stream.as_ref().ok_or(LooperError::NoStream)?;
            let set = active.context.lock();
            let recording = set
                .get(key)
                .ok_or_else(|| LooperError::UnknownKey(key.to_string()))?;
            (
                recording.snapshot(),
                recording.created_at(),
                active.handle.sample_rate(),
                active.channels,
                active.export_format,
            )
        };

        let data = wav_format::encode_wav(&snapshot.materialize(), channels, sample_rate, format)?;
        let file_name = format!(
            "{}-{}.wav",
            created_at.with_timezone(&chrono::Local).format("%Y_%m_%d-%H_%M"),
            key
        );

        Ok(RecordingExport {
            file_name,
            mime_type: "audio/wav",
            data,
        })
    }

    /// Current stream state. The host's device list is included whenever the
    /// stream is closed or has stopped delivering blocks.
    pub fn stream_info(&self) -> StreamInfo {
        let stream = self.stream.lock();
        let mut info = match stream.as_ref() {
            Some(active) => StreamInfo {
                active: active.handle.is_active(),
                sample_rate: active.handle.sample_rate(),
                device: Some(active.handle.device()),
                duration_stats: active.context.duration_stats(),
                notices: active.context.notices(),
                available_devices: Vec::new(),
            },
            None => StreamInfo {
                active: false,
                sample_rate: 0,
                device: None,
                duration_stats: Default::default(),
                notices: 0,
                available_devices: Vec::new(),
            },
        };
        if !info.active {
            info.available_devices = self.transport.list_devices();
        }
        info
    }
}

impl<T: AudioTransport> Drop for LooperSession<T> {
    fn drop(&mut self) {
        self.close_stream();
    }
}
