use chrono::{DateTime, Utc};

use crate::models::audio_models::RecordingInfo;
use crate::models::config::ExportFormat;
use crate::models::error::LooperError;
use crate::models::state::RecordingState;
use crate::processing::segment_list::SegmentList;
use crate::processing::wav_format;
use crate::traits::ring_access::{BufferSnapshot, RingAccess};

/// One loop track: a sample store plus its playback parameters.
///
/// The playback position is the store's read cursor; there is no separately
/// maintained frame counter that could drift from it.
///
/// `record_block` and `loop_block` do not check `state`. Choosing which one
/// to call for a block is the job of [`Recording::process_block`] (or of the
/// caller).
#[derive(Debug, Clone)]
pub struct Recording<B: RingAccess = SegmentList> {
    buffer: B,
    state: RecordingState,
    volume: f32,
    name: String,
    created_at: DateTime<Utc>,
}

impl Recording<SegmentList> {
    /// An empty, paused recording backed by a [`SegmentList`].
    pub fn new(channels: usize) -> Self {
        Self::with_buffer(SegmentList::new(channels))
    }
}

impl<B: RingAccess> Recording<B> {
    pub fn with_buffer(buffer: B) -> Self {
        Self {
            buffer,
            state: RecordingState::Paused,
            volume: 1.0,
            name: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn set_state(&mut self, state: RecordingState) {
        self.state = state;
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn channels(&self) -> usize {
        self.buffer.channels()
    }

    /// Playback position in frames.
    pub fn frame(&self) -> usize {
        self.buffer.position()
    }

    /// Recorded length in frames.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Move playback to `frame`. Returns `false` (position unchanged) when
    /// `frame` is outside the recorded data.
    pub fn set_frame(&mut self, frame: usize) -> bool {
        self.buffer.seek(frame)
    }

    /// Append one input block.
    pub fn record_block(&mut self, input: &[f32]) {
        self.buffer.append(input);
    }

    /// Mix the next `output.len() / channels` frames, scaled by the volume,
    /// into `output`. Does nothing while the recording is empty.
    pub fn loop_block(&mut self, output: &mut [f32]) {
        let volume = self.volume;
        let frames = output.len() / self.buffer.channels();
        if let Some(samples) = self.buffer.take(frames) {
            for (out, sample) in output.iter_mut().zip(samples.iter()) {
                *out += sample * volume;
            }
        }
    }

    /// Run one callback block according to the current state.
    pub fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        match self.state {
            RecordingState::Paused => {}
            RecordingState::Recording => self.record_block(input),
            RecordingState::Looping => self.loop_block(output),
        }
    }

    /// Shared view of the recorded samples for export off the lock.
    pub fn snapshot(&self) -> BufferSnapshot {
        self.buffer.snapshot()
    }

    /// All recorded samples, interleaved.
    pub fn samples(&self) -> Vec<f32> {
        self.buffer.materialize()
    }

    /// Encode the recording as a 32-bit float WAV file.
    pub fn export_samples(&self, sample_rate: u32) -> Result<Vec<u8>, LooperError> {
        self.export_samples_as(sample_rate, ExportFormat::Float32)
    }

    pub fn export_samples_as(
        &self,
        sample_rate: u32,
        format: ExportFormat,
    ) -> Result<Vec<u8>, LooperError> {
        let channels = u16::try_from(self.channels())
            .map_err(|_| LooperError::EncodingFailed("too many channels".into()))?;
        wav_format::encode_wav(&self.buffer.materialize(), channels, sample_rate, format)
    }

    pub fn info(&self) -> RecordingInfo {
        RecordingInfo {
            name: self.name.clone(),
            state: self.state,
            volume: self.volume,
            frame: self.frame(),
            length: self.len(),
            created_at: self.created_at,
        }
    }

    /// Drop all recorded audio; parameters are kept.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
