use std::borrow::Cow;
use std::sync::Arc;

use crate::traits::ring_access::{BufferSnapshot, RingAccess};

/// Append-only list of sample blocks with circular read access.
///
/// Every appended block is copied into its own segment; growing never moves
/// existing samples. The read cursor is kept as (segment, offset) together
/// with its absolute frame so per-block reads never rescan the list.
///
/// Segments are never empty, so whenever the list holds data the cursor
/// names a valid frame.
///
/// ```text
/// segments: [1 2 3 4] [5 6 7 8] [9 10]
///                                ^ cursor = (2, 0), position 8
/// take(4)  → [9 10 1 2], cursor = (0, 2), position 2
/// ```
#[derive(Debug, Clone)]
pub struct SegmentList {
    segments: Vec<Arc<[f32]>>,
    channels: usize,
    total_frames: usize,
    segment_idx: usize,
    frame_idx: usize,
    position: usize,
}

impl SegmentList {
    pub fn new(channels: usize) -> Self {
        Self {
            segments: Vec::new(),
            channels: channels.max(1),
            total_frames: 0,
            segment_idx: 0,
            frame_idx: 0,
            position: 0,
        }
    }

    /// Number of stored segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Cursor as (segment index, frame offset within that segment).
    pub fn cursor(&self) -> (usize, usize) {
        (self.segment_idx, self.frame_idx)
    }

    fn segment_frames(&self, idx: usize) -> usize {
        self.segments[idx].len() / self.channels
    }

    /// Advance by `frames`, which must not run past the current segment.
    fn advance_within_segment(&mut self, frames: usize) {
        self.frame_idx += frames;
        if self.frame_idx == self.segment_frames(self.segment_idx) {
            self.segment_idx = (self.segment_idx + 1) % self.segments.len();
            self.frame_idx = 0;
        }
        self.position = (self.position + frames) % self.total_frames;
    }
}

impl RingAccess for SegmentList {
    fn channels(&self) -> usize {
        self.channels
    }

    fn append(&mut self, block: &[f32]) {
        let frames = block.len() / self.channels;
        if frames == 0 {
            return;
        }

        self.segments.push(Arc::from(&block[..frames * self.channels]));
        self.total_frames += frames;
    }

    fn seek(&mut self, frame: usize) -> bool {
        if frame >= self.total_frames {
            log::warn!(
                "Could not set position to {} in data of length {}",
                frame,
                self.total_frames
            );
            return false;
        }

        let mut segment_start = 0;
        for idx in 0..self.segments.len() {
            let frames = self.segment_frames(idx);
            if frame < segment_start + frames {
                self.segment_idx = idx;
                self.frame_idx = frame - segment_start;
                self.position = frame;
                return true;
            }
            segment_start += frames;
        }

        false
    }

    fn take(&mut self, frames: usize) -> Option<Cow<'_, [f32]>> {
        if self.total_frames == 0 {
            return None;
        }

        let ch = self.channels;
        let available = self.segment_frames(self.segment_idx) - self.frame_idx;

        // Fast path: the read lies inside the current segment.
        if frames <= available {
            let (segment, start) = (self.segment_idx, self.frame_idx);
            self.advance_within_segment(frames);
            let samples = &self.segments[segment][start * ch..(start + frames) * ch];
            return Some(Cow::Borrowed(samples));
        }

        let mut out = Vec::with_capacity(frames * ch);
        let mut remaining = frames;
        while remaining > 0 {
            let segment = &self.segments[self.segment_idx];
            let count = remaining.min(segment.len() / ch - self.frame_idx);
            out.extend_from_slice(&segment[self.frame_idx * ch..(self.frame_idx + count) * ch]);
            self.advance_within_segment(count);
            remaining -= count;
        }

        Some(Cow::Owned(out))
    }

    fn len(&self) -> usize {
        self.total_frames
    }

    fn position(&self) -> usize {
        self.position
    }

    fn materialize(&self) -> Vec<f32> {
        let mut samples = Vec::with_capacity(self.total_frames * self.channels);
        for segment in &self.segments {
            samples.extend_from_slice(segment);
        }
        samples
    }

    fn snapshot(&self) -> BufferSnapshot {
        BufferSnapshot::new(self.channels, self.segments.clone())
    }

    fn clear(&mut self) {
        self.segments.clear();
        self.total_frames = 0;
        self.segment_idx = 0;
        self.frame_idx = 0;
        self.position = 0;
    }
}
