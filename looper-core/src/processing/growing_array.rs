use std::borrow::Cow;
use std::sync::Arc;

use crate::traits::ring_access::{BufferSnapshot, RingAccess};

/// Default growth step in frames.
pub const DEFAULT_GROWTH_FRAMES: usize = 100_000;

/// Flat sample array that grows in fixed steps, with circular reads.
///
/// Cheaper than [`SegmentList`](super::segment_list::SegmentList) to
/// materialize, but each growth step reallocates and moves all stored
/// samples, so appends on the real-time path can stall.
#[derive(Debug, Clone)]
pub struct GrowingArray {
    data: Vec<f32>,
    channels: usize,
    growth_frames: usize,
    position: usize,
}

impl GrowingArray {
    pub fn new(channels: usize) -> Self {
        Self::with_growth(channels, DEFAULT_GROWTH_FRAMES)
    }

    pub fn with_growth(channels: usize, growth_frames: usize) -> Self {
        let channels = channels.max(1);
        let growth_frames = growth_frames.max(1);
        Self {
            data: Vec::with_capacity(growth_frames * channels),
            channels,
            growth_frames,
            position: 0,
        }
    }

    /// Allocated capacity in frames.
    pub fn capacity(&self) -> usize {
        self.data.capacity() / self.channels
    }
}

impl RingAccess for GrowingArray {
    fn channels(&self) -> usize {
        self.channels
    }

    fn append(&mut self, block: &[f32]) {
        let frames = block.len() / self.channels;
        if frames == 0 {
            return;
        }

        let needed = (self.len() + frames) * self.channels;
        if needed > self.data.capacity() {
            // Grow in whole steps so a burst of small appends reallocates once.
            let missing = needed - self.data.capacity();
            let step = self.growth_frames * self.channels;
            let grow_by = missing.div_ceil(step) * step;
            let target = self.data.capacity() + grow_by;
            self.data.reserve_exact(target - self.data.len());
        }

        self.data.extend_from_slice(&block[..frames * self.channels]);
    }

    fn seek(&mut self, frame: usize) -> bool {
        if frame >= self.len() {
            log::warn!(
                "Could not set position to {} in data of length {}",
                frame,
                self.len()
            );
            return false;
        }

        self.position = frame;
        true
    }

    fn take(&mut self, frames: usize) -> Option<Cow<'_, [f32]>> {
        let size = self.len();
        if size == 0 {
            return None;
        }

        let ch = self.channels;
        let start = self.position;
        let end = start + frames;
        self.position = end % size;

        if end <= size {
            return Some(Cow::Borrowed(&self.data[start * ch..end * ch]));
        }

        let mut out = Vec::with_capacity(frames * ch);
        let mut cursor = start;
        let mut remaining = frames;
        while remaining > 0 {
            let count = remaining.min(size - cursor);
            out.extend_from_slice(&self.data[cursor * ch..(cursor + count) * ch]);
            cursor = (cursor + count) % size;
            remaining -= count;
        }

        Some(Cow::Owned(out))
    }

    fn len(&self) -> usize {
        self.data.len() / self.channels
    }

    fn position(&self) -> usize {
        self.position
    }

    fn materialize(&self) -> Vec<f32> {
        self.data.clone()
    }

    fn snapshot(&self) -> BufferSnapshot {
        BufferSnapshot::new(self.channels, vec![Arc::from(self.data.as_slice())])
    }

    fn clear(&mut self) {
        self.data.clear();
        self.position = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_append_take() {
        let mut array = GrowingArray::new(1);
        array.append(&[1.0, 2.0, 3.0]);

        assert_eq!(array.len(), 3);
        assert_eq!(&*array.take(2).unwrap(), &[1.0, 2.0]);
        assert_eq!(array.position(), 2);
    }

    #[test]
    fn grows_in_whole_steps() {
        let mut array = GrowingArray::with_growth(1, 4);
        assert!(array.capacity() >= 4);

        array.append(&[0.0; 5]);
        assert!(array.capacity() >= 8);
        assert_eq!(array.len(), 5);

        array.append(&[1.0; 3]);
        assert_eq!(array.len(), 8);
        assert_eq!(array.materialize()[7], 1.0);
    }

    #[test]
    fn wraparound() {
        let mut array = GrowingArray::with_growth(1, 4);
        array.append(&[1.0, 2.0, 3.0, 4.0]);
        array.append(&[5.0, 6.0, 7.0, 8.0]);
        array.append(&[9.0, 10.0]);

        assert!(array.seek(8));
        assert_eq!(&*array.take(4).unwrap(), &[9.0, 10.0, 1.0, 2.0]);
        assert_eq!(array.position(), 2);
    }

    #[test]
    fn take_wraps_more_than_once() {
        let mut array = GrowingArray::new(1);
        array.append(&[1.0, 2.0, 3.0]);

        assert_eq!(
            array.take(7).unwrap().into_owned(),
            vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0]
        );
        assert_eq!(array.position(), 1);
    }

    #[test]
    fn empty_operations() {
        let mut array = GrowingArray::new(2);

        assert!(array.is_empty());
        assert!(array.take(5).is_none());
        assert!(!array.seek(0));

        array.append(&[]);
        assert!(array.is_empty());
    }

    #[test]
    fn seek_out_of_range_keeps_position() {
        let mut array = GrowingArray::new(1);
        array.append(&[1.0, 2.0, 3.0]);
        array.take(1);

        assert!(!array.seek(3));
        assert_eq!(array.position(), 1);
    }

    #[test]
    fn clear_resets() {
        let mut array = GrowingArray::new(1);
        array.append(&[1.0, 2.0, 3.0]);
        array.take(2);
        array.clear();

        assert!(array.is_empty());
        assert_eq!(array.position(), 0);
        assert!(array.take(1).is_none());
    }

    #[test]
    fn stereo_snapshot() {
        let mut array = GrowingArray::new(2);
        array.append(&[0.1, 0.2, 0.3, 0.4]);

        let snapshot = array.snapshot();
        array.clear();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.materialize(), vec![0.1, 0.2, 0.3, 0.4]);
    }
}
