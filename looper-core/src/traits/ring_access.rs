use std::borrow::Cow;
use std::sync::Arc;

/// Growable sample store with tail append and circular reads.
///
/// Blocks are interleaved `frames × channels` slices of `f32`. A trailing
/// partial frame in an appended block is ignored. Positions and lengths are
/// counted in frames.
pub trait RingAccess: Send {
    /// Samples per frame.
    fn channels(&self) -> usize;

    /// Copy `block` onto the end of the store.
    fn append(&mut self, block: &[f32]);

    /// Move the read cursor to `frame`.
    ///
    /// Returns `false` and leaves the cursor untouched when `frame` is not
    /// inside the stored data, including when the store is empty.
    fn seek(&mut self, frame: usize) -> bool;

    /// Read `frames` frames from the cursor and advance it, wrapping to the
    /// start as often as needed.
    ///
    /// Returns `None` when nothing has been stored yet.
    fn take(&mut self, frames: usize) -> Option<Cow<'_, [f32]>>;

    /// Stored length in frames.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Absolute frame the next `take` starts at. Zero when empty.
    fn position(&self) -> usize;

    /// All stored samples, in append order, as one interleaved vector.
    fn materialize(&self) -> Vec<f32>;

    /// Shared view of the stored samples that stays valid after the store is
    /// cleared or dropped.
    fn snapshot(&self) -> BufferSnapshot;

    /// Drop everything and reset the cursor.
    fn clear(&mut self);
}

/// Immutable view of a store's contents at one point in time.
#[derive(Debug, Clone)]
pub struct BufferSnapshot {
    channels: usize,
    parts: Vec<Arc<[f32]>>,
}

impl BufferSnapshot {
    pub fn new(channels: usize, parts: Vec<Arc<[f32]>>) -> Self {
        Self {
            channels: channels.max(1),
            parts,
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Length in frames.
    pub fn len(&self) -> usize {
        self.parts.iter().map(|p| p.len()).sum::<usize>() / self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.parts.iter().all(|p| p.is_empty())
    }

    /// Concatenate all parts into one interleaved vector.
    pub fn materialize(&self) -> Vec<f32> {
        let total: usize = self.parts.iter().map(|p| p.len()).sum();
        let mut samples = Vec::with_capacity(total);
        for part in &self.parts {
            samples.extend_from_slice(part);
        }
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_concatenates_parts() {
        let snapshot = BufferSnapshot::new(
            2,
            vec![Arc::from(&[1.0f32, 2.0][..]), Arc::from(&[3.0f32, 4.0, 5.0, 6.0][..])],
        );

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.materialize(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn empty_snapshot() {
        let snapshot = BufferSnapshot::new(1, Vec::new());
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.len(), 0);
        assert!(snapshot.materialize().is_empty());
    }
}
