use std::collections::HashMap;

use crate::models::audio_models::RecordingsSnapshot;
use crate::models::state::RecordingState;
use crate::session::recording::Recording;

/// All recordings of one stream, keyed by an opaque string.
///
/// Not synchronized itself; the owner keeps it behind the one shared lock
/// that both the callback and the control plane take.
#[derive(Debug)]
pub struct RecordingSet {
    recordings: HashMap<String, Recording>,
    channels: usize,
}

impl RecordingSet {
    pub fn new(channels: usize) -> Self {
        Self {
            recordings: HashMap::new(),
            channels: channels.max(1),
        }
    }

    /// Channel count given to newly created recordings.
    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.recordings.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Recording> {
        self.recordings.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Recording> {
        self.recordings.get_mut(key)
    }

    /// The recording under `key`, created paused and empty if missing.
    pub fn get_or_create(&mut self, key: &str) -> &mut Recording {
        let channels = self.channels;
        self.recordings.entry(key.to_string()).or_insert_with(|| {
            log::debug!("Created recording '{}'", key);
            Recording::new(channels)
        })
    }

    /// Detach and drop the recording. Returns `false` if `key` is unknown.
    pub fn remove(&mut self, key: &str) -> bool {
        self.recordings.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.recordings.clear();
    }

    pub fn pause_all(&mut self) {
        for recording in self.recordings.values_mut() {
            recording.set_state(RecordingState::Paused);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Recording)> {
        self.recordings.iter().map(|(k, r)| (k.as_str(), r))
    }

    pub fn snapshot(&self) -> RecordingsSnapshot {
        self.recordings
            .iter()
            .map(|(key, recording)| (key.clone(), recording.info()))
            .collect()
    }

    /// Feed one block to every recording: recording ones append `input`,
    /// looping ones mix into `output`, paused ones are skipped.
    pub fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        for recording in self.recordings.values_mut() {
            recording.process_block(input, output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_is_lazy_and_stable() {
        let mut set = RecordingSet::new(1);
        assert!(set.get("a").is_none());

        set.get_or_create("a").set_name("first");
        set.get_or_create("a");

        assert_eq!(set.len(), 1);
        assert_eq!(set.get("a").unwrap().name(), "first");
        assert!(set.get("a").unwrap().state().is_paused());
    }

    #[test]
    fn remove_reports_unknown_keys() {
        let mut set = RecordingSet::new(1);
        set.get_or_create("a");

        assert!(set.remove("a"));
        assert!(!set.remove("a"));
        assert!(set.is_empty());
    }

    #[test]
    fn mixes_looping_recordings_with_volume() {
        let mut set = RecordingSet::new(1);

        let a = set.get_or_create("a");
        a.record_block(&[1.0; 4]);
        a.set_state(RecordingState::Looping);

        let b = set.get_or_create("b");
        b.record_block(&[2.0; 4]);
        b.set_volume(0.5);
        b.set_state(RecordingState::Looping);

        let mut output = [0.0; 4];
        set.process_block(&[0.0; 4], &mut output);

        assert_eq!(output, [2.0; 4]);
    }

    #[test]
    fn records_and_loops_in_same_block() {
        let mut set = RecordingSet::new(1);

        let looper = set.get_or_create("loop");
        looper.record_block(&[0.5, 0.5]);
        looper.set_state(RecordingState::Looping);

        set.get_or_create("rec").set_state(RecordingState::Recording);
        set.get_or_create("paused").record_block(&[9.0, 9.0]);

        let mut output = [0.0; 2];
        set.process_block(&[0.1, 0.2], &mut output);

        assert_eq!(output, [0.5, 0.5]);
        assert_eq!(set.get("rec").unwrap().samples(), vec![0.1, 0.2]);
        assert_eq!(set.get("paused").unwrap().frame(), 0);
    }

    #[test]
    fn pause_all_and_snapshot() {
        let mut set = RecordingSet::new(2);
        set.get_or_create("b").set_state(RecordingState::Looping);
        set.get_or_create("a").set_state(RecordingState::Recording);

        set.pause_all();
        let snapshot = set.snapshot();

        assert_eq!(snapshot.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(snapshot.values().all(|info| info.state == RecordingState::Paused));
        assert_eq!(set.get("a").unwrap().channels(), 2);
    }
}
