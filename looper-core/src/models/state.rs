use std::fmt;

use serde::{Deserialize, Serialize};

/// What a recording does with each audio block.
///
/// No transition rules are enforced here: any state may be assigned from any
/// other (looping straight into recording is legal). Gating such as
/// "no seeking while recording" belongs to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RecordingState {
    /// Skipped by the callback.
    #[default]
    #[serde(rename = "pause")]
    Paused,
    /// Input blocks are appended to the buffer.
    #[serde(rename = "record")]
    Recording,
    /// Buffer contents are mixed into the output, wrapping at the end.
    #[serde(rename = "loop")]
    Looping,
}

impl RecordingState {
    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_looping(&self) -> bool {
        matches!(self, Self::Looping)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paused => "pause",
            Self::Recording => "record",
            Self::Looping => "loop",
        }
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_paused() {
        assert_eq!(RecordingState::default(), RecordingState::Paused);
        assert!(RecordingState::default().is_paused());
    }

    #[test]
    fn serializes_to_short_names() {
        assert_eq!(serde_json::to_string(&RecordingState::Paused).unwrap(), "\"pause\"");
        assert_eq!(serde_json::to_string(&RecordingState::Recording).unwrap(), "\"record\"");
        assert_eq!(serde_json::to_string(&RecordingState::Looping).unwrap(), "\"loop\"");

        let parsed: RecordingState = serde_json::from_str("\"loop\"").unwrap();
        assert_eq!(parsed, RecordingState::Looping);
    }

    #[test]
    fn display_matches_serialized_name() {
        assert_eq!(RecordingState::Recording.to_string(), "record");
    }
}
