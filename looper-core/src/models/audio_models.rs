use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::RecordingState;

/// The devices a running stream is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub input: String,
    pub output: String,
}

/// Read-only projection of one recording for the control plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingInfo {
    pub name: String,
    pub state: RecordingState,
    pub volume: f32,
    /// Playback position in frames.
    pub frame: usize,
    /// Recorded length in frames.
    pub length: usize,
    pub created_at: DateTime<Utc>,
}

/// Keyed snapshot of every recording in the set.
pub type RecordingsSnapshot = BTreeMap<String, RecordingInfo>;

/// Aggregates over recent callback durations, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DurationStats {
    pub mean: f64,
    pub max: f64,
    pub std: f64,
    #[serde(rename = "99p")]
    pub p99: f64,
}

/// Stream state as reported to the control plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub active: bool,
    /// Zero when no stream is open.
    pub sample_rate: u32,
    pub device: Option<DeviceInfo>,
    pub duration_stats: DurationStats,
    /// Transport notices (overflow/underflow) seen since the stream opened.
    pub notices: u64,
    /// Devices the host reports; only filled while no stream is active.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub available_devices: Vec<String>,
}

/// Informational flags a transport attaches to one block.
///
/// Never fatal: the callback logs them and carries on mixing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockStatus {
    /// Input arrived faster than it was consumed and some was dropped.
    pub input_overflow: bool,
    /// Not enough input was available; the gap was zero-filled.
    pub input_underflow: bool,
}

impl BlockStatus {
    pub fn is_clean(&self) -> bool {
        !self.input_overflow && !self.input_underflow
    }
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.input_overflow, self.input_underflow) {
            (false, false) => f.write_str("ok"),
            (true, false) => f.write_str("input overflow"),
            (false, true) => f.write_str("input underflow"),
            (true, true) => f.write_str("input overflow, input underflow"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_stats_use_99p_key() {
        let stats = DurationStats {
            mean: 0.5,
            max: 1.0,
            std: 0.1,
            p99: 0.9,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["99p"], 0.9);
        assert!(json.get("p99").is_none());
    }

    #[test]
    fn block_status_display() {
        assert_eq!(BlockStatus::default().to_string(), "ok");
        assert!(BlockStatus::default().is_clean());

        let status = BlockStatus {
            input_underflow: true,
            ..Default::default()
        };
        assert!(!status.is_clean());
        assert_eq!(status.to_string(), "input underflow");
    }

    #[test]
    fn inactive_stream_info_lists_devices() {
        let info = StreamInfo {
            active: false,
            sample_rate: 0,
            device: None,
            duration_stats: DurationStats::default(),
            notices: 0,
            available_devices: vec!["hw:0".into()],
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["available_devices"][0], "hw:0");
        assert!(json["device"].is_null());
    }
}
