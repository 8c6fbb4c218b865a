use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which device(s) the stream should use.
///
/// Names are matched as case-insensitive substrings of the device names the
/// host reports, so `"Spark"` selects "Spark 40 Audio".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceSelection {
    /// One device for both input and output.
    Shared(String),
    /// Separate input and output devices.
    Split { input: String, output: String },
}

impl DeviceSelection {
    pub fn input(&self) -> &str {
        match self {
            Self::Shared(name) => name,
            Self::Split { input, .. } => input,
        }
    }

    pub fn output(&self) -> &str {
        match self {
            Self::Shared(name) => name,
            Self::Split { output, .. } => output,
        }
    }
}

/// Requested stream latency, mapped by the transport to a block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Latency {
    /// Small fixed blocks.
    Low,
    /// Whatever block size the device prefers.
    #[default]
    High,
    /// An explicit block size in frames.
    Frames(u32),
}

impl Latency {
    /// Block size to request, or `None` for the device default.
    pub fn block_frames(&self) -> Option<u32> {
        match self {
            Self::Low => Some(LOW_LATENCY_FRAMES),
            Self::High => None,
            Self::Frames(n) => Some(*n),
        }
    }
}

/// Block size used for [`Latency::Low`].
pub const LOW_LATENCY_FRAMES: u32 = 128;

/// Sample encoding used when exporting a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// 32-bit IEEE float WAV; lossless for the stored samples.
    #[default]
    Float32,
    /// 16-bit PCM WAV; samples are clamped to [-1.0, 1.0].
    Pcm16,
}

/// Configuration for opening the audio stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StreamConfiguration {
    /// Device(s) to open, or None for the host defaults.
    pub device: Option<DeviceSelection>,

    /// Requested latency (default: high).
    pub latency: Latency,

    /// Channels per frame for both input and output (default: 1).
    pub channels: u16,

    /// Sample rate in Hz, or None to use the output device default.
    pub sample_rate: Option<u32>,

    /// How long to keep looking for a named device before giving up.
    pub search_timeout_secs: f64,

    /// Encoding used by exports.
    pub export_format: ExportFormat,

    /// Number of callback durations kept for statistics.
    pub stats_capacity: usize,
}

impl StreamConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_CHANNELS).contains(&self.channels) {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        if self.sample_rate == Some(0) {
            return Err("sample rate must be positive".into());
        }
        if let Latency::Frames(0) = self.latency {
            return Err("block size must be positive".into());
        }
        if !(0.0..=MAX_SEARCH_TIMEOUT_SECS).contains(&self.search_timeout_secs) {
            return Err(format!("invalid search timeout: {}", self.search_timeout_secs));
        }
        if self.stats_capacity == 0 {
            return Err("stats capacity must be positive".into());
        }
        Ok(())
    }

    /// Device search timeout, clamped to `[0, MAX_SEARCH_TIMEOUT_SECS]`.
    pub fn search_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.search_timeout_secs.min(MAX_SEARCH_TIMEOUT_SECS))
            .unwrap_or(Duration::ZERO)
    }
}

/// Largest channel count accepted by [`StreamConfiguration::validate`].
pub const MAX_CHANNELS: u16 = 8;

/// Longest device search timeout accepted by [`StreamConfiguration::validate`].
pub const MAX_SEARCH_TIMEOUT_SECS: f64 = 3600.0;

impl Default for StreamConfiguration {
    fn default() -> Self {
        Self {
            device: None,
            latency: Latency::High,
            channels: 1,
            sample_rate: None,
            search_timeout_secs: 5.0,
            export_format: ExportFormat::Float32,
            stats_capacity: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(StreamConfiguration::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_channel_counts() {
        let zero = StreamConfiguration { channels: 0, ..Default::default() };
        assert!(zero.validate().is_err());

        let many = StreamConfiguration { channels: 9, ..Default::default() };
        assert!(many.validate().is_err());
    }

    #[test]
    fn rejects_negative_timeout() {
        let config = StreamConfiguration {
            search_timeout_secs: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_huge_timeout_without_panicking() {
        let config = StreamConfiguration {
            search_timeout_secs: 1e30,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(
            config.search_timeout(),
            Duration::from_secs_f64(MAX_SEARCH_TIMEOUT_SECS)
        );

        let nan = StreamConfiguration {
            search_timeout_secs: f64::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());
        assert_eq!(nan.search_timeout(), Duration::from_secs_f64(MAX_SEARCH_TIMEOUT_SECS));

        let negative = StreamConfiguration {
            search_timeout_secs: -1.0,
            ..Default::default()
        };
        assert_eq!(negative.search_timeout(), Duration::ZERO);
    }

    #[test]
    fn latency_block_sizes() {
        assert_eq!(Latency::High.block_frames(), None);
        assert_eq!(Latency::Low.block_frames(), Some(LOW_LATENCY_FRAMES));
        assert_eq!(Latency::Frames(256).block_frames(), Some(256));
        assert!(StreamConfiguration { latency: Latency::Frames(0), ..Default::default() }
            .validate()
            .is_err());
    }

    #[test]
    fn device_selection_directions() {
        let shared = DeviceSelection::Shared("Spark".into());
        assert_eq!(shared.input(), "Spark");
        assert_eq!(shared.output(), "Spark");

        let split = DeviceSelection::Split {
            input: "USB".into(),
            output: "HDMI".into(),
        };
        assert_eq!(split.input(), "USB");
        assert_eq!(split.output(), "HDMI");
    }

    #[test]
    fn deserializes_partial_config() {
        let config: StreamConfiguration =
            serde_json::from_str(r#"{"device": "Spark", "latency": "low", "channels": 2}"#).unwrap();

        assert_eq!(config.device, Some(DeviceSelection::Shared("Spark".into())));
        assert_eq!(config.latency, Latency::Low);
        assert_eq!(config.channels, 2);
        assert_eq!(config.stats_capacity, 100);
    }

    #[test]
    fn deserializes_split_devices() {
        let config: StreamConfiguration = serde_json::from_str(
            r#"{"device": {"input": "USB", "output": "HDMI"}, "search-timeout-secs": 0.5}"#,
        )
        .unwrap();

        assert_eq!(config.device.as_ref().map(|d| d.output()), Some("HDMI"));
        assert_eq!(config.search_timeout(), Duration::from_millis(500));
    }
}
