use thiserror::Error;

/// Errors surfaced by looper control operations and transports.
///
/// Out-of-range seeks are not errors; they are reported as `false` by
/// `seek`/`set_frame`. Reading from an empty buffer yields `None`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LooperError {
    #[error("no stream available")]
    NoStream,

    #[error("recording with key '{0}' does not exist")]
    UnknownKey(String),

    #[error("device not available: {0}")]
    DeviceNotAvailable(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("stream failed: {0}")]
    StreamFailed(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),
}
