use thiserror::Error;

/// Capture subsystem errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CameraError {
    #[error("no camera device available")]
    NoCameraDevice,

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("format query failed: {0}")]
    FormatQuery(String),

    #[error("stream start failed: {0}")]
    StreamStart(String),

    #[error("frame grab failed: {0}")]
    FrameGrab(String),

    #[error("frame mismatch: expected {expected}, got {actual}")]
    FrameMismatch { expected: String, actual: String },
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, CameraError>;
