use thiserror::Error;

/// Detector subsystem errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DetectError {
    #[error("model load failed: {0}")]
    ModelLoad(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("detector expects {expected} frames, pipeline delivers {actual}")]
    InputMismatch { expected: String, actual: String },
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, DetectError>;
