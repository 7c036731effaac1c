use thiserror::Error;

use crate::camera::error::CameraError;
use crate::detect::error::DetectError;
use crate::overlay::error::RenderError;

/// Errors that prevent a sampling session from starting or running.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid settings: {0}")]
    Settings(String),

    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("detector '{detector}' expects {expected} frames, settings request {requested}")]
    FrameSpecMismatch {
        detector: String,
        expected: String,
        requested: String,
    },

    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, SessionError>;
