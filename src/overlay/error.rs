use thiserror::Error;

/// Overlay rendering errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RenderError {
    #[error("drawing surface failed: {0}")]
    Surface(String),

    #[error("overlay thread is not running")]
    Closed,
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, RenderError>;
