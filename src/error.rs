//! Error types for the body pipeline.

use thiserror::Error;

/// Main error type for the library
///
/// "No body in this frame" is not an error: decoding returns `Ok(None)` for it.
#[derive(Error, Debug)]
pub enum Error {
    /// `OpenCV` operation failed
    #[error("OpenCV error: {0}")]
    OpenCV(#[from] opencv::Error),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input violating the documented contract (wrong tensor length, empty frame, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Region corners that cannot define an affine transform; skip the frame
    #[error("Degenerate geometry: {0}")]
    Geometry(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the caller should simply drop the current frame and carry on
    #[must_use]
    pub fn is_frame_skip(&self) -> bool {
        matches!(self, Self::Geometry(_))
    }
}
