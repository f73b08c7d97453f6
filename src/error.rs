use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the zoning pipeline.
///
/// An empty point set is not an error: clustering it yields zero modes. Seeds that hit the
/// iteration cap are not errors either, their last position is used.
#[derive(Debug, Error)]
pub enum Error {
    /// The image file could not be opened or decoded. Aborts only that image.
    #[error("failed to decode image {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// A region image could not be encoded or written.
    #[error("failed to write image {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("bandwidth must be finite and positive, got {0}")]
    InvalidBandwidth(f32),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("dimension mismatch: expected {expected} elements, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("image has zero width or height")]
    EmptyImage,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
