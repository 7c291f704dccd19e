//! Section loading errors

use std::path::PathBuf;

use thiserror::Error;

/// Failure while building a section from its descriptor or settings
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("descriptor has {found} segments, expected {expected}")]
    MissingSegment { found: usize, expected: usize },

    #[error("grid of {width}x{height} cells is too large")]
    GridTooLarge { width: usize, height: usize },

    #[error("unknown element type index {index} in token '{token}'")]
    UnknownElementType { index: i64, token: String },

    #[error("malformed tile token '{0}'")]
    MalformedToken(String),

    #[error("malformed ramp token '{token}': {reason}")]
    MalformedRamp { token: String, reason: &'static str },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),
}
