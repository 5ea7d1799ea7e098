//! Error types for hdsforge-media.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for hdsforge-media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for hdsforge-media operations.
///
/// Every variant is fatal for the current packaging run.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading the source or writing an output file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File that was being read or written.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The upstream demuxer reported that parsing failed.
    #[error("Source parsing failed: {0}")]
    Upstream(String),

    /// A sample's byte range lies outside the source buffer.
    #[error("Sample {index}: range {offset}+{len} exceeds source size {size}")]
    SourceRange {
        index: usize,
        offset: u64,
        len: u64,
        size: u64,
    },

    /// Samples are not in non-decreasing timestamp order.
    #[error("Sample {index}: timestamp {timestamp} precedes previous timestamp {previous}")]
    Unordered {
        index: usize,
        timestamp: f64,
        previous: f64,
    },

    /// A fragment other than the last one has zero duration.
    #[error("Fragment {index} has zero duration but is not the last fragment")]
    ZeroDuration { index: u32 },

    /// The timeline ends before the start of its last fragment.
    #[error("Fragment {index} has negative duration {duration}")]
    NegativeDuration { index: u32, duration: f64 },

    /// A value does not fit into its binary field.
    #[error("{field} overflows its field: {value}")]
    Overflow { field: &'static str, value: u64 },

    /// A bootstrap box could not be parsed.
    #[error("Invalid bootstrap: {0}")]
    InvalidBootstrap(String),

    /// Buffer too small for operation.
    #[error("Buffer underflow: need {need} bytes, have {have}")]
    BufferUnderflow { need: usize, have: usize },

    /// Configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create an I/O error tagged with the file it concerns.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create an invalid bootstrap error.
    pub fn invalid_bootstrap(msg: impl Into<String>) -> Self {
        Self::InvalidBootstrap(msg.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
