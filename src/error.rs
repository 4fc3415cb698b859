//! Error types for rangecache.

use std::io;
use thiserror::Error;

/// The result type used throughout rangecache.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for cache and reader operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The fetcher could not supply a block.
    ///
    /// `assembled` is the number of bytes already copied into the caller's
    /// buffer by the same read before the failing block was reached.
    #[error("Fetch failed for block at offset {offset} ({assembled} bytes assembled): {source}")]
    Fetch {
        /// Aligned offset of the block that failed to load.
        offset: u64,
        /// Bytes written to the output buffer before the failure.
        assembled: usize,
        /// The underlying fetcher error.
        #[source]
        source: io::Error,
    },

    /// The requested offset lies at or beyond the end of the source.
    #[error("Invalid range: offset {offset} is at or beyond end of source ({total_size} bytes)")]
    InvalidRange {
        /// The requested offset.
        offset: u64,
        /// Logical length of the source.
        total_size: u64,
    },

    /// An invalid argument or configuration was provided.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An I/O error occurred outside of a block fetch.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Creates a new invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Number of bytes successfully assembled before this error occurred.
    pub fn assembled(&self) -> usize {
        match self {
            Error::Fetch { assembled, .. } => *assembled,
            _ => 0,
        }
    }

    /// Returns true if this error signals a read at or past the end of the source.
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::InvalidRange { .. })
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => e,
            Error::Fetch { source, .. } => source,
            e @ Error::InvalidRange { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, e),
            e @ Error::InvalidArgument(_) => io::Error::new(io::ErrorKind::InvalidInput, e),
        }
    }
}
