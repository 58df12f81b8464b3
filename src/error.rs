//! Error types
//!
//! `SendError` is what the streaming primitive reports, `Error` is what a
//! middleware hands back to the host when it cannot decline.

use hyper::StatusCode;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure modes of [`crate::http::send::send`]
#[derive(Debug, Error)]
pub enum SendError {
    /// Nothing exists at the path (extensions included)
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The path resolved to a directory and no index file matched
    #[error("path is a directory: {}", .0.display())]
    Directory(PathBuf),

    /// Dotfile policy is `Deny` and the file name starts with a dot
    #[error("access to dotfile denied: {}", .0.display())]
    Forbidden(PathBuf),

    /// `If-Match` or `If-Unmodified-Since` did not hold
    #[error("precondition failed")]
    PreconditionFailed,

    /// The requested range lies outside the file
    #[error("range not satisfiable for {size} byte file")]
    RangeNotSatisfiable { size: u64 },

    /// The path cannot name a file: a component is not a directory or is too long
    #[error("invalid path {}: {source}", path.display())]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Any other filesystem error (permission denied, I/O error, ...)
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SendError {
    /// Whether the error means "nothing to serve here"
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// HTTP status this error carries
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::InvalidPath { .. } => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            Self::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::Directory(_) | Self::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Crate-wide error
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Send(#[from] SendError),

    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// HTTP status the host should answer with
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Send(e) => e.status(),
            Self::InvalidHeader { .. } | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
