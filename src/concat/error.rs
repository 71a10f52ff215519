//! Request failure taxonomy.
//!
//! Every gate in the combiner is fail-fast: the first error ends the request
//! and maps to exactly one HTTP status, with no partial body.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type ConcatResult<T> = Result<T, ConcatError>;

/// Why a combined-asset request was rejected.
#[derive(Debug, Error)]
pub enum ConcatError {
    /// Wrong method, missing query, empty or oversized list, undecodable payload.
    #[error("malformed request: {0}")]
    Protocol(String),

    /// Traversal sequence, NUL byte, or a path escaping the document root.
    #[error("unsafe reference `{0}`")]
    PathSafety(String),

    #[error("access to `{0}` is forbidden")]
    #[allow(dead_code)] // 403 is part of the status contract, no gate raises it yet
    Forbidden(String),

    #[error("`{}` does not exist", .0.display())]
    NotFound(PathBuf),

    /// Extension missing from the MIME table.
    #[error("unsupported file type for `{0}`")]
    UnknownType(String),

    /// A file whose MIME type differs from the one fixed by the first file.
    #[error("`{reference}` is {found}, request is {expected}")]
    MimeMismatch {
        reference: String,
        expected: String,
        found: String,
    },

    /// Stat or read failure on an existing, type-valid file.
    #[error("cannot read `{}`", .0.display())]
    Io(PathBuf, #[source] io::Error),
}

impl ConcatError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// HTTP status code for this failure.
    pub const fn status(&self) -> u16 {
        match self {
            Self::Protocol(_)
            | Self::PathSafety(_)
            | Self::UnknownType(_)
            | Self::MimeMismatch { .. } => 400,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Io(..) => 500,
        }
    }
}
