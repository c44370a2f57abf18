//! Error types that can be emitted from this library

use std::path::PathBuf;

use bgs_inflate::DecodeError;
use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent wrapper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// Transparent wrapper for [`bgs_inflate::DecodeError`]
    #[error(transparent)]
    DecodeError(#[from] DecodeError),

    /// {0} is not a BA2 or BSA archive
    #[error("{0} is not a BA2 or BSA archive")]
    InvalidArchive(String),

    /// unsupported {format} version {version}
    #[error("unsupported {format} version {version}")]
    UnsupportedVersion {
        /// Container format name
        format: &'static str,
        /// Version found in the header
        version: u32,
    },

    /// invalid archive directory: {0}
    #[error("invalid archive directory: {0}")]
    InvalidDirectory(String),

    /// entry {name} is corrupt: {reason}
    #[error("entry {name} is corrupt: {reason}")]
    CorruptEntry {
        /// Normalized name of the entry
        name: String,
        /// What did not add up
        reason: String,
    },

    /// unable to find requested file
    #[error("unable to find requested file")]
    FileNotFound(#[from] FileNotFoundError),
}

/// Error type to provide further information when a file has not been found
#[derive(Error, Diagnostic, Debug)]
#[error("unable to find requested file")]
pub enum FileNotFoundError {
    /// by name {0}
    #[error("by name {0}")]
    Name(String),

    /// at path {0}
    #[error("at path {0}")]
    Path(PathBuf),
}

/// Broad classification of an [`Error`]
///
/// Callers match on the kind rather than on message wording.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Reading from the operating system failed
    Io,

    /// The binary layout of a container is malformed
    Structural,

    /// A compressed payload could not be decoded
    Decode,

    /// The requested entry does not exist
    NotFound,

    /// A coordinate lies outside the stored data
    OutOfBounds,

    /// The caller passed an unusable argument
    InvalidArgument,

    /// A background worker failed without producing a result
    Worker,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::IOError(_) => ErrorKind::Io,
            Error::BinRWError(_)
            | Error::InvalidArchive(_)
            | Error::UnsupportedVersion { .. }
            | Error::InvalidDirectory(_) => ErrorKind::Structural,
            Error::DecodeError(_) | Error::CorruptEntry { .. } => ErrorKind::Decode,
            Error::FileNotFound(_) => ErrorKind::NotFound,
        }
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
