//! Error types that can be emitted from this library

use bgs_inflate::DecodeError;
use miette::Diagnostic;
use thiserror::Error;

pub use bgs_archive::ErrorKind;

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

    /// Transparent wrapper for [`bgs_archive::Error`], raised while opening a file
    #[error(transparent)]
    ArchiveError(#[from] bgs_archive::Error),

    /// unsupported BTD version {0}
    #[error("unsupported BTD version {0}")]
    UnsupportedVersion(u32),

    /// invalid terrain file: {0}
    #[error("invalid terrain file: {0}")]
    InvalidTerrain(String),

    /// compressed block {block} is corrupt: {reason}
    #[error("compressed block {block} is corrupt: {reason}")]
    CorruptBlock {
        /// Index in the block descriptor table
        block: usize,
        /// What did not add up
        reason: String,
    },

    /// cell ({x}, {y}) is outside the world
    #[error("cell ({x}, {y}) is outside the world")]
    CellOutOfBounds {
        /// Cell X coordinate
        x: i32,
        /// Cell Y coordinate
        y: i32,
    },

    /// {table} index {index} is out of range, count is {count}
    #[error("{table} index {index} is out of range, count is {count}")]
    IndexOutOfBounds {
        /// Name of the table
        table: &'static str,
        /// Requested index
        index: usize,
        /// Number of entries
        count: usize,
    },

    /// {0}
    #[error("{0}")]
    InvalidArgument(String),

    /// decode worker {0} panicked
    #[error("decode worker {0} panicked")]
    WorkerPanic(usize),
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::IOError(_) => ErrorKind::Io,
            Error::BinRWError(_) | Error::UnsupportedVersion(_) | Error::InvalidTerrain(_) => {
                ErrorKind::Structural
            }
            Error::DecodeError(_) | Error::CorruptBlock { .. } => ErrorKind::Decode,
            Error::ArchiveError(err) => err.kind(),
            Error::CellOutOfBounds { .. } | Error::IndexOutOfBounds { .. } => {
                ErrorKind::OutOfBounds
            }
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::WorkerPanic(_) => ErrorKind::Worker,
        }
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
