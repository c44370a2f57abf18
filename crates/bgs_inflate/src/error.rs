//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Reasons a compressed stream could not be decoded
///
/// Any of these aborts the current call only. The output buffer passed to the failing call holds
/// unspecified data afterwards.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// invalid or unsupported zlib compression method
    #[error("invalid or unsupported zlib compression method")]
    InvalidHeader,

    /// unsupported LZ4 version or frame flags
    #[error("unsupported LZ4 version or frame flags: {0:#04x}")]
    UnsupportedLz4Flags(u8),

    /// reserved Deflate block type
    #[error("invalid Deflate block type in zlib compressed data")]
    InvalidBlockType,

    /// stored block length does not match its complement
    #[error("stored block length {len:#06x} does not match complement {nlen:#06x}")]
    StoredLengthMismatch { len: u16, nlen: u16 },

    /// malformed code length table
    #[error("invalid Huffman code lengths: {0}")]
    InvalidCodeLengths(&'static str),

    /// bit pattern does not map to any symbol
    #[error("invalid Huffman code in zlib compressed data")]
    InvalidHuffmanCode,

    /// literal/length symbol without a length mapping
    #[error("invalid length symbol {0}")]
    InvalidLengthSymbol(u16),

    /// distance symbol without a distance mapping
    #[error("invalid distance symbol {0}")]
    InvalidDistanceSymbol(u16),

    /// back-reference before the start of the output
    #[error("invalid back-reference distance {distance} with {written} bytes written")]
    InvalidDistance { distance: usize, written: usize },

    /// LZ4 sequence that does not fit in its block
    #[error("invalid or corrupt LZ4 compressed data")]
    InvalidSequence,

    /// decoded data does not fit in the output buffer
    #[error("uncompressed data larger than output buffer of {capacity} bytes")]
    OutputOverflow { capacity: usize },

    /// input ends in the middle of a stream
    #[error("unexpected end of compressed data")]
    UnexpectedEnd,

    /// Adler-32 trailer mismatch
    #[error("checksum error in zlib compressed data: expected {expected:#010x}, computed {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// LZ4 frame produced a different amount of data than it declared
    #[error("LZ4 frame declares {expected} bytes of content but produced {actual}")]
    ContentSizeMismatch { expected: u64, actual: u64 },
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, DecodeError>;
