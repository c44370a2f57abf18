//! This library decodes the compressed payloads found in **BA2**, **BSA** and **BTD** files used by
//! *Bethesda* games.
//!
//! # Supported Stream Formats
//!
//! Two framings are recognised by looking at the first two bytes of the input. Nothing is ever
//! compressed by this crate, it only decodes.
//!
//! | First bytes      | Format     | Notes                                                       |
//! |------------------|------------|-------------------------------------------------------------|
//! | `04 22 4D 18`    | LZ4 frame  | Independent blocks only, no dictionary                      |
//! | `78 xx` and more | zlib       | Deflate (method 8), no preset dictionary, Adler-32 trailer  |
//!
//! ## zlib
//!
//! A zlib stream starts with a 2 byte big-endian header. The low nibble of the first byte must be
//! `8` (Deflate) and the 16-bit value must be a multiple of 31. The header is followed by a
//! sequence of Deflate blocks, and the stream ends with the big-endian Adler-32 checksum of the
//! decompressed data.
//!
//! Each Deflate block starts with a 3 bit header:
//!
//! | Bits | Meaning                                                         |
//! |------|-----------------------------------------------------------------|
//! | 0    | Set on the final block                                          |
//! | 1-2  | `00` stored, `01` fixed Huffman, `10` dynamic Huffman, `11` bad |
//!
//! ## LZ4 frame
//!
//! | Offset (bytes) | Field          | Description                                          |
//! |----------------|----------------|------------------------------------------------------|
//! | 0x0000         | Magic number   | 4 bytes: 0x184D2204, little-endian                   |
//! | 0x0004         | FLG            | 1 byte: version, independence, checksum flags        |
//! | 0x0005         | BD             | 1 byte: maximum block size (ignored)                 |
//! | 0x0006         | Content size   | 8 bytes: only present when FLG bit 3 is set          |
//! | ...            | HC             | 1 byte: header checksum (ignored)                    |
//!
//! The header is followed by blocks, each starting with a little-endian `u32` size. A size of
//! zero ends the frame, a set high bit marks a block that is stored without compression.
//! Block and content checksums are skipped without being verified.
//!
//! ```
//! let stream = [
//!     0x78, 0x9C, 0xF3, 0x48, 0xCD, 0xC9, 0xC9, 0x57, 0x08, 0xCF, 0x2F, 0xCA, 0x49, 0x01,
//!     0x00, 0x18, 0x0B, 0x04, 0x1D,
//! ];
//!
//! let mut buffer = [0u8; 32];
//! let written = bgs_inflate::decompress(&mut buffer, &stream)?;
//! assert_eq!(&buffer[..written], b"Hello World");
//! # Ok::<(), bgs_inflate::DecodeError>(())
//! ```

pub mod adler;
mod bits;
pub mod error;
mod huffman;
pub mod lz4;
mod output;
pub mod zlib;

pub use adler::Adler32;
pub use error::DecodeError;

use error::Result;

/// Framing of a compressed stream, detected from its first bytes
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Format {
    /// zlib wrapped Deflate data
    Zlib,

    /// LZ4 frame
    Lz4,
}

impl Format {
    /// Inspect the leading bytes of `src` and select the decoder to use.
    pub fn detect(src: &[u8]) -> Result<Format> {
        let [b0, b1, ..] = *src else {
            return Err(DecodeError::UnexpectedEnd);
        };

        let header = u16::from_be_bytes([b0, b1]);
        if header == 0x0422 {
            return Ok(Format::Lz4);
        }
        if (header & 0x8F20) != 0x0800 || header % 31 != 0 {
            return Err(DecodeError::InvalidHeader);
        }

        Ok(Format::Zlib)
    }
}

/// Decompress `src` into `dst`, returning the number of bytes written.
///
/// The capacity of the output is `dst.len()`. On failure the contents of `dst` are unspecified
/// and must be discarded.
#[tracing::instrument(level = "trace", skip_all, fields(src = src.len(), dst = dst.len()), err)]
pub fn decompress(dst: &mut [u8], src: &[u8]) -> Result<usize> {
    match Format::detect(src)? {
        Format::Zlib => zlib::inflate(dst, src),
        Format::Lz4 => lz4::decode_frame(dst, src),
    }
}

/// Decompress `src` into a freshly allocated buffer of at most `size` bytes.
pub fn decompress_to_vec(src: &[u8], size: usize) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; size];
    let written = decompress(&mut buffer, src)?;
    buffer.truncate(written);
    Ok(buffer)
}
