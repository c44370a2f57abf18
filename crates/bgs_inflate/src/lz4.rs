//! LZ4 frame decoding.

use tracing::trace;

use crate::bits::ByteReader;
use crate::error::{DecodeError, Result};
use crate::output::Output;

/// Frame magic number as stored in the file
pub const MAGIC: [u8; 4] = [0x04, 0x22, 0x4D, 0x18];

const FLAG_DICTIONARY_ID: u8 = 0x01;
const FLAG_RESERVED: u8 = 0x02;
const FLAG_CONTENT_CHECKSUM: u8 = 0x04;
const FLAG_CONTENT_SIZE: u8 = 0x08;
const FLAG_BLOCK_CHECKSUM: u8 = 0x10;
const FLAG_BLOCK_INDEPENDENCE: u8 = 0x20;
const VERSION_MASK: u8 = 0xC0;
const VERSION_01: u8 = 0x40;

const UNCOMPRESSED_BLOCK: u32 = 0x8000_0000;
const MIN_MATCH: usize = 4;

/// Decode a complete LZ4 frame from `src` into `dst`.
///
/// Returns the number of bytes written. Checksums in the frame are skipped, not verified.
pub fn decode_frame(dst: &mut [u8], src: &[u8]) -> Result<usize> {
    let mut input = ByteReader::new(src, 0);
    if input.take(4)? != MAGIC {
        return Err(DecodeError::InvalidHeader);
    }

    let flags = input.u8()?;
    if (flags & VERSION_MASK) != VERSION_01
        || (flags & (FLAG_RESERVED | FLAG_DICTIONARY_ID)) != 0
        || (flags & FLAG_BLOCK_INDEPENDENCE) == 0
    {
        return Err(DecodeError::UnsupportedLz4Flags(flags));
    }
    let _block_max_size = input.u8()?;
    let content_size = if flags & FLAG_CONTENT_SIZE != 0 {
        Some(input.u64_le()?)
    } else {
        None
    };
    let _header_checksum = input.u8()?;

    let mut out = Output::new(dst);
    loop {
        let block_size = input.u32_le()?;
        if block_size == 0 {
            break;
        }

        if block_size & UNCOMPRESSED_BLOCK != 0 {
            let size = (block_size & !UNCOMPRESSED_BLOCK) as usize;
            out.extend(input.take(size)?)?;
            trace!(size, "stored LZ4 block");
        } else {
            let block = input.take(block_size as usize)?;
            decode_block(block, &mut out)?;
            trace!(size = block_size, "compressed LZ4 block");
        }

        if flags & FLAG_BLOCK_CHECKSUM != 0 {
            input.skip(4)?;
        }
    }

    if flags & FLAG_CONTENT_CHECKSUM != 0 {
        input.skip(4)?;
    }

    let written = out.written();
    if let Some(expected) = content_size {
        if expected != written as u64 {
            return Err(DecodeError::ContentSizeMismatch {
                expected,
                actual: written as u64,
            });
        }
    }

    Ok(written)
}

/// Read the 15 + continuation byte length extension.
fn extended_length(block: &mut ByteReader<'_>, nibble: usize) -> Result<usize> {
    let mut length = nibble;
    if nibble == 15 {
        loop {
            let b = block.u8().map_err(|_| DecodeError::InvalidSequence)?;
            length += usize::from(b);
            if b != 0xFF {
                break;
            }
        }
    }
    Ok(length)
}

fn decode_block(data: &[u8], out: &mut Output<'_>) -> Result<()> {
    let mut block = ByteReader::new(data, 0);

    while block.remaining() > 0 {
        let token = block.u8()?;

        let literals = extended_length(&mut block, usize::from(token >> 4))?;
        let literals = block
            .take(literals)
            .map_err(|_| DecodeError::InvalidSequence)?;
        out.extend(literals)?;

        // the last sequence of a block carries literals only
        if block.remaining() == 0 {
            break;
        }

        let offset = block
            .u16_le()
            .map_err(|_| DecodeError::InvalidSequence)?;
        let length = extended_length(&mut block, usize::from(token & 0x0F))? + MIN_MATCH;
        out.copy_match(usize::from(offset), length)?;
    }

    Ok(())
}
