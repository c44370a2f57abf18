//! zlib / Deflate decoding.

use tracing::trace;

use crate::adler::Adler32;
use crate::bits::BitReader;
use crate::error::{DecodeError, Result};
use crate::huffman::Huffman;
use crate::output::Output;
use crate::Format;

const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];

const LENGTH_EXTRA: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

const DIST_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

const DIST_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Order in which code length code lengths are stored
const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

const MAX_LITERAL_CODES: usize = 286;
const MAX_DISTANCE_CODES: usize = 30;
const END_OF_BLOCK: u16 = 256;

/// Decode a complete zlib stream from `src` into `dst`.
///
/// Returns the number of bytes written. The Adler-32 trailer is always verified.
pub fn inflate(dst: &mut [u8], src: &[u8]) -> Result<usize> {
    if Format::detect(src)? != Format::Zlib {
        return Err(DecodeError::InvalidHeader);
    }

    let mut out = Output::new(dst);
    let mut adler = Adler32::new();
    let mut bits = BitReader::new(src, 2);

    loop {
        let header = bits.bits(3)?;
        let start = out.written();

        match header >> 1 {
            0 => bits = stored_block(bits, &mut out)?,
            1 => {
                let (literals, distances) = fixed_tables()?;
                huffman_block(&mut bits, &mut out, &literals, &distances)?;
            }
            2 => {
                let (literals, distances) = dynamic_tables(&mut bits)?;
                huffman_block(&mut bits, &mut out, &literals, &distances)?;
            }
            _ => return Err(DecodeError::InvalidBlockType),
        }

        trace!(kind = header >> 1, bytes = out.written() - start, "inflated block");
        adler.update(&out.as_slice()[start..]);

        if header & 1 != 0 {
            break;
        }
    }

    let mut trailer = bits.into_bytes();
    let expected = trailer.u32_be()?;
    let actual = adler.finish();
    if expected != actual {
        return Err(DecodeError::ChecksumMismatch { expected, actual });
    }

    Ok(out.written())
}

fn stored_block<'a>(bits: BitReader<'a>, out: &mut Output<'_>) -> Result<BitReader<'a>> {
    let mut bytes = bits.into_bytes();
    let len = bytes.u16_le()?;
    let nlen = bytes.u16_le()?;
    if len != !nlen {
        return Err(DecodeError::StoredLengthMismatch { len, nlen });
    }

    out.extend(bytes.take(usize::from(len))?)?;
    Ok(bytes.into_bits())
}

fn fixed_tables() -> Result<(Huffman, Huffman)> {
    let mut lengths = [0u8; 288];
    lengths[..144].fill(8);
    lengths[144..256].fill(9);
    lengths[256..280].fill(7);
    lengths[280..].fill(8);

    Ok((Huffman::new(&lengths)?, Huffman::new(&[5u8; 30])?))
}

fn dynamic_tables(bits: &mut BitReader<'_>) -> Result<(Huffman, Huffman)> {
    let literal_count = bits.bits(5)? as usize + 257;
    let distance_count = bits.bits(5)? as usize + 1;
    let code_length_count = bits.bits(4)? as usize + 4;

    if literal_count > MAX_LITERAL_CODES || distance_count > MAX_DISTANCE_CODES {
        return Err(DecodeError::InvalidCodeLengths(
            "too many length or distance symbols",
        ));
    }

    let mut code_lengths = [0u8; 19];
    for &symbol in &CODE_LENGTH_ORDER[..code_length_count] {
        code_lengths[symbol] = bits.bits(3)? as u8;
    }
    let code_length_table = Huffman::new(&code_lengths)?;

    let total = literal_count + distance_count;
    let mut lengths = [0u8; MAX_LITERAL_CODES + MAX_DISTANCE_CODES];
    let mut i = 0;
    while i < total {
        let symbol = code_length_table.decode(bits)?;
        let (value, repeat) = match symbol {
            0..=15 => {
                lengths[i] = symbol as u8;
                i += 1;
                continue;
            }
            16 => {
                if i == 0 {
                    return Err(DecodeError::InvalidCodeLengths(
                        "repeat with no previous length",
                    ));
                }
                (lengths[i - 1], 3 + bits.bits(2)? as usize)
            }
            17 => (0, 3 + bits.bits(3)? as usize),
            _ => (0, 11 + bits.bits(7)? as usize),
        };

        if i + repeat > total {
            return Err(DecodeError::InvalidCodeLengths("too many code lengths"));
        }
        lengths[i..i + repeat].fill(value);
        i += repeat;
    }

    if lengths[usize::from(END_OF_BLOCK)] == 0 {
        return Err(DecodeError::InvalidCodeLengths("missing end-of-block code"));
    }

    Ok((
        Huffman::new(&lengths[..literal_count])?,
        Huffman::new(&lengths[literal_count..total])?,
    ))
}

fn huffman_block(
    bits: &mut BitReader<'_>,
    out: &mut Output<'_>,
    literals: &Huffman,
    distances: &Huffman,
) -> Result<()> {
    loop {
        let symbol = literals.decode(bits)?;
        match symbol {
            0..=255 => out.push(symbol as u8)?,
            END_OF_BLOCK => return Ok(()),
            257..=285 => {
                let index = usize::from(symbol - 257);
                let length = usize::from(LENGTH_BASE[index])
                    + bits.bits(u32::from(LENGTH_EXTRA[index]))? as usize;

                let symbol = distances.decode(bits)?;
                let index = usize::from(symbol);
                if index >= DIST_BASE.len() {
                    return Err(DecodeError::InvalidDistanceSymbol(symbol));
                }
                let distance = usize::from(DIST_BASE[index])
                    + bits.bits(u32::from(DIST_EXTRA[index]))? as usize;

                out.copy_match(distance, length)?;
            }
            _ => return Err(DecodeError::InvalidLengthSymbol(symbol)),
        }
    }
}
