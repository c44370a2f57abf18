//! Canonical Huffman decode tables.

use crate::bits::BitReader;
use crate::error::{DecodeError, Result};

/// Longest code allowed by Deflate
pub(crate) const MAX_BITS: usize = 15;

const FAST_BITS: u32 = 8;
const FAST_SIZE: usize = 1 << FAST_BITS;

/// Largest alphabet used by Deflate (literal/length codes)
pub(crate) const MAX_SYMBOLS: usize = 288;

/// Decode table for one canonical Huffman code
///
/// Codes up to 8 bits are resolved with one lookup in `fast`. Longer codes fall back to walking
/// the code lengths one bit at a time using `counts` and `symbols`.
pub(crate) struct Huffman {
    /// `symbol << 4 | length`, zero for codes longer than 8 bits or unused patterns
    fast: [u16; FAST_SIZE],
    /// number of codes per length
    counts: [u16; MAX_BITS + 1],
    /// symbols ordered by code
    symbols: [u16; MAX_SYMBOLS],
}

impl Huffman {
    /// Build the table from per-symbol code lengths (0 = symbol unused).
    pub fn new(lengths: &[u8]) -> Result<Self> {
        debug_assert!(lengths.len() <= MAX_SYMBOLS);

        let mut table = Huffman {
            fast: [0; FAST_SIZE],
            counts: [0; MAX_BITS + 1],
            symbols: [0; MAX_SYMBOLS],
        };

        for &len in lengths {
            if usize::from(len) > MAX_BITS {
                return Err(DecodeError::InvalidCodeLengths("code longer than 15 bits"));
            }
            table.counts[usize::from(len)] += 1;
        }
        table.counts[0] = 0;

        let mut left: i32 = 1;
        for len in 1..=MAX_BITS {
            left <<= 1;
            left -= i32::from(table.counts[len]);
            if left < 0 {
                return Err(DecodeError::InvalidCodeLengths("over-subscribed code"));
            }
        }

        // first index into `symbols` and first code for each length
        let mut offsets = [0u16; MAX_BITS + 2];
        let mut next_code = [0u32; MAX_BITS + 2];
        let mut code = 0u32;
        for len in 1..=MAX_BITS {
            offsets[len + 1] = offsets[len] + table.counts[len];
            code = (code + u32::from(table.counts[len - 1])) << 1;
            next_code[len] = code;
        }

        for (symbol, &len) in lengths.iter().enumerate() {
            if len == 0 {
                continue;
            }
            let len = usize::from(len);
            table.symbols[usize::from(offsets[len])] = symbol as u16;
            offsets[len] += 1;

            let code = next_code[len];
            next_code[len] += 1;

            if len as u32 <= FAST_BITS {
                let reversed = reverse_bits(code, len as u32) as usize;
                let entry = ((symbol as u16) << 4) | len as u16;
                let mut index = reversed;
                while index < FAST_SIZE {
                    table.fast[index] = entry;
                    index += 1 << len;
                }
            }
        }

        Ok(table)
    }

    /// Decode one symbol from `bits`.
    #[inline]
    pub fn decode(&self, bits: &mut BitReader<'_>) -> Result<u16> {
        let (buffer, available) = bits.peek();

        let entry = self.fast[(buffer as usize) & (FAST_SIZE - 1)];
        if entry != 0 {
            bits.consume(u32::from(entry & 0x0F))?;
            return Ok(entry >> 4);
        }

        self.decode_slow(bits, buffer, available)
    }

    #[cold]
    fn decode_slow(&self, bits: &mut BitReader<'_>, buffer: u64, available: u32) -> Result<u16> {
        let mut code: i32 = 0;
        let mut first: i32 = 0;
        let mut index: i32 = 0;
        for len in 1..=MAX_BITS {
            if len as u32 > available {
                return Err(DecodeError::UnexpectedEnd);
            }
            code |= ((buffer >> (len - 1)) & 1) as i32;
            let count = i32::from(self.counts[len]);
            if code - first < count {
                bits.consume(len as u32)?;
                return Ok(self.symbols[(index + code - first) as usize]);
            }
            index += count;
            first += count;
            first <<= 1;
            code <<= 1;
        }

        Err(DecodeError::InvalidHuffmanCode)
    }
}

fn reverse_bits(code: u32, len: u32) -> u32 {
    code.reverse_bits() >> (32 - len)
}
