//! Bounds checked cursors over compressed input.

use crate::error::{DecodeError, Result};

/// LSB-first bit reader over an immutable byte slice
///
/// Bits are buffered in a 64-bit accumulator that is refilled one byte at a time, so the reader
/// never looks past the end of `data`. Bits above `count` in `buffer` are always zero.
pub(crate) struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    buffer: u64,
    count: u32,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos,
            buffer: 0,
            count: 0,
        }
    }

    #[inline]
    fn refill(&mut self) {
        while self.count <= 56 {
            let Some(&b) = self.data.get(self.pos) else {
                break;
            };
            self.buffer |= u64::from(b) << self.count;
            self.pos += 1;
            self.count += 8;
        }
    }

    /// Look at the next bits without consuming them.
    ///
    /// Returns the buffered bits (zero padded past the end of the input) and how many of them are
    /// real.
    #[inline]
    pub fn peek(&mut self) -> (u64, u32) {
        if self.count < 32 {
            self.refill();
        }
        (self.buffer, self.count)
    }

    #[inline]
    pub fn consume(&mut self, n: u32) -> Result<()> {
        if n > self.count {
            return Err(DecodeError::UnexpectedEnd);
        }
        self.buffer >>= n;
        self.count -= n;
        Ok(())
    }

    /// Read `n` (at most 32) bits as an integer.
    #[inline]
    pub fn bits(&mut self, n: u32) -> Result<u32> {
        debug_assert!(n <= 32);
        if n == 0 {
            return Ok(0);
        }
        if self.count < n {
            self.refill();
            if self.count < n {
                return Err(DecodeError::UnexpectedEnd);
            }
        }
        let value = (self.buffer & ((1u64 << n) - 1)) as u32;
        self.buffer >>= n;
        self.count -= n;
        Ok(value)
    }

    /// Discard the bits left in the current byte and hand back a byte cursor positioned at the
    /// next unread byte.
    pub fn into_bytes(self) -> ByteReader<'a> {
        let unread = (self.count / 8) as usize;
        ByteReader::new(self.data, self.pos - unread)
    }
}

/// Byte cursor over an immutable slice
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(DecodeError::UnexpectedEnd);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn u16_le(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u32_le(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn u32_be(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn u64_le(&mut self) -> Result<u64> {
        let lo = u64::from(self.u32_le()?);
        let hi = u64::from(self.u32_le()?);
        Ok(lo | (hi << 32))
    }

    /// Continue reading bits from the current position.
    pub fn into_bits(self) -> BitReader<'a> {
        BitReader::new(self.data, self.pos)
    }
}

#[cfg(test)]
mod test {
    use super::{BitReader, ByteReader};
    use crate::error::DecodeError;

    #[test]
    fn bits_are_lsb_first() {
        let mut reader = BitReader::new(&[0b1010_1101, 0xFF], 0);
        assert_eq!(reader.bits(1).unwrap(), 1);
        assert_eq!(reader.bits(2).unwrap(), 0b10);
        assert_eq!(reader.bits(5).unwrap(), 0b10101);
        assert_eq!(reader.bits(8).unwrap(), 0xFF);
        assert_eq!(reader.bits(1), Err(DecodeError::UnexpectedEnd));
    }

    #[test]
    fn align_returns_unread_bytes() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05];
        let mut reader = BitReader::new(&data, 0);
        assert_eq!(reader.bits(3).unwrap(), 1);

        let mut bytes = reader.into_bytes();
        assert_eq!(bytes.position(), 1);
        assert_eq!(bytes.u16_le().unwrap(), 0x0302);
        assert_eq!(bytes.u16_le().unwrap(), 0x0504);
        assert_eq!(bytes.u8(), Err(DecodeError::UnexpectedEnd));
    }

    #[test]
    fn byte_reader_endianness() {
        let data = [0x12, 0x34, 0x56, 0x78, 1, 0, 0, 0, 0, 0, 0, 2];
        let mut bytes = ByteReader::new(&data, 0);
        assert_eq!(bytes.u32_be().unwrap(), 0x1234_5678);
        assert_eq!(bytes.u64_le().unwrap(), 0x0200_0000_0000_0001);
        assert_eq!(bytes.remaining(), 0);
    }
}
