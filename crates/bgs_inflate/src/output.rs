//! Bounded output window shared by both decoders.

use crate::error::{DecodeError, Result};

pub(crate) struct Output<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Output<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written so far
    pub fn written(&self) -> usize {
        self.pos
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    fn overflow(&self) -> DecodeError {
        DecodeError::OutputOverflow {
            capacity: self.buf.len(),
        }
    }

    #[inline]
    pub fn push(&mut self, byte: u8) -> Result<()> {
        let Some(slot) = self.buf.get_mut(self.pos) else {
            return Err(self.overflow());
        };
        *slot = byte;
        self.pos += 1;
        Ok(())
    }

    pub fn extend(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.buf.len() - self.pos {
            return Err(self.overflow());
        }
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    /// Append `length` bytes starting `distance` bytes behind the cursor.
    ///
    /// The source may overlap the destination, in which case the copied run repeats itself.
    pub fn copy_match(&mut self, distance: usize, length: usize) -> Result<()> {
        if distance == 0 || distance > self.pos {
            return Err(DecodeError::InvalidDistance {
                distance,
                written: self.pos,
            });
        }
        if length > self.buf.len() - self.pos {
            return Err(self.overflow());
        }

        let start = self.pos - distance;
        if distance >= length {
            self.buf.copy_within(start..start + length, self.pos);
        } else {
            for i in 0..length {
                self.buf[self.pos + i] = self.buf[start + i];
            }
        }
        self.pos += length;
        Ok(())
    }
}
