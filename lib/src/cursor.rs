//! A bounds-checked, little-endian reader over a log payload, plus the bit
//! helpers used to pick apart the packed fields once they've been read.

use bytes::Buf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("Input ended early (needed {needed} bytes at offset {offset}, {remaining} remaining)")]
    Underflow {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
}

#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteCursor { data, pos: 0 }
    }

    /// Total length of the underlying input, regardless of position.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], CursorError> {
        if self.remaining() < needed {
            return Err(CursorError::Underflow {
                offset: self.pos,
                needed,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        let mut bytes = self.take(1)?;
        Ok(bytes.get_u8())
    }

    pub fn read_u16(&mut self) -> Result<u16, CursorError> {
        let mut bytes = self.take(2)?;
        Ok(bytes.get_u16_le())
    }

    pub fn skip(&mut self, count: usize) -> Result<(), CursorError> {
        self.take(count).map(|_| ())
    }
}

/// Returns `bits` bits of `value`, starting `offset` bits from the least
/// significant end.
pub fn extract(value: u32, offset: u32, bits: u32) -> u32 {
    debug_assert!(bits > 0 && bits < 32);
    (value >> offset) & ((1 << bits) - 1)
}

pub fn extract_bit(value: u32, offset: u32) -> bool {
    extract(value, offset, 1) == 1
}

/// ORs `value` into `base` at `offset`. The target bits of `base` must be zero.
pub fn insert(base: u32, value: u32, offset: u32) -> u32 {
    base | (value << offset)
}
