//! A clamped, big-endian cursor over raw font bytes.

use std::ops::Range;

/// A forward/seekable cursor over a borrowed byte slice.
///
/// Every read is clamped to the underlying data: reading past the end yields
/// zero and never panics. This lets the table decoders walk malformed fonts
/// without checking every access, with errors surfacing only as missing
/// tables or empty glyphs further up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a new cursor positioned at the start of `data`.
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, cursor: 0 }
    }

    /// An empty cursor. All reads return zero.
    pub const fn empty() -> Self {
        Self::new(&[])
    }

    /// The bytes this cursor walks over.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The number of bytes in the underlying data.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The current position.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Returns `true` if there are no more bytes to read.
    pub fn at_end(&self) -> bool {
        self.cursor >= self.data.len()
    }

    /// Read a byte and advance, or return 0 at the end of the data.
    pub fn get8(&mut self) -> u8 {
        match self.data.get(self.cursor) {
            Some(byte) => {
                self.cursor += 1;
                *byte
            }
            None => 0,
        }
    }

    /// Read a byte without advancing.
    pub fn peek8(&self) -> u8 {
        self.data.get(self.cursor).copied().unwrap_or(0)
    }

    /// Move to `offset`, clamped to `[0, size]`.
    pub fn seek(&mut self, offset: usize) {
        self.cursor = offset.min(self.data.len());
    }

    /// Move by a signed delta, clamped to `[0, size]`.
    pub fn skip(&mut self, delta: isize) {
        let target = if delta < 0 {
            self.cursor.saturating_sub(delta.unsigned_abs())
        } else {
            self.cursor.saturating_add(delta as usize)
        };
        self.seek(target);
    }

    /// Read a big-endian unsigned integer of `n_bytes` (1..=4) bytes.
    ///
    /// Bytes past the end of the data read as zero.
    pub fn get(&mut self, n_bytes: usize) -> u32 {
        debug_assert!((1..=4).contains(&n_bytes));
        let mut v = 0u32;
        for _ in 0..n_bytes.min(4) {
            v = (v << 8) | self.get8() as u32;
        }
        v
    }

    pub fn get16(&mut self) -> u16 {
        self.get(2) as u16
    }

    pub fn get32(&mut self) -> u32 {
        self.get(4)
    }

    /// A new cursor over `len` bytes starting at `offset`.
    ///
    /// Returns an empty cursor if the requested range does not fit.
    pub fn range(&self, offset: usize, len: usize) -> ByteCursor<'a> {
        match offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
        {
            Some(data) => ByteCursor::new(data),
            None => ByteCursor::empty(),
        }
    }

    /// A new cursor over the given byte range, empty if out of bounds.
    pub fn slice(&self, range: Range<usize>) -> ByteCursor<'a> {
        if range.start > range.end {
            return ByteCursor::empty();
        }
        self.range(range.start, range.end - range.start)
    }

    /// A new cursor over everything from `offset` to the end of the data.
    pub fn tail(&self, offset: usize) -> ByteCursor<'a> {
        match self.data.get(offset..) {
            Some(data) => ByteCursor::new(data),
            None => ByteCursor::empty(),
        }
    }

    /// Read a `u8` at an absolute offset without moving the cursor.
    pub fn u8_at(&self, offset: usize) -> u8 {
        self.data.get(offset).copied().unwrap_or(0)
    }

    /// Read a `u16` at an absolute offset without moving the cursor.
    pub fn u16_at(&self, offset: usize) -> u16 {
        let mut c = *self;
        c.seek(offset);
        if c.position() != offset {
            return 0;
        }
        c.get16()
    }

    /// Read an `i16` at an absolute offset without moving the cursor.
    pub fn i16_at(&self, offset: usize) -> i16 {
        self.u16_at(offset) as i16
    }

    /// Read a `u32` at an absolute offset without moving the cursor.
    pub fn u32_at(&self, offset: usize) -> u32 {
        let mut c = *self;
        c.seek(offset);
        if c.position() != offset {
            return 0;
        }
        c.get32()
    }

    /// Read an `i8` at an absolute offset without moving the cursor.
    pub fn i8_at(&self, offset: usize) -> i8 {
        self.u8_at(offset) as i8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_past_end_are_zero() {
        let mut cursor = ByteCursor::new(&[0x12, 0x34, 0x56]);
        assert_eq!(cursor.get16(), 0x1234);
        // one real byte, one past the end
        assert_eq!(cursor.get16(), 0x5600);
        assert!(cursor.at_end());
        assert_eq!(cursor.get8(), 0);
        assert_eq!(cursor.peek8(), 0);
        assert_eq!(cursor.get32(), 0);
    }

    #[test]
    fn seek_and_skip_clamp() {
        let mut cursor = ByteCursor::new(&[1, 2, 3, 4]);
        cursor.seek(10);
        assert_eq!(cursor.position(), 4);
        cursor.skip(-2);
        assert_eq!(cursor.get8(), 3);
        cursor.skip(-100);
        assert_eq!(cursor.position(), 0);
        cursor.skip(isize::MAX);
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn multi_byte_reads() {
        let mut cursor = ByteCursor::new(&[0xDE, 0xAD, 0xBE, 0xEF, 0x01]);
        assert_eq!(cursor.get(3), 0xDEADBE);
        assert_eq!(cursor.get(1), 0xEF);
        cursor.seek(0);
        assert_eq!(cursor.get32(), 0xDEADBEEF);
        assert_eq!(cursor.u16_at(3), 0xEF01);
        assert_eq!(cursor.i16_at(0), 0xDEADu16 as i16);
        assert_eq!(cursor.u32_at(2), 0xBEEF0100);
        assert_eq!(cursor.u32_at(9), 0);
    }

    #[test]
    fn out_of_bounds_range_is_empty() {
        let cursor = ByteCursor::new(&[1, 2, 3, 4]);
        assert_eq!(cursor.range(1, 2).data(), &[2, 3]);
        assert_eq!(cursor.range(4, 0).size(), 0);
        assert!(cursor.range(3, 2).is_empty());
        assert!(cursor.range(usize::MAX, 2).is_empty());
        assert!(cursor.slice(3..1).is_empty());
        assert_eq!(cursor.tail(2).data(), &[3, 4]);
        assert!(cursor.tail(5).is_empty());
    }
}
