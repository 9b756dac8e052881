//! small utilities for writing big-endian test data

use std::collections::HashMap;

/// A value that can be written as big-endian bytes.
pub trait Scalar: Copy {
    type Raw: AsRef<[u8]>;

    fn to_raw(self) -> Self::Raw;
}

macro_rules! impl_scalar {
    ($($ty:ty),*) => {
        $(
            impl Scalar for $ty {
                type Raw = [u8; std::mem::size_of::<$ty>()];

                fn to_raw(self) -> Self::Raw {
                    self.to_be_bytes()
                }
            }
        )*
    };
}

impl_scalar!(u8, i8, u16, i16, u32, i32, u64, i64);

/// A 2.14 fixed point number, as used for composite glyph transforms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct F2Dot14(pub f32);

impl Scalar for F2Dot14 {
    type Raw = [u8; 2];

    fn to_raw(self) -> Self::Raw {
        ((self.0 * 16384.0).round() as i16).to_be_bytes()
    }
}

/// A convenience type for generating a buffer of big-endian bytes.
#[derive(Debug, Clone, Default)]
pub struct BeBuffer {
    data: Vec<u8>,
    tagged_locations: HashMap<String, usize>,
}

impl BeBuffer {
    pub fn new() -> Self {
        Default::default()
    }

    /// The current length of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the buffer contains zero bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Return a reference to the contents of the buffer
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer, returning the bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Write any scalar to this buffer.
    pub fn push(mut self, item: impl Scalar) -> Self {
        self.data.extend(item.to_raw().as_ref());
        self
    }

    /// Write a scalar and remember its position for a later [`Self::write_at`].
    pub fn push_with_tag(mut self, item: impl Scalar, tag: &str) -> Self {
        self.tagged_locations
            .insert(tag.to_string(), self.data.len());
        self.data.extend(item.to_raw().as_ref());
        self
    }

    /// Write multiple scalars into the buffer
    pub fn extend<T: Scalar>(mut self, iter: impl IntoIterator<Item = T>) -> Self {
        for item in iter {
            self.data.extend(item.to_raw().as_ref());
        }
        self
    }

    /// Pad with zeros to a multiple of `alignment` bytes.
    pub fn align(mut self, alignment: usize) -> Self {
        while self.data.len() % alignment != 0 {
            self.data.push(0);
        }
        self
    }

    pub fn offset_for(&self, tag: &str) -> usize {
        // panic on unrecognized tags
        self.tagged_locations.get(tag).copied().unwrap()
    }

    fn data_for(&mut self, tag: &str) -> &mut [u8] {
        let offset = self.offset_for(tag);
        &mut self.data[offset..]
    }

    /// Overwrite the value at a position remembered with
    /// [`Self::push_with_tag`].
    pub fn write_at(&mut self, tag: &str, item: impl Scalar) {
        let data = self.data_for(tag);
        let raw = item.to_raw();
        let new_data: &[u8] = raw.as_ref();

        if data.len() < new_data.len() {
            panic!("not enough room left in buffer for the requested write.");
        }

        for (left, right) in data.iter_mut().zip(new_data) {
            *left = *right
        }
    }
}

impl std::ops::Deref for BeBuffer {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl From<BeBuffer> for Vec<u8> {
    fn from(buf: BeBuffer) -> Self {
        buf.data
    }
}

/// Build a [`BeBuffer`] from a list of scalars.
#[macro_export]
macro_rules! be_buffer {
    ( $( $x:expr ),* $(,)? ) => {{
        let builder = $crate::bebuffer::BeBuffer::new();
        $(
            let builder = builder.push($x);
        )*
        builder
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_big_endian() {
        let buf = be_buffer!(1u16, -2i16, 0x01020304u32, F2Dot14(0.5));
        assert_eq!(
            buf.as_slice(),
            &[0, 1, 0xFF, 0xFE, 1, 2, 3, 4, 0x20, 0x00]
        );
    }

    #[test]
    fn patch_tagged_value() {
        let mut buf = BeBuffer::new()
            .push(1u8)
            .push_with_tag(0u16, "offset")
            .align(4);
        assert_eq!(buf.len(), 4);
        buf.write_at("offset", 0xABCDu16);
        assert_eq!(buf.as_slice(), &[1, 0xAB, 0xCD, 0]);
    }
}
