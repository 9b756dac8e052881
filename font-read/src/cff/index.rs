//! Parsing for CFF INDEX objects.
//!
//! See <https://adobe-type-tools.github.io/font-tech-notes/pdfs/5176.CFF.pdf#page=12>

use crate::ByteCursor;

/// A CFF INDEX: a count, an offset size and `count + 1` one-based offsets
/// followed by the object data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Index<'a> {
    data: ByteCursor<'a>,
}

impl<'a> Index<'a> {
    /// Reads an INDEX at the current position of `cursor`, leaving the
    /// cursor just past the end of it.
    pub fn read(cursor: &mut ByteCursor<'a>) -> Self {
        let start = cursor.position();
        let count = cursor.get16() as usize;
        if count != 0 {
            let off_size = cursor.get8() as usize;
            if !(1..=4).contains(&off_size) {
                log::trace!("invalid INDEX offset size {off_size}");
                cursor.seek(cursor.size());
                return Self::default();
            }
            cursor.skip((off_size * count) as isize);
            let last = cursor.get(off_size) as isize;
            cursor.skip(last - 1);
        }
        Self {
            data: cursor.range(start, cursor.position() - start),
        }
    }

    /// Creates an INDEX from data that begins with one.
    pub fn new(data: &'a [u8]) -> Self {
        Self::read(&mut ByteCursor::new(data))
    }

    /// The raw bytes of the INDEX, including its header.
    pub fn data(&self) -> &'a [u8] {
        self.data.data()
    }

    /// Returns the number of objects in the INDEX.
    pub fn count(&self) -> usize {
        self.data.u16_at(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Returns the object at `index`, or an empty cursor if it does not
    /// exist.
    pub fn get(&self, index: usize) -> ByteCursor<'a> {
        let mut b = self.data;
        b.seek(0);
        let count = b.get16() as usize;
        let off_size = b.get8() as usize;
        if index >= count || !(1..=4).contains(&off_size) {
            return ByteCursor::empty();
        }
        b.skip((index * off_size) as isize);
        let start = b.get(off_size) as usize;
        let end = b.get(off_size) as usize;
        if end < start {
            return ByteCursor::empty();
        }
        b.range(2 + (count + 1) * off_size + start, end - start)
    }

    /// Computes the bias added to a subroutine number in a charstring.
    pub fn subr_bias(&self) -> i32 {
        let count = self.count();
        if count < 1240 {
            107
        } else if count <= 32767 {
            1131
        } else {
            32768
        }
    }

    /// Returns the subroutine for an unbiased subroutine number, or an empty
    /// cursor if the biased number is out of range.
    pub fn get_subr(&self, n: i32) -> ByteCursor<'a> {
        let index = n.saturating_add(self.subr_bias());
        if index < 0 {
            return ByteCursor::empty();
        }
        self.get(index as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use font_test_data::bebuffer::BeBuffer;
    use font_test_data::cff::make_index;

    #[test]
    fn read_index_entries() {
        for off_size in 1..=4 {
            let items: Vec<Vec<u8>> = (0..5u8).map(|i| vec![i; i as usize + 1]).collect();
            let buf = BeBuffer::new()
                .extend(make_index(&items, off_size))
                .push(0xFFu8); // trailing data
            let mut cursor = ByteCursor::new(buf.as_slice());
            let index = Index::read(&mut cursor);
            assert_eq!(cursor.peek8(), 0xFF);
            assert_eq!(index.count(), 5);
            for (i, item) in items.iter().enumerate() {
                assert_eq!(index.get(i).data(), item.as_slice());
            }
            assert!(index.get(5).is_empty());
        }
    }

    #[test]
    fn empty_index() {
        let mut cursor = ByteCursor::new(&[0, 0, 7]);
        let index = Index::read(&mut cursor);
        assert_eq!(cursor.position(), 2);
        assert!(index.is_empty());
        assert!(index.get(0).is_empty());
        assert!(index.get_subr(-107).is_empty());
    }

    #[test]
    fn subr_bias_thresholds() {
        let sizes = [(0, 107), (1239, 107), (1240, 1131), (32767, 1131), (32768, 32768)];
        for (count, bias) in sizes {
            let items = vec![Vec::new(); count];
            let data = make_index(&items, 1);
            assert_eq!(Index::new(&data).subr_bias(), bias, "count {count}");
        }
    }

    #[test]
    fn biased_lookup() {
        let items: Vec<Vec<u8>> = (0..3u8).map(|i| vec![i]).collect();
        let data = make_index(&items, 1);
        let index = Index::new(&data);
        assert_eq!(index.get_subr(-107).data(), &[0]);
        assert_eq!(index.get_subr(-105).data(), &[2]);
        assert!(index.get_subr(-108).is_empty());
        assert!(index.get_subr(-104).is_empty());
    }
}
