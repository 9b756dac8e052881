//! Assembling tables into font files

use std::{collections::BTreeMap, ops::Range};

use crate::bebuffer::BeBuffer;

const TABLE_RECORD_LEN: usize = 16;
const HEADER_LEN: usize = 12;

pub const TT_SFNT_VERSION: u32 = 0x00010000;
pub const CFF_SFNT_VERSION: u32 = u32::from_be_bytes(*b"OTTO");

/// Builds a font file from raw table data.
#[derive(Debug, Clone)]
pub struct FontBuilder {
    sfnt_version: u32,
    tables: BTreeMap<[u8; 4], Vec<u8>>,
}

impl Default for FontBuilder {
    fn default() -> Self {
        Self {
            sfnt_version: TT_SFNT_VERSION,
            tables: Default::default(),
        }
    }
}

impl FontBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sfnt_version(mut self, version: u32) -> Self {
        self.sfnt_version = version;
        self
    }

    /// Add or replace a table.
    pub fn add_raw(mut self, tag: impl Into<[u8; 4]>, data: impl Into<Vec<u8>>) -> Self {
        self.tables.insert(tag.into(), data.into());
        self
    }

    /// Remove a table, if present.
    pub fn remove(mut self, tag: impl Into<[u8; 4]>) -> Self {
        self.tables.remove(&tag.into());
        self
    }

    pub fn contains(&self, tag: impl Into<[u8; 4]>) -> bool {
        self.tables.contains_key(&tag.into())
    }

    /// Build a standalone font.
    pub fn build(&self) -> Vec<u8> {
        self.build_at(0)
    }

    /// Build a font whose table offsets assume it starts at `base` within a
    /// larger file, as fonts in a collection do.
    pub fn build_at(&self, base: usize) -> Vec<u8> {
        let num_tables = self.tables.len();
        let search = SearchRange::compute(num_tables, TABLE_RECORD_LEN);
        let mut buf = BeBuffer::new()
            .push(self.sfnt_version)
            .push(num_tables as u16)
            .push(search.search_range)
            .push(search.entry_selector)
            .push(search.range_shift);
        let mut position = HEADER_LEN + num_tables * TABLE_RECORD_LEN;
        for (tag, data) in &self.tables {
            buf = buf
                .push(u32::from_be_bytes(*tag))
                .push(checksum(data))
                .push((base + position) as u32)
                .push(data.len() as u32);
            position += round4(data.len());
        }
        for data in self.tables.values() {
            buf = buf.extend(data.iter().copied()).align(4);
        }
        buf.into_vec()
    }
}

/// Build a TrueType collection from several fonts.
pub fn collection(fonts: &[FontBuilder]) -> Vec<u8> {
    let header_len = HEADER_LEN + 4 * fonts.len();
    let mut header = BeBuffer::new()
        .extend(*b"ttcf")
        .push(0x00010000u32)
        .push(fonts.len() as u32);
    let mut body = Vec::new();
    for font in fonts {
        let base = header_len + body.len();
        header = header.push(base as u32);
        body.extend(font.build_at(base));
    }
    let mut data = header.into_vec();
    data.extend(body);
    data
}

/// Returns the byte range of a table in a standalone font.
///
/// Panics if the table is missing.
pub fn table_range(font: &[u8], tag: [u8; 4]) -> Range<usize> {
    let read_u32 = |pos: usize| u32::from_be_bytes(font[pos..pos + 4].try_into().unwrap());
    let num_tables = u16::from_be_bytes([font[4], font[5]]) as usize;
    (0..num_tables)
        .map(|i| HEADER_LEN + i * TABLE_RECORD_LEN)
        .find(|&record| font[record..record + 4] == tag)
        .map(|record| {
            let offset = read_u32(record + 8) as usize;
            offset..offset + read_u32(record + 12) as usize
        })
        .unwrap()
}

/// The binary search assists of a table directory or cmap subtable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchRange {
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
}

impl SearchRange {
    pub fn compute(n_items: usize, item_size: usize) -> Self {
        let entry_selector = (n_items as f64).log2().floor().max(0.0) as usize;
        let search_range = (2usize.pow(entry_selector as u32) * item_size) as u16;
        let range_shift = (n_items * item_size).saturating_sub(search_range as usize) as u16;
        SearchRange {
            search_range,
            entry_selector: entry_selector as u16,
            range_shift,
        }
    }
}

fn round4(len: usize) -> usize {
    (len + 3) & !3
}

fn checksum(data: &[u8]) -> u32 {
    data.chunks(4)
        .map(|chunk| {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            u32::from_be_bytes(word)
        })
        .fold(0u32, u32::wrapping_add)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sets_binary_search_assists() {
        // Based on Roboto's num tables
        let search = SearchRange::compute(0x16, TABLE_RECORD_LEN);
        assert_eq!(
            (256, 4, 96),
            (search.search_range, search.entry_selector, search.range_shift)
        );
    }

    #[test]
    fn survives_no_tables() {
        let data = FontBuilder::default().build();
        assert_eq!(data.len(), HEADER_LEN);
    }

    #[test]
    fn tables_are_padded_and_found() {
        let data = FontBuilder::new()
            .add_raw(*b"abcd", vec![1, 2, 3])
            .add_raw(*b"wxyz", vec![4; 8])
            .build();
        let first = table_range(&data, *b"abcd");
        let second = table_range(&data, *b"wxyz");
        assert_eq!(&data[first.clone()], &[1, 2, 3]);
        assert_eq!(second.start, first.start + 4);
        assert_eq!(&data[second], &[4; 8]);
    }

    #[test]
    fn collection_offsets_are_absolute() {
        let font = FontBuilder::new().add_raw(*b"abcd", vec![9; 4]);
        let data = collection(&[font.clone(), font]);
        let second = u32::from_be_bytes(data[16..20].try_into().unwrap()) as usize;
        let table = u32::from_be_bytes(data[second + 20..second + 24].try_into().unwrap());
        assert_eq!(&data[table as usize..table as usize + 4], &[9; 4]);
    }
}
