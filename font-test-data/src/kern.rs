//! kern tables

use crate::{be_buffer, builder::SearchRange};

// from https://github.com/fonttools/fonttools/blob/729b3d2960efd3/Tests/ttLib/tables/_k_e_r_n_test.py#L9
#[rustfmt::skip]
pub static KERN_VER_0_FMT_0_DATA: &[u8] = &[
    0x00, 0x00, // "0000 "  #  0: version=0
    0x00, 0x01, // "0001 "  #  2: nTables=1
    0x00, 0x00, // "0000 "  #  4: version=0 (bogus field, unused)
    0x00, 0x20, // "0020 "  #  6: length=32
    0x00,       // "00 "  #  8: format=0
    0x01,       // "01 "  #  9: coverage=1
    0x00, 0x03, // "0003 "  # 10: nPairs=3
    0x00, 0x0C, // "000C "  # 12: searchRange=12
    0x00, 0x01, // "0001 "  # 14: entrySelector=1
    0x00, 0x06, // "0006 "  # 16: rangeShift=6
    0x00, 0x04, 0x00, 0x0C, 0xFF, 0xD8, // "0004 000C FFD8 "  # 18: l=4, r=12, v=-40
    0x00, 0x04, 0x00, 0x1C, 0x00, 0x28, // "0004 001C 0028 "  # 24: l=4, r=28, v=40
    0x00, 0x05, 0x00, 0x28, 0xFF, 0xCE, // "0005 0028 FFCE "  # 30: l=5, r=40, v=-50
];

/// A version 0 kern table with a single horizontal format 0 subtable.
///
/// `pairs` must be sorted by `(left, right)`.
pub fn format0(pairs: &[(u16, u16, i16)]) -> Vec<u8> {
    let search = SearchRange::compute(pairs.len(), 6);
    let subtable_len = 14 + pairs.len() * 6;
    let mut buf = be_buffer!(
        0u16, // version
        1u16, // nTables
        0u16, // subtable version
        subtable_len as u16,
        0u8,  // format
        1u8,  // coverage: horizontal
        pairs.len() as u16,
        search.search_range,
        search.entry_selector,
        search.range_shift
    );
    for (left, right, value) in pairs {
        buf = buf.push(*left).push(*right).push(*value);
    }
    buf.into_vec()
}
