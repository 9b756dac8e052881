//! GPOS pair adjustment data

use crate::be_buffer;

/// XAdvance of the class based pair in [`kerning_gpos`].
pub const T_O_ADVANCE: i32 = -60;

/// XAdvance of the glyph pair in [`kerning_gpos`].
pub const A_V_ADVANCE: i16 = -120;

/// Coverage format 1 over a sorted glyph array.
pub fn coverage_format1(glyphs: &[u16]) -> Vec<u8> {
    be_buffer!(1u16, glyphs.len() as u16)
        .extend(glyphs.iter().copied())
        .into_vec()
}

/// Coverage format 2 over `(start, end, start coverage index)` ranges.
pub fn coverage_format2(ranges: &[(u16, u16, u16)]) -> Vec<u8> {
    be_buffer!(2u16, ranges.len() as u16)
        .extend(ranges.iter().flat_map(|(start, end, ix)| [*start, *end, *ix]))
        .into_vec()
}

/// Class definition format 1 with classes for `start..start + classes.len()`.
pub fn class_def_format1(start: u16, classes: &[u16]) -> Vec<u8> {
    be_buffer!(1u16, start, classes.len() as u16)
        .extend(classes.iter().copied())
        .into_vec()
}

/// Class definition format 2 over `(start, end, class)` ranges.
pub fn class_def_format2(ranges: &[(u16, u16, u16)]) -> Vec<u8> {
    be_buffer!(2u16, ranges.len() as u16)
        .extend(ranges.iter().flat_map(|(start, end, class)| [*start, *end, *class]))
        .into_vec()
}

/// Concatenates a header with trailing blobs, returning the offset of each
/// blob from the start of the header.
fn layout(header_len: usize, blobs: &[&[u8]]) -> (Vec<u16>, Vec<u8>) {
    let mut offsets = Vec::new();
    let mut data = Vec::new();
    for blob in blobs {
        offsets.push((header_len + data.len()) as u16);
        data.extend_from_slice(blob);
    }
    (offsets, data)
}

/// A lookup of the given type wrapping `subtables`.
fn lookup(lookup_type: u16, subtables: &[&[u8]]) -> Vec<u8> {
    let header_len = 6 + 2 * subtables.len();
    let (offsets, data) = layout(header_len, subtables);
    let mut table = be_buffer!(lookup_type, 0u16, subtables.len() as u16)
        .extend(offsets)
        .into_vec();
    table.extend(data);
    table
}

/// A GPOS table with a single adjustment lookup (which pair kerning must
/// skip) followed by a pair adjustment lookup with two subtables:
///
/// * format 1: `(a, v)` adjusts by [`A_V_ADVANCE`]
/// * format 2: glyph `t` is class 1, glyph `o` is class 1, and the class
///   pair `(1, 1)` adjusts by [`T_O_ADVANCE`] after an XPlacement field.
///   Every glyph below `num_glyphs` other than 0 and 1 is covered.
pub fn kerning_gpos(a: u16, v: u16, t: u16, o: u16, num_glyphs: u16) -> Vec<u8> {
    let single_coverage = coverage_format1(&[a]);
    let single = {
        let mut table = be_buffer!(1u16, 8u16, 4u16, -999i16).into_vec();
        table.extend(single_coverage);
        table
    };

    let pair1 = {
        let coverage = coverage_format1(&[a]);
        let pair_set = be_buffer!(1u16, v, A_V_ADVANCE).into_vec();
        let (offsets, data) = layout(12, &[&coverage, &pair_set]);
        let mut table = be_buffer!(1u16, offsets[0], 4u16, 0u16, 1u16, offsets[1]).into_vec();
        table.extend(data);
        table
    };

    let pair2 = {
        let coverage = coverage_format2(&[(2, num_glyphs - 1, 0)]);
        let class_def1 = class_def_format1(t, &[1]);
        let class_def2 = class_def_format2(&[(o, o, 1)]);
        // value format 1 is XPlacement | XAdvance, so each record is 4 bytes
        let records = be_buffer!(
            0i16, 0i16, 0i16, 0i16, // class1 0
            0i16, 0i16, 7i16, T_O_ADVANCE as i16 // class1 1
        )
        .into_vec();
        let header_len = 16 + records.len();
        let (offsets, data) = layout(header_len, &[&coverage, &class_def1, &class_def2]);
        let mut table = be_buffer!(
            2u16, offsets[0], 5u16, 0u16, offsets[1], offsets[2], 2u16, 2u16
        )
        .into_vec();
        table.extend(records);
        table.extend(data);
        table
    };

    let lookups = [lookup(1, &[&single]), lookup(2, &[&pair1, &pair2])];
    let (lookup_offsets, lookup_data) = layout(
        2 + 2 * lookups.len(),
        &[&lookups[0], &lookups[1]],
    );
    let mut table = be_buffer!(1u16, 0u16, 0u16, 0u16, 10u16, lookups.len() as u16)
        .extend(lookup_offsets)
        .into_vec();
    table.extend(lookup_data);
    table
}
