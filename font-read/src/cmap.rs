//! Mapping codepoints to glyph identifiers with the `cmap` table.

use crate::{ByteCursor, FontInfo, GlyphId};

/// Maps `codepoint` through the cmap subtable at the start of `subtable`.
///
/// Formats 0, 4, 6, 12 and 13 are supported. Format 2 (high-byte mapping)
/// and unknown formats map everything to `.notdef`.
pub fn map_codepoint(subtable: ByteCursor, codepoint: u32) -> GlyphId {
    let format = subtable.u16_at(0);
    let gid = match format {
        0 => map_format0(subtable, codepoint),
        2 => 0,
        4 => map_format4(subtable, codepoint),
        6 => map_format6(subtable, codepoint),
        12 | 13 => map_format12_13(subtable, codepoint, format == 13),
        _ => {
            log::trace!("unsupported cmap subtable format {format}");
            0
        }
    };
    GlyphId::new(gid)
}

/// Byte encoding table: one glyph byte per codepoint.
fn map_format0(subtable: ByteCursor, codepoint: u32) -> u32 {
    let bytes = subtable.u16_at(2) as u32;
    if codepoint < bytes.saturating_sub(6) {
        return subtable.u8_at(6 + codepoint as usize) as u32;
    }
    0
}

/// Trimmed table mapping: a dense range of glyph ids.
fn map_format6(subtable: ByteCursor, codepoint: u32) -> u32 {
    let first = subtable.u16_at(6) as u32;
    let count = subtable.u16_at(8) as u32;
    if (first..first + count).contains(&codepoint) {
        return subtable.u16_at(10 + (codepoint - first) as usize * 2) as u32;
    }
    0
}

/// Segment mapping to delta values.
///
/// The segment search follows the `searchRange`/`entrySelector`/`rangeShift`
/// descent over the endCode array.
fn map_format4(subtable: ByteCursor, codepoint: u32) -> u32 {
    if codepoint > 0xFFFF {
        return 0;
    }
    let seg_count = (subtable.u16_at(6) >> 1) as usize;
    let mut search_range = (subtable.u16_at(8) >> 1) as usize;
    let mut entry_selector = subtable.u16_at(10);
    let range_shift = (subtable.u16_at(12) >> 1) as usize;

    // they lie from endCount .. endCount + segCount but searchRange is the
    // nearest power of two
    let end_count = 14;
    let mut search = end_count;
    if codepoint >= subtable.u16_at(search + range_shift * 2) as u32 {
        search += range_shift * 2;
    }
    // bias by one entry so the descent finds the smallest matching end
    search = search.wrapping_sub(2);
    while entry_selector != 0 {
        search_range >>= 1;
        let end = subtable.u16_at(search.wrapping_add(search_range * 2)) as u32;
        if codepoint > end {
            search = search.wrapping_add(search_range * 2);
        }
        entry_selector -= 1;
    }
    search = search.wrapping_add(2);

    let item = search.wrapping_sub(end_count) >> 1;
    if item >= seg_count {
        return 0;
    }
    let start = subtable.u16_at(end_count + seg_count * 2 + 2 + 2 * item) as u32;
    let last = subtable.u16_at(end_count + 2 * item) as u32;
    if codepoint < start || codepoint > last {
        return 0;
    }
    let id_delta = subtable.u16_at(end_count + seg_count * 4 + 2 + 2 * item);
    let id_range_offset_pos = end_count + seg_count * 6 + 2 + 2 * item;
    let id_range_offset = subtable.u16_at(id_range_offset_pos) as usize;
    if id_range_offset == 0 {
        return (codepoint as u16).wrapping_add(id_delta) as u32;
    }
    subtable.u16_at(id_range_offset_pos + id_range_offset + (codepoint - start) as usize * 2)
        as u32
}

/// Segmented coverage (format 12) and many-to-one range mappings (format 13).
fn map_format12_13(subtable: ByteCursor, codepoint: u32, constant_groups: bool) -> u32 {
    let n_groups = subtable.u32_at(12) as usize;
    let mut low = 0;
    let mut high = n_groups;
    while low < high {
        let mid = low + ((high - low) >> 1);
        let group = 16 + mid * 12;
        let start_char = subtable.u32_at(group);
        let end_char = subtable.u32_at(group + 4);
        if codepoint < start_char {
            high = mid;
        } else if codepoint > end_char {
            low = mid + 1;
        } else {
            let start_glyph = subtable.u32_at(group + 8);
            return if constant_groups {
                start_glyph
            } else {
                start_glyph.wrapping_add(codepoint - start_char)
            };
        }
    }
    0
}

impl<'a> FontInfo<'a> {
    /// Maps a Unicode codepoint to a glyph identifier.
    ///
    /// Returns [`GlyphId::NOTDEF`] when the font has no glyph for the
    /// codepoint.
    pub fn find_glyph_index(&self, codepoint: u32) -> GlyphId {
        map_codepoint(self.cursor().tail(self.index_map as usize), codepoint)
    }
}
