//! cmap subtables for each supported format

use crate::{be_buffer, builder::SearchRange};

/// A format 4 segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub start: u16,
    pub end: u16,
    pub mapping: SegmentMapping,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SegmentMapping {
    /// `idRangeOffset` is zero and glyphs are `codepoint + delta`.
    Delta(i16),
    /// Glyphs are read from the glyph id array, one per codepoint.
    Array(Vec<u16>),
}

impl Segment {
    pub fn delta(start: u16, end: u16, delta: i16) -> Self {
        Self {
            start,
            end,
            mapping: SegmentMapping::Delta(delta),
        }
    }

    pub fn array(start: u16, glyphs: &[u16]) -> Self {
        Self {
            start,
            end: start + glyphs.len() as u16 - 1,
            mapping: SegmentMapping::Array(glyphs.to_vec()),
        }
    }
}

/// A byte encoding table mapping the given codepoints.
pub fn format0(map: &[(u8, u8)]) -> Vec<u8> {
    let mut glyphs = [0u8; 256];
    for (codepoint, gid) in map {
        glyphs[*codepoint as usize] = *gid;
    }
    be_buffer!(0u16, 262u16, 0u16).extend(glyphs).into_vec()
}

/// A high-byte mapping table with a single two byte subheader.
pub fn format2() -> Vec<u8> {
    let mut sub_header_keys = [0u16; 256];
    // first bytes 0x81..=0x9F use subheader 1
    for key in &mut sub_header_keys[0x81..=0x9F] {
        *key = 8;
    }
    let buf = be_buffer!(2u16, 0u16, 0u16)
        .extend(sub_header_keys)
        // subheader 0: one byte codes
        .extend([0u16, 256, 0, 2])
        // subheader 1
        .extend([0x40u16, 2, 0, 2])
        .extend([5u16, 6]);
    let len = buf.len() as u16;
    let mut data = buf.into_vec();
    data[2..4].copy_from_slice(&len.to_be_bytes());
    data
}

/// A segment mapping table. The terminating 0xFFFF segment is appended.
pub fn format4(segments: &[Segment]) -> Vec<u8> {
    let mut segments = segments.to_vec();
    segments.push(Segment::delta(0xFFFF, 0xFFFF, 1));
    let seg_count = segments.len();
    let search = SearchRange::compute(seg_count, 2);

    let mut id_range_offsets = Vec::with_capacity(seg_count);
    let mut glyph_ids: Vec<u16> = Vec::new();
    for (i, segment) in segments.iter().enumerate() {
        match &segment.mapping {
            SegmentMapping::Delta(_) => id_range_offsets.push(0u16),
            SegmentMapping::Array(glyphs) => {
                // distance from this idRangeOffset entry to the glyph array entry
                let offset = (seg_count - i + glyph_ids.len()) * 2;
                id_range_offsets.push(offset as u16);
                glyph_ids.extend(glyphs);
            }
        }
    }
    let deltas = segments.iter().map(|segment| match segment.mapping {
        SegmentMapping::Delta(delta) => delta,
        SegmentMapping::Array(_) => 0,
    });

    let len = 16 + seg_count * 8 + glyph_ids.len() * 2;
    be_buffer!(
        4u16,
        len as u16,
        0u16,
        (seg_count * 2) as u16,
        search.search_range,
        search.entry_selector,
        search.range_shift
    )
    .extend(segments.iter().map(|segment| segment.end))
    .push(0u16) // reservedPad
    .extend(segments.iter().map(|segment| segment.start))
    .extend(deltas)
    .extend(id_range_offsets)
    .extend(glyph_ids)
    .into_vec()
}

/// A trimmed table mapping `first..first + glyphs.len()`.
pub fn format6(first: u16, glyphs: &[u16]) -> Vec<u8> {
    be_buffer!(
        6u16,
        (10 + glyphs.len() * 2) as u16,
        0u16,
        first,
        glyphs.len() as u16
    )
    .extend(glyphs.iter().copied())
    .into_vec()
}

fn group_table(format: u16, groups: &[(u32, u32, u32)]) -> Vec<u8> {
    be_buffer!(
        format,
        0u16,
        (16 + groups.len() * 12) as u32,
        0u32,
        groups.len() as u32
    )
    .extend(
        groups
            .iter()
            .flat_map(|(start, end, glyph)| [*start, *end, *glyph]),
    )
    .into_vec()
}

/// Segmented coverage with `(start, end, start glyph)` groups.
pub fn format12(groups: &[(u32, u32, u32)]) -> Vec<u8> {
    group_table(12, groups)
}

/// Many-to-one range mappings with `(start, end, glyph)` groups.
pub fn format13(groups: &[(u32, u32, u32)]) -> Vec<u8> {
    group_table(13, groups)
}

/// A cmap table with `(platform, encoding, subtable)` records.
pub fn cmap_table(subtables: &[(u16, u16, Vec<u8>)]) -> Vec<u8> {
    let mut buf = be_buffer!(0u16, subtables.len() as u16);
    let mut offset = 4 + subtables.len() * 8;
    for (platform, encoding, data) in subtables {
        buf = buf.push(*platform).push(*encoding).push(offset as u32);
        offset += data.len();
    }
    for (_, _, data) in subtables {
        buf = buf.extend(data.iter().copied());
    }
    buf.into_vec()
}

/// A trivial format 4 subtable that maps nothing, used where only the
/// presence of a Unicode cmap matters.
pub fn empty_unicode_cmap() -> Vec<u8> {
    cmap_table(&[(3, 1, format4(&[]))])
}
