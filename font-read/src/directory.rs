//! Locating tables in the sfnt table directory.

use std::ops::Range;

use crate::{ByteCursor, Tag};

const TABLE_RECORD_LEN: usize = 16;

/// Return the absolute offset of the table with the given `tag`.
///
/// `font_start` is the offset of the table directory in `data`, which is
/// zero for a single font and the subfont offset for collections. The
/// directory is scanned linearly.
pub fn find_table(data: &[u8], font_start: usize, tag: Tag) -> Option<u32> {
    table_record(data, font_start, tag).map(|(offset, _)| offset)
}

/// Return the absolute byte range of the table with the given `tag`.
///
/// The range is clipped to the available data.
pub fn find_table_range(data: &[u8], font_start: usize, tag: Tag) -> Option<Range<usize>> {
    let (offset, len) = table_record(data, font_start, tag)?;
    let start = (offset as usize).min(data.len());
    let end = start.saturating_add(len as usize).min(data.len());
    Some(start..end)
}

fn table_record(data: &[u8], font_start: usize, tag: Tag) -> Option<(u32, u32)> {
    let font = ByteCursor::new(data);
    let num_tables = font.u16_at(font_start.saturating_add(4)) as usize;
    let records_start = font_start.saturating_add(12);
    (0..num_tables)
        .map(|i| records_start.saturating_add(i * TABLE_RECORD_LEN))
        .find(|&loc| font.u32_at(loc) == tag.to_u32())
        .map(|loc| (font.u32_at(loc + 8), font.u32_at(loc + 12)))
        .filter(|(offset, _)| *offset != 0)
}
