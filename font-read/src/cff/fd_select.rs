//! Parsing for CFF FDSelect tables.

use crate::ByteCursor;

/// Returns the font DICT index for `glyph` from the FDSelect table at
/// the start of `fd_select`.
///
/// Supports format 0 (one byte per glyph) and format 3 (sorted ranges
/// terminated by a sentinel glyph id).
pub fn font_index(fd_select: ByteCursor, glyph: u32) -> Option<usize> {
    let mut b = fd_select;
    b.seek(0);
    match b.get8() {
        0 => {
            if glyph as usize >= b.size().saturating_sub(1) {
                return None;
            }
            b.skip(glyph as isize);
            Some(b.get8() as usize)
        }
        3 => {
            let n_ranges = b.get16();
            let mut start = b.get16() as u32;
            for _ in 0..n_ranges {
                let fd = b.get8();
                let end = b.get16() as u32;
                if (start..end).contains(&glyph) {
                    return Some(fd as usize);
                }
                start = end;
            }
            None
        }
        format => {
            log::trace!("unsupported FDSelect format {format}");
            None
        }
    }
}
