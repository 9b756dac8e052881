//! Pair adjustment from the `GPOS` table.
//!
//! This walks every pair adjustment lookup (type 2) in the lookup list and
//! returns the XAdvance adjustment of the first value record for the pair.
//! Features, scripts and lookup flags are ignored; this is kerning, not
//! shaping.

use crate::{ByteCursor, FontInfo, GlyphId};

const PAIR_ADJUSTMENT: u16 = 2;

/// Bits of a value format.
const X_PLACEMENT: u16 = 0x0001;
const Y_PLACEMENT: u16 = 0x0002;
const X_ADVANCE: u16 = 0x0004;

/// The size and XAdvance position of a pair of value records.
#[derive(Copy, Clone, Debug)]
struct ValueLayout {
    /// Byte offset of XAdvance in the first record, if present.
    x_advance: Option<usize>,
    /// Combined byte size of both records.
    pair_len: usize,
}

impl ValueLayout {
    fn new(format1: u16, format2: u16) -> Self {
        let x_advance = (format1 & X_ADVANCE != 0)
            .then(|| 2 * (format1 & (X_PLACEMENT | Y_PLACEMENT)).count_ones() as usize);
        let pair_len = 2 * (format1.count_ones() + format2.count_ones()) as usize;
        Self {
            x_advance,
            pair_len,
        }
    }
}

/// Returns the coverage index of `glyph`, if covered.
pub fn coverage_index(coverage: ByteCursor, glyph: GlyphId) -> Option<usize> {
    let glyph = glyph.to_u32();
    match coverage.u16_at(0) {
        1 => {
            let count = coverage.u16_at(2) as usize;
            let (mut low, mut high) = (0, count);
            while low < high {
                let mid = low + ((high - low) >> 1);
                let straw = coverage.u16_at(4 + 2 * mid) as u32;
                if glyph < straw {
                    high = mid;
                } else if glyph > straw {
                    low = mid + 1;
                } else {
                    return Some(mid);
                }
            }
            None
        }
        2 => {
            let count = coverage.u16_at(2) as usize;
            let (mut low, mut high) = (0, count);
            while low < high {
                let mid = low + ((high - low) >> 1);
                let range = 4 + 6 * mid;
                let start = coverage.u16_at(range) as u32;
                let end = coverage.u16_at(range + 2) as u32;
                if glyph < start {
                    high = mid;
                } else if glyph > end {
                    low = mid + 1;
                } else {
                    let start_index = coverage.u16_at(range + 4) as u32;
                    return Some((start_index + glyph - start) as usize);
                }
            }
            None
        }
        format => {
            log::trace!("unsupported coverage format {format}");
            None
        }
    }
}

/// Returns the class of `glyph` in a class definition table.
///
/// Glyphs not assigned to a class are in class 0. Unknown formats yield
/// `None`.
pub fn glyph_class(class_def: ByteCursor, glyph: GlyphId) -> Option<u16> {
    let glyph = glyph.to_u32();
    match class_def.u16_at(0) {
        1 => {
            let start = class_def.u16_at(2) as u32;
            let count = class_def.u16_at(4) as u32;
            if (start..start + count).contains(&glyph) {
                return Some(class_def.u16_at(6 + 2 * (glyph - start) as usize));
            }
            Some(0)
        }
        2 => {
            let count = class_def.u16_at(2) as usize;
            let (mut low, mut high) = (0, count);
            while low < high {
                let mid = low + ((high - low) >> 1);
                let range = 4 + 6 * mid;
                let start = class_def.u16_at(range) as u32;
                let end = class_def.u16_at(range + 2) as u32;
                if glyph < start {
                    high = mid;
                } else if glyph > end {
                    low = mid + 1;
                } else {
                    return Some(class_def.u16_at(range + 4));
                }
            }
            Some(0)
        }
        format => {
            log::trace!("unsupported class definition format {format}");
            None
        }
    }
}

/// The outcome of consulting one pair adjustment subtable.
enum PairResult {
    /// The subtable does not cover the pair; keep looking.
    Miss,
    /// The subtable decides the adjustment.
    Advance(i32),
}

fn pair_pos_format1(table: ByteCursor, coverage_index: usize, glyph2: GlyphId) -> PairResult {
    let layout = ValueLayout::new(table.u16_at(4), table.u16_at(6));
    let pair_set_count = table.u16_at(8) as usize;
    if coverage_index >= pair_set_count {
        return PairResult::Advance(0);
    }
    let pair_set = table.tail(table.u16_at(10 + 2 * coverage_index) as usize);
    let pair_value_count = pair_set.u16_at(0) as usize;
    let record_len = 2 + layout.pair_len;
    let needle = glyph2.to_u32();
    let (mut low, mut high) = (0, pair_value_count);
    while low < high {
        let mid = low + ((high - low) >> 1);
        let record = 2 + mid * record_len;
        let straw = pair_set.u16_at(record) as u32;
        if needle < straw {
            high = mid;
        } else if needle > straw {
            low = mid + 1;
        } else {
            let advance = layout
                .x_advance
                .map(|offset| pair_set.i16_at(record + 2 + offset) as i32)
                .unwrap_or(0);
            return PairResult::Advance(advance);
        }
    }
    PairResult::Miss
}

fn pair_pos_format2(table: ByteCursor, glyph1: GlyphId, glyph2: GlyphId) -> PairResult {
    let layout = ValueLayout::new(table.u16_at(4), table.u16_at(6));
    let class1 = glyph_class(table.tail(table.u16_at(8) as usize), glyph1);
    let class2 = glyph_class(table.tail(table.u16_at(10) as usize), glyph2);
    let class1_count = table.u16_at(12);
    let class2_count = table.u16_at(14);
    let (Some(class1), Some(class2)) = (class1, class2) else {
        return PairResult::Advance(0);
    };
    if class1 >= class1_count || class2 >= class2_count {
        return PairResult::Advance(0);
    }
    let Some(x_advance) = layout.x_advance else {
        return PairResult::Advance(0);
    };
    let class1_record = 16 + class1 as usize * class2_count as usize * layout.pair_len;
    let class2_record = class1_record + class2 as usize * layout.pair_len;
    PairResult::Advance(table.i16_at(class2_record + x_advance) as i32)
}

impl<'a> FontInfo<'a> {
    /// Looks up the XAdvance pair adjustment for `(glyph1, glyph2)` in
    /// `GPOS`.
    ///
    /// Returns 0 if the font has no `GPOS` table, the version is not 1.0 or
    /// no pair adjustment subtable covers the pair.
    pub fn gpos_advance(&self, glyph1: GlyphId, glyph2: GlyphId) -> i32 {
        let Some(gpos) = self.gpos else {
            return 0;
        };
        let gpos = self.cursor().tail(gpos as usize);
        // major, minor version
        if gpos.u16_at(0) != 1 || gpos.u16_at(2) != 0 {
            return 0;
        }
        let lookup_list = gpos.tail(gpos.u16_at(8) as usize);
        let lookup_count = lookup_list.u16_at(0) as usize;
        for i in 0..lookup_count {
            let lookup = lookup_list.tail(lookup_list.u16_at(2 + 2 * i) as usize);
            if lookup.u16_at(0) != PAIR_ADJUSTMENT {
                continue;
            }
            let subtable_count = lookup.u16_at(4) as usize;
            for j in 0..subtable_count {
                let table = lookup.tail(lookup.u16_at(6 + 2 * j) as usize);
                let coverage = table.tail(table.u16_at(2) as usize);
                let Some(coverage_ix) = coverage_index(coverage, glyph1) else {
                    continue;
                };
                let result = match table.u16_at(0) {
                    1 => pair_pos_format1(table, coverage_ix, glyph2),
                    2 => pair_pos_format2(table, glyph1, glyph2),
                    format => {
                        log::debug!("unsupported pair adjustment format {format}");
                        return 0;
                    }
                };
                if let PairResult::Advance(advance) = result {
                    return advance;
                }
            }
        }
        0
    }
}
