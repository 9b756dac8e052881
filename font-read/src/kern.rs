//! Pair kerning from the legacy `kern` table.
//!
//! Only the first subtable is consulted, and only if it is a horizontal
//! format 0 subtable: a sorted array of `(left, right, value)` pairs.

use crate::{ByteCursor, FontInfo, GlyphId};

const PAIRS_START: usize = 18;
const PAIR_LEN: usize = 6;

/// A single entry of a format 0 kerning subtable.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub struct KerningEntry {
    pub glyph1: GlyphId,
    pub glyph2: GlyphId,
    /// Adjustment to the advance of `glyph1` in font units.
    pub advance: i32,
}

/// Returns the first subtable if it is a horizontal format 0 subtable.
fn horizontal_pairs(kern: ByteCursor) -> Option<(ByteCursor, usize)> {
    // nTables
    if kern.u16_at(2) < 1 {
        return None;
    }
    // format 0 with only the horizontal coverage bit set
    if kern.u16_at(8) != 1 {
        log::trace!("unsupported kern subtable format/coverage {:#06x}", kern.u16_at(8));
        return None;
    }
    Some((kern, kern.u16_at(10) as usize))
}

impl<'a> FontInfo<'a> {
    fn kern_table(&self) -> Option<(ByteCursor<'a>, usize)> {
        let kern = self.cursor().tail(self.kern? as usize);
        horizontal_pairs(kern)
    }

    /// The number of pairs in the first horizontal `kern` subtable.
    pub fn kerning_table_len(&self) -> usize {
        self.kern_table().map(|(_, len)| len).unwrap_or_default()
    }

    /// Iterates over all pairs of the first horizontal `kern` subtable.
    pub fn kerning_table(&self) -> impl Iterator<Item = KerningEntry> + 'a {
        let (kern, len) = self.kern_table().unwrap_or_default();
        (0..len).map(move |i| {
            let pair = PAIRS_START + i * PAIR_LEN;
            KerningEntry {
                glyph1: GlyphId::from(kern.u16_at(pair)),
                glyph2: GlyphId::from(kern.u16_at(pair + 2)),
                advance: kern.i16_at(pair + 4) as i32,
            }
        })
    }

    /// Looks up the pair `(glyph1, glyph2)` in the `kern` table.
    ///
    /// Returns 0 if there is no such pair or the table is unsupported.
    pub fn kern_table_advance(&self, glyph1: GlyphId, glyph2: GlyphId) -> i32 {
        let Some((kern, len)) = self.kern_table() else {
            return 0;
        };
        let needle = (glyph1.to_u32() << 16) | (glyph2.to_u32() & 0xFFFF);
        let mut low = 0;
        let mut high = len;
        while low < high {
            let mid = low + ((high - low) >> 1);
            let pair = PAIRS_START + mid * PAIR_LEN;
            let straw = kern.u32_at(pair);
            if needle < straw {
                high = mid;
            } else if needle > straw {
                low = mid + 1;
            } else {
                return kern.i16_at(pair + 4) as i32;
            }
        }
        0
    }

    /// The kerning adjustment between two glyphs in font units.
    ///
    /// Pair adjustments in `GPOS` take precedence over the `kern` table.
    pub fn glyph_kern_advance(&self, glyph1: GlyphId, glyph2: GlyphId) -> i32 {
        if self.gpos.is_some() {
            self.gpos_advance(glyph1, glyph2)
        } else if self.kern.is_some() {
            self.kern_table_advance(glyph1, glyph2)
        } else {
            0
        }
    }

    /// The kerning adjustment between the glyphs mapped from two codepoints.
    pub fn codepoint_kern_advance(&self, codepoint1: u32, codepoint2: u32) -> i32 {
        if self.kern.is_none() && self.gpos.is_none() {
            return 0;
        }
        self.glyph_kern_advance(
            self.find_glyph_index(codepoint1),
            self.find_glyph_index(codepoint2),
        )
    }
}
