//! Horizontal glyph metrics and font-wide vertical metrics.

use crate::{font::OS2, FontInfo, GlyphId};

/// Vertical metrics of a font in font units.
///
/// `descent` is typically negative. The distance between baselines is
/// `ascent - descent + line_gap`.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub struct VMetrics {
    pub ascent: i32,
    pub descent: i32,
    pub line_gap: i32,
}

/// Horizontal metrics of a single glyph in font units.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub struct HMetrics {
    /// Offset from the current horizontal position to the next.
    pub advance_width: i32,
    /// Offset from the current horizontal position to the left edge of the
    /// glyph.
    pub left_side_bearing: i32,
}

/// An integer bounding box.
///
/// In font units the y axis points up; in bitmap boxes it points down.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub struct BoundingBox {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl BoundingBox {
    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> i32 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }
}

impl<'a> FontInfo<'a> {
    /// The `unitsPerEm` field of `head`.
    pub fn units_per_em(&self) -> u16 {
        self.cursor().u16_at(self.head as usize + 18)
    }

    /// The `macStyle` bits of `head`.
    pub fn mac_style(&self) -> u16 {
        self.cursor().u16_at(self.head as usize + 44)
    }

    /// Ascent, descent and line gap from `hhea`.
    pub fn font_vmetrics(&self) -> VMetrics {
        let font = self.cursor();
        let hhea = self.hhea as usize;
        VMetrics {
            ascent: font.i16_at(hhea + 4) as i32,
            descent: font.i16_at(hhea + 6) as i32,
            line_gap: font.i16_at(hhea + 8) as i32,
        }
    }

    /// Typographic ascent, descent and line gap from `OS/2`.
    ///
    /// Returns `None` if the font has no `OS/2` table.
    pub fn font_vmetrics_os2(&self) -> Option<VMetrics> {
        let os2 = self.table_offset(OS2)? as usize;
        let font = self.cursor();
        Some(VMetrics {
            ascent: font.i16_at(os2 + 68) as i32,
            descent: font.i16_at(os2 + 70) as i32,
            line_gap: font.i16_at(os2 + 72) as i32,
        })
    }

    /// The bounding box of all glyphs, from `head`.
    pub fn font_bounding_box(&self) -> BoundingBox {
        let font = self.cursor();
        let head = self.head as usize;
        BoundingBox {
            x0: font.i16_at(head + 36) as i32,
            y0: font.i16_at(head + 38) as i32,
            x1: font.i16_at(head + 40) as i32,
            y1: font.i16_at(head + 42) as i32,
        }
    }

    /// The scale factor that makes the distance from the highest ascender to
    /// the lowest descender `height` pixels.
    pub fn scale_for_pixel_height(&self, height: f32) -> f32 {
        let VMetrics {
            ascent, descent, ..
        } = self.font_vmetrics();
        height / (ascent - descent) as f32
    }

    /// The scale factor that makes one em `pixels` pixels tall.
    pub fn scale_for_mapping_em_to_pixels(&self, pixels: f32) -> f32 {
        pixels / self.units_per_em() as f32
    }

    /// Advance width and left side bearing for `glyph` from `hmtx`.
    ///
    /// Glyphs past the last long metric record share its advance and read
    /// their side bearing from the trailing array.
    pub fn glyph_hmetrics(&self, glyph: GlyphId) -> HMetrics {
        let font = self.cursor();
        let hmtx = self.hmtx as usize;
        let num_long_metrics = font.u16_at(self.hhea as usize + 34) as usize;
        let ix = glyph.to_usize();
        if ix < num_long_metrics {
            HMetrics {
                advance_width: font.i16_at(hmtx + 4 * ix) as i32,
                left_side_bearing: font.i16_at(hmtx + 4 * ix + 2) as i32,
            }
        } else {
            let last = 4 * num_long_metrics;
            HMetrics {
                advance_width: font.i16_at((hmtx + last).wrapping_sub(4)) as i32,
                left_side_bearing: font.i16_at(hmtx + last + 2 * (ix - num_long_metrics))
                    as i32,
            }
        }
    }

    /// Horizontal metrics for the glyph mapped from `codepoint`.
    pub fn codepoint_hmetrics(&self, codepoint: u32) -> HMetrics {
        self.glyph_hmetrics(self.find_glyph_index(codepoint))
    }
}
