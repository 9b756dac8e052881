//! Loading glyph outlines.
//!
//! TrueType glyphs are decoded from `glyf` records, including composites;
//! CFF glyphs are produced by evaluating Type 2 charstrings. Either way the
//! result is a list of [`Vertex`] commands in font units.

pub mod charstring;
pub mod glyf;

use alloc::vec::Vec;

use font_read::{FontInfo, Outlines};

use crate::{BoundingBox, DrawError, GlyphId, Vertex};

/// Limit for recursion when loading TrueType composite glyphs.
pub const GLYF_COMPOSITE_RECURSION_LIMIT: usize = 32;

/// Returns the outline of `glyph`.
///
/// Malformed glyph data is clamped and usually yields a partial or empty
/// outline; charstring evaluation errors and composite cycles produce an
/// error rather than a partial outline.
pub fn glyph_shape(font: &FontInfo, glyph: GlyphId) -> Result<Vec<Vertex>, DrawError> {
    match font.outlines() {
        Outlines::Glyf { .. } => glyf::glyph_shape(font, glyph),
        Outlines::Cff(cff) => charstring::glyph_shape(cff, glyph),
    }
}

/// Returns the outline of the glyph mapped to `codepoint`.
pub fn codepoint_shape(font: &FontInfo, codepoint: u32) -> Result<Vec<Vertex>, DrawError> {
    glyph_shape(font, font.find_glyph_index(codepoint))
}

/// Returns the bounding box of `glyph` in font units.
///
/// For TrueType this is the box stored in the glyph header and is `None` for
/// glyphs without outline data. For CFF the charstring is evaluated to
/// measure it.
pub fn glyph_box(font: &FontInfo, glyph: GlyphId) -> Option<BoundingBox> {
    match font.outlines() {
        Outlines::Glyf { .. } => {
            let range = font.glyph_data_range(glyph)?;
            let data = font.cursor();
            let g = range.start;
            Some(BoundingBox {
                x0: data.i16_at(g + 2) as i32,
                y0: data.i16_at(g + 4) as i32,
                x1: data.i16_at(g + 6) as i32,
                y1: data.i16_at(g + 8) as i32,
            })
        }
        Outlines::Cff(cff) => match charstring::measure(cff, glyph) {
            Ok(bounds) => Some(bounds.bounding_box()),
            Err(e) => {
                log::debug!("cannot measure {glyph}: {e}");
                None
            }
        },
    }
}

/// Returns the bounding box of the glyph mapped to `codepoint`.
pub fn codepoint_box(font: &FontInfo, codepoint: u32) -> Option<BoundingBox> {
    glyph_box(font, font.find_glyph_index(codepoint))
}

/// Returns `true` if `glyph` has nothing to draw.
pub fn is_glyph_empty(font: &FontInfo, glyph: GlyphId) -> bool {
    match font.outlines() {
        Outlines::Glyf { .. } => match font.glyph_data_range(glyph) {
            Some(range) => font.cursor().i16_at(range.start) == 0,
            None => true,
        },
        Outlines::Cff(cff) => charstring::measure(cff, glyph)
            .map(|bounds| bounds.num_vertices == 0)
            .unwrap_or(true),
    }
}

/// Loads an outline for rendering, where a glyph that fails to load is
/// drawn as nothing.
pub(crate) fn shape_or_empty(font: &FontInfo, glyph: GlyphId) -> Vec<Vertex> {
    glyph_shape(font, glyph).unwrap_or_else(|e| {
        log::warn!("drawing {glyph} as empty: {e}");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VertexKind;
    use font_test_data::{cff as cff_data, ttf};

    /// Every contour must end where it started.
    pub(crate) fn assert_contours_closed(vertices: &[Vertex]) {
        let mut start: Option<&Vertex> = None;
        let mut last: Option<&Vertex> = None;
        for vertex in vertices {
            if vertex.kind == VertexKind::Move {
                if let (Some(start), Some(last)) = (start, last) {
                    assert_eq!((start.x, start.y), (last.x, last.y));
                }
                start = Some(vertex);
            }
            last = Some(vertex);
        }
        if let (Some(start), Some(last)) = (start, last) {
            assert_eq!((start.x, start.y), (last.x, last.y));
        }
    }

    #[test]
    fn every_truetype_contour_is_closed() {
        let data = ttf::mono();
        let font = FontInfo::new(&data, 0).unwrap();
        for gid in 0..ttf::NUM_GLYPHS {
            if gid == ttf::GID_RECURSIVE {
                continue;
            }
            let shape = glyph_shape(&font, GlyphId::new(gid)).unwrap();
            assert_contours_closed(&shape);
        }
    }

    #[test]
    fn every_cff_contour_is_closed() {
        let data = cff_data::simple_font();
        let font = FontInfo::new(&data, 0).unwrap();
        for gid in [
            cff_data::GID_LOCAL_SUBR,
            cff_data::GID_GLOBAL_SUBR,
            cff_data::GID_HINTED_CURVE,
            cff_data::GID_FLEX,
        ] {
            let shape = glyph_shape(&font, GlyphId::new(gid)).unwrap();
            assert!(!shape.is_empty());
            assert_contours_closed(&shape);
        }
    }

    #[test]
    fn truetype_boxes() {
        let data = ttf::mono();
        let font = FontInfo::new(&data, 0).unwrap();
        let bbox = codepoint_box(&font, 'H' as u32).unwrap();
        assert_eq!(
            [bbox.x0, bbox.y0, bbox.x1, bbox.y1],
            ttf::BOX.map(|v| v as i32)
        );
        assert_eq!(glyph_box(&font, GlyphId::new(ttf::GID_SPACE)), None);
        assert_eq!(glyph_box(&font, GlyphId::new(ttf::NUM_GLYPHS)), None);
    }

    #[test]
    fn cff_boxes() {
        let data = cff_data::simple_font();
        let font = FontInfo::new(&data, 0).unwrap();
        let bbox = glyph_box(&font, GlyphId::new(cff_data::GID_HINTED_CURVE)).unwrap();
        assert_eq!([bbox.x0, bbox.y0, bbox.x1, bbox.y1], [100, 100, 300, 300]);
        let bbox = glyph_box(&font, GlyphId::new(cff_data::GID_LOCAL_SUBR)).unwrap();
        assert_eq!([bbox.x0, bbox.y0, bbox.x1, bbox.y1], [100, 0, 300, 200]);
        assert_eq!(
            glyph_box(&font, GlyphId::new(cff_data::GID_RESERVED_OP)),
            None
        );
    }

    #[test]
    fn empty_glyphs() {
        let data = ttf::mono();
        let font = FontInfo::new(&data, 0).unwrap();
        assert!(is_glyph_empty(&font, GlyphId::new(ttf::GID_SPACE)));
        assert!(!is_glyph_empty(&font, GlyphId::new(ttf::GID_A)));
        assert!(!is_glyph_empty(&font, GlyphId::new(ttf::GID_COMPOSITE)));
        assert!(glyph_shape(&font, GlyphId::new(ttf::GID_SPACE))
            .unwrap()
            .is_empty());

        let data = cff_data::simple_font();
        let font = FontInfo::new(&data, 0).unwrap();
        assert!(is_glyph_empty(&font, GlyphId::NOTDEF));
        assert!(!is_glyph_empty(&font, GlyphId::new(cff_data::GID_FLEX)));
        assert!(is_glyph_empty(&font, GlyphId::new(cff_data::GID_NO_ENDCHAR)));
    }

    #[test]
    fn codepoint_shapes_match_glyph_shapes() {
        let data = ttf::mono();
        let font = FontInfo::new(&data, 0).unwrap();
        assert_eq!(
            codepoint_shape(&font, 'A' as u32),
            glyph_shape(&font, GlyphId::new(ttf::GID_A))
        );
    }

    #[test]
    fn missing_glyph() {
        let data = ttf::mono();
        let font = FontInfo::new(&data, 0).unwrap();
        let gid = GlyphId::new(ttf::NUM_GLYPHS + 5);
        assert_eq!(glyph_shape(&font, gid), Err(DrawError::GlyphNotFound(gid)));
        assert!(shape_or_empty(&font, gid).is_empty());
    }
}
