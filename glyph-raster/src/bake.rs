//! Single-size baking of a codepoint range into an atlas.
//!
//! This is the simple path: every glyph is rendered at one pixel height with
//! no oversampling, placed left to right on rows. [`pack`](crate::pack)
//! provides the general version.

use alloc::vec::Vec;

#[cfg(feature = "libm")]
#[allow(unused_imports)]
use core_maths::CoreFloat;

use font_read::FontInfo;

use crate::{
    bitmap::{self, BitmapMut, Scale},
    BakeError,
};

/// Placement of a baked glyph in the atlas.
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct BakedChar {
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
    /// Offset from the pen position to the top left of the glyph.
    pub xoff: f32,
    pub yoff: f32,
    pub xadvance: f32,
}

/// A textured quad: screen coordinates with the matching atlas coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct AlignedQuad {
    pub x0: f32,
    pub y0: f32,
    pub s0: f32,
    pub t0: f32,
    pub x1: f32,
    pub y1: f32,
    pub s1: f32,
    pub t1: f32,
}

/// The result of a successful bake.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BakedFont {
    /// One entry per character of the range.
    pub chars: Vec<BakedChar>,
    /// The first row of the atlas left unused.
    pub rows_used: usize,
}

/// Renders `num_chars` codepoints starting at `first_char` into `atlas` at
/// `pixel_height`.
///
/// The atlas is cleared first. Glyphs are separated by one empty pixel.
pub fn bake_font_bitmap(
    font: &FontInfo,
    pixel_height: f32,
    atlas: &mut BitmapMut,
    first_char: u32,
    num_chars: usize,
) -> Result<BakedFont, BakeError> {
    atlas.clear();
    let (pw, ph) = (atlas.width() as i32, atlas.height() as i32);
    let scale = font.scale_for_pixel_height(pixel_height);
    let mut chars = Vec::with_capacity(num_chars);
    let (mut x, mut y, mut bottom_y) = (1, 1, 1);
    for i in 0..num_chars {
        let glyph = font.find_glyph_index(first_char.wrapping_add(i as u32));
        let advance = font.glyph_hmetrics(glyph).advance_width;
        let bbox = bitmap::glyph_bitmap_box(font, glyph, Scale::uniform(scale));
        let (gw, gh) = (bbox.width(), bbox.height());
        if x + gw + 1 >= pw {
            // next row
            y = bottom_y;
            x = 1;
        }
        if y + gh + 1 >= ph || x + gw + 1 >= pw {
            log::debug!("baking stopped at character {i} of {num_chars}");
            return Err(BakeError::OutOfSpace { first_unfit: i });
        }
        bitmap::make_glyph_bitmap(
            font,
            &mut atlas.region(x as usize, y as usize, gw as usize, gh as usize),
            Scale::uniform(scale),
            glyph,
        );
        chars.push(BakedChar {
            x0: x as u16,
            y0: y as u16,
            x1: (x + gw) as u16,
            y1: (y + gh) as u16,
            xadvance: scale * advance as f32,
            xoff: bbox.x0 as f32,
            yoff: bbox.y0 as f32,
        });
        x += gw + 1;
        bottom_y = bottom_y.max(y + gh + 1);
    }
    Ok(BakedFont {
        chars,
        rows_used: bottom_y as usize,
    })
}

/// Returns the quad to draw for `baked` at the pen position, advancing
/// `xpos`.
///
/// The quad is snapped to whole pixels. Without `opengl_fill_rule` it is
/// moved up and left by half a pixel to match Direct3D 9 pixel centers.
pub fn baked_quad(
    baked: &BakedChar,
    atlas_width: u32,
    atlas_height: u32,
    xpos: &mut f32,
    ypos: f32,
    opengl_fill_rule: bool,
) -> AlignedQuad {
    let d3d_bias = if opengl_fill_rule { 0.0 } else { -0.5 };
    let ipw = 1.0 / atlas_width as f32;
    let iph = 1.0 / atlas_height as f32;
    let round_x = (*xpos + baked.xoff + 0.5).floor();
    let round_y = (ypos + baked.yoff + 0.5).floor();
    *xpos += baked.xadvance;
    AlignedQuad {
        x0: round_x + d3d_bias,
        y0: round_y + d3d_bias,
        x1: round_x + baked.x1 as f32 - baked.x0 as f32 + d3d_bias,
        y1: round_y + baked.y1 as f32 - baked.y0 as f32 + d3d_bias,
        s0: baked.x0 as f32 * ipw,
        t0: baked.y0 as f32 * iph,
        s1: baked.x1 as f32 * ipw,
        t1: baked.y1 as f32 * iph,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use font_test_data::ttf;
    use pretty_assertions::assert_eq;

    fn overlaps(a: &BakedChar, b: &BakedChar) -> bool {
        a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
    }

    #[test]
    fn bake_ascii() {
        let _ = env_logger::builder().is_test(true).try_init();
        let data = ttf::mono();
        let font = FontInfo::new(&data, 0).unwrap();
        let mut pixels = vec![0xAA; 512 * 512];
        let mut atlas = BitmapMut::new(&mut pixels, 512, 512, 0);
        let baked = bake_font_bitmap(&font, 32.0, &mut atlas, 32, 95).unwrap();
        assert_eq!(baked.chars.len(), 95);
        assert!(baked.rows_used > 1 && baked.rows_used < 512);
        // space takes no room
        let space = baked.chars[0];
        assert_eq!((space.x0, space.y0, space.x1, space.y1), (1, 1, 1, 1));
        // BOX is 100..500 by 0..500, 3.2..16 by -16..0 pixels
        let bang = baked.chars[1];
        assert_eq!((bang.x0, bang.y0, bang.x1, bang.y1), (2, 1, 15, 17));
        assert_eq!((bang.xoff, bang.yoff), (3.0, -16.0));
        assert_eq!(bang.xadvance, font.scale_for_pixel_height(32.0) * 600.0);
        for (i, a) in baked.chars.iter().enumerate() {
            assert!(a.x1 < 512 && (a.y1 as usize) < baked.rows_used);
            for b in &baked.chars[i + 1..] {
                assert!(!overlaps(a, b));
            }
        }
        // the atlas was cleared and the border stays empty
        assert!(pixels[..512].iter().all(|p| *p == 0));
        assert_eq!(pixels[8 * 512 + 10], 255);
    }

    #[test]
    fn small_atlas_reports_first_unfit() {
        let data = ttf::mono();
        let font = FontInfo::new(&data, 0).unwrap();
        let mut pixels = vec![0; 64 * 64];
        let mut atlas = BitmapMut::new(&mut pixels, 64, 64, 0);
        let err = bake_font_bitmap(&font, 32.0, &mut atlas, 32, 95).unwrap_err();
        let BakeError::OutOfSpace { first_unfit } = err;
        assert!(first_unfit > 0 && first_unfit < 95);
        assert_eq!(err.code(), -(first_unfit as i32));
        assert!(err.code() < 0 && err.code().abs() < 95);
    }

    #[test]
    fn glyph_wider_than_atlas() {
        let data = ttf::mono();
        let font = FontInfo::new(&data, 0).unwrap();
        let mut pixels = vec![0; 8 * 64];
        let mut atlas = BitmapMut::new(&mut pixels, 8, 64, 0);
        assert_eq!(
            bake_font_bitmap(&font, 32.0, &mut atlas, 'H' as u32, 1),
            Err(BakeError::OutOfSpace { first_unfit: 0 })
        );
    }

    #[test]
    fn quads() {
        let baked = BakedChar {
            x0: 2,
            y0: 1,
            x1: 15,
            y1: 17,
            xoff: 3.0,
            yoff: -16.0,
            xadvance: 19.25,
        };
        let mut xpos = 10.25;
        let quad = baked_quad(&baked, 512, 256, &mut xpos, 20.0, true);
        assert_eq!(
            quad,
            AlignedQuad {
                x0: 13.0,
                y0: 4.0,
                s0: 2.0 / 512.0,
                t0: 1.0 / 256.0,
                x1: 26.0,
                y1: 20.0,
                s1: 15.0 / 512.0,
                t1: 17.0 / 256.0,
            }
        );
        assert_eq!(xpos, 29.5);
        let quad = baked_quad(&baked, 512, 256, &mut xpos, 20.0, false);
        // 29.5 + 3 rounds up to 33
        assert_eq!((quad.x0, quad.y0, quad.x1, quad.y1), (32.5, 3.5, 45.5, 19.5));
        assert_eq!(xpos, 48.75);
    }

    #[test]
    fn quads_cast_to_floats() {
        let quads = [AlignedQuad::default(); 3];
        assert_eq!(bytemuck::cast_slice::<_, f32>(&quads).len(), 24);
        let chars = [BakedChar::default(); 2];
        assert_eq!(bytemuck::cast_slice::<_, u8>(&chars).len(), 40);
    }
}
