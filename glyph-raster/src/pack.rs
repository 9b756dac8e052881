//! Packing many glyphs into a shared texture atlas.
//!
//! Packing happens in three phases, each of which is public so callers can
//! pack several fonts into the same atlas:
//!
//! 1. [`PackContext::gather_rects`] computes the size of every glyph,
//!    including padding and room for oversampling.
//! 2. [`PackContext::pack_rects`] places the rectangles on shelves.
//! 3. [`PackContext::render_into_rects`] renders and filters each glyph and
//!    fills in the [`PackedChar`] metrics.
//!
//! [`PackContext::pack_font_ranges`] runs all three.

use alloc::vec::Vec;

#[cfg(feature = "libm")]
#[allow(unused_imports)]
use core_maths::CoreFloat;

use font_read::FontInfo;

use crate::{
    bake::AlignedQuad,
    bitmap::{self, BitmapMut, Scale, Shift},
    GlyphId,
};

/// Maximum oversampling factor on either axis.
pub const MAX_OVERSAMPLE: u32 = 8;

const OVER_MASK: usize = MAX_OVERSAMPLE as usize - 1;

/// The size at which a range of characters is rendered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RangeSize {
    /// Scale so that ascent to descent spans this many pixels.
    PixelHeight(f32),
    /// Scale so that the em square spans this many pixels.
    Em(f32),
}

impl RangeSize {
    /// The scale factor from font units to pixels.
    pub fn scale(&self, font: &FontInfo) -> f32 {
        match *self {
            Self::PixelHeight(height) => font.scale_for_pixel_height(height),
            Self::Em(pixels) => font.scale_for_mapping_em_to_pixels(pixels),
        }
    }
}

/// The characters of a [`PackRange`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Codepoints<'a> {
    /// `count` consecutive codepoints starting at `first`.
    Span { first: u32, count: usize },
    /// An explicit list.
    List(&'a [u32]),
}

impl Codepoints<'_> {
    pub fn len(&self) -> usize {
        match self {
            Self::Span { count, .. } => *count,
            Self::List(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the codepoint at `index`.
    pub fn get(&self, index: usize) -> Option<u32> {
        match self {
            Self::Span { first, count } => {
                (index < *count).then(|| first.wrapping_add(index as u32))
            }
            Self::List(list) => list.get(index).copied(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }
}

/// Placement of a glyph in the atlas, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct PackedChar {
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
    /// Offset from the pen position to the top left of the quad.
    pub xoff: f32,
    pub yoff: f32,
    pub xadvance: f32,
    /// Offset from the pen position to the bottom right of the quad.
    pub xoff2: f32,
    pub yoff2: f32,
}

/// A range of characters to pack at one size, along with its results.
#[derive(Clone, Debug)]
pub struct PackRange<'a> {
    pub font_size: RangeSize,
    pub codepoints: Codepoints<'a>,
    /// Output, one entry per codepoint.
    pub chardata: Vec<PackedChar>,
    h_oversample: u32,
    v_oversample: u32,
}

impl<'a> PackRange<'a> {
    pub fn new(font_size: RangeSize, codepoints: Codepoints<'a>) -> Self {
        Self {
            font_size,
            codepoints,
            chardata: alloc::vec![bytemuck::Zeroable::zeroed(); codepoints.len()],
            h_oversample: 1,
            v_oversample: 1,
        }
    }

    /// A range of `count` consecutive codepoints.
    pub fn span(font_size: RangeSize, first: u32, count: usize) -> Self {
        Self::new(font_size, Codepoints::Span { first, count })
    }
}

/// A rectangle to be placed in the atlas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PackRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    /// The glyph is missing from the font.
    pub missing: bool,
    pub was_packed: bool,
}

/// Places rectangles left to right on shelves, starting a new shelf below
/// the tallest rectangle of the current one when a row is full.
#[derive(Clone, Copy, Debug, Default)]
struct ShelfPacker {
    width: u32,
    height: u32,
    x: u32,
    y: u32,
    bottom_y: u32,
}

impl ShelfPacker {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Packs `rects` in order. Once one rectangle does not fit, it and every
    /// one after it are left unpacked.
    fn pack(&mut self, rects: &mut [PackRect]) {
        let mut i = 0;
        while let Some(rect) = rects.get_mut(i) {
            if self.x + rect.w > self.width {
                self.x = 0;
                self.y = self.bottom_y;
            }
            if self.y + rect.h > self.height {
                break;
            }
            rect.x = self.x;
            rect.y = self.y;
            rect.was_packed = true;
            self.x += rect.w;
            self.bottom_y = self.bottom_y.max(self.y + rect.h);
            i += 1;
        }
        for rect in &mut rects[i..] {
            rect.was_packed = false;
        }
    }
}

/// Font-wide vertical metrics scaled to pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PackedFontMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
}

/// Returns the vertical metrics of `font` scaled to `size`.
pub fn scaled_font_vmetrics(font: &FontInfo, size: RangeSize) -> PackedFontMetrics {
    let scale = size.scale(font);
    let metrics = font.font_vmetrics();
    PackedFontMetrics {
        ascent: metrics.ascent as f32 * scale,
        descent: metrics.descent as f32 * scale,
        line_gap: metrics.line_gap as f32 * scale,
    }
}

/// An atlas being filled with glyphs.
#[derive(Clone, Debug)]
pub struct PackContext {
    width: u32,
    height: u32,
    stride: usize,
    padding: u32,
    h_oversample: u32,
    v_oversample: u32,
    skip_missing: bool,
    packer: ShelfPacker,
    pixels: Vec<u8>,
}

impl PackContext {
    /// Starts packing into a zeroed atlas of `width` by `height` pixels.
    ///
    /// A `stride` of 0 means rows are `width` bytes apart. `padding` pixels
    /// are left empty between glyphs; 1 is a good default for bilinear
    /// filtering.
    pub fn begin(width: u32, height: u32, stride: usize, padding: u32) -> Self {
        let stride = stride.max(width as usize);
        Self {
            width,
            height,
            stride,
            padding,
            h_oversample: 1,
            v_oversample: 1,
            skip_missing: false,
            packer: ShelfPacker::new(
                width.saturating_sub(padding),
                height.saturating_sub(padding),
            ),
            pixels: alloc::vec![0; stride * height as usize],
        }
    }

    /// Sets the oversampling for ranges gathered from now on.
    ///
    /// Factors outside `1..=8` are ignored.
    pub fn set_oversampling(&mut self, h_oversample: u32, v_oversample: u32) {
        if (1..=MAX_OVERSAMPLE).contains(&h_oversample) {
            self.h_oversample = h_oversample;
        } else {
            log::warn!("ignoring horizontal oversampling of {h_oversample}");
        }
        if (1..=MAX_OVERSAMPLE).contains(&v_oversample) {
            self.v_oversample = v_oversample;
        } else {
            log::warn!("ignoring vertical oversampling of {v_oversample}");
        }
    }

    /// When set, codepoints without a glyph are not packed and make the
    /// pack report failure. Otherwise they all share a single rendering of
    /// the `.notdef` glyph.
    pub fn set_skip_missing_codepoints(&mut self, skip: bool) {
        self.skip_missing = skip;
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The atlas.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Finishes packing, returning the atlas.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Packs a single range of characters. See
    /// [`pack_font_ranges`](Self::pack_font_ranges).
    pub fn pack_font_range(&mut self, font: &FontInfo, range: &mut PackRange) -> bool {
        self.pack_font_ranges(font, core::slice::from_mut(range))
    }

    /// Packs and renders every character of `ranges`, filling in their
    /// `chardata`.
    ///
    /// Returns `false` if any character could not be packed; those keep
    /// zeroed metrics.
    pub fn pack_font_ranges(&mut self, font: &FontInfo, ranges: &mut [PackRange]) -> bool {
        for range in ranges.iter_mut() {
            range.chardata.clear();
            range
                .chardata
                .resize(range.codepoints.len(), bytemuck::Zeroable::zeroed());
        }
        let mut rects = self.gather_rects(font, ranges);
        self.pack_rects(&mut rects);
        self.render_into_rects(font, ranges, &mut rects)
    }

    /// Computes the padded, oversampled size of every character in
    /// `ranges`, in order.
    ///
    /// The current oversampling is recorded in each range.
    pub fn gather_rects(&self, font: &FontInfo, ranges: &mut [PackRange]) -> Vec<PackRect> {
        let mut rects = Vec::with_capacity(ranges.iter().map(|r| r.codepoints.len()).sum());
        let mut missing_glyph_added = false;
        for range in ranges.iter_mut() {
            let scale = range.font_size.scale(font);
            range.h_oversample = self.h_oversample;
            range.v_oversample = self.v_oversample;
            let oversampled = Scale {
                x: scale * self.h_oversample as f32,
                y: scale * self.v_oversample as f32,
            };
            for glyph in range_glyphs(font, range) {
                let missing = glyph.is_notdef();
                let mut rect = PackRect {
                    missing,
                    ..Default::default()
                };
                if !(missing && (self.skip_missing || missing_glyph_added)) {
                    let bbox = bitmap::glyph_bitmap_box(font, glyph, oversampled);
                    rect.w = (bbox.width() + (self.padding + self.h_oversample - 1) as i32).max(0)
                        as u32;
                    rect.h = (bbox.height() + (self.padding + self.v_oversample - 1) as i32).max(0)
                        as u32;
                    if missing {
                        missing_glyph_added = true;
                    }
                }
                rects.push(rect);
            }
        }
        rects
    }

    /// Places `rects` in the atlas, continuing after anything packed
    /// before.
    pub fn pack_rects(&mut self, rects: &mut [PackRect]) {
        self.packer.pack(rects);
    }

    /// Renders the characters of `ranges` into their packed `rects`.
    ///
    /// `rects` must come from [`gather_rects`](Self::gather_rects) for the
    /// same ranges. Returns `false` if any character was left without
    /// metrics.
    pub fn render_into_rects(
        &mut self,
        font: &FontInfo,
        ranges: &mut [PackRange],
        rects: &mut [PackRect],
    ) -> bool {
        let mut success = true;
        let mut missing_glyph: Option<PackedChar> = None;
        let mut rects = rects.iter_mut();
        for range in ranges.iter_mut() {
            let scale = range.font_size.scale(font);
            let (h_over, v_over) = (range.h_oversample.max(1), range.v_oversample.max(1));
            let oversampled = Scale {
                x: scale * h_over as f32,
                y: scale * v_over as f32,
            };
            let recip_h = 1.0 / h_over as f32;
            let recip_v = 1.0 / v_over as f32;
            let sub_x = oversample_shift(h_over);
            let sub_y = oversample_shift(v_over);
            if range.chardata.len() < range.codepoints.len() {
                range
                    .chardata
                    .resize(range.codepoints.len(), bytemuck::Zeroable::zeroed());
            }
            for (j, glyph) in range_glyphs(font, range).into_iter().enumerate() {
                let Some(r) = rects.next() else {
                    return false;
                };
                if r.was_packed && r.w != 0 && r.h != 0 {
                    // pad on the left and top
                    r.x += self.padding;
                    r.y += self.padding;
                    r.w = r.w.saturating_sub(self.padding);
                    r.h = r.h.saturating_sub(self.padding);
                    let advance = font.glyph_hmetrics(glyph).advance_width;
                    let bbox = bitmap::glyph_bitmap_box(font, glyph, oversampled);
                    let mut atlas = BitmapMut::new(
                        &mut self.pixels,
                        self.width as usize,
                        self.height as usize,
                        self.stride,
                    );
                    let mut target = atlas.region(
                        r.x as usize,
                        r.y as usize,
                        r.w as usize,
                        r.h as usize,
                    );
                    bitmap::make_glyph_bitmap_subpixel_prefilter(
                        font,
                        &mut target,
                        oversampled,
                        Shift::ZERO,
                        (h_over, v_over),
                        glyph,
                    );
                    let packed = PackedChar {
                        x0: r.x as u16,
                        y0: r.y as u16,
                        x1: (r.x + r.w) as u16,
                        y1: (r.y + r.h) as u16,
                        xadvance: scale * advance as f32,
                        xoff: bbox.x0 as f32 * recip_h + sub_x,
                        yoff: bbox.y0 as f32 * recip_v + sub_y,
                        xoff2: (bbox.x0 + r.w as i32) as f32 * recip_h + sub_x,
                        yoff2: (bbox.y0 + r.h as i32) as f32 * recip_v + sub_y,
                    };
                    range.chardata[j] = packed;
                    if glyph.is_notdef() {
                        missing_glyph = Some(packed);
                    }
                } else if r.missing && self.skip_missing {
                    success = false;
                } else if r.missing && r.was_packed {
                    match missing_glyph {
                        Some(packed) => range.chardata[j] = packed,
                        None => success = false,
                    }
                } else if r.was_packed {
                    // nothing to draw, but the advance still applies
                    let advance = font.glyph_hmetrics(glyph).advance_width;
                    range.chardata[j] = PackedChar {
                        x0: r.x as u16,
                        y0: r.y as u16,
                        x1: r.x as u16,
                        y1: r.y as u16,
                        xadvance: scale * advance as f32,
                        ..bytemuck::Zeroable::zeroed()
                    };
                } else {
                    success = false;
                }
            }
        }
        success
    }
}

/// Returns the quad to draw for `packed` at the pen position, advancing
/// `xpos`.
///
/// With `align_to_integer` the quad is snapped to whole pixels.
pub fn packed_quad(
    packed: &PackedChar,
    atlas_width: u32,
    atlas_height: u32,
    xpos: &mut f32,
    ypos: f32,
    align_to_integer: bool,
) -> AlignedQuad {
    let ipw = 1.0 / atlas_width as f32;
    let iph = 1.0 / atlas_height as f32;
    let (x0, y0, x1, y1) = if align_to_integer {
        let x = (*xpos + packed.xoff + 0.5).floor();
        let y = (ypos + packed.yoff + 0.5).floor();
        (
            x,
            y,
            x + packed.xoff2 - packed.xoff,
            y + packed.yoff2 - packed.yoff,
        )
    } else {
        (
            *xpos + packed.xoff,
            ypos + packed.yoff,
            *xpos + packed.xoff2,
            ypos + packed.yoff2,
        )
    };
    *xpos += packed.xadvance;
    AlignedQuad {
        x0,
        y0,
        s0: packed.x0 as f32 * ipw,
        t0: packed.y0 as f32 * iph,
        x1,
        y1,
        s1: packed.x1 as f32 * ipw,
        t1: packed.y1 as f32 * iph,
    }
}

/// Returns the subpixel shift that recenters a glyph after a box filter of
/// width `oversample`, which moves it right by `(oversample - 1) / 2`
/// oversampled pixels.
pub fn oversample_shift(oversample: u32) -> f32 {
    if oversample == 0 {
        return 0.0;
    }
    -((oversample - 1) as f32) / (2.0 * oversample as f32)
}

/// Applies a horizontal box filter of `kernel_width` pixels in place.
///
/// The filter spreads each pixel right, so the rightmost `kernel_width - 1`
/// columns should start out empty. Widths outside `2..=8` do nothing.
pub fn h_prefilter(bitmap: &mut BitmapMut, kernel_width: u32) {
    if !(2..=MAX_OVERSAMPLE).contains(&kernel_width) {
        return;
    }
    let kernel = kernel_width as usize;
    let width = bitmap.width();
    for y in 0..bitmap.height() {
        let row = bitmap.row_mut(y);
        let mut buffer = [0u8; MAX_OVERSAMPLE as usize];
        let mut total = 0u32;
        let mut i = 0;
        while i + kernel <= width {
            total = total + row[i] as u32 - buffer[i & OVER_MASK] as u32;
            buffer[(i + kernel) & OVER_MASK] = row[i];
            row[i] = (total / kernel_width) as u8;
            i += 1;
        }
        while i < width {
            total -= buffer[i & OVER_MASK] as u32;
            row[i] = (total / kernel_width) as u8;
            i += 1;
        }
    }
}

/// Applies a vertical box filter of `kernel_width` pixels in place.
///
/// The filter spreads each pixel down, so the bottom `kernel_width - 1`
/// rows should start out empty. Widths outside `2..=8` do nothing.
pub fn v_prefilter(bitmap: &mut BitmapMut, kernel_width: u32) {
    if !(2..=MAX_OVERSAMPLE).contains(&kernel_width) {
        return;
    }
    let kernel = kernel_width as usize;
    let height = bitmap.height();
    for x in 0..bitmap.width() {
        let mut buffer = [0u8; MAX_OVERSAMPLE as usize];
        let mut total = 0u32;
        let mut i = 0;
        while i + kernel <= height {
            let pixel = &mut bitmap.row_mut(i)[x];
            total = total + *pixel as u32 - buffer[i & OVER_MASK] as u32;
            buffer[(i + kernel) & OVER_MASK] = *pixel;
            *pixel = (total / kernel_width) as u8;
            i += 1;
        }
        while i < height {
            total -= buffer[i & OVER_MASK] as u32;
            bitmap.row_mut(i)[x] = (total / kernel_width) as u8;
            i += 1;
        }
    }
}

/// Returns the glyph for each codepoint of `range`, in range order.
///
/// This is the order of the rects from
/// [`gather_rects`](PackContext::gather_rects) and of `chardata`.
pub fn range_glyphs(font: &FontInfo, range: &PackRange) -> Vec<GlyphId> {
    range
        .codepoints
        .iter()
        .map(|codepoint| font.find_glyph_index(codepoint))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use font_test_data::ttf;
    use pretty_assertions::assert_eq;

    fn font_data() -> Vec<u8> {
        ttf::mono()
    }

    fn overlaps(a: &PackedChar, b: &PackedChar) -> bool {
        a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
    }

    #[test]
    fn pack_ascii() {
        let _ = env_logger::builder().is_test(true).try_init();
        let data = font_data();
        let font = FontInfo::new(&data, 0).unwrap();
        let mut context = PackContext::begin(512, 512, 0, 1);
        let mut range = PackRange::span(RangeSize::PixelHeight(32.0), 32, 95);
        assert!(context.pack_font_range(&font, &mut range));
        let chars = &range.chardata;
        assert_eq!(chars.len(), 95);
        // space has no pixels but still advances
        assert_eq!(chars[0].x0, chars[0].x1);
        assert_eq!(chars[0].xadvance, 32.0 / 1000.0 * ttf::ADVANCE as f32);
        for (i, a) in chars.iter().enumerate().skip(1) {
            assert!(a.x1 > a.x0 && a.y1 > a.y0, "char {i}");
            assert!(a.x1 as u32 <= 512 && a.y1 as u32 <= 512);
            for b in &chars[i + 1..] {
                assert!(!overlaps(a, b));
            }
        }
        // the box glyph is fully covered inside its rect
        let h = &chars[(b'H' - 32) as usize];
        let pixels = context.pixels();
        let center = (h.y0 as usize + h.y1 as usize) / 2 * 512 + (h.x0 as usize + h.x1 as usize) / 2;
        assert_eq!(pixels[center], 255);
        // and the padding row above it is empty
        assert_eq!(pixels[(h.y0 as usize - 1) * 512 + h.x0 as usize], 0);
    }

    #[test]
    fn quad_offsets_match_bitmap_box() {
        let data = font_data();
        let font = FontInfo::new(&data, 0).unwrap();
        let mut context = PackContext::begin(256, 256, 0, 1);
        let mut range = PackRange::new(RangeSize::Em(100.0), Codepoints::List(&['H' as u32]));
        assert!(context.pack_font_range(&font, &mut range));
        let h = range.chardata[0];
        // BOX is 100..500 by 0..500 at 0.1 pixels per unit
        assert_eq!((h.xoff, h.yoff), (10.0, -50.0));
        assert_eq!((h.xoff2, h.yoff2), (50.0, 0.0));
        assert_eq!((h.x1 - h.x0, h.y1 - h.y0), (40, 50));
        let mut xpos = 0.0;
        let quad = packed_quad(&h, 256, 256, &mut xpos, 100.0, true);
        assert_eq!((quad.x0, quad.y0, quad.x1, quad.y1), (10.0, 50.0, 50.0, 100.0));
        assert_eq!(quad.s0, h.x0 as f32 / 256.0);
        assert_eq!(xpos, 60.0);
    }

    #[test]
    fn overflow_marks_remaining_rects_unpacked() {
        let data = font_data();
        let font = FontInfo::new(&data, 0).unwrap();
        let mut context = PackContext::begin(64, 64, 0, 1);
        let mut ranges = [PackRange::span(RangeSize::PixelHeight(32.0), 33, 94)];
        let mut rects = context.gather_rects(&font, &mut ranges);
        context.pack_rects(&mut rects);
        let first_unpacked = rects.iter().position(|r| !r.was_packed).unwrap();
        assert!(first_unpacked > 0);
        assert!(rects[first_unpacked..].iter().all(|r| !r.was_packed));
        assert!(!context.render_into_rects(&font, &mut ranges, &mut rects));
        assert_eq!(
            ranges[0].chardata[first_unpacked],
            PackedChar::default()
        );
        assert_ne!(ranges[0].chardata[0], PackedChar::default());
    }

    #[test]
    fn missing_glyphs_share_notdef() {
        let data = font_data();
        let font = FontInfo::new(&data, 0).unwrap();
        let first = ['A' as u32, 0x10FFFF, 'B' as u32];
        let second = [0x10FFFE];
        let mut ranges = [
            PackRange::new(RangeSize::PixelHeight(20.0), Codepoints::List(&first)),
            PackRange::new(RangeSize::PixelHeight(20.0), Codepoints::List(&second)),
        ];
        let mut context = PackContext::begin(256, 256, 0, 1);
        let rects = context.gather_rects(&font, &mut ranges);
        // only the first missing glyph is given space
        assert!(rects[1].missing && rects[1].w > 0);
        assert!(rects[3].missing && rects[3].w == 0);
        assert!(context.pack_font_ranges(&font, &mut ranges));
        let notdef = ranges[0].chardata[1];
        assert!(notdef.x1 > notdef.x0);
        assert_eq!(ranges[1].chardata[0], notdef);
    }

    #[test]
    fn skip_missing_glyphs() {
        let data = font_data();
        let font = FontInfo::new(&data, 0).unwrap();
        let codepoints = ['A' as u32, 0x10FFFF, 'B' as u32];
        let mut range = PackRange::new(RangeSize::PixelHeight(20.0), Codepoints::List(&codepoints));
        let mut context = PackContext::begin(256, 256, 0, 1);
        context.set_skip_missing_codepoints(true);
        assert!(!context.pack_font_range(&font, &mut range));
        assert_eq!(range.chardata[1], PackedChar::default());
        assert!(range.chardata[0].x1 > range.chardata[0].x0);
        assert!(range.chardata[2].x1 > range.chardata[2].x0);
    }

    #[test]
    fn oversampling() {
        let data = font_data();
        let font = FontInfo::new(&data, 0).unwrap();
        let mut context = PackContext::begin(256, 256, 0, 1);
        // out of range factors are ignored
        context.set_oversampling(2, 9);
        let mut ranges = [PackRange::new(RangeSize::Em(100.0), Codepoints::List(&['H' as u32]))];
        let rects = context.gather_rects(&font, &mut ranges);
        // 80 oversampled pixels wide plus padding and filter room
        assert_eq!((rects[0].w, rects[0].h), (80 + 1 + 1, 50 + 1));
        assert!(context.pack_font_ranges(&font, &mut ranges));
        let h = ranges[0].chardata[0];
        assert_eq!(h.x1 - h.x0, 81);
        assert_eq!(h.xoff, 10.0 - 0.25);
        assert_eq!(h.xoff2, 10.0 + 81.0 / 2.0 - 0.25);
        // the glyph spans 40.5 output pixels after filtering
        assert_eq!(h.xoff2 - h.xoff, 40.5);
    }

    #[test]
    fn prefilters() {
        let mut pixels = [0, 0, 255, 255, 0, 0, 0, 0];
        let mut row = BitmapMut::new(&mut pixels, 8, 1, 0);
        h_prefilter(&mut row, 3);
        assert_eq!(pixels, [0, 0, 85, 170, 170, 85, 0, 0]);

        let mut pixels = [255, 255, 0, 0, 0, 0];
        let mut column = BitmapMut::new(&mut pixels, 1, 6, 0);
        v_prefilter(&mut column, 2);
        assert_eq!(pixels, [127, 255, 127, 0, 0, 0]);

        let mut pixels = [10, 20, 30];
        h_prefilter(&mut BitmapMut::new(&mut pixels, 3, 1, 0), 9);
        assert_eq!(pixels, [10, 20, 30]);
    }

    #[test]
    fn shifts() {
        assert_eq!(oversample_shift(0), 0.0);
        assert_eq!(oversample_shift(1), 0.0);
        assert_eq!(oversample_shift(2), -0.25);
        assert_eq!(oversample_shift(4), -0.375);
    }

    #[test]
    fn vertical_metrics() {
        let data = font_data();
        let font = FontInfo::new(&data, 0).unwrap();
        let metrics = scaled_font_vmetrics(&font, RangeSize::PixelHeight(100.0));
        assert!((metrics.ascent - 80.0).abs() < 1e-4);
        assert!((metrics.descent + 20.0).abs() < 1e-4);
        assert!((metrics.line_gap - 9.0).abs() < 1e-4);
        let metrics = scaled_font_vmetrics(&font, RangeSize::Em(100.0));
        assert!((metrics.ascent - 80.0).abs() < 1e-4);
    }

    #[test]
    fn codepoint_lists() {
        let span = Codepoints::Span { first: 65, count: 3 };
        assert_eq!(span.iter().collect::<Vec<_>>(), [65, 66, 67]);
        assert_eq!(span.get(3), None);
        let list = Codepoints::List(&[5, 1]);
        assert_eq!(list.len(), 2);
        assert_eq!(list.iter().collect::<Vec<_>>(), [5, 1]);
        let data = font_data();
        let font = FontInfo::new(&data, 0).unwrap();
        let range = PackRange::span(RangeSize::Em(10.0), 'A' as u32, 2);
        assert_eq!(
            range_glyphs(&font, &range),
            [GlyphId::new(ttf::GID_A), GlyphId::new(ttf::GID_B)]
        );
    }

    #[test]
    fn rects_follow_range_glyphs() {
        let data = font_data();
        let font = FontInfo::new(&data, 0).unwrap();
        let codepoints = ['H' as u32, 0x10FFFF, ' ' as u32, 'A' as u32];
        let mut ranges = [PackRange::new(
            RangeSize::PixelHeight(24.0),
            Codepoints::List(&codepoints),
        )];
        let context = PackContext::begin(256, 256, 0, 1);
        let rects = context.gather_rects(&font, &mut ranges);
        let glyphs = range_glyphs(&font, &ranges[0]);
        assert_eq!(rects.len(), glyphs.len());
        let scale = Scale::uniform(font.scale_for_pixel_height(24.0));
        for (rect, glyph) in rects.iter().zip(&glyphs) {
            assert_eq!(rect.missing, glyph.is_notdef());
            let bbox = bitmap::glyph_bitmap_box(&font, *glyph, scale);
            // one pixel of padding, no oversampling
            assert_eq!(rect.w as i32, bbox.width() + 1);
            assert_eq!(rect.h as i32, bbox.height() + 1);
        }
    }

    #[test]
    fn packed_chars_cast_to_bytes() {
        let chars = [PackedChar::default(); 2];
        assert_eq!(bytemuck::cast_slice::<_, u8>(&chars).len(), 2 * 28);
    }
}
