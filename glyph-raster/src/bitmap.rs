//! Rendering single glyphs to 8-bit coverage bitmaps.

use alloc::vec::Vec;

#[cfg(feature = "libm")]
#[allow(unused_imports)]
use core_maths::CoreFloat;

use font_read::FontInfo;

use crate::{outline, pack, raster, BoundingBox, GlyphId, FLATNESS_IN_PIXELS};

/// Scale factors from font units to pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Scale {
    pub x: f32,
    pub y: f32,
}

impl Scale {
    /// The same scale on both axes.
    pub const fn uniform(scale: f32) -> Self {
        Self { x: scale, y: scale }
    }
}

/// A subpixel offset applied after scaling.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Shift {
    pub x: f32,
    pub y: f32,
}

impl Shift {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };
}

/// A mutable view of an 8-bit bitmap with rows `stride` bytes apart.
#[derive(Debug)]
pub struct BitmapMut<'a> {
    pixels: &'a mut [u8],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> BitmapMut<'a> {
    /// Creates a view over `pixels`.
    ///
    /// A `stride` of 0 means rows are tightly packed. The height is reduced
    /// to the number of rows that fit in `pixels`.
    pub fn new(pixels: &'a mut [u8], width: usize, height: usize, stride: usize) -> Self {
        let stride = stride.max(width);
        let height = if width == 0 || pixels.len() < width {
            0
        } else {
            height.min((pixels.len() - width) / stride + 1)
        };
        Self {
            pixels,
            width,
            height,
            stride,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The underlying bytes, including any padding between rows.
    pub fn pixels(&self) -> &[u8] {
        self.pixels
    }

    /// The pixel at `(x, y)`, or 0 outside the bitmap.
    pub fn get(&self, x: usize, y: usize) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.pixels[y * self.stride + x]
    }

    /// The pixels of row `y`; empty outside the bitmap.
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        if y >= self.height {
            return &mut [];
        }
        let start = y * self.stride;
        self.pixels
            .get_mut(start..start + self.width)
            .unwrap_or_default()
    }

    /// A view of the rectangle at `(x, y)`, clipped to this bitmap.
    pub fn region(&mut self, x: usize, y: usize, width: usize, height: usize) -> BitmapMut<'_> {
        let x = x.min(self.width);
        let y = y.min(self.height);
        let width = width.min(self.width - x);
        let height = height.min(self.height - y);
        let start = (y * self.stride + x).min(self.pixels.len());
        BitmapMut::new(&mut self.pixels[start..], width, height, self.stride)
    }

    /// Sets every pixel to zero.
    pub fn clear(&mut self) {
        for y in 0..self.height {
            self.row_mut(y).fill(0);
        }
    }
}

/// An owned bitmap for a single glyph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bitmap {
    pub width: usize,
    pub height: usize,
    /// Offset from the pen position to the left edge of the bitmap.
    pub xoff: i32,
    /// Offset from the baseline to the top edge of the bitmap, y down.
    pub yoff: i32,
    /// Tightly packed rows, top to bottom.
    pub pixels: Vec<u8>,
}

impl Bitmap {
    /// The pixel at `(x, y)`, or 0 outside the bitmap.
    pub fn get(&self, x: usize, y: usize) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.pixels[y * self.width + x]
    }
}

/// Returns the pixel bounds of `glyph` at the given scale and shift, with y
/// pointing down.
///
/// Glyphs without a bounding box, such as a space, get an all zero box.
pub fn glyph_bitmap_box_subpixel(
    font: &FontInfo,
    glyph: GlyphId,
    scale: Scale,
    shift: Shift,
) -> BoundingBox {
    match outline::glyph_box(font, glyph) {
        Some(bbox) => BoundingBox {
            x0: (bbox.x0 as f32 * scale.x + shift.x).floor() as i32,
            y0: (-bbox.y1 as f32 * scale.y + shift.y).floor() as i32,
            x1: (bbox.x1 as f32 * scale.x + shift.x).ceil() as i32,
            y1: (-bbox.y0 as f32 * scale.y + shift.y).ceil() as i32,
        },
        None => BoundingBox::default(),
    }
}

/// Returns the pixel bounds of `glyph` at the given scale.
pub fn glyph_bitmap_box(font: &FontInfo, glyph: GlyphId, scale: Scale) -> BoundingBox {
    glyph_bitmap_box_subpixel(font, glyph, scale, Shift::ZERO)
}

pub fn codepoint_bitmap_box_subpixel(
    font: &FontInfo,
    codepoint: u32,
    scale: Scale,
    shift: Shift,
) -> BoundingBox {
    glyph_bitmap_box_subpixel(font, font.find_glyph_index(codepoint), scale, shift)
}

pub fn codepoint_bitmap_box(font: &FontInfo, codepoint: u32, scale: Scale) -> BoundingBox {
    codepoint_bitmap_box_subpixel(font, codepoint, scale, Shift::ZERO)
}

/// Renders `glyph` into a newly allocated bitmap.
///
/// A zero scale on one axis takes the scale of the other. Returns `None`
/// when both are zero or the glyph covers no pixels.
pub fn glyph_bitmap_subpixel(
    font: &FontInfo,
    scale: Scale,
    shift: Shift,
    glyph: GlyphId,
) -> Option<Bitmap> {
    let mut scale = scale;
    if scale.x == 0.0 {
        scale.x = scale.y;
    }
    if scale.y == 0.0 {
        if scale.x == 0.0 {
            return None;
        }
        scale.y = scale.x;
    }
    let bbox = glyph_bitmap_box_subpixel(font, glyph, scale, shift);
    let width = usize::try_from(bbox.width()).ok()?;
    let height = usize::try_from(bbox.height()).ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    let vertices = outline::shape_or_empty(font, glyph);
    let mut pixels = alloc::vec![0u8; width * height];
    raster::rasterize(
        &mut BitmapMut::new(&mut pixels, width, height, width),
        FLATNESS_IN_PIXELS,
        &vertices,
        scale,
        shift,
        (bbox.x0, bbox.y0),
        true,
    );
    Some(Bitmap {
        width,
        height,
        xoff: bbox.x0,
        yoff: bbox.y0,
        pixels,
    })
}

/// Renders `glyph` into a newly allocated bitmap.
pub fn glyph_bitmap(font: &FontInfo, scale: Scale, glyph: GlyphId) -> Option<Bitmap> {
    glyph_bitmap_subpixel(font, scale, Shift::ZERO, glyph)
}

pub fn codepoint_bitmap_subpixel(
    font: &FontInfo,
    scale: Scale,
    shift: Shift,
    codepoint: u32,
) -> Option<Bitmap> {
    glyph_bitmap_subpixel(font, scale, shift, font.find_glyph_index(codepoint))
}

pub fn codepoint_bitmap(font: &FontInfo, scale: Scale, codepoint: u32) -> Option<Bitmap> {
    codepoint_bitmap_subpixel(font, scale, Shift::ZERO, codepoint)
}

/// Renders `glyph` into `output`, whose top left corner is placed at the
/// top left of the glyph's bitmap box.
///
/// Parts of the glyph beyond the size of `output` are clipped.
pub fn make_glyph_bitmap_subpixel(
    font: &FontInfo,
    output: &mut BitmapMut,
    scale: Scale,
    shift: Shift,
    glyph: GlyphId,
) {
    let bbox = glyph_bitmap_box_subpixel(font, glyph, scale, shift);
    if output.width() == 0 || output.height() == 0 {
        return;
    }
    let vertices = outline::shape_or_empty(font, glyph);
    raster::rasterize(
        output,
        FLATNESS_IN_PIXELS,
        &vertices,
        scale,
        shift,
        (bbox.x0, bbox.y0),
        true,
    );
}

pub fn make_glyph_bitmap(font: &FontInfo, output: &mut BitmapMut, scale: Scale, glyph: GlyphId) {
    make_glyph_bitmap_subpixel(font, output, scale, Shift::ZERO, glyph);
}

pub fn make_codepoint_bitmap_subpixel(
    font: &FontInfo,
    output: &mut BitmapMut,
    scale: Scale,
    shift: Shift,
    codepoint: u32,
) {
    make_glyph_bitmap_subpixel(font, output, scale, shift, font.find_glyph_index(codepoint));
}

pub fn make_codepoint_bitmap(font: &FontInfo, output: &mut BitmapMut, scale: Scale, codepoint: u32) {
    make_codepoint_bitmap_subpixel(font, output, scale, Shift::ZERO, codepoint);
}

/// Renders an oversampled `glyph` into `output` and box filters it.
///
/// `oversample` gives the filter width on each axis; `output` should be
/// `oversample - 1` pixels larger than the glyph on each axis to hold the
/// filter's spread. Returns the subpixel shift that recenters the filtered
/// glyph, in output pixels.
pub fn make_glyph_bitmap_subpixel_prefilter(
    font: &FontInfo,
    output: &mut BitmapMut,
    scale: Scale,
    shift: Shift,
    oversample: (u32, u32),
    glyph: GlyphId,
) -> (f32, f32) {
    let (h_over, v_over) = oversample;
    let inner_width = output
        .width()
        .saturating_sub(h_over.saturating_sub(1) as usize);
    let inner_height = output
        .height()
        .saturating_sub(v_over.saturating_sub(1) as usize);
    make_glyph_bitmap_subpixel(
        font,
        &mut output.region(0, 0, inner_width, inner_height),
        scale,
        shift,
        glyph,
    );
    if h_over > 1 {
        pack::h_prefilter(output, h_over);
    }
    if v_over > 1 {
        pack::v_prefilter(output, v_over);
    }
    (pack::oversample_shift(h_over), pack::oversample_shift(v_over))
}

pub fn make_codepoint_bitmap_subpixel_prefilter(
    font: &FontInfo,
    output: &mut BitmapMut,
    scale: Scale,
    shift: Shift,
    oversample: (u32, u32),
    codepoint: u32,
) -> (f32, f32) {
    make_glyph_bitmap_subpixel_prefilter(
        font,
        output,
        scale,
        shift,
        oversample,
        font.find_glyph_index(codepoint),
    )
}
