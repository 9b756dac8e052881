//! TrueType outlines.

use alloc::vec::Vec;

#[cfg(feature = "libm")]
#[allow(unused_imports)]
use core_maths::CoreFloat;

use font_read::{ByteCursor, FontInfo};

use super::GLYF_COMPOSITE_RECURSION_LIMIT;
use crate::{DrawError, GlyphId, Vertex, VertexKind};

// simple glyph flags
const ON_CURVE_POINT: u8 = 0x01;
const X_SHORT_VECTOR: u8 = 0x02;
const Y_SHORT_VECTOR: u8 = 0x04;
const REPEAT_FLAG: u8 = 0x08;
const X_IS_SAME_OR_POSITIVE: u8 = 0x10;
const Y_IS_SAME_OR_POSITIVE: u8 = 0x20;

// composite glyph flags
const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const ARGS_ARE_XY_VALUES: u16 = 0x0002;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

/// Loads the outline of a TrueType glyph.
pub fn glyph_shape(font: &FontInfo, glyph: GlyphId) -> Result<Vec<Vertex>, DrawError> {
    if glyph.to_u32() >= font.num_glyphs() {
        return Err(DrawError::GlyphNotFound(glyph));
    }
    let mut vertices = Vec::new();
    load(font, glyph, 0, &mut vertices)?;
    Ok(vertices)
}

fn load(
    font: &FontInfo,
    glyph: GlyphId,
    depth: usize,
    vertices: &mut Vec<Vertex>,
) -> Result<(), DrawError> {
    let Some(range) = font.glyph_data_range(glyph) else {
        return Ok(());
    };
    let data = font.cursor().slice(range);
    let number_of_contours = data.i16_at(0);
    if number_of_contours > 0 {
        load_simple(data, number_of_contours as usize, vertices);
    } else if number_of_contours < 0 {
        load_composite(font, data, depth, vertices)?;
    }
    Ok(())
}

/// A point as stored in the glyph, before conversion to vertices.
#[derive(Clone, Copy, Default)]
struct RawPoint {
    x: i32,
    y: i32,
    flags: u8,
}

impl RawPoint {
    fn is_on_curve(&self) -> bool {
        self.flags & ON_CURVE_POINT != 0
    }
}

fn load_simple(data: ByteCursor, number_of_contours: usize, vertices: &mut Vec<Vertex>) {
    let end_points = 10;
    let instruction_len = data.u16_at(end_points + number_of_contours * 2) as usize;
    let num_points = 1 + data.u16_at(end_points + number_of_contours * 2 - 2) as usize;
    let mut cursor = data;
    cursor.seek(end_points + number_of_contours * 2 + 2 + instruction_len);

    let mut points = alloc::vec![RawPoint::default(); num_points];
    let mut flags = 0;
    let mut repeat = 0;
    for point in points.iter_mut() {
        if repeat == 0 {
            flags = cursor.get8();
            if flags & REPEAT_FLAG != 0 {
                repeat = cursor.get8();
            }
        } else {
            repeat -= 1;
        }
        point.flags = flags;
    }
    let mut x = 0i32;
    for point in points.iter_mut() {
        if point.flags & X_SHORT_VECTOR != 0 {
            let dx = cursor.get8() as i32;
            x += if point.flags & X_IS_SAME_OR_POSITIVE != 0 {
                dx
            } else {
                -dx
            };
        } else if point.flags & X_IS_SAME_OR_POSITIVE == 0 {
            x += cursor.get16() as i16 as i32;
        }
        point.x = x as i16 as i32;
    }
    let mut y = 0i32;
    for point in points.iter_mut() {
        if point.flags & Y_SHORT_VECTOR != 0 {
            let dy = cursor.get8() as i32;
            y += if point.flags & Y_IS_SAME_OR_POSITIVE != 0 {
                dy
            } else {
                -dy
            };
        } else if point.flags & Y_IS_SAME_OR_POSITIVE == 0 {
            y += cursor.get16() as i16 as i32;
        }
        point.y = y as i16 as i32;
    }

    vertices.reserve(num_points + 2 * number_of_contours);
    let mut contour = ContourState::default();
    let mut next_move = 0;
    let mut contour_ix = 0;
    let mut i = 0;
    while i < num_points {
        let point = points[i];
        if next_move == i {
            if i != 0 {
                contour.close(vertices);
            }
            contour = ContourState::default();
            contour.start_off = !point.is_on_curve();
            if contour.start_off {
                // find an on-curve start and remember the off-curve point
                // for when the contour wraps around
                contour.scx = point.x;
                contour.scy = point.y;
                let next = points.get(i + 1).copied().unwrap_or(point);
                if !next.is_on_curve() {
                    contour.sx = (point.x + next.x) >> 1;
                    contour.sy = (point.y + next.y) >> 1;
                } else {
                    contour.sx = next.x;
                    contour.sy = next.y;
                    i += 1;
                }
            } else {
                contour.sx = point.x;
                contour.sy = point.y;
            }
            vertices.push(Vertex::move_to(contour.sx, contour.sy));
            next_move = 1 + data.u16_at(end_points + contour_ix * 2) as usize;
            contour_ix += 1;
        } else if !point.is_on_curve() {
            if contour.was_off {
                // implied on-curve point between two off-curve points
                vertices.push(Vertex::quad_to(
                    (contour.cx + point.x) >> 1,
                    (contour.cy + point.y) >> 1,
                    contour.cx,
                    contour.cy,
                ));
            }
            contour.cx = point.x;
            contour.cy = point.y;
            contour.was_off = true;
        } else {
            if contour.was_off {
                vertices.push(Vertex::quad_to(point.x, point.y, contour.cx, contour.cy));
            } else {
                vertices.push(Vertex::line_to(point.x, point.y));
            }
            contour.was_off = false;
        }
        i += 1;
    }
    contour.close(vertices);
}

/// Tracking for the contour being converted.
#[derive(Default)]
struct ContourState {
    /// The contour began with an off-curve point.
    start_off: bool,
    /// The previous point was off-curve.
    was_off: bool,
    /// Start point.
    sx: i32,
    sy: i32,
    /// First off-curve point, when `start_off`.
    scx: i32,
    scy: i32,
    /// Pending control point.
    cx: i32,
    cy: i32,
}

impl ContourState {
    fn close(&self, vertices: &mut Vec<Vertex>) {
        if self.start_off {
            if self.was_off {
                vertices.push(Vertex::quad_to(
                    (self.cx + self.scx) >> 1,
                    (self.cy + self.scy) >> 1,
                    self.cx,
                    self.cy,
                ));
            }
            vertices.push(Vertex::quad_to(self.sx, self.sy, self.scx, self.scy));
        } else if self.was_off {
            vertices.push(Vertex::quad_to(self.sx, self.sy, self.cx, self.cy));
        } else {
            vertices.push(Vertex::line_to(self.sx, self.sy));
        }
    }
}

fn load_composite(
    font: &FontInfo,
    data: ByteCursor,
    depth: usize,
    vertices: &mut Vec<Vertex>,
) -> Result<(), DrawError> {
    let mut cursor = data;
    cursor.seek(10);
    loop {
        let flags = cursor.get16();
        let component = GlyphId::new(cursor.get16() as u32);
        // [a, b, c, d, e, f]
        let mut mtx = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
        let (arg1, arg2) = if flags & ARG_1_AND_2_ARE_WORDS != 0 {
            (cursor.get16() as i16 as f32, cursor.get16() as i16 as f32)
        } else {
            (cursor.get8() as i8 as f32, cursor.get8() as i8 as f32)
        };
        if flags & ARGS_ARE_XY_VALUES != 0 {
            mtx[4] = arg1;
            mtx[5] = arg2;
        } else {
            log::debug!("point matching for component {component} is not supported, using a zero offset");
        }
        if flags & WE_HAVE_A_SCALE != 0 {
            let scale = read_f2dot14(&mut cursor);
            mtx[0] = scale;
            mtx[3] = scale;
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            mtx[0] = read_f2dot14(&mut cursor);
            mtx[3] = read_f2dot14(&mut cursor);
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            mtx[0] = read_f2dot14(&mut cursor);
            mtx[1] = read_f2dot14(&mut cursor);
            mtx[2] = read_f2dot14(&mut cursor);
            mtx[3] = read_f2dot14(&mut cursor);
        }

        if depth >= GLYF_COMPOSITE_RECURSION_LIMIT {
            return Err(DrawError::RecursionLimitExceeded(component));
        }
        let start = vertices.len();
        load(font, component, depth + 1, vertices)?;
        transform(&mut vertices[start..], &mtx);

        if flags & MORE_COMPONENTS == 0 {
            break;
        }
    }
    Ok(())
}

fn read_f2dot14(cursor: &mut ByteCursor) -> f32 {
    cursor.get16() as i16 as f32 / 16384.0
}

/// Applies a component transform scaled by the length of each matrix row.
fn transform(vertices: &mut [Vertex], mtx: &[f32; 6]) {
    let m = (mtx[0] * mtx[0] + mtx[1] * mtx[1]).sqrt();
    let n = (mtx[2] * mtx[2] + mtx[3] * mtx[3]).sqrt();
    let apply = |x: i16, y: i16| {
        let (x, y) = (x as f32, y as f32);
        (
            (m * (mtx[0] * x + mtx[2] * y + mtx[4])) as i16,
            (n * (mtx[1] * x + mtx[3] * y + mtx[5])) as i16,
        )
    };
    for vertex in vertices {
        (vertex.x, vertex.y) = apply(vertex.x, vertex.y);
        (vertex.cx, vertex.cy) = apply(vertex.cx, vertex.cy);
        if vertex.kind == VertexKind::Cubic {
            (vertex.cx1, vertex.cy1) = apply(vertex.cx1, vertex.cy1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use font_test_data::ttf;
    use pretty_assertions::assert_eq;

    fn mono() -> Vec<u8> {
        ttf::mono()
    }

    #[test]
    fn curved_glyph() {
        let data = mono();
        let font = FontInfo::new(&data, 0).unwrap();
        let shape = glyph_shape(&font, GlyphId::new(ttf::GID_A)).unwrap();
        assert_eq!(
            shape,
            [
                Vertex::move_to(50, 0),
                Vertex::quad_to(300, 600, 150, 600),
                Vertex::quad_to(550, 0, 450, 600),
                Vertex::line_to(50, 0),
            ]
        );
    }

    #[test]
    fn box_glyph() {
        let data = mono();
        let font = FontInfo::new(&data, 0).unwrap();
        let shape = glyph_shape(&font, GlyphId::new(ttf::ascii_gid(b'H'))).unwrap();
        let [x0, y0, x1, y1] = ttf::BOX.map(|v| v as i32);
        assert_eq!(
            shape,
            [
                Vertex::move_to(x0, y0),
                Vertex::line_to(x0, y1),
                Vertex::line_to(x1, y1),
                Vertex::line_to(x1, y0),
                Vertex::line_to(x0, y0),
            ]
        );
    }

    #[test]
    fn contour_starting_off_curve() {
        let data = mono();
        let font = FontInfo::new(&data, 0).unwrap();
        let shape = glyph_shape(&font, GlyphId::new(ttf::GID_OFF_CURVE_START)).unwrap();
        assert_eq!(
            shape,
            [
                Vertex::move_to(450, 150),
                Vertex::quad_to(450, 450, 600, 300),
                Vertex::quad_to(150, 450, 300, 600),
                Vertex::quad_to(150, 150, 0, 300),
                Vertex::quad_to(450, 150, 300, 0),
            ]
        );
    }

    #[test]
    fn composite_transforms() {
        let data = mono();
        let font = FontInfo::new(&data, 0).unwrap();
        let shape = glyph_shape(&font, GlyphId::new(ttf::GID_COMPOSITE)).unwrap();
        // the scaled 'A' followed by the offset 'B'
        assert_eq!(shape.len(), 4 + 5);
        // scale 0.5 is applied to the matrix and again as the row length
        let scaled = |x: f32, y: f32| ((0.25 * x + 5.0) as i16, (0.25 * y + 10.0) as i16);
        assert_eq!((shape[0].x, shape[0].y), scaled(50.0, 0.0));
        assert_eq!((shape[1].x, shape[1].y), scaled(300.0, 600.0));
        assert_eq!((shape[1].cx, shape[1].cy), scaled(150.0, 600.0));
        assert_eq!((shape[2].x, shape[2].y), scaled(550.0, 0.0));
        let (dx, dy) = ttf::COMPONENT_OFFSET;
        let [x0, y0, _, y1] = ttf::BOX;
        assert_eq!(shape[4].kind, VertexKind::Move);
        assert_eq!((shape[4].x, shape[4].y), (x0 + dx, y0 + dy));
        assert_eq!((shape[5].x, shape[5].y), (x0 + dx, y1 + dy));
    }

    #[test]
    fn composite_cycle_is_bounded() {
        let data = mono();
        let font = FontInfo::new(&data, 0).unwrap();
        let gid = GlyphId::new(ttf::GID_RECURSIVE);
        assert_eq!(
            glyph_shape(&font, gid),
            Err(DrawError::RecursionLimitExceeded(gid))
        );
    }

    #[test]
    fn point_matching_uses_zero_offset() {
        let mut glyphs = ttf::glyphs();
        glyphs[ttf::GID_RECURSIVE as usize] = ttf::composite_glyph(
            [0, 0, 600, 600],
            &[
                ttf::Component {
                    anchor: true,
                    ..ttf::Component::offset(ttf::GID_B as u16, 1000, 1000)
                },
                ttf::Component::offset(ttf::GID_B as u16, 0, 50),
            ],
        );
        let (glyf, loca) = ttf::glyf_loca(&glyphs, false);
        let data = ttf::mono_builder()
            .add_raw(*b"glyf", glyf)
            .add_raw(*b"loca", loca)
            .build();
        let font = FontInfo::new(&data, 0).unwrap();
        let shape = glyph_shape(&font, GlyphId::new(ttf::GID_RECURSIVE)).unwrap();
        assert_eq!(shape.len(), 10);
        assert_eq!((shape[0].x, shape[0].y), (ttf::BOX[0], ttf::BOX[1]));
        // the word sized anchor arguments were consumed
        assert_eq!((shape[5].x, shape[5].y), (ttf::BOX[0], ttf::BOX[1] + 50));
    }

    #[test]
    fn long_loca_offsets() {
        let data = ttf::mono_long_loca();
        let font = FontInfo::new(&data, 0).unwrap();
        let short = mono();
        let short_font = FontInfo::new(&short, 0).unwrap();
        for gid in [0, ttf::GID_A, ttf::GID_COMPOSITE, ttf::GID_OFF_CURVE_START] {
            let gid = GlyphId::new(gid);
            assert_eq!(glyph_shape(&font, gid), glyph_shape(&short_font, gid));
        }
    }

    #[test]
    fn truncated_glyph_data_does_not_panic() {
        let mut glyphs = ttf::glyphs();
        for glyph in glyphs.iter_mut() {
            let len = glyph.len();
            glyph.truncate(len.saturating_sub(7));
        }
        let (glyf, loca) = ttf::glyf_loca(&glyphs, false);
        let data = ttf::mono_builder()
            .add_raw(*b"glyf", glyf)
            .add_raw(*b"loca", loca)
            .build();
        let font = FontInfo::new(&data, 0).unwrap();
        for gid in 0..ttf::NUM_GLYPHS + 2 {
            let _ = glyph_shape(&font, GlyphId::new(gid));
        }
    }
}
