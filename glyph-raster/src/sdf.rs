//! Signed distance fields.
//!
//! Each pixel stores the distance from its center to the nearest point of
//! the outline, positive inside the glyph and negative outside, remapped to
//! a byte with [`SdfParams`]. Distances are computed exactly against lines
//! and quadratic curves; cubic segments do not contribute.

use alloc::vec::Vec;

#[cfg(feature = "libm")]
#[allow(unused_imports)]
use core_maths::CoreFloat;

use font_read::FontInfo;

use crate::{
    bitmap::{self, Bitmap, Scale},
    outline, GlyphId, Vertex, VertexKind,
};

/// A signed distance field bitmap, one byte per pixel.
pub type SdfBitmap = Bitmap;

/// Controls the extent of a signed distance field and how distances map to
/// bytes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SdfParams {
    /// Extra pixels around the glyph box on every side.
    pub padding: i32,
    /// The byte value for points exactly on the outline.
    pub onedge_value: u8,
    /// Byte units per pixel of distance. Larger values give a steeper
    /// field that saturates closer to the outline.
    pub pixel_dist_scale: f32,
}

impl Default for SdfParams {
    fn default() -> Self {
        Self {
            padding: 5,
            onedge_value: 180,
            pixel_dist_scale: 36.0,
        }
    }
}

/// An outline prepared for distance queries at a fixed scale.
#[derive(Clone, Debug)]
pub struct SdfShape {
    vertices: Vec<Vertex>,
    scale_x: f32,
    scale_y: f32,
    /// Reciprocal segment lengths for lines, and of the squared second
    /// derivative for curves. Zero for degenerate segments.
    precompute: Vec<f32>,
}

impl SdfShape {
    /// Prepares `vertices` for sampling at `scale` pixels per font unit.
    pub fn new(vertices: Vec<Vertex>, scale: f32) -> Self {
        let scale_x = scale;
        // y down
        let scale_y = -scale;
        let scaled = |x: i16, y: i16| (x as f32 * scale_x, y as f32 * scale_y);
        let precompute = (0..vertices.len())
            .map(|i| {
                let v = vertices[i];
                let prev = vertices[if i == 0 { vertices.len() - 1 } else { i - 1 }];
                match v.kind {
                    VertexKind::Line => {
                        let (x0, y0) = scaled(v.x, v.y);
                        let (x1, y1) = scaled(prev.x, prev.y);
                        let dist = ((x1 - x0) * (x1 - x0) + (y1 - y0) * (y1 - y0)).sqrt();
                        if dist == 0.0 {
                            0.0
                        } else {
                            1.0 / dist
                        }
                    }
                    VertexKind::Curve => {
                        let (x2, y2) = scaled(prev.x, prev.y);
                        let (x1, y1) = scaled(v.cx, v.cy);
                        let (x0, y0) = scaled(v.x, v.y);
                        let bx = x0 - 2.0 * x1 + x2;
                        let by = y0 - 2.0 * y1 + y2;
                        let len2 = bx * bx + by * by;
                        if len2 != 0.0 {
                            1.0 / len2
                        } else {
                            0.0
                        }
                    }
                    _ => 0.0,
                }
            })
            .collect();
        Self {
            vertices,
            scale_x,
            scale_y,
            precompute,
        }
    }

    fn scaled(&self, x: i16, y: i16) -> (f32, f32) {
        (x as f32 * self.scale_x, y as f32 * self.scale_y)
    }

    /// Returns the signed distance in pixels from `(sx, sy)` to the
    /// outline, where pixel space has y pointing down. Points inside the
    /// outline are positive.
    pub fn signed_distance(&self, sx: f32, sy: f32) -> f32 {
        let winding =
            compute_crossings_x(sx / self.scale_x, sy / self.scale_y, &self.vertices);
        let mut min_dist = 999999.0f32;
        for (i, v) in self.vertices.iter().enumerate().skip(1) {
            let prev = self.vertices[i - 1];
            let (x0, y0) = self.scaled(v.x, v.y);
            match v.kind {
                VertexKind::Line if self.precompute[i] != 0.0 => {
                    let (x1, y1) = self.scaled(prev.x, prev.y);
                    let dist2 = (x0 - sx) * (x0 - sx) + (y0 - sy) * (y0 - sy);
                    if dist2 < min_dist * min_dist {
                        min_dist = dist2.sqrt();
                    }
                    let dist = ((x1 - x0) * (y0 - sy) - (y1 - y0) * (x0 - sx)).abs()
                        * self.precompute[i];
                    if dist < min_dist {
                        // only when the nearest point lies within the segment
                        let (dx, dy) = (x1 - x0, y1 - y0);
                        let (px, py) = (x0 - sx, y0 - sy);
                        let t = -(px * dx + py * dy) / (dx * dx + dy * dy);
                        if (0.0..=1.0).contains(&t) {
                            min_dist = dist;
                        }
                    }
                }
                VertexKind::Curve => {
                    let (x2, y2) = self.scaled(prev.x, prev.y);
                    let (x1, y1) = self.scaled(v.cx, v.cy);
                    let box_x0 = x0.min(x1).min(x2);
                    let box_y0 = y0.min(y1).min(y2);
                    let box_x1 = x0.max(x1).max(x2);
                    let box_y1 = y0.max(y1).max(y2);
                    if sx > box_x0 - min_dist
                        && sx < box_x1 + min_dist
                        && sy > box_y0 - min_dist
                        && sy < box_y1 + min_dist
                    {
                        let roots = nearest_curve_params(
                            (x0, y0),
                            (x1, y1),
                            (x2, y2),
                            (sx, sy),
                            self.precompute[i],
                        );
                        let dist2 = (x0 - sx) * (x0 - sx) + (y0 - sy) * (y0 - sy);
                        if dist2 < min_dist * min_dist {
                            min_dist = dist2.sqrt();
                        }
                        for t in roots.iter().filter(|t| (0.0..=1.0).contains(*t)) {
                            let it = 1.0 - t;
                            let px = it * it * x0 + 2.0 * t * it * x1 + t * t * x2;
                            let py = it * it * y0 + 2.0 * t * it * y1 + t * t * y2;
                            let dist2 = (px - sx) * (px - sx) + (py - sy) * (py - sy);
                            if dist2 < min_dist * min_dist {
                                min_dist = dist2.sqrt();
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        if winding == 0 {
            -min_dist
        } else {
            min_dist
        }
    }
}

/// Returns the curve parameters where the distance from `sample` to the
/// quadratic curve `p0 p1 p2` is stationary.
///
/// `a_inv` is the reciprocal squared length of the curve's second
/// derivative; zero means the curve is a line.
fn nearest_curve_params(
    (x0, y0): (f32, f32),
    (x1, y1): (f32, f32),
    (x2, y2): (f32, f32),
    (sx, sy): (f32, f32),
    a_inv: f32,
) -> Roots {
    let (ax, ay) = (x1 - x0, y1 - y0);
    let (bx, by) = (x0 - 2.0 * x1 + x2, y0 - 2.0 * y1 + y2);
    let (mx, my) = (x0 - sx, y0 - sy);
    if a_inv == 0.0 {
        // second degree
        let a = 3.0 * (ax * bx + ay * by);
        let b = 2.0 * (ax * ax + ay * ay) + (mx * bx + my * by);
        let c = mx * ax + my * ay;
        if a == 0.0 {
            if b != 0.0 {
                return Roots::one(-c / b);
            }
            return Roots::default();
        }
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return Roots::default();
        }
        let root = discriminant.sqrt();
        Roots::two((-b - root) / (2.0 * a), (-b + root) / (2.0 * a))
    } else {
        let b = 3.0 * (ax * bx + ay * by) * a_inv;
        let c = (2.0 * (ax * ax + ay * ay) + (mx * bx + my * by)) * a_inv;
        let d = (mx * ax + my * ay) * a_inv;
        solve_cubic(b, c, d)
    }
}

/// Up to three real roots.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Roots {
    values: [f32; 3],
    len: usize,
}

impl Roots {
    fn one(a: f32) -> Self {
        Self {
            values: [a, 0.0, 0.0],
            len: 1,
        }
    }

    fn two(a: f32, b: f32) -> Self {
        Self {
            values: [a, b, 0.0],
            len: 2,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> core::slice::Iter<'_, f32> {
        self.values[..self.len].iter()
    }
}

/// Solves `x^3 + a*x^2 + b*x + c = 0`.
///
/// With a single real root only that root is returned; otherwise all three
/// are, found with the trigonometric method.
pub fn solve_cubic(a: f32, b: f32, c: f32) -> Roots {
    let s = -a / 3.0;
    let p = b - a * a / 3.0;
    let q = a * (2.0 * a * a - 9.0 * b) / 27.0 + c;
    let p3 = p * p * p;
    let d = q * q + 4.0 * p3 / 27.0;
    if d >= 0.0 {
        let z = d.sqrt();
        let u = ((-q + z) / 2.0).cbrt();
        let v = ((-q - z) / 2.0).cbrt();
        Roots::one(s + u + v)
    } else {
        // p3 is negative here since d is
        let u = (-p / 3.0).sqrt();
        let v = (-(-27.0 / p3).sqrt() * q / 2.0).acos() / 3.0;
        let m = v.cos();
        let n = (v - core::f32::consts::FRAC_PI_2).cos() * 1.732_050_8;
        Roots {
            values: [s + u * 2.0 * m, s - u * (m + n), s - u * (m - n)],
            len: 3,
        }
    }
}

/// Returns the winding number of the outline around `(x, y)` in font
/// units, counting crossings of a ray towards negative x.
///
/// The sample is nudged off integer rows so the ray never passes exactly
/// through a vertex.
pub fn compute_crossings_x(x: f32, y: f32, vertices: &[Vertex]) -> i32 {
    let y_frac = y % 1.0;
    let y = if y_frac < 0.01 {
        y + 0.01
    } else if y_frac > 0.99 {
        y - 0.01
    } else {
        y
    };
    let mut winding = 0;
    let line_crossing = |(x0, y0): (i32, i32), (x1, y1): (i32, i32)| {
        if y > y0.min(y1) as f32 && y < y0.max(y1) as f32 && x > x0.min(x1) as f32 {
            let x_inter = (y - y0 as f32) / (y1 - y0) as f32 * (x1 - x0) as f32 + x0 as f32;
            if x_inter < x {
                return if y0 < y1 { 1 } else { -1 };
            }
        }
        0
    };
    for (i, v) in vertices.iter().enumerate().skip(1) {
        let prev = vertices[i - 1];
        let p0 = (prev.x as i32, prev.y as i32);
        let p2 = (v.x as i32, v.y as i32);
        match v.kind {
            VertexKind::Line => winding += line_crossing(p0, p2),
            VertexKind::Curve => {
                let p1 = (v.cx as i32, v.cy as i32);
                let ax = p0.0.min(p1.0).min(p2.0);
                let ay = p0.1.min(p1.1).min(p2.1);
                let by = p0.1.max(p1.1).max(p2.1);
                if y > ay as f32 && y < by as f32 && x > ax as f32 {
                    if p0 == p1 || p1 == p2 {
                        winding += line_crossing(p0, p2);
                    } else {
                        let to_f32 = |(x, y): (i32, i32)| (x as f32, y as f32);
                        for (hit_x, slope) in
                            ray_intersect_bezier((x, y), to_f32(p0), to_f32(p1), to_f32(p2))
                                .into_iter()
                                .flatten()
                        {
                            if hit_x < 0.0 {
                                winding += if slope < 0.0 { -1 } else { 1 };
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    winding
}

/// Intersects a horizontal ray through `origin` with the quadratic curve
/// `q0 q1 q2`.
///
/// Each hit is the signed distance along the ray from the origin paired
/// with the curve's vertical direction at that point.
fn ray_intersect_bezier(
    origin: (f32, f32),
    q0: (f32, f32),
    q1: (f32, f32),
    q2: (f32, f32),
) -> [Option<(f32, f32)>; 2] {
    let a = q0.1 - 2.0 * q1.1 + q2.1;
    let b = q1.1 - q0.1;
    let c = q0.1 - origin.1;
    let mut s = [0.0f32; 2];
    let mut num_s = 0;
    if a != 0.0 {
        let discr = b * b - a * c;
        if discr > 0.0 {
            let rcpna = -1.0 / a;
            let d = discr.sqrt();
            let s0 = (b + d) * rcpna;
            let s1 = (b - d) * rcpna;
            if (0.0..=1.0).contains(&s0) {
                s[num_s] = s0;
                num_s += 1;
            }
            if d > 0.0 && (0.0..=1.0).contains(&s1) {
                s[num_s] = s1;
                num_s += 1;
            }
        }
    } else {
        let s0 = c / (-2.0 * b);
        if (0.0..=1.0).contains(&s0) {
            s[0] = s0;
            num_s = 1;
        }
    }
    let q10 = q1.0 - q0.0;
    let q20 = q2.0 - q0.0;
    let q0r = q0.0 - origin.0;
    let hit = |t: f32| (q0r + t * (2.0 - 2.0 * t) * q10 + t * t * q20, a * t + b);
    let mut hits = [None; 2];
    for (slot, t) in hits.iter_mut().zip(&s[..num_s]) {
        *slot = Some(hit(*t));
    }
    hits
}

/// Computes the signed distance field of `glyph` at `scale`.
///
/// Returns `None` for a zero scale or a glyph without pixels.
pub fn glyph_sdf(
    font: &FontInfo,
    scale: f32,
    glyph: GlyphId,
    params: SdfParams,
) -> Option<SdfBitmap> {
    if scale == 0.0 {
        return None;
    }
    let bbox = bitmap::glyph_bitmap_box(font, glyph, Scale::uniform(scale));
    if bbox.x0 == bbox.x1 || bbox.y0 == bbox.y1 {
        return None;
    }
    let (ix0, iy0) = (bbox.x0 - params.padding, bbox.y0 - params.padding);
    let (ix1, iy1) = (bbox.x1 + params.padding, bbox.y1 + params.padding);
    let width = usize::try_from(ix1 - ix0).ok()?;
    let height = usize::try_from(iy1 - iy0).ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    let vertices = outline::shape_or_empty(font, glyph);
    if vertices.iter().any(|v| v.kind == VertexKind::Cubic) {
        log::debug!("cubic segments of {glyph} are left out of its distance field");
    }
    let shape = SdfShape::new(vertices, scale);
    let mut pixels = alloc::vec![0u8; width * height];
    for (row, y) in pixels.chunks_exact_mut(width).zip(iy0..iy1) {
        for (pixel, x) in row.iter_mut().zip(ix0..ix1) {
            let dist = shape.signed_distance(x as f32 + 0.5, y as f32 + 0.5);
            let value = params.onedge_value as f32 + params.pixel_dist_scale * dist;
            *pixel = value.clamp(0.0, 255.0) as u8;
        }
    }
    Some(SdfBitmap {
        width,
        height,
        xoff: ix0,
        yoff: iy0,
        pixels,
    })
}

/// Computes the signed distance field of the glyph for `codepoint`.
///
/// See [`glyph_sdf`].
pub fn codepoint_sdf(
    font: &FontInfo,
    scale: f32,
    codepoint: u32,
    params: SdfParams,
) -> Option<SdfBitmap> {
    glyph_sdf(font, scale, font.find_glyph_index(codepoint), params)
}
