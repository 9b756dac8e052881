//! Conversion of outlines to polygons.
//!
//! Curves are recursively subdivided until each piece is within a flatness
//! tolerance of a straight line. Flattening runs in two phases: a
//! [`Flattener::measure`] pass that only counts points, followed by a
//! [`Flattener::fill`] pass that writes into storage sized from that count.

use alloc::vec::Vec;

#[cfg(feature = "libm")]
#[allow(unused_imports)]
use core_maths::CoreFloat;

use crate::{Vertex, VertexKind};

/// Maximum recursion depth when subdividing a single curve.
pub const MAX_SUBDIVISION_DEPTH: u32 = 16;

/// A point of a flattened outline.
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A set of closed polygons.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contours {
    /// Points of every contour, one after another.
    pub points: Vec<Point>,
    /// Number of points in each contour.
    pub lengths: Vec<usize>,
}

impl Contours {
    /// Returns an iterator over the points of each contour.
    pub fn iter(&self) -> impl Iterator<Item = &[Point]> + '_ {
        let mut start = 0;
        self.lengths.iter().map(move |len| {
            let end = (start + len).min(self.points.len());
            let contour = &self.points[start.min(end)..end];
            start = end;
            contour
        })
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }
}

/// Converts a flatness measured in pixels to font units for the given
/// scale, using the finer of the two axes.
pub fn objspace_flatness(flatness_in_pixels: f32, scale_x: f32, scale_y: f32) -> f32 {
    flatness_in_pixels / scale_x.min(scale_y)
}

/// Flattens `vertices`, returning the resulting polygons.
///
/// `objspace_flatness` is the tolerance in font units, see
/// [`objspace_flatness`].
pub fn flatten_curves(vertices: &[Vertex], objspace_flatness: f32) -> Contours {
    let flattener = Flattener::new(objspace_flatness);
    let (num_points, num_contours) = flattener.measure(vertices);
    let mut contours = Contours {
        points: alloc::vec![Point::default(); num_points],
        lengths: alloc::vec![0; num_contours],
    };
    flattener.fill(vertices, &mut contours.points, &mut contours.lengths);
    contours
}

/// Subdivides curves against a fixed flatness tolerance.
#[derive(Clone, Copy, Debug)]
pub struct Flattener {
    flatness_squared: f32,
}

impl Flattener {
    /// Creates a flattener for a tolerance in font units.
    pub fn new(objspace_flatness: f32) -> Self {
        Self {
            flatness_squared: objspace_flatness * objspace_flatness,
        }
    }

    /// Returns the number of points and contours that [`Self::fill`] will
    /// produce for `vertices`.
    pub fn measure(&self, vertices: &[Vertex]) -> (usize, usize) {
        let mut counter = Counter::default();
        self.walk(vertices, &mut counter);
        (counter.points, counter.contours)
    }

    /// Writes the flattened polygons into `points` and their lengths into
    /// `lengths`.
    ///
    /// Both slices should be sized by [`Self::measure`]; output beyond
    /// their ends is dropped.
    pub fn fill(&self, vertices: &[Vertex], points: &mut [Point], lengths: &mut [usize]) {
        let mut writer = Writer {
            points,
            lengths,
            num_points: 0,
            num_contours: 0,
        };
        self.walk(vertices, &mut writer);
    }

    fn walk(&self, vertices: &[Vertex], out: &mut impl Output) {
        let mut started = false;
        let mut start = 0;
        let (mut x, mut y) = (0.0, 0.0);
        for vertex in vertices {
            let (vx, vy) = (vertex.x as f32, vertex.y as f32);
            if vertex.kind == VertexKind::Move {
                if started {
                    let len = out.num_points() - start;
                    out.end_contour(len);
                }
                started = true;
                start = out.num_points();
                out.point(vx, vy);
            } else if !started {
                // no contour to attach to
                continue;
            } else {
                match vertex.kind {
                    VertexKind::Line => out.point(vx, vy),
                    VertexKind::Curve => self.tesselate_curve(
                        out,
                        [x, y, vertex.cx as f32, vertex.cy as f32, vx, vy],
                        0,
                    ),
                    VertexKind::Cubic => self.tesselate_cubic(
                        out,
                        [
                            x,
                            y,
                            vertex.cx as f32,
                            vertex.cy as f32,
                            vertex.cx1 as f32,
                            vertex.cy1 as f32,
                            vx,
                            vy,
                        ],
                        0,
                    ),
                    VertexKind::Move => {}
                }
            }
            (x, y) = (vx, vy);
        }
        if started {
            let len = out.num_points() - start;
            out.end_contour(len);
        }
    }

    fn tesselate_curve(&self, out: &mut impl Output, p: [f32; 6], depth: u32) {
        let [x0, y0, x1, y1, x2, y2] = p;
        // midpoint of the curve
        let mx = (x0 + 2.0 * x1 + x2) / 4.0;
        let my = (y0 + 2.0 * y1 + y2) / 4.0;
        // versus the midpoint of the chord
        let dx = (x0 + x2) / 2.0 - mx;
        let dy = (y0 + y2) / 2.0 - my;
        if depth > MAX_SUBDIVISION_DEPTH {
            return;
        }
        if dx * dx + dy * dy > self.flatness_squared {
            let (x01, y01) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);
            let (x12, y12) = ((x1 + x2) / 2.0, (y1 + y2) / 2.0);
            self.tesselate_curve(out, [x0, y0, x01, y01, mx, my], depth + 1);
            self.tesselate_curve(out, [mx, my, x12, y12, x2, y2], depth + 1);
        } else {
            out.point(x2, y2);
        }
    }

    fn tesselate_cubic(&self, out: &mut impl Output, p: [f32; 8], depth: u32) {
        let [x0, y0, x1, y1, x2, y2, x3, y3] = p;
        let len = |dx: f32, dy: f32| (dx * dx + dy * dy).sqrt();
        // length of the control polygon against the chord
        let long_len = len(x1 - x0, y1 - y0) + len(x2 - x1, y2 - y1) + len(x3 - x2, y3 - y2);
        let short_len = len(x3 - x0, y3 - y0);
        let flatness_squared = long_len * long_len - short_len * short_len;
        if depth > MAX_SUBDIVISION_DEPTH {
            return;
        }
        if flatness_squared > self.flatness_squared {
            let (x01, y01) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);
            let (x12, y12) = ((x1 + x2) / 2.0, (y1 + y2) / 2.0);
            let (x23, y23) = ((x2 + x3) / 2.0, (y2 + y3) / 2.0);
            let (xa, ya) = ((x01 + x12) / 2.0, (y01 + y12) / 2.0);
            let (xb, yb) = ((x12 + x23) / 2.0, (y12 + y23) / 2.0);
            let (mx, my) = ((xa + xb) / 2.0, (ya + yb) / 2.0);
            self.tesselate_cubic(out, [x0, y0, x01, y01, xa, ya, mx, my], depth + 1);
            self.tesselate_cubic(out, [mx, my, xb, yb, x23, y23, x3, y3], depth + 1);
        } else {
            out.point(x3, y3);
        }
    }
}

/// Destination of the flattening walk.
trait Output {
    fn num_points(&self) -> usize;
    fn point(&mut self, x: f32, y: f32);
    fn end_contour(&mut self, len: usize);
}

#[derive(Default)]
struct Counter {
    points: usize,
    contours: usize,
}

impl Output for Counter {
    fn num_points(&self) -> usize {
        self.points
    }

    fn point(&mut self, _x: f32, _y: f32) {
        self.points += 1;
    }

    fn end_contour(&mut self, _len: usize) {
        self.contours += 1;
    }
}

struct Writer<'a> {
    points: &'a mut [Point],
    lengths: &'a mut [usize],
    num_points: usize,
    num_contours: usize,
}

impl Output for Writer<'_> {
    fn num_points(&self) -> usize {
        self.num_points
    }

    fn point(&mut self, x: f32, y: f32) {
        if let Some(point) = self.points.get_mut(self.num_points) {
            *point = Point::new(x, y);
        }
        self.num_points += 1;
    }

    fn end_contour(&mut self, len: usize) {
        if let Some(slot) = self.lengths.get_mut(self.num_contours) {
            *slot = len;
        }
        self.num_contours += 1;
    }
}
