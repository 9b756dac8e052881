//! Anti-aliased scanline rasterization.
//!
//! Coverage is computed analytically: every edge crossing a scanline adds
//! the exact signed area it covers in each pixel to an accumulation buffer,
//! along with a running fill for everything to its right.

use alloc::vec::Vec;

#[cfg(feature = "libm")]
#[allow(unused_imports)]
use core_maths::CoreFloat;

use crate::{
    bitmap::{BitmapMut, Scale, Shift},
    flatten::{self, Contours},
    Vertex,
};

/// Partitions at or below this size are left for the insertion sort.
const QUICKSORT_THRESHOLD: usize = 12;

/// A non-horizontal polygon edge in bitmap space, oriented so that
/// `y0 < y1`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Edge {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    /// The contour ran upwards through this edge.
    pub invert: bool,
}

/// An edge intersecting the current scanline.
#[derive(Clone, Copy, Debug)]
struct ActiveEdge {
    /// x at the top of the current scanline, relative to the bitmap.
    fx: f32,
    /// dx/dy
    fdx: f32,
    /// dy/dx
    fdy: f32,
    /// Winding contribution; +1 or -1.
    direction: f32,
    /// Start y.
    sy: f32,
    /// End y.
    ey: f32,
}

impl ActiveEdge {
    fn new(edge: &Edge, off_x: i32, start_point: f32) -> Self {
        let dxdy = (edge.x1 - edge.x0) / (edge.y1 - edge.y0);
        Self {
            fx: edge.x0 + dxdy * (start_point - edge.y0) - off_x as f32,
            fdx: dxdy,
            fdy: if dxdy != 0.0 { 1.0 / dxdy } else { 0.0 },
            direction: if edge.invert { 1.0 } else { -1.0 },
            sy: edge.y0,
            ey: edge.y1,
        }
    }
}

/// Flattens `vertices` and rasterizes the result into `result`.
///
/// Font units are mapped to pixels by `x * scale.x + shift.x`; y is mapped
/// the same way, negated when `invert` is set. `origin` is the pixel
/// position of the top left corner of `result`.
pub fn rasterize(
    result: &mut BitmapMut,
    flatness_in_pixels: f32,
    vertices: &[Vertex],
    scale: Scale,
    shift: Shift,
    origin: (i32, i32),
    invert: bool,
) {
    let flatness = flatten::objspace_flatness(flatness_in_pixels, scale.x, scale.y);
    let contours = flatten::flatten_curves(vertices, flatness);
    if contours.is_empty() {
        return;
    }
    rasterize_contours(result, &contours, scale, shift, origin, invert);
}

/// Rasterizes polygons that are already flattened.
pub fn rasterize_contours(
    result: &mut BitmapMut,
    contours: &Contours,
    scale: Scale,
    shift: Shift,
    origin: (i32, i32),
    invert: bool,
) {
    let mut edges = build_edges(contours, scale, shift, invert);
    sort_edges(&mut edges);
    rasterize_sorted_edges(result, &edges, origin);
}

/// Converts polygons to edges in bitmap space, dropping horizontal ones.
pub fn build_edges(contours: &Contours, scale: Scale, shift: Shift, invert: bool) -> Vec<Edge> {
    let y_scale = if invert { -scale.y } else { scale.y };
    let mut edges = Vec::with_capacity(contours.points.len());
    for points in contours.iter() {
        let Some(mut j) = points.len().checked_sub(1) else {
            continue;
        };
        for k in 0..points.len() {
            let (pj, pk) = (points[j], points[k]);
            j = k;
            if pj.y == pk.y {
                continue;
            }
            let reversed = if invert { pj.y > pk.y } else { pj.y < pk.y };
            let (a, b) = if reversed { (pj, pk) } else { (pk, pj) };
            edges.push(Edge {
                x0: a.x * scale.x + shift.x,
                y0: a.y * y_scale + shift.y,
                x1: b.x * scale.x + shift.x,
                y1: b.y * y_scale + shift.y,
                invert: reversed,
            });
        }
    }
    edges
}

/// Sorts edges by their top y coordinate.
///
/// A quicksort with a median of three pivot handles large partitions and
/// an insertion sort finishes the nearly sorted result.
pub fn sort_edges(edges: &mut [Edge]) {
    quicksort(edges);
    insertion_sort(edges);
}

fn insertion_sort(p: &mut [Edge]) {
    for i in 1..p.len() {
        let t = p[i];
        let mut j = i;
        while j > 0 && t.y0 < p[j - 1].y0 {
            p[j] = p[j - 1];
            j -= 1;
        }
        if i != j {
            p[j] = t;
        }
    }
}

fn quicksort(mut p: &mut [Edge]) {
    while p.len() > QUICKSORT_THRESHOLD {
        let n = p.len();
        let m = n >> 1;
        let c01 = p[0].y0 < p[m].y0;
        let c12 = p[m].y0 < p[n - 1].y0;
        // unless the middle is already the median, swap the median into it
        if c01 != c12 {
            let c = p[0].y0 < p[n - 1].y0;
            let z = if c == c12 { 0 } else { n - 1 };
            p.swap(z, m);
        }
        // keep the pivot at the front
        p.swap(0, m);

        let mut i = 1;
        let mut j = n - 1;
        loop {
            while i < n && p[i].y0 < p[0].y0 {
                i += 1;
            }
            while j > 0 && p[0].y0 < p[j].y0 {
                j -= 1;
            }
            if i >= j {
                break;
            }
            p.swap(i, j);
            i += 1;
            j -= 1;
        }
        // recurse on the smaller side, loop on the larger
        let rest = core::mem::take(&mut p);
        if j < n - i {
            quicksort(&mut rest[..j]);
            p = &mut rest[i..];
        } else {
            quicksort(&mut rest[i..]);
            p = &mut rest[..j];
        }
    }
}

/// Sweeps sorted edges down the rows of `result`.
///
/// `origin` is the pixel position of the top left corner of `result`.
pub fn rasterize_sorted_edges(result: &mut BitmapMut, edges: &[Edge], origin: (i32, i32)) {
    let (off_x, off_y) = origin;
    let width = result.width();
    let mut active: Vec<ActiveEdge> = Vec::new();
    let mut scanline = alloc::vec![0f32; width];
    // running fill, offset by one so that an edge left of the bitmap can
    // still contribute
    let mut fill = alloc::vec![0f32; width + 1];
    let mut next_edge = 0;

    for j in 0..result.height() {
        let scan_y_top = (off_y + j as i32) as f32;
        let scan_y_bottom = scan_y_top + 1.0;
        scanline.fill(0.0);
        fill.fill(0.0);

        // remove edges that end above this scanline
        active.retain(|z| z.ey > scan_y_top);

        // add edges that start before its bottom
        while let Some(edge) = edges.get(next_edge) {
            if edge.y0 > scan_y_bottom {
                break;
            }
            if edge.y0 != edge.y1 {
                let mut z = ActiveEdge::new(edge, off_x, scan_y_top);
                if j == 0 && off_y != 0 && z.ey < scan_y_top {
                    // subpixel positioning can leave an edge just above
                    // the first row
                    z.ey = scan_y_top;
                }
                active.push(z);
            }
            next_edge += 1;
        }

        if !active.is_empty() {
            fill_active_edges(&mut scanline, &mut fill, &active, scan_y_top);
        }

        let mut sum = 0.0;
        for ((pixel, coverage), fill) in result
            .row_mut(j)
            .iter_mut()
            .zip(&scanline)
            .zip(&fill)
        {
            sum += fill;
            let k = (coverage + sum).abs() * 255.0 + 0.5;
            *pixel = (k as i32).min(255) as u8;
        }

        for z in active.iter_mut() {
            z.fx += z.fdx;
        }
    }
}

/// Accumulates the coverage of an edge segment that does not cross the
/// vertical lines at `x` or `x + 1` into `scanline[x]`.
#[allow(clippy::too_many_arguments)]
fn handle_clipped_edge(
    scanline: &mut [f32],
    x: usize,
    e: &ActiveEdge,
    mut x0: f32,
    mut y0: f32,
    mut x1: f32,
    mut y1: f32,
) {
    if y0 == y1 {
        return;
    }
    if y0 > e.ey || y1 < e.sy {
        return;
    }
    if y0 < e.sy {
        x0 += (x1 - x0) * (e.sy - y0) / (y1 - y0);
        y0 = e.sy;
    }
    if y1 > e.ey {
        x1 += (x1 - x0) * (e.ey - y1) / (y1 - y0);
        y1 = e.ey;
    }
    let Some(cell) = scanline.get_mut(x) else {
        return;
    };
    let xf = x as f32;
    if x0 <= xf && x1 <= xf {
        *cell += e.direction * (y1 - y0);
    } else if x0 >= xf + 1.0 && x1 >= xf + 1.0 {
        // entirely to the right
    } else {
        // coverage is one minus the average x position
        *cell += e.direction * (y1 - y0) * (1.0 - ((x0 - xf) + (x1 - xf)) / 2.0);
    }
}

fn sized_trapezoid_area(height: f32, top_width: f32, bottom_width: f32) -> f32 {
    (top_width + bottom_width) / 2.0 * height
}

fn position_trapezoid_area(height: f32, tx0: f32, tx1: f32, bx0: f32, bx1: f32) -> f32 {
    sized_trapezoid_area(height, tx1 - tx0, bx1 - bx0)
}

fn sized_triangle_area(height: f32, width: f32) -> f32 {
    height * width / 2.0
}

/// Adds the coverage of every active edge within the scanline starting at
/// `y_top`.
///
/// `fill` has one more entry than `scanline`; `fill[x + 1]` holds the fill
/// that starts right of pixel `x`.
fn fill_active_edges(scanline: &mut [f32], fill: &mut [f32], active: &[ActiveEdge], y_top: f32) {
    let len = scanline.len() as f32;
    let y_bottom = y_top + 1.0;
    for e in active {
        if e.fdx == 0.0 {
            let x0 = e.fx;
            if x0 < len {
                if x0 >= 0.0 {
                    handle_clipped_edge(scanline, x0 as usize, e, x0, y_top, x0, y_bottom);
                    handle_clipped_edge(fill, x0 as usize + 1, e, x0, y_top, x0, y_bottom);
                } else {
                    handle_clipped_edge(fill, 0, e, x0, y_top, x0, y_bottom);
                }
            }
            continue;
        }

        let mut x0 = e.fx;
        let mut dx = e.fdx;
        let mut xb = x0 + dx;
        let mut dy = e.fdy;

        // endpoints of the segment clipped to this scanline; x0 is where
        // the line meets y_top, which may lie outside the segment
        let (mut x_top, mut sy0) = if e.sy > y_top {
            (x0 + dx * (e.sy - y_top), e.sy)
        } else {
            (x0, y_top)
        };
        let (mut x_bottom, mut sy1) = if e.ey < y_bottom {
            (x0 + dx * (e.ey - y_top), e.ey)
        } else {
            (xb, y_bottom)
        };

        if x_top >= 0.0 && x_bottom >= 0.0 && x_top < len && x_bottom < len {
            if x_top as usize == x_bottom as usize {
                // only spans one pixel
                let x = x_top as usize;
                let xf = x as f32;
                let height = (sy1 - sy0) * e.direction;
                scanline[x] += position_trapezoid_area(height, x_top, xf + 1.0, x_bottom, xf + 1.0);
                fill[x + 1] += height;
                continue;
            }
            if x_top > x_bottom {
                // flip the scanline vertically; the signed area is the same
                sy0 = y_bottom - (sy0 - y_top);
                sy1 = y_bottom - (sy1 - y_top);
                core::mem::swap(&mut sy0, &mut sy1);
                core::mem::swap(&mut x_bottom, &mut x_top);
                dx = -dx;
                dy = -dy;
                core::mem::swap(&mut x0, &mut xb);
            }
            debug_assert!(dy >= 0.0 && dx >= 0.0);

            let x1 = x_top as usize;
            let x2 = x_bottom as usize;
            // where the line crosses x1 + 1 and x2
            let mut y_crossing = y_top + dy * ((x1 + 1) as f32 - x0);
            let mut y_final = y_top + dy * (x2 as f32 - x0);

            // x2 right at the edge of x1 can blow up the crossing
            if y_crossing > y_bottom {
                y_crossing = y_bottom;
            }
            let sign = e.direction;
            // the rectangle from sy0 to y_crossing
            let mut area = sign * (y_crossing - sy0);
            // the triangle (x_top, sy0), (x1 + 1, sy0), (x1 + 1, y_crossing)
            scanline[x1] += sized_triangle_area(area, (x1 + 1) as f32 - x_top);

            if y_final > y_bottom {
                let denom = x2 as f32 - (x1 + 1) as f32;
                y_final = y_bottom;
                if denom != 0.0 {
                    dy = (y_final - y_crossing) / denom;
                }
            }

            // every pixel in between gains the area to its left plus a
            // trapezoid sliding down by dy per pixel
            let step = sign * dy;
            for cell in &mut scanline[x1 + 1..x2] {
                *cell += area + step / 2.0;
                area += step;
            }
            scanline[x2] += area
                + sign
                    * position_trapezoid_area(
                        sy1 - y_final,
                        x2 as f32,
                        x2 as f32 + 1.0,
                        x_bottom,
                        x2 as f32 + 1.0,
                    );
            fill[x2 + 1] += sign * (sy1 - sy0);
        } else {
            // the edge leaves the bitmap; clip it against every pixel
            for x in 0..scanline.len() {
                let xf = x as f32;
                let y0 = y_top;
                let x1 = xf;
                let x2 = xf + 1.0;
                let x3 = xb;
                let y3 = y_bottom;
                let y1 = (xf - x0) / dx + y_top;
                let y2 = (xf + 1.0 - x0) / dx + y_top;

                let mut clip = |ax: f32, ay: f32, bx: f32, by: f32| {
                    handle_clipped_edge(scanline, x, e, ax, ay, bx, by)
                };
                if x0 < x1 && x3 > x2 {
                    // three segments descending down-right
                    clip(x0, y0, x1, y1);
                    clip(x1, y1, x2, y2);
                    clip(x2, y2, x3, y3);
                } else if x3 < x1 && x0 > x2 {
                    // three segments descending down-left
                    clip(x0, y0, x2, y2);
                    clip(x2, y2, x1, y1);
                    clip(x1, y1, x3, y3);
                } else if (x0 < x1 && x3 > x1) || (x3 < x1 && x0 > x1) {
                    // two segments across x
                    clip(x0, y0, x1, y1);
                    clip(x1, y1, x3, y3);
                } else if (x0 < x2 && x3 > x2) || (x3 < x2 && x0 > x2) {
                    // two segments across x + 1
                    clip(x0, y0, x2, y2);
                    clip(x2, y2, x3, y3);
                } else {
                    clip(x0, y0, x3, y3);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::Point;
    use pretty_assertions::assert_eq;

    fn render(width: usize, height: usize, vertices: &[Vertex], invert: bool) -> Vec<u8> {
        let mut pixels = vec![0u8; width * height];
        let mut bitmap = BitmapMut::new(&mut pixels, width, height, 0);
        rasterize(
            &mut bitmap,
            crate::FLATNESS_IN_PIXELS,
            vertices,
            Scale::uniform(1.0),
            Shift::ZERO,
            (0, 0),
            invert,
        );
        pixels
    }

    fn polygon(points: &[(i32, i32)]) -> Vec<Vertex> {
        let mut vertices = vec![Vertex::move_to(points[0].0, points[0].1)];
        for (x, y) in points[1..].iter().chain(&points[..1]) {
            vertices.push(Vertex::line_to(*x, *y));
        }
        vertices
    }

    #[test]
    fn empty_shape() {
        let pixels = render(8, 8, &[], true);
        assert!(pixels.iter().all(|p| *p == 0));
    }

    #[test]
    fn aligned_square() {
        let square = polygon(&[(2, 2), (2, 6), (6, 6), (6, 2)]);
        for invert in [false, true] {
            let vertices: Vec<_> = if invert {
                // flip into y-up font space
                square
                    .iter()
                    .map(|v| Vertex::new(v.kind, v.x as i32, -(v.y as i32), 0, 0))
                    .collect()
            } else {
                square.clone()
            };
            let pixels = render(8, 8, &vertices, invert);
            for y in 0..8 {
                for x in 0..8 {
                    let inside = (2..6).contains(&x) && (2..6).contains(&y);
                    let expected = if inside { 255 } else { 0 };
                    assert_eq!(pixels[y * 8 + x], expected, "pixel ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn partial_coverage() {
        let mut pixels = vec![0u8; 4 * 2];
        let mut bitmap = BitmapMut::new(&mut pixels, 4, 2, 0);
        let contours = Contours {
            points: vec![
                Point::new(0.5, 0.0),
                Point::new(0.5, 2.0),
                Point::new(2.5, 2.0),
                Point::new(2.5, 0.0),
            ],
            lengths: vec![4],
        };
        rasterize_contours(
            &mut bitmap,
            &contours,
            Scale::uniform(1.0),
            Shift::ZERO,
            (0, 0),
            false,
        );
        assert_eq!(pixels, [128, 255, 128, 0, 128, 255, 128, 0]);
    }

    fn total_coverage(pixels: &[u8]) -> f32 {
        pixels.iter().map(|p| *p as f32 / 255.0).sum()
    }

    #[test]
    fn diagonal_edges_cover_exact_area() {
        // spans several pixels per row
        let shallow = polygon(&[(1, 1), (7, 1), (1, 4)]);
        let pixels = render(8, 8, &shallow, false);
        assert!((total_coverage(&pixels) - 9.0).abs() < 0.1);
        // touches the right edge of the bitmap, which needs clipping
        let clipped = polygon(&[(0, 0), (8, 0), (0, 8)]);
        let pixels = render(8, 8, &clipped, false);
        assert!((total_coverage(&pixels) - 32.0).abs() < 0.1);
        // steep, one pixel per row
        let steep = polygon(&[(2, 0), (3, 8), (2, 8)]);
        let pixels = render(8, 8, &steep, false);
        assert!((total_coverage(&pixels) - 4.0).abs() < 0.1);
    }

    #[test]
    fn shape_outside_bitmap() {
        let far_away = polygon(&[(20, 20), (20, 30), (30, 30), (30, 20)]);
        let pixels = render(8, 8, &far_away, false);
        assert!(pixels.iter().all(|p| *p == 0));
        let mut pixels = vec![0u8; 16];
        let mut bitmap = BitmapMut::new(&mut pixels, 4, 4, 0);
        // the same square seen through a bitmap placed over it
        rasterize(
            &mut bitmap,
            0.35,
            &far_away,
            Scale::uniform(1.0),
            Shift::ZERO,
            (21, 21),
            false,
        );
        assert!(pixels.iter().all(|p| *p == 255));
    }

    #[test]
    fn horizontal_edges_are_dropped() {
        let contours = Contours {
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(0.0, 4.0),
                Point::new(4.0, 4.0),
                Point::new(4.0, 0.0),
            ],
            lengths: vec![4],
        };
        let edges = build_edges(&contours, Scale::uniform(2.0), Shift { x: 1.0, y: 0.0 }, false);
        assert_eq!(edges.len(), 2);
        for edge in &edges {
            assert!(edge.y0 < edge.y1);
            assert_eq!((edge.y0, edge.y1), (0.0, 8.0));
        }
        assert_eq!(edges.iter().filter(|e| e.invert).count(), 1);
        let inverted = build_edges(&contours, Scale::uniform(2.0), Shift::ZERO, true);
        for edge in &inverted {
            assert_eq!((edge.y0, edge.y1), (-8.0, 0.0));
        }
    }

    #[test]
    fn sorting() {
        // simple linear congruential generator
        let mut seed = 12345u32;
        let mut next = || {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            (seed >> 16) % 100
        };
        for len in [0, 1, 5, 12, 13, 50, 300] {
            let mut edges: Vec<Edge> = (0..len)
                .map(|i| Edge {
                    x0: i as f32,
                    y0: next() as f32,
                    ..Default::default()
                })
                .collect();
            let mut expected: Vec<f32> = edges.iter().map(|e| e.y0).collect();
            expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
            sort_edges(&mut edges);
            let sorted: Vec<f32> = edges.iter().map(|e| e.y0).collect();
            assert_eq!(sorted, expected);
            let mut xs: Vec<u32> = edges.iter().map(|e| e.x0 as u32).collect();
            xs.sort();
            assert_eq!(xs, (0..len).collect::<Vec<_>>());
        }
    }
}
