//! Outline commands.

/// The command carried by a [`Vertex`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VertexKind {
    /// Start a new contour at `(x, y)`.
    Move = 1,
    /// Straight line to `(x, y)`.
    Line = 2,
    /// Quadratic curve to `(x, y)` with control point `(cx, cy)`.
    Curve = 3,
    /// Cubic curve to `(x, y)` with control points `(cx, cy)` and
    /// `(cx1, cy1)`.
    Cubic = 4,
}

/// A single outline command in font units.
///
/// A [`VertexKind::Move`] starts a new contour; each contour is closed,
/// ending where it started.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Vertex {
    pub x: i16,
    pub y: i16,
    pub cx: i16,
    pub cy: i16,
    pub cx1: i16,
    pub cy1: i16,
    pub kind: VertexKind,
}

impl Vertex {
    /// Creates a vertex, truncating every coordinate to 16 bits.
    pub fn new(kind: VertexKind, x: i32, y: i32, cx: i32, cy: i32) -> Self {
        Self {
            x: x as i16,
            y: y as i16,
            cx: cx as i16,
            cy: cy as i16,
            cx1: 0,
            cy1: 0,
            kind,
        }
    }

    pub fn move_to(x: i32, y: i32) -> Self {
        Self::new(VertexKind::Move, x, y, 0, 0)
    }

    pub fn line_to(x: i32, y: i32) -> Self {
        Self::new(VertexKind::Line, x, y, 0, 0)
    }

    pub fn quad_to(x: i32, y: i32, cx: i32, cy: i32) -> Self {
        Self::new(VertexKind::Curve, x, y, cx, cy)
    }

    pub fn cubic_to(x: i32, y: i32, cx: i32, cy: i32, cx1: i32, cy1: i32) -> Self {
        Self {
            cx1: cx1 as i16,
            cy1: cy1 as i16,
            ..Self::new(VertexKind::Cubic, x, y, cx, cy)
        }
    }
}
