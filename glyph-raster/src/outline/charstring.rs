//! Evaluation of CFF Type 2 charstrings.
//!
//! See <https://adobe-type-tools.github.io/font-tech-notes/pdfs/5177.Type2.pdf>

use alloc::vec::Vec;

#[cfg(feature = "libm")]
#[allow(unused_imports)]
use core_maths::CoreFloat;

use font_read::{
    cff::{dict, CffInfo},
    ByteCursor,
};

use crate::{BoundingBox, CharstringError, DrawError, GlyphId, Vertex, VertexKind};

/// Maximum number of operands on the argument stack.
pub const MAX_STACK: usize = 48;

/// Maximum depth of nested subroutine calls.
pub const MAX_SUBR_NESTING: usize = 10;

mod op {
    pub const HSTEM: u8 = 0x01;
    pub const VSTEM: u8 = 0x03;
    pub const VMOVETO: u8 = 0x04;
    pub const RLINETO: u8 = 0x05;
    pub const HLINETO: u8 = 0x06;
    pub const VLINETO: u8 = 0x07;
    pub const RRCURVETO: u8 = 0x08;
    pub const CALLSUBR: u8 = 0x0A;
    pub const RETURN: u8 = 0x0B;
    pub const ESCAPE: u8 = 0x0C;
    pub const ENDCHAR: u8 = 0x0E;
    pub const HSTEMHM: u8 = 0x12;
    pub const HINTMASK: u8 = 0x13;
    pub const CNTRMASK: u8 = 0x14;
    pub const RMOVETO: u8 = 0x15;
    pub const HMOVETO: u8 = 0x16;
    pub const VSTEMHM: u8 = 0x17;
    pub const RCURVELINE: u8 = 0x18;
    pub const RLINECURVE: u8 = 0x19;
    pub const VVCURVETO: u8 = 0x1A;
    pub const HHCURVETO: u8 = 0x1B;
    pub const SHORTINT: u8 = 0x1C;
    pub const CALLGSUBR: u8 = 0x1D;
    pub const VHCURVETO: u8 = 0x1E;
    pub const HVCURVETO: u8 = 0x1F;
    pub const FIXED: u8 = 0xFF;

    // escaped
    pub const HFLEX: u8 = 0x22;
    pub const FLEX: u8 = 0x23;
    pub const HFLEX1: u8 = 0x24;
    pub const FLEX1: u8 = 0x25;
}

/// Receives the vertices produced by a charstring.
pub trait CharstringSink {
    fn push(&mut self, vertex: Vertex);
}

impl CharstringSink for Vec<Vertex> {
    fn push(&mut self, vertex: Vertex) {
        Vec::push(self, vertex);
    }
}

/// A sink that measures an outline without storing it.
///
/// Control points of cubic curves are included in the bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bounds {
    started: bool,
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
    /// Number of vertices the outline would produce.
    pub num_vertices: usize,
}

impl Bounds {
    fn track(&mut self, x: i16, y: i16) {
        let (x, y) = (x as i32, y as i32);
        if !self.started {
            self.started = true;
            (self.min_x, self.max_x, self.min_y, self.max_y) = (x, x, y, y);
            return;
        }
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    /// The accumulated bounds; all zero if nothing was drawn.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox {
            x0: self.min_x,
            y0: self.min_y,
            x1: self.max_x,
            y1: self.max_y,
        }
    }
}

impl CharstringSink for Bounds {
    fn push(&mut self, vertex: Vertex) {
        self.track(vertex.x, vertex.y);
        if vertex.kind == VertexKind::Cubic {
            self.track(vertex.cx, vertex.cy);
            self.track(vertex.cx1, vertex.cy1);
        }
        self.num_vertices += 1;
    }
}

/// Loads the outline of `glyph`.
///
/// The charstring is evaluated twice: once to count vertices and once to
/// produce them.
pub fn glyph_shape(cff: &CffInfo, glyph: GlyphId) -> Result<Vec<Vertex>, DrawError> {
    if glyph.to_usize() >= cff.charstrings().count() {
        return Err(DrawError::GlyphNotFound(glyph));
    }
    let bounds = measure(cff, glyph)?;
    let mut vertices = Vec::with_capacity(bounds.num_vertices);
    evaluate(cff, glyph, &mut vertices)?;
    debug_assert_eq!(vertices.len(), bounds.num_vertices);
    Ok(vertices)
}

/// Evaluates the charstring for `glyph` to compute its bounds and vertex
/// count.
pub fn measure(cff: &CffInfo, glyph: GlyphId) -> Result<Bounds, CharstringError> {
    let mut bounds = Bounds::default();
    evaluate(cff, glyph, &mut bounds)?;
    Ok(bounds)
}

/// Pen state while evaluating a charstring.
struct Context<'a, S> {
    sink: &'a mut S,
    x: f32,
    y: f32,
    first_x: f32,
    first_y: f32,
    /// Set once the first contour has started.
    started: bool,
}

impl<S: CharstringSink> Context<'_, S> {
    fn vertex(&mut self, kind: VertexKind, x: f32, y: f32, cx: f32, cy: f32) {
        self.sink
            .push(Vertex::new(kind, x as i32, y as i32, cx as i32, cy as i32));
    }

    fn close_shape(&mut self) {
        if self.started && (self.first_x != self.x || self.first_y != self.y) {
            self.vertex(VertexKind::Line, self.first_x, self.first_y, 0.0, 0.0);
        }
    }

    fn rmove_to(&mut self, dx: f32, dy: f32) {
        self.close_shape();
        self.x += dx;
        self.y += dy;
        self.first_x = self.x;
        self.first_y = self.y;
        self.started = true;
        self.vertex(VertexKind::Move, self.x, self.y, 0.0, 0.0);
    }

    fn rline_to(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
        self.vertex(VertexKind::Line, self.x, self.y, 0.0, 0.0);
    }

    #[allow(clippy::too_many_arguments)]
    fn rcurve_to(&mut self, dx1: f32, dy1: f32, dx2: f32, dy2: f32, dx3: f32, dy3: f32) {
        let cx1 = self.x + dx1;
        let cy1 = self.y + dy1;
        let cx2 = cx1 + dx2;
        let cy2 = cy1 + dy2;
        self.x = cx2 + dx3;
        self.y = cy2 + dy3;
        self.sink.push(Vertex::cubic_to(
            self.x as i32,
            self.y as i32,
            cx1 as i32,
            cy1 as i32,
            cx2 as i32,
            cy2 as i32,
        ));
    }
}

/// Runs the charstring for `glyph`, sending every vertex to `sink`.
///
/// Hints are skipped and the advance width operand is ignored.
pub fn evaluate(
    cff: &CffInfo,
    glyph: GlyphId,
    sink: &mut impl CharstringSink,
) -> Result<(), CharstringError> {
    let global_subrs = cff.global_subrs();
    let local_subrs = cff.local_subrs_for_glyph(glyph);
    let mut ctx = Context {
        sink,
        x: 0.0,
        y: 0.0,
        first_x: 0.0,
        first_y: 0.0,
        started: false,
    };
    let mut stack = [0f32; MAX_STACK];
    let mut sp = 0usize;
    let mut call_stack = [ByteCursor::empty(); MAX_SUBR_NESTING];
    let mut call_depth = 0usize;
    let mut in_header = true;
    let mut mask_bits = 0usize;

    let mut b = cff.charstring(glyph);
    while !b.at_end() {
        let mut i = 0;
        let mut clear_stack = true;
        let b0 = b.get8();
        match b0 {
            op::HSTEM | op::VSTEM | op::HSTEMHM | op::VSTEMHM => {
                mask_bits += sp / 2;
            }
            op::HINTMASK | op::CNTRMASK => {
                if in_header {
                    // implied vstem operands
                    mask_bits += sp / 2;
                }
                in_header = false;
                b.skip(mask_bits.div_ceil(8) as isize);
            }
            op::RMOVETO => {
                in_header = false;
                if sp < 2 {
                    return Err(CharstringError::StackUnderflow);
                }
                ctx.rmove_to(stack[sp - 2], stack[sp - 1]);
            }
            op::VMOVETO => {
                in_header = false;
                if sp < 1 {
                    return Err(CharstringError::StackUnderflow);
                }
                ctx.rmove_to(0.0, stack[sp - 1]);
            }
            op::HMOVETO => {
                in_header = false;
                if sp < 1 {
                    return Err(CharstringError::StackUnderflow);
                }
                ctx.rmove_to(stack[sp - 1], 0.0);
            }
            op::RLINETO => {
                if sp < 2 {
                    return Err(CharstringError::StackUnderflow);
                }
                while i + 1 < sp {
                    ctx.rline_to(stack[i], stack[i + 1]);
                    i += 2;
                }
            }
            op::HLINETO | op::VLINETO => {
                if sp < 1 {
                    return Err(CharstringError::StackUnderflow);
                }
                // alternating horizontal and vertical lines
                let mut horizontal = b0 == op::HLINETO;
                while i < sp {
                    if horizontal {
                        ctx.rline_to(stack[i], 0.0);
                    } else {
                        ctx.rline_to(0.0, stack[i]);
                    }
                    horizontal = !horizontal;
                    i += 1;
                }
            }
            op::HVCURVETO | op::VHCURVETO => {
                if sp < 4 {
                    return Err(CharstringError::StackUnderflow);
                }
                let mut horizontal = b0 == op::HVCURVETO;
                while i + 3 < sp {
                    // the final curve may carry a fifth operand
                    let last = if sp - i == 5 { stack[i + 4] } else { 0.0 };
                    let s = &stack[i..i + 4];
                    if horizontal {
                        ctx.rcurve_to(s[0], 0.0, s[1], s[2], last, s[3]);
                    } else {
                        ctx.rcurve_to(0.0, s[0], s[1], s[2], s[3], last);
                    }
                    horizontal = !horizontal;
                    i += 4;
                }
            }
            op::RRCURVETO => {
                if sp < 6 {
                    return Err(CharstringError::StackUnderflow);
                }
                while i + 5 < sp {
                    let s = &stack[i..i + 6];
                    ctx.rcurve_to(s[0], s[1], s[2], s[3], s[4], s[5]);
                    i += 6;
                }
            }
            op::RCURVELINE => {
                if sp < 8 {
                    return Err(CharstringError::StackUnderflow);
                }
                while i + 5 < sp - 2 {
                    let s = &stack[i..i + 6];
                    ctx.rcurve_to(s[0], s[1], s[2], s[3], s[4], s[5]);
                    i += 6;
                }
                if i + 1 >= sp {
                    return Err(CharstringError::StackUnderflow);
                }
                ctx.rline_to(stack[i], stack[i + 1]);
            }
            op::RLINECURVE => {
                if sp < 8 {
                    return Err(CharstringError::StackUnderflow);
                }
                while i + 1 < sp - 6 {
                    ctx.rline_to(stack[i], stack[i + 1]);
                    i += 2;
                }
                if i + 5 >= sp {
                    return Err(CharstringError::StackUnderflow);
                }
                let s = &stack[i..i + 6];
                ctx.rcurve_to(s[0], s[1], s[2], s[3], s[4], s[5]);
            }
            op::VVCURVETO | op::HHCURVETO => {
                if sp < 4 {
                    return Err(CharstringError::StackUnderflow);
                }
                let mut f = 0.0;
                if sp & 1 != 0 {
                    f = stack[i];
                    i += 1;
                }
                while i + 3 < sp {
                    let s = &stack[i..i + 4];
                    if b0 == op::HHCURVETO {
                        ctx.rcurve_to(s[0], f, s[1], s[2], s[3], 0.0);
                    } else {
                        ctx.rcurve_to(f, s[0], s[1], s[2], 0.0, s[3]);
                    }
                    f = 0.0;
                    i += 4;
                }
            }
            op::CALLSUBR | op::CALLGSUBR => {
                if sp < 1 {
                    return Err(CharstringError::StackUnderflow);
                }
                sp -= 1;
                let n = stack[sp] as i32;
                if call_depth >= MAX_SUBR_NESTING {
                    return Err(CharstringError::SubroutineNestingLimit);
                }
                call_stack[call_depth] = b;
                call_depth += 1;
                let subrs = if b0 == op::CALLSUBR {
                    local_subrs
                } else {
                    global_subrs
                };
                b = subrs.get_subr(n);
                if b.is_empty() {
                    return Err(CharstringError::InvalidSubroutineIndex(n));
                }
                clear_stack = false;
            }
            op::RETURN => {
                if call_depth == 0 {
                    return Err(CharstringError::ReturnOutsideSubroutine);
                }
                call_depth -= 1;
                b = call_stack[call_depth];
                clear_stack = false;
            }
            op::ENDCHAR => {
                ctx.close_shape();
                return Ok(());
            }
            op::ESCAPE => {
                let b1 = b.get8();
                let s = &stack[..sp];
                match b1 {
                    op::HFLEX => {
                        if sp < 7 {
                            return Err(CharstringError::StackUnderflow);
                        }
                        let [dx1, dx2, dy2, dx3, dx4, dx5, dx6] =
                            [s[0], s[1], s[2], s[3], s[4], s[5], s[6]];
                        ctx.rcurve_to(dx1, 0.0, dx2, dy2, dx3, 0.0);
                        ctx.rcurve_to(dx4, 0.0, dx5, -dy2, dx6, 0.0);
                    }
                    op::FLEX => {
                        if sp < 13 {
                            return Err(CharstringError::StackUnderflow);
                        }
                        // the flex depth in s[12] is ignored
                        ctx.rcurve_to(s[0], s[1], s[2], s[3], s[4], s[5]);
                        ctx.rcurve_to(s[6], s[7], s[8], s[9], s[10], s[11]);
                    }
                    op::HFLEX1 => {
                        if sp < 9 {
                            return Err(CharstringError::StackUnderflow);
                        }
                        let [dx1, dy1, dx2, dy2, dx3, dx4, dx5, dy5, dx6] =
                            [s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7], s[8]];
                        ctx.rcurve_to(dx1, dy1, dx2, dy2, dx3, 0.0);
                        ctx.rcurve_to(dx4, 0.0, dx5, dy5, dx6, -(dy1 + dy2 + dy5));
                    }
                    op::FLEX1 => {
                        if sp < 11 {
                            return Err(CharstringError::StackUnderflow);
                        }
                        let dx = s[0] + s[2] + s[4] + s[6] + s[8];
                        let dy = s[1] + s[3] + s[5] + s[7] + s[9];
                        let (dx6, dy6) = if dx.abs() > dy.abs() {
                            (s[10], -dy)
                        } else {
                            (-dx, s[10])
                        };
                        ctx.rcurve_to(s[0], s[1], s[2], s[3], s[4], s[5]);
                        ctx.rcurve_to(s[6], s[7], s[8], s[9], dx6, dy6);
                    }
                    _ => return Err(CharstringError::InvalidOperator(b1)),
                }
            }
            _ => {
                if b0 != op::FIXED && b0 != op::SHORTINT && b0 < 32 {
                    return Err(CharstringError::InvalidOperator(b0));
                }
                let value = if b0 == op::FIXED {
                    b.get32() as i32 as f32 / 65536.0
                } else {
                    b.skip(-1);
                    dict::read_int(&mut b) as i16 as f32
                };
                if sp >= MAX_STACK {
                    return Err(CharstringError::StackOverflow);
                }
                stack[sp] = value;
                sp += 1;
                clear_stack = false;
            }
        }
        if clear_stack {
            sp = 0;
        }
    }
    Err(CharstringError::MissingEndChar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use font_read::FontInfo;
    use font_test_data::cff::{self as cff_data, op as cs, Charstring, CffBuilder};
    use pretty_assertions::assert_eq;

    fn shape_of(data: &[u8], gid: u32) -> Result<Vec<Vertex>, DrawError> {
        let font = FontInfo::new(data, 0).unwrap();
        crate::glyph_shape(&font, GlyphId::new(gid))
    }

    /// Builds a font whose glyph 1 is `charstring`.
    fn font_with(charstring: Vec<u8>) -> Vec<u8> {
        CffBuilder::new()
            .charstrings(vec![vec![cs::ENDCHAR], charstring])
            .build_font()
    }

    fn square(x0: i32, y0: i32, size: i32) -> Vec<Vertex> {
        let (x1, y1) = (x0 + size, y0 + size);
        vec![
            Vertex::move_to(x0, y0),
            Vertex::line_to(x1, y0),
            Vertex::line_to(x1, y1),
            Vertex::line_to(x0, y1),
            Vertex::line_to(x0, y0),
        ]
    }

    #[test]
    fn hinted_curve() {
        let _ = env_logger::builder().is_test(true).try_init();
        let data = cff_data::simple_font();
        assert_eq!(
            shape_of(&data, cff_data::GID_HINTED_CURVE).unwrap(),
            [
                Vertex::move_to(100, 100),
                Vertex::cubic_to(300, 300, 100, 200, 200, 300),
                Vertex::line_to(300, 100),
                Vertex::line_to(100, 100),
            ]
        );
    }

    #[test]
    fn flex() {
        let data = cff_data::simple_font();
        assert_eq!(
            shape_of(&data, cff_data::GID_FLEX).unwrap(),
            [
                Vertex::move_to(0, 0),
                Vertex::cubic_to(300, 200, 100, 100, 200, 200),
                Vertex::cubic_to(600, 0, 400, 200, 500, 100),
                Vertex::line_to(0, 0),
            ]
        );
    }

    #[test]
    fn local_and_global_subroutines() {
        let data = cff_data::simple_font();
        assert_eq!(
            shape_of(&data, cff_data::GID_LOCAL_SUBR).unwrap(),
            square(100, 0, 200)
        );
        assert_eq!(
            shape_of(&data, cff_data::GID_GLOBAL_SUBR).unwrap(),
            square(0, 0, 300)
        );
    }

    #[test]
    fn errors() {
        let data = cff_data::simple_font();
        assert_eq!(
            shape_of(&data, cff_data::GID_RESERVED_OP),
            Err(DrawError::Charstring(CharstringError::InvalidOperator(2)))
        );
        assert_eq!(
            shape_of(&data, cff_data::GID_NO_ENDCHAR),
            Err(DrawError::Charstring(CharstringError::MissingEndChar))
        );
        let gid = cff_data::SIMPLE_GLYPH_COUNT as u32;
        assert_eq!(
            shape_of(&data, gid),
            Err(DrawError::GlyphNotFound(GlyphId::new(gid)))
        );
    }

    #[test]
    fn stack_limits() {
        let overflow = Charstring::new()
            .args(&[1; MAX_STACK + 1])
            .op(cs::ENDCHAR)
            .build();
        assert_eq!(
            shape_of(&font_with(overflow), 1),
            Err(DrawError::Charstring(CharstringError::StackOverflow))
        );
        let underflow = Charstring::new().args(&[1]).op(cs::RMOVETO).build();
        assert_eq!(
            shape_of(&font_with(underflow), 1),
            Err(DrawError::Charstring(CharstringError::StackUnderflow))
        );
        let exactly_full = Charstring::new()
            .args(&[0; MAX_STACK])
            .op(cs::RLINETO)
            .op(cs::ENDCHAR)
            .build();
        assert_eq!(shape_of(&font_with(exactly_full), 1).unwrap().len(), 24);
    }

    #[test]
    fn subroutine_errors() {
        let stray_return = Charstring::new().op(cs::RETURN).build();
        assert_eq!(
            shape_of(&font_with(stray_return), 1),
            Err(DrawError::Charstring(
                CharstringError::ReturnOutsideSubroutine
            ))
        );
        let missing = Charstring::new()
            .args(&[5])
            .op(cs::CALLGSUBR)
            .op(cs::ENDCHAR)
            .build();
        assert_eq!(
            shape_of(&font_with(missing), 1),
            Err(DrawError::Charstring(CharstringError::InvalidSubroutineIndex(
                5
            )))
        );
        // a global subroutine that calls itself forever
        let recursive = Charstring::new()
            .args(&[-107])
            .op(cs::CALLGSUBR)
            .op(cs::RETURN)
            .build();
        let data = CffBuilder::new()
            .charstrings(vec![
                vec![cs::ENDCHAR],
                Charstring::new()
                    .args(&[-107])
                    .op(cs::CALLGSUBR)
                    .op(cs::ENDCHAR)
                    .build(),
            ])
            .global_subrs(vec![recursive])
            .build_font();
        assert_eq!(
            shape_of(&data, 1),
            Err(DrawError::Charstring(CharstringError::SubroutineNestingLimit))
        );
    }

    #[test]
    fn unsupported_escape() {
        let charstring = Charstring::new()
            .args(&[1, 2])
            .escape(0x03) // and
            .op(cs::ENDCHAR)
            .build();
        assert_eq!(
            shape_of(&font_with(charstring), 1),
            Err(DrawError::Charstring(CharstringError::InvalidOperator(3)))
        );
    }

    #[test]
    fn line_and_curve_operators() {
        let charstring = Charstring::new()
            .args(&[10])
            .op(cs::HMOVETO)
            .args(&[100, 50, -20])
            .op(cs::HLINETO)
            .args(&[30, 10, 10, 10])
            .op(cs::VLINETO)
            .args(&[10, 20, 30, 40, 50])
            .op(cs::HHCURVETO)
            .args(&[10, 20, 30, 40, 50])
            .op(cs::VVCURVETO)
            .args(&[10, 20, 30, 40, 5])
            .op(cs::HVCURVETO)
            .op(cs::ENDCHAR)
            .build();
        let shape = shape_of(&font_with(charstring), 1).unwrap();
        assert_eq!(
            shape,
            [
                Vertex::move_to(10, 0),
                Vertex::line_to(110, 0),
                Vertex::line_to(110, 50),
                Vertex::line_to(90, 50),
                Vertex::line_to(90, 80),
                Vertex::line_to(100, 80),
                Vertex::line_to(100, 90),
                Vertex::line_to(110, 90),
                // hhcurveto with a leading dy1
                Vertex::cubic_to(210, 140, 130, 100, 160, 140),
                // vvcurveto with a leading dx1
                Vertex::cubic_to(250, 250, 220, 160, 250, 200),
                // hvcurveto with a trailing dy3
                Vertex::cubic_to(285, 320, 260, 250, 280, 280),
                Vertex::line_to(10, 0),
            ]
        );
    }

    #[test]
    fn empty_charstring() {
        let data = font_with(Vec::new());
        let font = FontInfo::new(&data, 0).unwrap();
        assert_eq!(
            measure(font.cff().unwrap(), GlyphId::new(1)),
            Err(CharstringError::MissingEndChar)
        );
    }

    #[test]
    fn fixed_operands() {
        let charstring = Charstring::new()
            .fixed(10.5)
            .fixed(-20.25)
            .op(cs::RMOVETO)
            .args(&[100, 0])
            .op(cs::RLINETO)
            .op(cs::ENDCHAR)
            .build();
        let shape = shape_of(&font_with(charstring), 1).unwrap();
        assert_eq!(
            shape,
            [
                Vertex::move_to(10, -20),
                Vertex::line_to(110, -20),
                Vertex::line_to(10, -20),
            ]
        );
    }

    #[test]
    fn bounds_include_control_points() {
        let data = cff_data::simple_font();
        let font = FontInfo::new(&data, 0).unwrap();
        let cff = font.cff().unwrap();
        let bounds = measure(cff, GlyphId::new(cff_data::GID_FLEX)).unwrap();
        assert_eq!(bounds.num_vertices, 4);
        let bbox = bounds.bounding_box();
        assert_eq!([bbox.x0, bbox.y0, bbox.x1, bbox.y1], [0, 0, 600, 200]);
        let empty = measure(cff, GlyphId::NOTDEF).unwrap();
        assert_eq!(empty.num_vertices, 0);
        assert!(empty.bounding_box().is_empty());
    }

    #[test]
    fn cid_keyed_subroutines() {
        for format in [0, 3] {
            let data = cff_data::cid_font(format);
            assert_eq!(shape_of(&data, 50).unwrap(), square(0, 0, 100));
            assert_eq!(shape_of(&data, 150).unwrap(), square(0, 0, 500));
            assert_eq!(shape_of(&data, 299).unwrap(), square(0, 0, 500));
            // no font dict covers the last glyph
            assert_eq!(
                shape_of(&data, 300),
                Err(DrawError::Charstring(CharstringError::InvalidSubroutineIndex(
                    -107
                )))
            );
        }
    }
}
