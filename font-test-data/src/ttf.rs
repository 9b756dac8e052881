//! A small monospace TrueType font
//!
//! Glyph ids:
//!
//! * 0: `.notdef`, a rectangle
//! * 1: space, empty
//! * 2..=95: `'!'..='~'`, each a box; `'A'` has a curved top instead
//! * 96 (U+E000): a composite of a scaled `'A'` and an offset `'B'`
//! * 97 (U+E001): a diamond made only of off-curve points
//! * 98 (U+E002): a composite that references itself

use crate::{
    be_buffer,
    bebuffer::{BeBuffer, F2Dot14},
    builder::{self, FontBuilder},
    cmap, kern,
};

pub const NUM_GLYPHS: u32 = 99;
pub const UNITS_PER_EM: u16 = 1000;
pub const ADVANCE: i32 = 600;
pub const ASCENT: i16 = 800;
pub const DESCENT: i16 = -200;
pub const LINE_GAP: i16 = 90;
pub const FONT_BBOX: [i32; 4] = [0, -100, 800, 700];

pub const GID_SPACE: u32 = 1;
pub const GID_A: u32 = 34;
pub const GID_B: u32 = 35;
pub const GID_V: u32 = 55;
pub const GID_COMPOSITE: u32 = 96;
pub const GID_OFF_CURVE_START: u32 = 97;
pub const GID_RECURSIVE: u32 = 98;

/// Bounds of the box glyphs.
pub const BOX: [i16; 4] = [100, 0, 500, 500];

/// Offset of the `'B'` component in the composite glyph.
pub const COMPONENT_OFFSET: (i16, i16) = (300, -100);

/// Kerning pairs of the `kern` table, sorted.
pub const KERN_PAIRS: &[(u16, u16, i16)] = &[(34, 55, -80), (53, 80, -40), (55, 34, -70)];

pub const FAMILY_NAME: &str = "Test Mono";
pub const SUBFAMILY_NAME: &str = "Regular";

/// The glyph id for a printable ASCII character.
pub const fn ascii_gid(c: u8) -> u32 {
    c as u32 - 31
}

/// A contour point: `(x, y, on_curve)`.
pub type Point = (i16, i16, bool);

/// Encodes a simple glyph with compressed flags and coordinates.
pub fn simple_glyph(contours: &[&[Point]]) -> Vec<u8> {
    let points: Vec<Point> = contours.iter().flat_map(|c| c.iter().copied()).collect();
    let (x_min, x_max) = min_max(points.iter().map(|p| p.0));
    let (y_min, y_max) = min_max(points.iter().map(|p| p.1));
    let mut buf = be_buffer!(contours.len() as i16, x_min, y_min, x_max, y_max);
    let mut end = 0;
    for contour in contours {
        end += contour.len();
        buf = buf.push((end - 1) as u16);
    }
    // no instructions
    buf = buf.push(0u16);

    let mut flags = Vec::new();
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let (mut last_x, mut last_y) = (0i16, 0i16);
    for &(x, y, on_curve) in &points {
        let mut flag = on_curve as u8;
        flag |= encode_delta(x - last_x, 0x02, 0x10, &mut xs);
        flag |= encode_delta(y - last_y, 0x04, 0x20, &mut ys);
        flags.push(flag);
        (last_x, last_y) = (x, y);
    }
    // run length encode the flags
    let mut i = 0;
    while i < flags.len() {
        let flag = flags[i];
        let run = flags[i + 1..]
            .iter()
            .take(255)
            .take_while(|f| **f == flag)
            .count();
        if run > 0 {
            buf = buf.push(flag | 0x08).push(run as u8);
        } else {
            buf = buf.push(flag);
        }
        i += run + 1;
    }
    let mut data = buf.into_vec();
    data.extend(xs);
    data.extend(ys);
    data
}

fn encode_delta(delta: i16, short: u8, same_or_positive: u8, out: &mut Vec<u8>) -> u8 {
    if delta == 0 {
        same_or_positive
    } else if delta.unsigned_abs() < 256 {
        out.push(delta.unsigned_abs() as u8);
        if delta > 0 {
            short | same_or_positive
        } else {
            short
        }
    } else {
        out.extend(delta.to_be_bytes());
        0
    }
}

fn min_max(values: impl Iterator<Item = i16>) -> (i16, i16) {
    values.fold((i16::MAX, i16::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// A component of a composite glyph.
#[derive(Clone, Copy, Debug)]
pub struct Component {
    pub glyph: u16,
    pub dx: i16,
    pub dy: i16,
    pub scale: Option<f32>,
    /// Use point matching instead of offsets.
    pub anchor: bool,
}

impl Component {
    pub fn offset(glyph: u16, dx: i16, dy: i16) -> Self {
        Self {
            glyph,
            dx,
            dy,
            scale: None,
            anchor: false,
        }
    }
}

/// Encodes a composite glyph with the given header bounds.
pub fn composite_glyph(bbox: [i16; 4], components: &[Component]) -> Vec<u8> {
    let mut buf = be_buffer!(-1i16, bbox[0], bbox[1], bbox[2], bbox[3]);
    for (i, component) in components.iter().enumerate() {
        let bytes = i8::try_from(component.dx).is_ok() && i8::try_from(component.dy).is_ok();
        let mut flags = 0u16;
        if !bytes {
            flags |= 0x0001; // ARG_1_AND_2_ARE_WORDS
        }
        if !component.anchor {
            flags |= 0x0002; // ARGS_ARE_XY_VALUES
        }
        if component.scale.is_some() {
            flags |= 0x0008; // WE_HAVE_A_SCALE
        }
        if i + 1 < components.len() {
            flags |= 0x0020; // MORE_COMPONENTS
        }
        buf = buf.push(flags).push(component.glyph);
        buf = if bytes {
            buf.push(component.dx as i8).push(component.dy as i8)
        } else {
            buf.push(component.dx).push(component.dy)
        };
        if let Some(scale) = component.scale {
            buf = buf.push(F2Dot14(scale));
        }
    }
    buf.into_vec()
}

fn rect(x0: i16, y0: i16, x1: i16, y1: i16) -> Vec<u8> {
    // clockwise
    simple_glyph(&[&[
        (x0, y0, true),
        (x0, y1, true),
        (x1, y1, true),
        (x1, y0, true),
    ]])
}

/// The outlines of every glyph, indexed by glyph id.
pub fn glyphs() -> Vec<Vec<u8>> {
    let mut glyphs = vec![rect(50, 0, 550, 700), Vec::new()];
    for c in b'!'..=b'~' {
        let glyph = match c {
            b'A' => simple_glyph(&[&[
                (50, 0, true),
                (150, 600, false),
                (450, 600, false),
                (550, 0, true),
            ]]),
            _ => rect(BOX[0], BOX[1], BOX[2], BOX[3]),
        };
        glyphs.push(glyph);
    }
    glyphs.push(composite_glyph(
        [17, -100, 800, 400],
        &[
            Component {
                scale: Some(0.5),
                ..Component::offset(GID_A as u16, 10, 20)
            },
            Component::offset(GID_B as u16, COMPONENT_OFFSET.0, COMPONENT_OFFSET.1),
        ],
    ));
    glyphs.push(simple_glyph(&[&[
        (300, 0, false),
        (600, 300, false),
        (300, 600, false),
        (0, 300, false),
    ]]));
    glyphs.push(composite_glyph(
        [0, 0, 100, 100],
        &[Component::offset(GID_RECURSIVE as u16, 0, 0)],
    ));
    assert_eq!(glyphs.len(), NUM_GLYPHS as usize);
    glyphs
}

/// Builds `glyf` and `loca` with 4-byte aligned glyph records.
pub fn glyf_loca(glyphs: &[Vec<u8>], long_offsets: bool) -> (Vec<u8>, Vec<u8>) {
    let mut glyf = Vec::new();
    let mut offsets = vec![0usize];
    for glyph in glyphs {
        glyf.extend(glyph);
        while glyf.len() % 4 != 0 {
            glyf.push(0);
        }
        offsets.push(glyf.len());
    }
    let loca = if long_offsets {
        BeBuffer::new().extend(offsets.iter().map(|o| *o as u32))
    } else {
        BeBuffer::new().extend(offsets.iter().map(|o| (*o / 2) as u16))
    };
    (glyf, loca.into_vec())
}

/// The `head` table.
pub fn head(units_per_em: u16, bbox: [i32; 4], mac_style: u16, long_offsets: bool) -> Vec<u8> {
    be_buffer!(
        0x00010000u32, // version
        0x00010000u32, // fontRevision
        0u32,          // checkSumAdjustment
        0x5F0F3CF5u32, // magicNumber
        0u16,          // flags
        units_per_em,
        0u64, // created
        0u64, // modified
        bbox[0] as i16,
        bbox[1] as i16,
        bbox[2] as i16,
        bbox[3] as i16,
        mac_style,
        8u16, // lowestRecPPEM
        2i16, // fontDirectionHint
        long_offsets as i16,
        0i16 // glyphDataFormat
    )
    .into_vec()
}

/// The `hhea` table.
pub fn hhea(ascent: i16, descent: i16, line_gap: i16, num_h_metrics: u16) -> Vec<u8> {
    be_buffer!(0x00010000u32, ascent, descent, line_gap, ADVANCE as u16)
        .extend([0i16; 3]) // minLeftSideBearing, minRightSideBearing, xMaxExtent
        .extend([1i16, 0, 0]) // caretSlopeRise, caretSlopeRun, caretOffset
        .extend([0i16; 4]) // reserved
        .push(0i16) // metricDataFormat
        .push(num_h_metrics)
        .into_vec()
}

/// The `hmtx` table: `long` metrics followed by trailing side bearings.
pub fn hmtx(long: &[(u16, i16)], lsbs: &[i16]) -> Vec<u8> {
    let mut buf = BeBuffer::new();
    for (advance, lsb) in long {
        buf = buf.push(*advance).push(*lsb);
    }
    buf.extend(lsbs.iter().copied()).into_vec()
}

/// A version 1.0 `maxp` table.
pub fn maxp(num_glyphs: u16) -> Vec<u8> {
    be_buffer!(0x00010000u32, num_glyphs)
        .extend([0u16; 13])
        .into_vec()
}

/// A version 4 `OS/2` table with the given typographic metrics.
pub fn os2(typo_ascender: i16, typo_descender: i16, typo_line_gap: i16) -> Vec<u8> {
    let mut data = vec![0u8; 96];
    data[0..2].copy_from_slice(&4u16.to_be_bytes());
    data[68..70].copy_from_slice(&typo_ascender.to_be_bytes());
    data[70..72].copy_from_slice(&typo_descender.to_be_bytes());
    data[72..74].copy_from_slice(&typo_line_gap.to_be_bytes());
    data
}

/// A format 0 `name` table with family and subfamily names for the Mac
/// Roman and Windows Unicode BMP encodings.
pub fn name(family: &str, subfamily: &str) -> Vec<u8> {
    let utf16 = |s: &str| -> Vec<u8> { s.encode_utf16().flat_map(u16::to_be_bytes).collect() };
    let records: [(u16, u16, u16, u16, Vec<u8>); 4] = [
        (1, 0, 0, 1, family.as_bytes().to_vec()),
        (1, 0, 0, 2, subfamily.as_bytes().to_vec()),
        (3, 1, 0x0409, 1, utf16(family)),
        (3, 1, 0x0409, 2, utf16(subfamily)),
    ];
    let mut buf = be_buffer!(0u16, records.len() as u16, (6 + 12 * records.len()) as u16);
    let mut offset = 0;
    for (platform, encoding, language, name_id, string) in &records {
        buf = buf
            .push(*platform)
            .push(*encoding)
            .push(*language)
            .push(*name_id)
            .push(string.len() as u16)
            .push(offset as u16);
        offset += string.len();
    }
    for (.., string) in &records {
        buf = buf.extend(string.iter().copied());
    }
    buf.into_vec()
}

fn mono_cmap() -> Vec<u8> {
    cmap::cmap_table(&[
        (1, 0, cmap::format0(&[(b'A', GID_A as u8)])),
        (
            3,
            1,
            cmap::format4(&[
                cmap::Segment::delta(0x20, 0x7E, -31),
                cmap::Segment::array(
                    0xE000,
                    &[
                        GID_COMPOSITE as u16,
                        GID_OFF_CURVE_START as u16,
                        GID_RECURSIVE as u16,
                    ],
                ),
            ]),
        ),
    ])
}

fn mono_hmtx(glyphs: &[Vec<u8>]) -> Vec<u8> {
    // the side bearing is xMin from the glyph header
    let lsb = |glyph: &Vec<u8>| {
        glyph
            .get(2..4)
            .map(|b| i16::from_be_bytes([b[0], b[1]]))
            .unwrap_or(0)
    };
    let lsbs: Vec<i16> = glyphs[2..].iter().map(lsb).collect();
    hmtx(
        &[(ADVANCE as u16, lsb(&glyphs[0])), (ADVANCE as u16, 0)],
        &lsbs,
    )
}

fn mono_builder_with_loca(long_offsets: bool) -> FontBuilder {
    let glyphs = glyphs();
    let (glyf, loca) = glyf_loca(&glyphs, long_offsets);
    FontBuilder::new()
        .add_raw(*b"OS/2", os2(780, -220, 60))
        .add_raw(*b"cmap", mono_cmap())
        .add_raw(*b"glyf", glyf)
        .add_raw(
            *b"head",
            head(UNITS_PER_EM, FONT_BBOX, 0, long_offsets),
        )
        .add_raw(*b"hhea", hhea(ASCENT, DESCENT, LINE_GAP, 2))
        .add_raw(*b"hmtx", mono_hmtx(&glyphs))
        .add_raw(*b"kern", kern::format0(KERN_PAIRS))
        .add_raw(*b"loca", loca)
        .add_raw(*b"maxp", maxp(NUM_GLYPHS as u16))
        .add_raw(*b"name", name(FAMILY_NAME, SUBFAMILY_NAME))
}

/// The tables of the monospace font, ready for modification.
pub fn mono_builder() -> FontBuilder {
    mono_builder_with_loca(false)
}

/// The monospace font.
pub fn mono() -> Vec<u8> {
    mono_builder().build()
}

/// The monospace font with long `loca` offsets.
pub fn mono_long_loca() -> Vec<u8> {
    mono_builder_with_loca(true).build()
}

/// The monospace font with pair adjustments in `GPOS`.
///
/// See [`crate::gpos::kerning_gpos`] for the pairs.
pub fn mono_with_gpos() -> Vec<u8> {
    let gpos = crate::gpos::kerning_gpos(
        GID_A as u16,
        GID_V as u16,
        ascii_gid(b'T') as u16,
        ascii_gid(b'o') as u16,
        NUM_GLYPHS as u16,
    );
    mono_builder().add_raw(*b"GPOS", gpos).build()
}

/// A collection holding two copies of the monospace font.
pub fn collection() -> Vec<u8> {
    builder::collection(&[mono_builder(), mono_builder()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_gids() {
        assert_eq!(ascii_gid(b'A'), GID_A);
        assert_eq!(ascii_gid(b'B'), GID_B);
        assert_eq!(ascii_gid(b'V'), GID_V);
        assert_eq!(ascii_gid(b'~'), 95);
    }

    #[test]
    fn compressed_flags() {
        let glyph = rect(0, 0, 10, 300);
        // header, one end point, instruction length
        let flags = &glyph[14..];
        // (0,0): both same; (0,300): x same, y long; (10,300): x short
        // positive, y same; (10,0): x same, y long
        assert_eq!(&flags[..4], &[0x31, 0x11, 0x33, 0x11]);
    }
}
