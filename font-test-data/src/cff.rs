//! CFF structures and CFF-flavored fonts

use std::ops::Range;

use crate::{
    be_buffer,
    bebuffer::BeBuffer,
    builder::{FontBuilder, CFF_SFNT_VERSION},
    cmap, ttf,
};

/// Charstring operators.
pub mod op {
    pub const HSTEM: u8 = 1;
    pub const VSTEM: u8 = 3;
    pub const VMOVETO: u8 = 4;
    pub const RLINETO: u8 = 5;
    pub const HLINETO: u8 = 6;
    pub const VLINETO: u8 = 7;
    pub const RRCURVETO: u8 = 8;
    pub const CALLSUBR: u8 = 10;
    pub const RETURN: u8 = 11;
    pub const ESCAPE: u8 = 12;
    pub const ENDCHAR: u8 = 14;
    pub const HSTEMHM: u8 = 18;
    pub const HINTMASK: u8 = 19;
    pub const CNTRMASK: u8 = 20;
    pub const RMOVETO: u8 = 21;
    pub const HMOVETO: u8 = 22;
    pub const VSTEMHM: u8 = 23;
    pub const RCURVELINE: u8 = 24;
    pub const RLINECURVE: u8 = 25;
    pub const VVCURVETO: u8 = 26;
    pub const HHCURVETO: u8 = 27;
    pub const CALLGSUBR: u8 = 29;
    pub const VHCURVETO: u8 = 30;
    pub const HVCURVETO: u8 = 31;
    /// Escaped operators, following [`ESCAPE`].
    pub const HFLEX: u8 = 34;
    pub const FLEX: u8 = 35;
    pub const HFLEX1: u8 = 36;
    pub const FLEX1: u8 = 37;
}

/// Top and Private DICT operators.
pub mod dict_key {
    pub const CHARSTRINGS: u16 = 17;
    pub const PRIVATE: u16 = 18;
    pub const SUBRS: u16 = 19;
    pub const CHARSTRING_TYPE: u16 = 0x106;
    pub const FD_ARRAY: u16 = 0x124;
    pub const FD_SELECT: u16 = 0x125;
}

/// Builds a Type 2 charstring.
#[derive(Clone, Debug, Default)]
pub struct Charstring(Vec<u8>);

impl Charstring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push integer operands.
    pub fn args(mut self, args: &[i32]) -> Self {
        for arg in args {
            self.0.extend(cs_int(*arg));
        }
        self
    }

    /// Push a 16.16 fixed point operand.
    pub fn fixed(mut self, value: f32) -> Self {
        self.0.push(255);
        self.0.extend(((value * 65536.0) as i32).to_be_bytes());
        self
    }

    pub fn op(mut self, op: u8) -> Self {
        self.0.push(op);
        self
    }

    /// An escaped (two byte) operator.
    pub fn escape(mut self, op: u8) -> Self {
        self.0.extend([op::ESCAPE, op]);
        self
    }

    /// Raw bytes, such as hint mask data.
    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.0
    }
}

/// Encodes a charstring integer operand in its shortest form.
pub fn cs_int(value: i32) -> Vec<u8> {
    match value {
        -107..=107 => vec![(value + 139) as u8],
        108..=1131 => {
            let v = value - 108;
            vec![(v / 256 + 247) as u8, (v % 256) as u8]
        }
        -1131..=-108 => {
            let v = -value - 108;
            vec![(v / 256 + 251) as u8, (v % 256) as u8]
        }
        _ => {
            let mut bytes = vec![28];
            bytes.extend((value as i16).to_be_bytes());
            bytes
        }
    }
}

/// A DICT integer operand in the fixed size five byte form.
pub fn dict_int(value: i32) -> Vec<u8> {
    let mut bytes = vec![29];
    bytes.extend(value.to_be_bytes());
    bytes
}

/// A DICT operator; values above 0xFF are escaped.
pub fn dict_op(op: u16) -> Vec<u8> {
    if op > 0xFF {
        vec![12, (op & 0xFF) as u8]
    } else {
        vec![op as u8]
    }
}

/// Builds an INDEX with the given offset size.
pub fn make_index(items: &[Vec<u8>], off_size: u8) -> Vec<u8> {
    let mut buf = BeBuffer::new().push(items.len() as u16);
    if items.is_empty() {
        return buf.into_vec();
    }
    buf = buf.push(off_size);
    let mut offset = 1u32;
    let push_offset = |buf: BeBuffer, offset: u32| {
        let bytes = offset.to_be_bytes();
        buf.extend(bytes[4 - off_size as usize..].iter().copied())
    };
    buf = push_offset(buf, offset);
    for item in items {
        offset += item.len() as u32;
        buf = push_offset(buf, offset);
    }
    for item in items {
        buf = buf.extend(item.iter().copied());
    }
    buf.into_vec()
}

/// Builds an INDEX with the smallest offset size for its data.
pub fn index(items: &[Vec<u8>]) -> Vec<u8> {
    let last_offset = 1 + items.iter().map(Vec::len).sum::<usize>();
    let off_size = match last_offset {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        0x10000..=0xFFFFFF => 3,
        _ => 4,
    };
    make_index(items, off_size)
}

/// An FDSelect format 0 table with one font dict index per glyph.
pub fn fd_select_format0(fds: &[u8]) -> Vec<u8> {
    let mut data = vec![0];
    data.extend_from_slice(fds);
    data
}

/// An FDSelect format 3 table from sorted, contiguous ranges.
pub fn fd_select_format3(ranges: &[(Range<u32>, u8)]) -> Vec<u8> {
    let mut buf = be_buffer!(3u8, ranges.len() as u16);
    for (range, fd) in ranges {
        buf = buf.push(range.start as u16).push(*fd);
    }
    let sentinel = ranges.last().map(|(range, _)| range.end).unwrap_or(0);
    buf.push(sentinel as u16).into_vec()
}

/// Assembles a CFF table.
#[derive(Clone, Debug)]
pub struct CffBuilder {
    charstring_type: Option<i32>,
    charstrings: Option<Vec<Vec<u8>>>,
    global_subrs: Vec<Vec<u8>>,
    local_subrs: Vec<Vec<u8>>,
    font_dict_subrs: Vec<Vec<Vec<u8>>>,
    fd_select: Option<Vec<u8>>,
}

impl Default for CffBuilder {
    fn default() -> Self {
        Self {
            charstring_type: None,
            charstrings: Some(vec![vec![op::ENDCHAR]]),
            global_subrs: Vec::new(),
            local_subrs: Vec::new(),
            font_dict_subrs: Vec::new(),
            fd_select: None,
        }
    }
}

const PRIVATE_WITH_SUBRS_LEN: usize = 6;
const FONT_DICT_LEN: usize = 11;

impl CffBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes an explicit CharstringType entry.
    pub fn charstring_type(mut self, ty: i32) -> Self {
        self.charstring_type = Some(ty);
        self
    }

    pub fn charstrings(mut self, charstrings: Vec<Vec<u8>>) -> Self {
        self.charstrings = Some(charstrings);
        self
    }

    pub fn omit_charstrings(mut self) -> Self {
        self.charstrings = None;
        self
    }

    pub fn global_subrs(mut self, subrs: Vec<Vec<u8>>) -> Self {
        self.global_subrs = subrs;
        self
    }

    /// Local subroutines of the Top DICT's Private DICT.
    pub fn local_subrs(mut self, subrs: Vec<Vec<u8>>) -> Self {
        self.local_subrs = subrs;
        self
    }

    /// Makes the font CID-keyed with one font dict per entry, each with a
    /// Private DICT holding the given local subroutines.
    pub fn font_dict_subrs(mut self, subrs: Vec<Vec<Vec<u8>>>) -> Self {
        self.font_dict_subrs = subrs;
        if self.fd_select.is_none() {
            self.fd_select = Some(fd_select_format0(&[]));
        }
        self
    }

    pub fn fd_select(mut self, fd_select: Vec<u8>) -> Self {
        self.fd_select = Some(fd_select);
        self
    }

    /// Leaves out the FDSelect entry of a CID-keyed font.
    pub fn omit_fd_select(mut self) -> Self {
        self.fd_select = None;
        self
    }

    fn top_dict(&self, charstrings: usize, private: usize, fd_array: usize, fd_select: usize) -> Vec<u8> {
        let mut dict = Vec::new();
        if self.charstrings.is_some() {
            dict.extend(dict_int(charstrings as i32));
            dict.extend(dict_op(dict_key::CHARSTRINGS));
        }
        if let Some(ty) = self.charstring_type {
            dict.extend(dict_int(ty));
            dict.extend(dict_op(dict_key::CHARSTRING_TYPE));
        }
        if !self.local_subrs.is_empty() {
            dict.extend(dict_int(PRIVATE_WITH_SUBRS_LEN as i32));
            dict.extend(dict_int(private as i32));
            dict.extend(dict_op(dict_key::PRIVATE));
        }
        if !self.font_dict_subrs.is_empty() {
            dict.extend(dict_int(fd_array as i32));
            dict.extend(dict_op(dict_key::FD_ARRAY));
            if self.fd_select.is_some() {
                dict.extend(dict_int(fd_select as i32));
                dict.extend(dict_op(dict_key::FD_SELECT));
            }
        }
        dict
    }

    /// A Private DICT whose Subrs immediately follow it.
    fn private_with_subrs() -> Vec<u8> {
        let mut dict = dict_int(PRIVATE_WITH_SUBRS_LEN as i32);
        dict.extend(dict_op(dict_key::SUBRS));
        dict
    }

    pub fn build_table(&self) -> Vec<u8> {
        let header = vec![1u8, 0, 4, 4];
        let names = index(&[b"Test".to_vec()]);
        let strings = index(&[]);
        let global_subrs = index(&self.global_subrs);
        let charstrings = index(self.charstrings.as_deref().unwrap_or_default());
        // every offset is written in the five byte form so the size of the
        // Top DICT does not depend on the values
        let top_len = index(&[self.top_dict(0, 0, 0, 0)]).len();

        let charstrings_offset =
            header.len() + names.len() + top_len + strings.len() + global_subrs.len();
        let mut position = charstrings_offset + charstrings.len();
        let private_offset = position;
        let local_subrs = index(&self.local_subrs);
        if !self.local_subrs.is_empty() {
            position += PRIVATE_WITH_SUBRS_LEN + local_subrs.len();
        }
        let fd_array_offset = position;
        let fd_subrs: Vec<Vec<u8>> = self.font_dict_subrs.iter().map(|s| index(s)).collect();
        let fd_array_len = index(&vec![vec![0; FONT_DICT_LEN]; fd_subrs.len()]).len();
        let fd_select_offset = fd_array_offset + fd_array_len;
        let fd_select = self.fd_select.clone().unwrap_or_default();
        position = fd_select_offset + fd_select.len();
        let mut font_dicts = Vec::new();
        let mut fd_privates = Vec::new();
        for subrs in &fd_subrs {
            let mut font_dict = dict_int(PRIVATE_WITH_SUBRS_LEN as i32);
            font_dict.extend(dict_int(position as i32));
            font_dict.extend(dict_op(dict_key::PRIVATE));
            font_dicts.push(font_dict);
            fd_privates.extend(Self::private_with_subrs());
            fd_privates.extend(subrs);
            position += PRIVATE_WITH_SUBRS_LEN + subrs.len();
        }

        let top_dict = self.top_dict(
            charstrings_offset,
            private_offset,
            fd_array_offset,
            fd_select_offset,
        );
        let mut data = header;
        data.extend(names);
        data.extend(index(&[top_dict]));
        data.extend(strings);
        data.extend(global_subrs);
        data.extend(charstrings);
        if !self.local_subrs.is_empty() {
            data.extend(Self::private_with_subrs());
            data.extend(local_subrs);
        }
        if !fd_subrs.is_empty() {
            data.extend(index(&font_dicts));
            data.extend(fd_select);
            data.extend(fd_privates);
        }
        data
    }

    /// Wraps the table in an OpenType font with a cmap mapping
    /// `'A'..` to glyphs `1..`.
    pub fn build_font(&self) -> Vec<u8> {
        let num_glyphs = self.charstrings.as_ref().map(Vec::len).unwrap_or(0);
        let last = (num_glyphs.max(2) - 1) as u16;
        let cmap = cmap::cmap_table(&[(
            3,
            1,
            cmap::format4(&[cmap::Segment::delta(0x41, 0x40 + last, -0x40)]),
        )]);
        FontBuilder::new()
            .sfnt_version(CFF_SFNT_VERSION)
            .add_raw(*b"CFF ", self.build_table())
            .add_raw(*b"cmap", cmap)
            .add_raw(*b"head", ttf::head(UNITS_PER_EM, [0, -100, 600, 700], 0, false))
            .add_raw(*b"hhea", ttf::hhea(800, -200, 0, 1))
            .add_raw(*b"hmtx", ttf::hmtx(&[(ADVANCE, 0)], &[]))
            .add_raw(*b"maxp", be_buffer!(0x00005000u32, num_glyphs as u16).into_vec())
            .build()
    }
}

pub const UNITS_PER_EM: u16 = 1000;
pub const ADVANCE: u16 = 500;

pub const SIMPLE_GLYPH_COUNT: usize = 7;

/// A square from (100, 0) to (300, 200) drawn by local subroutine 0.
pub const GID_LOCAL_SUBR: u32 = 1;
/// A square from (0, 0) to (300, 300) drawn by global subroutine 0.
pub const GID_GLOBAL_SUBR: u32 = 2;
/// Width, stem hints and a hint mask before a cubic and a line.
pub const GID_HINTED_CURVE: u32 = 3;
/// Two cubics from a flex operator.
pub const GID_FLEX: u32 = 4;
/// Uses a reserved operator.
pub const GID_RESERVED_OP: u32 = 5;
/// Ends without endchar.
pub const GID_NO_ENDCHAR: u32 = 6;

fn square_subr(x: i32, y: i32, size: i32) -> Vec<u8> {
    Charstring::new()
        .args(&[x, y])
        .op(op::RMOVETO)
        .args(&[size, 0])
        .op(op::RLINETO)
        .args(&[0, size])
        .op(op::RLINETO)
        .args(&[-size, 0])
        .op(op::RLINETO)
        .op(op::RETURN)
        .build()
}

/// The charstrings of [`simple_font`].
pub fn simple_charstrings() -> Vec<Vec<u8>> {
    vec![
        // .notdef draws nothing
        vec![op::ENDCHAR],
        Charstring::new()
            .args(&[-107])
            .op(op::CALLSUBR)
            .op(op::ENDCHAR)
            .build(),
        Charstring::new()
            .args(&[-107])
            .op(op::CALLGSUBR)
            .op(op::ENDCHAR)
            .build(),
        Charstring::new()
            .args(&[50, 0, 10])
            .op(op::HSTEM)
            .op(op::HINTMASK)
            .bytes(&[0x80])
            .args(&[100, 100])
            .op(op::RMOVETO)
            .args(&[0, 100, 100, 100, 100, 0])
            .op(op::RRCURVETO)
            .args(&[0, -200])
            .op(op::RLINETO)
            .op(op::ENDCHAR)
            .build(),
        Charstring::new()
            .args(&[0, 0])
            .op(op::RMOVETO)
            .args(&[100, 100, 100, 100, 100, 0, 100, 0, 100, -100, 100, -100, 50])
            .escape(op::FLEX)
            .op(op::ENDCHAR)
            .build(),
        Charstring::new()
            .args(&[0, 0])
            .op(op::RMOVETO)
            .op(2)
            .op(op::ENDCHAR)
            .build(),
        Charstring::new().args(&[0, 0]).op(op::RMOVETO).build(),
    ]
}

/// A plain (non CID-keyed) CFF font with local and global subroutines.
pub fn simple_font() -> Vec<u8> {
    CffBuilder::new()
        .charstrings(simple_charstrings())
        .global_subrs(vec![square_subr(0, 0, 300)])
        .local_subrs(vec![square_subr(100, 0, 200)])
        .build_font()
}

/// Local subroutine 0 of font dict 0 in [`cid_font`]: a 100 unit square.
#[rustfmt::skip]
pub const FD0_SUBR: &[u8] = &[
    139, 139, 21,    // 0 0 rmoveto
    239, 139, 5,     // 100 0 rlineto
    139, 239, 5,     // 0 100 rlineto
    39, 139, 5,      // -100 0 rlineto
    11,              // return
];

/// Local subroutine 0 of font dict 1 in [`cid_font`]: a 500 unit square.
#[rustfmt::skip]
pub const FD1_SUBR: &[u8] = &[
    139, 139, 21,        // 0 0 rmoveto
    248, 136, 139, 5,    // 500 0 rlineto
    139, 248, 136, 5,    // 0 500 rlineto
    252, 136, 139, 5,    // -500 0 rlineto
    11,                  // return
];

pub const CID_GLYPH_COUNT: usize = 301;

/// Font dict ranges of [`cid_font`]. Glyph 300 is in no range.
pub const CID_FD_RANGES: [(Range<u32>, u8); 2] = [(0..100, 0), (100..300, 1)];

/// A CID-keyed font where every glyph calls local subroutine 0 of its font
/// dict, with FDSelect in the given format (0 or 3).
pub fn cid_font(fd_select_format: u8) -> Vec<u8> {
    let fd_select = match fd_select_format {
        0 => {
            let fds: Vec<u8> = CID_FD_RANGES
                .iter()
                .flat_map(|(range, fd)| range.clone().map(move |_| *fd))
                .collect();
            fd_select_format0(&fds)
        }
        3 => fd_select_format3(&CID_FD_RANGES),
        _ => panic!("unsupported FDSelect format {fd_select_format}"),
    };
    let glyph = Charstring::new()
        .args(&[-107])
        .op(op::CALLSUBR)
        .op(op::ENDCHAR)
        .build();
    CffBuilder::new()
        .charstrings(vec![glyph; CID_GLYPH_COUNT])
        .font_dict_subrs(vec![vec![FD0_SUBR.to_vec()], vec![FD1_SUBR.to_vec()]])
        .fd_select(fd_select)
        .build_font()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charstring_ints() {
        assert_eq!(cs_int(0), [139]);
        assert_eq!(cs_int(100), [239]);
        assert_eq!(cs_int(-100), [39]);
        assert_eq!(cs_int(500), [248, 136]);
        assert_eq!(cs_int(-500), [252, 136]);
        assert_eq!(cs_int(2000), [28, 0x07, 0xD0]);
        assert_eq!(square_subr(0, 0, 100), FD0_SUBR);
        assert_eq!(square_subr(0, 0, 500), FD1_SUBR);
    }

    #[test]
    fn index_layout() {
        let data = make_index(&[vec![1, 2], vec![3]], 2);
        assert_eq!(data, [0, 2, 2, 0, 1, 0, 3, 0, 4, 1, 2, 3]);
        assert_eq!(index(&[]), [0, 0]);
    }

    #[test]
    fn fd_select_sentinel() {
        let data = fd_select_format3(&CID_FD_RANGES);
        assert_eq!(data, [3, 0, 2, 0, 0, 0, 0, 100, 1, 1, 44]);
    }
}
