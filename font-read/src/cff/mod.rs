//! Support for the Compact Font Format.
//!
//! Only the structures required to locate charstrings and subroutines are
//! decoded: the header, the Top DICT, the global and local subroutine
//! INDEXes and, for CID-keyed fonts, the FDArray and FDSelect.

pub mod dict;
pub mod fd_select;
pub mod index;

pub use dict::Dict;
pub use index::Index;

use crate::{ByteCursor, GlyphId, ReadError};

/// Parsed CFF structures for a single font.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CffInfo<'a> {
    cff: ByteCursor<'a>,
    charstrings: Index<'a>,
    global_subrs: Index<'a>,
    subrs: Index<'a>,
    font_dicts: Index<'a>,
    fd_select: ByteCursor<'a>,
}

impl<'a> CffInfo<'a> {
    /// Parses the CFF table in `data`.
    ///
    /// Only the first font in the Name INDEX is used.
    pub fn new(data: &'a [u8]) -> Result<Self, ReadError> {
        let cff = ByteCursor::new(data);
        let mut b = cff;
        // header: major, minor, hdrSize, offSize
        b.skip(2);
        let header_size = b.get8() as usize;
        b.seek(header_size);

        let _names = Index::read(&mut b);
        let top_dicts = Index::read(&mut b);
        let top_dict = Dict::new(top_dicts.get(0));
        let _strings = Index::read(&mut b);
        let global_subrs = Index::read(&mut b);

        let charstrings_offset = top_dict.get_int(dict::CHARSTRINGS).unwrap_or(0);
        let mut charstring_type = [2];
        top_dict.get_ints(dict::CHARSTRING_TYPE, &mut charstring_type);
        let fd_array_offset = top_dict.get_int(dict::FD_ARRAY).unwrap_or(0);
        let fd_select_offset = top_dict.get_int(dict::FD_SELECT).unwrap_or(0);
        let subrs = private_subrs(cff, top_dict);

        if charstring_type[0] != 2 {
            log::debug!("unsupported charstring type {}", charstring_type[0]);
            return Err(ReadError::UnsupportedCharstringType(
                charstring_type[0] as u32,
            ));
        }
        if charstrings_offset == 0 {
            return Err(ReadError::MissingCharstrings);
        }

        let mut font_dicts = Index::default();
        let mut fd_select = ByteCursor::empty();
        if fd_array_offset != 0 {
            // looks like a CID font
            if fd_select_offset == 0 {
                return Err(ReadError::MissingFdSelect);
            }
            b.seek(offset(fd_array_offset));
            font_dicts = Index::read(&mut b);
            fd_select = cff.tail(offset(fd_select_offset));
        }

        b.seek(offset(charstrings_offset));
        let charstrings = Index::read(&mut b);
        Ok(Self {
            cff,
            charstrings,
            global_subrs,
            subrs,
            font_dicts,
            fd_select,
        })
    }

    /// The CharStrings INDEX.
    pub fn charstrings(&self) -> Index<'a> {
        self.charstrings
    }

    /// Returns the charstring for `glyph`, empty if out of range.
    pub fn charstring(&self, glyph: GlyphId) -> ByteCursor<'a> {
        self.charstrings.get(glyph.to_usize())
    }

    /// The global subroutine INDEX.
    pub fn global_subrs(&self) -> Index<'a> {
        self.global_subrs
    }

    /// The local subroutines from the Top DICT's Private DICT.
    ///
    /// For CID-keyed fonts use [`Self::local_subrs_for_glyph`].
    pub fn subrs(&self) -> Index<'a> {
        self.subrs
    }

    /// The FDArray INDEX, empty unless the font is CID-keyed.
    pub fn font_dicts(&self) -> Index<'a> {
        self.font_dicts
    }

    /// Returns `true` if the font has an FDSelect table.
    pub fn is_cid(&self) -> bool {
        !self.fd_select.is_empty()
    }

    /// Returns the font DICT index for `glyph` in a CID-keyed font.
    pub fn font_dict_index(&self, glyph: GlyphId) -> Option<usize> {
        fd_select::font_index(self.fd_select, glyph.to_u32())
    }

    /// Returns the local subroutines that apply to `glyph`.
    ///
    /// In CID-keyed fonts these come from the Private DICT of the font DICT
    /// selected by FDSelect; otherwise this is [`Self::subrs`].
    pub fn local_subrs_for_glyph(&self, glyph: GlyphId) -> Index<'a> {
        if !self.is_cid() {
            return self.subrs;
        }
        match self.font_dict_index(glyph) {
            Some(fd) => private_subrs(self.cff, Dict::new(self.font_dicts.get(fd))),
            None => Index::default(),
        }
    }
}

fn offset(value: i32) -> usize {
    value.max(0) as usize
}

/// Resolves the Subrs INDEX of the Private DICT referenced by `font_dict`.
///
/// The Subrs offset is relative to the start of the Private DICT.
fn private_subrs<'a>(cff: ByteCursor<'a>, font_dict: Dict<'a>) -> Index<'a> {
    // [size, offset]
    let mut private = [0; 2];
    font_dict.get_ints(dict::PRIVATE, &mut private);
    let [size, private_offset] = private;
    if size <= 0 || private_offset <= 0 {
        return Index::default();
    }
    let private_dict = Dict::new(cff.range(offset(private_offset), offset(size)));
    let subrs_offset = private_dict.get_int(dict::SUBRS).unwrap_or(0);
    if subrs_offset == 0 {
        return Index::default();
    }
    let mut b = cff;
    b.seek(offset(private_offset).saturating_add_signed(subrs_offset as isize));
    Index::read(&mut b)
}
