//! The font descriptor.

use std::ops::Range;

use crate::{
    cff::CffInfo,
    collection::font_offset_for_index,
    directory::{find_table, find_table_range},
    ByteCursor, GlyphId, ReadError, Tag,
};

pub const CMAP: Tag = Tag::new(b"cmap");
pub const LOCA: Tag = Tag::new(b"loca");
pub const HEAD: Tag = Tag::new(b"head");
pub const GLYF: Tag = Tag::new(b"glyf");
pub const HHEA: Tag = Tag::new(b"hhea");
pub const HMTX: Tag = Tag::new(b"hmtx");
pub const KERN: Tag = Tag::new(b"kern");
pub const GPOS: Tag = Tag::new(b"GPOS");
pub const CFF: Tag = Tag::new(b"CFF ");
pub const MAXP: Tag = Tag::new(b"maxp");
pub const OS2: Tag = Tag::new(b"OS/2");
pub const NAME: Tag = Tag::new(b"name");

/// Platform identifiers accepted as Unicode cmap subtables.
const PLATFORM_UNICODE: u16 = 0;
const PLATFORM_MICROSOFT: u16 = 3;
const MS_EID_UNICODE_BMP: u16 = 1;
const MS_EID_UNICODE_FULL: u16 = 10;

/// The source of glyph outlines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outlines<'a> {
    /// TrueType quadratic outlines in `glyf`, indexed by `loca`.
    Glyf { glyf: u32, loca: u32 },
    /// Type 2 charstrings in a `CFF ` table.
    Cff(CffInfo<'a>),
}

/// A font ready for queries.
///
/// This holds a reference to the font data and the resolved offsets of the
/// tables used for mapping, outlines and metrics. It is immutable once
/// created and can be shared freely between threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontInfo<'a> {
    data: &'a [u8],
    font_start: u32,
    num_glyphs: u32,
    pub(crate) head: u32,
    pub(crate) hhea: u32,
    pub(crate) hmtx: u32,
    pub(crate) kern: Option<u32>,
    pub(crate) gpos: Option<u32>,
    pub(crate) index_map: u32,
    index_to_loc_format: u16,
    outlines: Outlines<'a>,
}

impl<'a> FontInfo<'a> {
    /// Initializes the font whose table directory begins at `font_start`.
    ///
    /// For single fonts `font_start` is 0; for collections use
    /// [`font_offset_for_index`] or [`Self::from_index`].
    pub fn new(data: &'a [u8], font_start: u32) -> Result<Self, ReadError> {
        let start = font_start as usize;
        let table = |tag| find_table(data, start, tag);
        let required = |tag| {
            table(tag).ok_or_else(|| {
                log::debug!("font is missing required table {tag}");
                ReadError::TableIsMissing(tag)
            })
        };
        let cmap = required(CMAP)?;
        let head = required(HEAD)?;
        let hhea = required(HHEA)?;
        let hmtx = required(HMTX)?;
        let kern = table(KERN);
        let gpos = table(GPOS);

        let outlines = match (table(GLYF), table(LOCA)) {
            (Some(glyf), Some(loca)) => Outlines::Glyf { glyf, loca },
            (Some(_), None) => {
                log::debug!("font has a glyf table without loca");
                return Err(ReadError::MissingLoca);
            }
            (None, _) => {
                let range = find_table_range(data, start, CFF).ok_or_else(|| {
                    log::debug!("font has neither glyf nor CFF outlines");
                    ReadError::TableIsMissing(CFF)
                })?;
                Outlines::Cff(CffInfo::new(&data[range])?)
            }
        };

        let font = ByteCursor::new(data);
        let num_glyphs = table(MAXP)
            .map(|maxp| font.u16_at(maxp as usize + 4) as u32)
            .unwrap_or(0xFFFF);

        // the last Unicode subtable wins
        let num_subtables = font.u16_at(cmap as usize + 2) as usize;
        let index_map = (0..num_subtables)
            .map(|i| cmap as usize + 4 + 8 * i)
            .filter(|&record| {
                let platform = font.u16_at(record);
                let encoding = font.u16_at(record + 2);
                match platform {
                    PLATFORM_MICROSOFT => {
                        matches!(encoding, MS_EID_UNICODE_BMP | MS_EID_UNICODE_FULL)
                    }
                    PLATFORM_UNICODE => true,
                    _ => false,
                }
            })
            .map(|record| cmap.wrapping_add(font.u32_at(record + 4)))
            .last()
            .ok_or(ReadError::NoUnicodeCmap)?;

        let index_to_loc_format = font.u16_at(head as usize + 50);

        Ok(Self {
            data,
            font_start,
            num_glyphs,
            head,
            hhea,
            hmtx,
            kern,
            gpos,
            index_map,
            index_to_loc_format,
            outlines,
        })
    }

    /// Initializes the font at `index` in a collection, or the only font in
    /// a bare font file.
    pub fn from_index(data: &'a [u8], index: u32) -> Result<Self, ReadError> {
        let offset = font_offset_for_index(data, index).ok_or_else(|| {
            if crate::collection::number_of_fonts(data) == 0 {
                ReadError::NotAFont
            } else {
                ReadError::FontIndexOutOfRange(index)
            }
        })?;
        Self::new(data, offset)
    }

    /// The raw font data, including any other fonts of a collection.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// A cursor over the whole font data.
    pub fn cursor(&self) -> ByteCursor<'a> {
        ByteCursor::new(self.data)
    }

    /// The offset of this font's table directory.
    pub fn font_start(&self) -> u32 {
        self.font_start
    }

    /// The number of glyphs from `maxp`, or 0xFFFF if the table is missing.
    pub fn num_glyphs(&self) -> u32 {
        self.num_glyphs
    }

    /// The absolute offset of the cmap subtable used for Unicode mapping.
    pub fn index_map(&self) -> u32 {
        self.index_map
    }

    /// The `indexToLocFormat` field of `head`: 0 for short offsets, 1 for
    /// long. Any other value makes every glyf lookup fail.
    pub fn index_to_loc_format(&self) -> u16 {
        self.index_to_loc_format
    }

    /// Where the glyph outlines come from.
    pub fn outlines(&self) -> &Outlines<'a> {
        &self.outlines
    }

    /// The CFF structures, if this is a CFF-flavored font.
    pub fn cff(&self) -> Option<&CffInfo<'a>> {
        match &self.outlines {
            Outlines::Cff(cff) => Some(cff),
            Outlines::Glyf { .. } => None,
        }
    }

    /// Returns the absolute offset of any table in this font.
    pub fn table_offset(&self, tag: Tag) -> Option<u32> {
        find_table(self.data, self.font_start as usize, tag)
    }

    /// Returns the absolute byte range of the `glyf` record for `glyph`.
    ///
    /// Returns `None` for CFF fonts, out of range glyphs, an invalid loca
    /// format and zero length records (empty glyphs).
    pub fn glyph_data_range(&self, glyph: GlyphId) -> Option<Range<usize>> {
        let Outlines::Glyf { glyf, loca } = self.outlines else {
            return None;
        };
        if glyph.to_u32() >= self.num_glyphs {
            return None;
        }
        let font = self.cursor();
        let (glyf, loca, ix) = (glyf as usize, loca as usize, glyph.to_usize());
        let (g1, g2) = match self.index_to_loc_format {
            0 => (
                glyf + font.u16_at(loca + ix * 2) as usize * 2,
                glyf + font.u16_at(loca + ix * 2 + 2) as usize * 2,
            ),
            1 => (
                glyf + font.u32_at(loca + ix * 4) as usize,
                glyf + font.u32_at(loca + ix * 4 + 4) as usize,
            ),
            _ => return None,
        };
        (g2 > g1).then_some(g1..g2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use font_test_data::{builder::FontBuilder, cff as cff_data, ttf};

    #[test]
    fn init_truetype() {
        let data = ttf::mono();
        let font = FontInfo::new(&data, 0).unwrap();
        assert!(matches!(font.outlines(), Outlines::Glyf { .. }));
        assert_eq!(font.num_glyphs(), ttf::NUM_GLYPHS);
        assert_eq!(font.index_to_loc_format(), 0);
        assert!(font.kern.is_some());
        assert!(font.gpos.is_none());
        assert!(font.cff().is_none());
    }

    #[test]
    fn init_is_idempotent() {
        let data = ttf::mono();
        assert_eq!(FontInfo::new(&data, 0), FontInfo::new(&data, 0));
        let data = cff_data::cid_font(3);
        assert_eq!(FontInfo::new(&data, 0), FontInfo::new(&data, 0));
    }

    #[test]
    fn init_cff() {
        let data = cff_data::simple_font();
        let font = FontInfo::new(&data, 0).unwrap();
        assert!(font.cff().is_some());
        assert_eq!(font.num_glyphs(), cff_data::SIMPLE_GLYPH_COUNT as u32);
        assert_eq!(font.glyph_data_range(GlyphId::new(1)), None);
    }

    #[test]
    fn missing_required_tables() {
        for tag in [CMAP, HEAD, HHEA, HMTX] {
            let data = ttf::mono_builder().remove(tag).build();
            assert_eq!(FontInfo::new(&data, 0), Err(ReadError::TableIsMissing(tag)));
        }
        let data = ttf::mono_builder().remove(LOCA).build();
        assert_eq!(FontInfo::new(&data, 0), Err(ReadError::MissingLoca));
        let data = ttf::mono_builder().remove(LOCA).remove(GLYF).build();
        assert_eq!(FontInfo::new(&data, 0), Err(ReadError::TableIsMissing(CFF)));
    }

    #[test]
    fn missing_maxp_is_unbounded() {
        let data = ttf::mono_builder().remove(MAXP).build();
        let font = FontInfo::new(&data, 0).unwrap();
        assert_eq!(font.num_glyphs(), 0xFFFF);
    }

    #[test]
    fn last_unicode_subtable_wins() {
        use font_test_data::cmap;
        let bmp = cmap::format4(&[cmap::Segment::delta(0x41, 0x41, 1)]);
        let full = cmap::format12(&[(0x41, 0x41, 7)]);
        let mac = cmap::format0(&[(0x41, 9)]);
        let table = cmap::cmap_table(&[(3, 1, bmp), (3, 10, full), (1, 0, mac)]);
        let data = ttf::mono_builder().add_raw(CMAP, table).build();
        let font = FontInfo::new(&data, 0).unwrap();
        assert_eq!(font.find_glyph_index(0x41), GlyphId::new(7));
    }

    #[test]
    fn requires_unicode_cmap() {
        use font_test_data::cmap;
        let mac = cmap::format0(&[(0x41, 9)]);
        let symbol = cmap::format4(&[cmap::Segment::delta(0x41, 0x41, 1)]);
        let table = cmap::cmap_table(&[(1, 0, mac), (3, 0, symbol)]);
        let data = ttf::mono_builder().add_raw(CMAP, table).build();
        assert_eq!(FontInfo::new(&data, 0), Err(ReadError::NoUnicodeCmap));
    }

    #[test]
    fn ascii_coverage() {
        let data = ttf::mono();
        let font = FontInfo::new(&data, 0).unwrap();
        for c in 32..=126u32 {
            let gid = font.find_glyph_index(c);
            assert_ne!(gid, GlyphId::NOTDEF, "U+{c:04X}");
            assert_eq!(font.find_glyph_index(c), gid);
        }
        assert_eq!(font.find_glyph_index('A' as u32), GlyphId::new(ttf::GID_A));
    }

    #[test]
    fn collection_fonts() {
        let data = ttf::collection();
        let first = FontInfo::from_index(&data, 0).unwrap();
        let second = FontInfo::from_index(&data, 1).unwrap();
        assert_ne!(first.font_start(), second.font_start());
        assert_eq!(first.find_glyph_index(0x41), second.find_glyph_index(0x41));
        assert_eq!(
            FontInfo::from_index(&data, 2),
            Err(ReadError::FontIndexOutOfRange(2))
        );
        assert_eq!(FontInfo::from_index(b"junk", 0), Err(ReadError::NotAFont));
    }

    #[test]
    fn glyph_ranges() {
        let data = ttf::mono();
        let font = FontInfo::new(&data, 0).unwrap();
        // space has no outline
        assert_eq!(font.glyph_data_range(font.find_glyph_index(0x20)), None);
        assert!(font.glyph_data_range(GlyphId::new(ttf::GID_A)).is_some());
        assert_eq!(font.glyph_data_range(GlyphId::new(ttf::NUM_GLYPHS)), None);

        let data = ttf::mono_long_loca();
        let font = FontInfo::new(&data, 0).unwrap();
        assert_eq!(font.index_to_loc_format(), 1);
        assert!(font.glyph_data_range(GlyphId::new(ttf::GID_A)).is_some());
    }

    #[test]
    fn invalid_loca_format() {
        let mut data = ttf::mono();
        let head = find_table(&data, 0, HEAD).unwrap() as usize;
        data[head + 50..head + 52].copy_from_slice(&[0, 2]);
        let font = FontInfo::new(&data, 0).unwrap();
        assert_eq!(font.glyph_data_range(GlyphId::new(ttf::GID_A)), None);
    }

    #[test]
    fn raw_builder_font() {
        // a font with nothing but the required tables and no outlines
        let data = FontBuilder::new().build();
        assert_eq!(
            FontInfo::new(&data, 0),
            Err(ReadError::TableIsMissing(CMAP))
        );
    }
}
