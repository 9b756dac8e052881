//! The `name` table and font lookup by name.

use std::ops::BitOr;

use crate::{
    collection::font_offset_for_index,
    collection::is_font,
    directory::find_table,
    font::{HEAD, NAME},
    ByteCursor, FontInfo,
};

const NAME_RECORD_LEN: usize = 12;

/// A platform identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlatformId(pub u16);

impl PlatformId {
    pub const UNICODE: Self = Self(0);
    pub const MAC: Self = Self(1);
    pub const ISO: Self = Self(2);
    pub const MICROSOFT: Self = Self(3);
}

/// Encoding identifiers for [`PlatformId::UNICODE`].
pub struct UnicodeEid;

impl UnicodeEid {
    pub const UNICODE_1_0: u16 = 0;
    pub const UNICODE_1_1: u16 = 1;
    pub const ISO_10646: u16 = 2;
    pub const UNICODE_2_0_BMP: u16 = 3;
    pub const UNICODE_2_0_FULL: u16 = 4;
}

/// Encoding identifiers for [`PlatformId::MICROSOFT`].
pub struct MsEid;

impl MsEid {
    pub const SYMBOL: u16 = 0;
    pub const UNICODE_BMP: u16 = 1;
    pub const SHIFTJIS: u16 = 2;
    pub const UNICODE_FULL: u16 = 10;
}

/// Encoding identifiers for [`PlatformId::MAC`].
pub struct MacEid;

impl MacEid {
    pub const ROMAN: u16 = 0;
    pub const JAPANESE: u16 = 1;
    pub const CHINESE_TRAD: u16 = 2;
    pub const KOREAN: u16 = 3;
    pub const ARABIC: u16 = 4;
    pub const HEBREW: u16 = 5;
    pub const GREEK: u16 = 6;
    pub const RUSSIAN: u16 = 7;
}

/// Language identifiers for [`PlatformId::MICROSOFT`].
pub struct MsLang;

impl MsLang {
    pub const ENGLISH: u16 = 0x0409;
    pub const CHINESE: u16 = 0x0804;
    pub const DUTCH: u16 = 0x0413;
    pub const FRENCH: u16 = 0x040C;
    pub const GERMAN: u16 = 0x0407;
    pub const HEBREW: u16 = 0x040D;
    pub const ITALIAN: u16 = 0x0410;
    pub const JAPANESE: u16 = 0x0411;
    pub const KOREAN: u16 = 0x0412;
    pub const RUSSIAN: u16 = 0x0419;
    pub const SPANISH: u16 = 0x040A;
    pub const SWEDISH: u16 = 0x041D;
}

/// Language identifiers for [`PlatformId::MAC`].
pub struct MacLang;

impl MacLang {
    pub const ENGLISH: u16 = 0;
    pub const FRENCH: u16 = 1;
    pub const GERMAN: u16 = 2;
    pub const ITALIAN: u16 = 3;
    pub const DUTCH: u16 = 4;
    pub const SWEDISH: u16 = 5;
    pub const SPANISH: u16 = 6;
    pub const HEBREW: u16 = 10;
    pub const JAPANESE: u16 = 11;
    pub const ARABIC: u16 = 12;
    pub const CHINESE_TRAD: u16 = 19;
    pub const KOREAN: u16 = 23;
    pub const RUSSIAN: u16 = 32;
    pub const CHINESE_SIMPLIFIED: u16 = 33;
}

/// Identifier for an informational string in the `name` table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameId(pub u16);

impl NameId {
    pub const COPYRIGHT_NOTICE: Self = Self(0);
    pub const FAMILY_NAME: Self = Self(1);
    pub const SUBFAMILY_NAME: Self = Self(2);
    pub const UNIQUE_ID: Self = Self(3);
    pub const FULL_NAME: Self = Self(4);
    pub const VERSION_STRING: Self = Self(5);
    pub const POSTSCRIPT_NAME: Self = Self(6);
    pub const TYPOGRAPHIC_FAMILY_NAME: Self = Self(16);
    pub const TYPOGRAPHIC_SUBFAMILY_NAME: Self = Self(17);
}

/// Style requirements for [`find_matching_font`].
///
/// These mirror the low bits of `head.macStyle`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MacStyle(u8);

impl MacStyle {
    /// Match any style; names are compared as family plus subfamily.
    pub const DONT_CARE: Self = Self(0);
    pub const BOLD: Self = Self(1);
    pub const ITALIC: Self = Self(2);
    pub const UNDERSCORE: Self = Self(4);
    /// Require none of the style bits to be set.
    pub const NONE: Self = Self(8);

    pub const fn bits(self) -> u8 {
        self.0
    }

    fn is_dont_care(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for MacStyle {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl<'a> FontInfo<'a> {
    /// Returns the raw bytes of a name string.
    ///
    /// The encoding of the bytes depends on the platform and encoding: they
    /// are UTF-16BE for Unicode and Microsoft Unicode names.
    pub fn font_name_string(
        &self,
        platform: PlatformId,
        encoding: u16,
        language: u16,
        name_id: NameId,
    ) -> Option<&'a [u8]> {
        let name = NameTable::new(self.data(), self.table_offset(NAME)?);
        name.records().find_map(|record| {
            (record.platform == platform.0
                && record.encoding == encoding
                && record.language == language
                && record.name_id == name_id.0)
                .then(|| name.string(&record))
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct NameRecord {
    platform: u16,
    encoding: u16,
    language: u16,
    name_id: u16,
    length: u16,
    offset: u16,
}

impl NameRecord {
    fn is_unicode(&self) -> bool {
        self.platform == PlatformId::UNICODE.0
            || (self.platform == PlatformId::MICROSOFT.0
                && matches!(self.encoding, MsEid::UNICODE_BMP | MsEid::UNICODE_FULL))
    }

    fn same_encoding(&self, other: &NameRecord) -> bool {
        self.platform == other.platform
            && self.encoding == other.encoding
            && self.language == other.language
    }
}

#[derive(Copy, Clone)]
struct NameTable<'a> {
    font: ByteCursor<'a>,
    name: usize,
}

impl<'a> NameTable<'a> {
    fn new(data: &'a [u8], offset: u32) -> Self {
        Self {
            font: ByteCursor::new(data),
            name: offset as usize,
        }
    }

    fn count(&self) -> usize {
        self.font.u16_at(self.name + 2) as usize
    }

    fn record(&self, i: usize) -> NameRecord {
        let loc = self.name + 6 + NAME_RECORD_LEN * i;
        let font = self.font;
        NameRecord {
            platform: font.u16_at(loc),
            encoding: font.u16_at(loc + 2),
            language: font.u16_at(loc + 4),
            name_id: font.u16_at(loc + 6),
            length: font.u16_at(loc + 8),
            offset: font.u16_at(loc + 10),
        }
    }

    fn records(self) -> impl Iterator<Item = NameRecord> + 'a {
        (0..self.count()).map(move |i| self.record(i))
    }

    fn string(&self, record: &NameRecord) -> &'a [u8] {
        let storage = self.name + self.font.u16_at(self.name + 4) as usize;
        self.font
            .range(storage + record.offset as usize, record.length as usize)
            .data()
    }

    /// Looks for a Unicode `target` name that matches `name`, optionally
    /// followed by a space and the `next` name from the adjacent record.
    fn match_pair(&self, name: &str, target: NameId, next: Option<NameId>) -> bool {
        let name = name.as_bytes();
        let count = self.count();
        for i in 0..count {
            let record = self.record(i);
            if record.name_id != target.0 || !record.is_unicode() {
                continue;
            }
            let Some(matched) = utf16be_prefix_len(name, self.string(&record)) else {
                continue;
            };
            let following = (i + 1 < count).then(|| self.record(i + 1));
            match following {
                Some(next_record)
                    if Some(NameId(next_record.name_id)) == next
                        && next_record.same_encoding(&record) =>
                {
                    if next_record.length == 0 {
                        if matched == name.len() {
                            return true;
                        }
                    } else if name.get(matched) == Some(&b' ') {
                        let rest = &name[matched + 1..];
                        if utf16be_prefix_len(rest, self.string(&next_record)) == Some(rest.len())
                        {
                            return true;
                        }
                    }
                }
                _ => {
                    if matched == name.len() {
                        return true;
                    }
                }
            }
        }
        false
    }
}

/// Compares the UTF-8 `utf8` against the UTF-16BE string `utf16`.
///
/// Returns the number of bytes of `utf8` matched if all of `utf16` is a
/// prefix of it.
fn utf16be_prefix_len(utf8: &[u8], utf16: &[u8]) -> Option<usize> {
    let units = utf16
        .chunks_exact(2)
        .map(|unit| u16::from_be_bytes([unit[0], unit[1]]));
    let mut matched = 0;
    for ch in char::decode_utf16(units) {
        let ch = ch.ok()?;
        let mut buf = [0; 4];
        let encoded = ch.encode_utf8(&mut buf).as_bytes();
        if !utf8.get(matched..)?.starts_with(encoded) {
            return None;
        }
        matched += encoded.len();
    }
    Some(matched)
}

fn font_matches(data: &[u8], offset: u32, name: &str, style: MacStyle) -> bool {
    let start = offset as usize;
    if !data.get(start..).is_some_and(is_font) {
        return false;
    }
    let font = ByteCursor::new(data);
    if !style.is_dont_care() {
        let Some(head) = find_table(data, start, HEAD) else {
            return false;
        };
        if font.u16_at(head as usize + 44) & 7 != (style.bits() & 7) as u16 {
            return false;
        }
    }
    let Some(name_offset) = find_table(data, start, NAME) else {
        return false;
    };
    let table = NameTable::new(data, name_offset);
    let pairs: [(NameId, Option<NameId>); 3] = if style.is_dont_care() {
        [
            (
                NameId::TYPOGRAPHIC_FAMILY_NAME,
                Some(NameId::TYPOGRAPHIC_SUBFAMILY_NAME),
            ),
            (NameId::FAMILY_NAME, Some(NameId::SUBFAMILY_NAME)),
            (NameId::UNIQUE_ID, None),
        ]
    } else {
        [
            (NameId::TYPOGRAPHIC_FAMILY_NAME, None),
            (NameId::FAMILY_NAME, None),
            (NameId::UNIQUE_ID, None),
        ]
    };
    pairs
        .into_iter()
        .any(|(target, next)| table.match_pair(name, target, next))
}

/// Finds the offset of the font in `data` whose name matches `name`.
///
/// With [`MacStyle::DONT_CARE`], `name` is compared against the family name
/// followed by a space and the subfamily name (for example "Test Mono
/// Regular"), or against the unique identifier. With any other style,
/// `name` is compared against the family name alone and the font's
/// `macStyle` bits must equal `style`.
pub fn find_matching_font(data: &[u8], name: &str, style: MacStyle) -> Option<u32> {
    (0..)
        .map_while(|index| font_offset_for_index(data, index))
        .find(|&offset| font_matches(data, offset, name, style))
}

#[cfg(test)]
mod tests {
    use super::*;
    use font_test_data::ttf;

    fn utf16(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(u16::to_be_bytes).collect()
    }

    #[test]
    fn utf16_prefix() {
        assert_eq!(utf16be_prefix_len(b"Test Mono", &utf16("Test")), Some(4));
        assert_eq!(utf16be_prefix_len(b"Test", &utf16("Test Mono")), None);
        assert_eq!(utf16be_prefix_len("caf\u{e9}!".as_bytes(), &utf16("caf\u{e9}")), Some(5));
        assert_eq!(utf16be_prefix_len("\u{1F600}".as_bytes(), &utf16("\u{1F600}")), Some(4));
        // unpaired surrogate
        assert_eq!(utf16be_prefix_len(b"a", &[0xDC, 0x00]), None);
    }

    #[test]
    fn name_strings() {
        let data = ttf::mono();
        let font = FontInfo::new(&data, 0).unwrap();
        let family = font.font_name_string(
            PlatformId::MICROSOFT,
            MsEid::UNICODE_BMP,
            MsLang::ENGLISH,
            NameId::FAMILY_NAME,
        );
        assert_eq!(family, Some(utf16(ttf::FAMILY_NAME).as_slice()));
        let mac = font.font_name_string(
            PlatformId::MAC,
            MacEid::ROMAN,
            MacLang::ENGLISH,
            NameId::FAMILY_NAME,
        );
        assert_eq!(mac, Some(ttf::FAMILY_NAME.as_bytes()));
        let missing = font.font_name_string(
            PlatformId::MICROSOFT,
            MsEid::UNICODE_BMP,
            MsLang::SPANISH,
            NameId::FAMILY_NAME,
        );
        assert_eq!(missing, None);
    }

    #[test]
    fn spanish_is_distinct() {
        assert_ne!(MsLang::SPANISH, MsLang::ENGLISH);
    }

    #[test]
    fn match_family_and_subfamily() {
        let data = ttf::mono();
        let full = format!("{} {}", ttf::FAMILY_NAME, ttf::SUBFAMILY_NAME);
        assert_eq!(find_matching_font(&data, &full, MacStyle::DONT_CARE), Some(0));
        assert_eq!(
            find_matching_font(&data, ttf::FAMILY_NAME, MacStyle::DONT_CARE),
            None
        );
        assert_eq!(
            find_matching_font(&data, "Test Mono Bold", MacStyle::DONT_CARE),
            None
        );
        // the family alone with an explicit style
        assert_eq!(
            find_matching_font(&data, ttf::FAMILY_NAME, MacStyle::NONE),
            Some(0)
        );
        assert_eq!(
            find_matching_font(&data, ttf::FAMILY_NAME, MacStyle::BOLD),
            None
        );
        assert_eq!(
            find_matching_font(&data, ttf::FAMILY_NAME, MacStyle::BOLD | MacStyle::ITALIC),
            None
        );
    }

    #[test]
    fn match_in_collection() {
        let data = ttf::collection();
        let second = font_offset_for_index(&data, 1).unwrap();
        let full = format!("{} {}", ttf::FAMILY_NAME, ttf::SUBFAMILY_NAME);
        // both fonts share a name, so the first wins
        assert_ne!(second, 0);
        assert_eq!(
            find_matching_font(&data, &full, MacStyle::DONT_CARE),
            font_offset_for_index(&data, 0)
        );
        assert_eq!(find_matching_font(b"junk", &full, MacStyle::DONT_CARE), None);
    }
}
