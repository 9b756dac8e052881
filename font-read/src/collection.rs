//! Single fonts and TrueType collections.

use crate::ByteCursor;

const TTC_HEADER_TAG: [u8; 4] = *b"ttcf";

/// Returns `true` if `data` starts with a recognized sfnt version tag.
pub fn is_font(data: &[u8]) -> bool {
    matches!(
        data.get(..4),
        Some(b"1\0\0\0") // TrueType 1
            | Some(b"typ1") // TrueType with type 1 font; no outlines for these
            | Some(b"OTTO") // OpenType with CFF
            | Some(&[0, 1, 0, 0]) // OpenType 1.0
            | Some(b"true") // Apple TrueType
    )
}

fn collection_header(data: &[u8]) -> Option<u32> {
    if data.get(..4) != Some(&TTC_HEADER_TAG[..]) {
        return None;
    }
    let header = ByteCursor::new(data);
    match header.u32_at(4) {
        0x00010000 | 0x00020000 => Some(header.u32_at(8)),
        _ => None,
    }
}

/// The number of fonts in `data`.
///
/// Returns 1 for a bare font, the font count for a collection, and 0 if the
/// data is not recognized.
pub fn number_of_fonts(data: &[u8]) -> u32 {
    if is_font(data) {
        return 1;
    }
    collection_header(data).unwrap_or(0)
}

/// The offset of the font at `index`.
///
/// A bare font only has index 0, at offset 0.
pub fn font_offset_for_index(data: &[u8], index: u32) -> Option<u32> {
    if is_font(data) {
        return (index == 0).then_some(0);
    }
    let num_fonts = collection_header(data)?;
    if index >= num_fonts {
        return None;
    }
    let offset = 12usize.checked_add((index as usize).checked_mul(4)?)?;
    Some(ByteCursor::new(data).u32_at(offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_fonts() {
        for magic in [b"OTTO", b"true", b"typ1", b"1\0\0\0", &[0, 1, 0, 0]] {
            assert_eq!(number_of_fonts(magic), 1);
            assert_eq!(font_offset_for_index(magic, 0), Some(0));
            assert_eq!(font_offset_for_index(magic, 1), None);
        }
        assert_eq!(number_of_fonts(b"wOFF"), 0);
        assert_eq!(font_offset_for_index(b"wOFF", 0), None);
        assert_eq!(number_of_fonts(&[]), 0);
    }

    #[test]
    fn collection_offsets() {
        let ttc = font_test_data::ttf::collection();
        assert_eq!(number_of_fonts(&ttc), 2);
        let first = font_offset_for_index(&ttc, 0).unwrap();
        let second = font_offset_for_index(&ttc, 1).unwrap();
        assert!(first > 0 && second > first);
        assert!(is_font(&ttc[first as usize..]));
        assert!(is_font(&ttc[second as usize..]));
        assert_eq!(font_offset_for_index(&ttc, 2), None);
    }

    #[test]
    fn unknown_collection_version() {
        let mut ttc = font_test_data::ttf::collection();
        ttc[4..8].copy_from_slice(&[0, 3, 0, 0]);
        assert_eq!(number_of_fonts(&ttc), 0);
        assert_eq!(font_offset_for_index(&ttc, 0), None);
    }
}
