//! Errors that can occur when loading a font.

use crate::Tag;

/// An error that occurs when a font cannot be initialized.
///
/// Malformed data inside tables never produces an error: reads are clamped
/// and degrade to empty glyphs or zero metrics. These variants cover the
/// structural checks performed when a [`FontInfo`](crate::FontInfo) is
/// created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadError {
    /// The data does not start with a recognized sfnt or collection header.
    NotAFont,
    /// The requested index does not exist in the collection.
    FontIndexOutOfRange(u32),
    /// A required table is missing.
    TableIsMissing(Tag),
    /// A `glyf` table is present without a `loca` table.
    MissingLoca,
    /// The CFF top dict has no CharStrings offset.
    MissingCharstrings,
    /// Only Type 2 charstrings are supported.
    UnsupportedCharstringType(u32),
    /// A CID-keyed CFF font has an FDArray but no FDSelect.
    MissingFdSelect,
    /// The cmap has no Unicode subtable.
    NoUnicodeCmap,
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::NotAFont => write!(f, "Data is not a font or font collection"),
            ReadError::FontIndexOutOfRange(ix) => {
                write!(f, "Invalid index {ix} for font collection")
            }
            ReadError::TableIsMissing(tag) => write!(f, "the {tag} table is missing"),
            ReadError::MissingLoca => write!(f, "the glyf table requires a loca table"),
            ReadError::MissingCharstrings => write!(f, "the CFF table has no charstrings"),
            ReadError::UnsupportedCharstringType(ty) => {
                write!(f, "unsupported charstring type {ty}")
            }
            ReadError::MissingFdSelect => {
                write!(f, "CID-keyed CFF font has an FDArray but no FDSelect")
            }
            ReadError::NoUnicodeCmap => write!(f, "the cmap table has no Unicode subtable"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ReadError {}
