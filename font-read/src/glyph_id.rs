//! Glyph identifiers

/// A glyph identifier.
///
/// Glyph ids are 16-bit in the table formats read here, but `cmap` format 12
/// groups can produce larger values, so the identifier is stored as a `u32`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlyphId(u32);

impl GlyphId {
    /// The identifier reserved for unknown glyphs
    pub const NOTDEF: GlyphId = GlyphId(0);

    /// Construct a new `GlyphId`.
    pub const fn new(raw: u32) -> Self {
        GlyphId(raw)
    }

    /// The identifier as a u32.
    pub const fn to_u32(self) -> u32 {
        self.0
    }

    /// The identifier as a usize, for indexing.
    pub const fn to_usize(self) -> usize {
        self.0 as usize
    }

    /// Returns `true` for the `.notdef` glyph.
    pub const fn is_notdef(self) -> bool {
        self.0 == 0
    }
}

impl From<u16> for GlyphId {
    fn from(value: u16) -> Self {
        GlyphId(value as u32)
    }
}

impl From<u32> for GlyphId {
    fn from(value: u32) -> Self {
        GlyphId(value)
    }
}

impl std::fmt::Display for GlyphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GID_{}", self.0)
    }
}
