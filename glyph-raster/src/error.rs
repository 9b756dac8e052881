//! Errors that may occur when decoding glyph outlines.

use core::fmt;

use crate::{outline::GLYF_COMPOSITE_RECURSION_LIMIT, GlyphId};

/// Errors produced while interpreting a Type 2 charstring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharstringError {
    /// More than 48 operands were pushed.
    StackOverflow,
    /// An operator was missing required operands.
    StackUnderflow,
    /// Subroutine calls nested more than 10 levels deep.
    SubroutineNestingLimit,
    /// A subroutine call referenced a missing or empty subroutine.
    InvalidSubroutineIndex(i32),
    /// A return operator outside of any subroutine.
    ReturnOutsideSubroutine,
    /// A reserved or unsupported operator.
    InvalidOperator(u8),
    /// The charstring ended without an endchar operator.
    MissingEndChar,
}

impl fmt::Display for CharstringError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::StackOverflow => write!(f, "charstring operand stack overflow"),
            Self::StackUnderflow => write!(f, "charstring operator is missing operands"),
            Self::SubroutineNestingLimit => write!(f, "subroutine nesting limit exceeded"),
            Self::InvalidSubroutineIndex(index) => {
                write!(f, "subroutine {index} is not present")
            }
            Self::ReturnOutsideSubroutine => write!(f, "return operator outside of a subroutine"),
            Self::InvalidOperator(op) => write!(f, "invalid charstring operator {op}"),
            Self::MissingEndChar => write!(f, "charstring ended without endchar"),
        }
    }
}

/// Errors that may occur when loading a glyph outline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawError {
    /// The requested glyph was not present in the font.
    GlyphNotFound(GlyphId),
    /// Exceeded a recursion limit when loading a composite glyph.
    RecursionLimitExceeded(GlyphId),
    /// Error occurred while evaluating a CFF charstring.
    Charstring(CharstringError),
}

impl From<CharstringError> for DrawError {
    fn from(value: CharstringError) -> Self {
        Self::Charstring(value)
    }
}

impl fmt::Display for DrawError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::GlyphNotFound(gid) => write!(f, "Glyph {gid} was not found in the given font"),
            Self::RecursionLimitExceeded(gid) => write!(
                f,
                "Recursion limit ({}) exceeded when loading composite component {gid}",
                GLYF_COMPOSITE_RECURSION_LIMIT,
            ),
            Self::Charstring(e) => write!(f, "{e}"),
        }
    }
}

/// Errors that may occur when baking glyphs into an atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BakeError {
    /// The atlas ran out of rows before character `first_unfit` (counted
    /// from the start of the range) could be placed.
    OutOfSpace { first_unfit: usize },
}

impl BakeError {
    /// The negated index of the first character that did not fit, as
    /// returned by single-call bakers that report rows used on success.
    pub fn code(&self) -> i32 {
        match self {
            Self::OutOfSpace { first_unfit } => -(*first_unfit as i32),
        }
    }
}

impl fmt::Display for BakeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::OutOfSpace { first_unfit } => {
                write!(f, "atlas is full, character {first_unfit} did not fit")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CharstringError {}

#[cfg(feature = "std")]
impl std::error::Error for DrawError {}

#[cfg(feature = "std")]
impl std::error::Error for BakeError {}
