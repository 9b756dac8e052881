//! Reading TrueType, OpenType and CFF font programs
//!
//! This crate provides memory safe zero-allocation access to the parts of a
//! font file needed to map characters to glyphs, locate glyph outlines and
//! compute metrics. It is the parsing layer underneath [`glyph-raster`],
//! which turns the located outlines into bitmaps.
//!
//! All reads go through a [`ByteCursor`], which clamps every access to the
//! underlying data. Malformed tables therefore degrade to empty glyphs or
//! zero metrics rather than errors; only the structural checks performed
//! when a [`FontInfo`] is created can fail.
//!
//! # Example
//!
//! ```no_run
//! # let path_to_my_font_file = std::path::Path::new("");
//! use font_read::FontInfo;
//! let font_bytes = std::fs::read(path_to_my_font_file).unwrap();
//! // for font collections (.ttc) use FontInfo::from_index
//! let font = FontInfo::new(&font_bytes, 0).expect("failed to read font data");
//! let glyph = font.find_glyph_index('A' as u32);
//! let metrics = font.glyph_hmetrics(glyph);
//! println!("'A' is {glyph} with advance {}", metrics.advance_width);
//! ```
//!
//! [`glyph-raster`]: https://docs.rs/glyph-raster/

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[cfg(all(not(feature = "std"), not(test)))]
#[macro_use]
extern crate core as std;

pub mod cff;
pub mod cmap;
pub mod collection;
pub mod cursor;
pub mod directory;
mod error;
mod font;
mod glyph_id;
pub mod gpos;
pub mod kern;
pub mod metrics;
pub mod name;
mod tag;

pub use cursor::ByteCursor;
pub use error::ReadError;
pub use font::{FontInfo, Outlines};
pub use glyph_id::GlyphId;
pub use tag::Tag;

/// Well known table tags.
pub mod tags {
    pub use crate::font::{
        CFF, CMAP, GLYF, GPOS, HEAD, HHEA, HMTX, KERN, LOCA, MAXP, NAME, OS2,
    };
}
