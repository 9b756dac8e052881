//! Glyph outlines, anti-aliased rasterization, atlas packing and signed
//! distance fields.
//!
//! This crate sits on top of [`font-read`](raw), which locates the tables of
//! a font, and turns glyphs into pixels:
//!
//! * [`glyph_shape`] decodes a glyph into a list of [`Vertex`] commands from
//!   either TrueType `glyf` data or CFF Type 2 charstrings.
//! * [`flatten`] converts curves into polygons and [`raster`] computes exact
//!   area coverage for them.
//! * [`bitmap`] combines the two into single glyph renderers.
//! * [`bake`] and [`pack`] lay out many glyphs into a shared atlas.
//! * [`sdf`] computes signed distance fields.
//!
//! # Example
//!
//! ```no_run
//! # let path_to_my_font_file = std::path::Path::new("");
//! use glyph_raster::{bitmap, raw::FontInfo};
//! let font_bytes = std::fs::read(path_to_my_font_file).unwrap();
//! let font = FontInfo::new(&font_bytes, 0).expect("failed to read font data");
//! let scale = font.scale_for_pixel_height(32.0);
//! let glyph = font.find_glyph_index('a' as u32);
//! if let Some(bitmap) = bitmap::glyph_bitmap(&font, bitmap::Scale::uniform(scale), glyph) {
//!     println!("{}x{} at ({}, {})", bitmap.width, bitmap.height, bitmap.xoff, bitmap.yoff);
//! }
//! ```

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

extern crate alloc;

/// Expose our "raw" underlying parser crate.
pub extern crate font_read as raw;

pub mod bake;
pub mod bitmap;
mod error;
pub mod flatten;
pub mod outline;
pub mod pack;
pub mod raster;
pub mod sdf;
mod vertex;

pub use error::{BakeError, CharstringError, DrawError};
pub use outline::{codepoint_box, codepoint_shape, glyph_box, glyph_shape, is_glyph_empty};
pub use vertex::{Vertex, VertexKind};

/// Type for a glyph identifier.
pub type GlyphId = font_read::GlyphId;

/// An integer bounding box, in font units or pixels.
pub type BoundingBox = font_read::metrics::BoundingBox;

/// The flatness, in pixels, used by every bitmap renderer.
pub const FLATNESS_IN_PIXELS: f32 = 0.35;
