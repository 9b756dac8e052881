//! Synthetic fonts and table builders shared by the font-read and
//! glyph-raster tests.
//!
//! Everything here is generated in code, so each test can describe exactly
//! the structures it exercises.

pub mod bebuffer;
pub mod builder;
pub mod cff;
pub mod cmap;
pub mod gpos;
pub mod kern;
pub mod ttf;
