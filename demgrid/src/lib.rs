//! # demgrid - Elevation Grid Loader
//!
//! Loads legacy elevation-model rasters into a column-major in-memory
//! [`Grid`] addressable by geographic or projected coordinates.
//!
//! ## Supported formats
//!
//! - **SRTM `.hgt`**: packed big-endian 16-bit samples, 3601×3601 (SRTM1,
//!   1 arc-second) or 1201×1201 (SRTM3, 3 arc-seconds), optionally wrapped
//!   in a single-entry ZIP archive. Tile origin comes from the
//!   `[NS]dd[EW]ddd` filename.
//! - **USGS DEM "24k"**: fixed-layout Fortran-style ASCII in 1024-byte
//!   records, one elevation profile per grid column, optionally
//!   bzip2-compressed.
//!
//! ## Quick Start
//!
//! ```ignore
//! use demgrid::srtm;
//!
//! let grid = srtm::read_from_file("/data/N41E056.hgt")?;
//! let arcsec = |deg: f64| deg * 3600.0;
//! if let Some(elevation) = grid.elevation_at(arcsec(56.5), arcsec(41.5)) {
//!     println!("Elevation: {}m", elevation);
//! }
//! ```
//!
//! Format dispatch is the caller's job: pick [`srtm::read_from_file`] or
//! [`dem24k::read_from_file`] from the file's name and extension. For
//! bzip2-compressed DEM input, run
//! [`compress::decompress_bzip2_to_temp`] first and delete the returned
//! temporary file when done.
//!
//! A grid is built single-threaded and handed to the caller whole; on any
//! parse failure the partial grid is discarded and an error returned.

pub mod compress;
pub mod dem24k;
pub mod error;
pub mod grid;
pub mod srtm;

// Re-export main types at crate root for convenience
pub use error::{DemError, Result};
pub use grid::{
    Bounds, Column, Grid, Hemisphere, HorizontalUnit, Scale, VerticalUnit, Zone,
    INVALID_ELEVATION,
};
