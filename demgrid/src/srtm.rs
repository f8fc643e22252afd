//! SRTM `.hgt` grid loading.
//!
//! Tile origin comes from the filename (`[NS]dd[EW]ddd`, southwest corner),
//! resolution from the payload size: 3601×3601 16-bit samples for SRTM1
//! (1 arc-second), 1201×1201 for SRTM3 (3 arc-seconds). Samples are
//! big-endian, rows run north to south in the file and are reversed here so
//! that column index 0 is the southernmost row.
//!
//! A `.zip` suffix routes the raw bytes through the single-entry extractor
//! in [`crate::compress`] before interpretation.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::compress::unzip_single_entry;
use crate::error::{DemError, Result};
use crate::grid::{Bounds, Column, Grid, HorizontalUnit, Scale, VerticalUnit};

/// Samples per row/column for SRTM1 (1 arc-second).
const SRTM1_SAMPLES: usize = 3601;

/// Samples per row/column for SRTM3 (3 arc-seconds).
const SRTM3_SAMPLES: usize = 1201;

/// Payload size for SRTM1: 3601 × 3601 × 2 bytes.
const SRTM1_SIZE: usize = SRTM1_SAMPLES * SRTM1_SAMPLES * 2;

/// Payload size for SRTM3: 1201 × 1201 × 2 bytes.
const SRTM3_SIZE: usize = SRTM3_SAMPLES * SRTM3_SAMPLES * 2;

/// Arc-seconds per degree; every tile spans exactly one degree.
const TILE_SPAN_ARCSEC: f64 = 3600.0;

/// Southwest tile corner in arc-seconds, derived from the filename.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TileOrigin {
    min_north: f64,
    min_east: f64,
}

/// Parse a `[NS]dd[EW]ddd` tile name into its southwest corner.
///
/// Only the first seven characters are inspected; extensions like `.hgt`
/// or `.hgt.zip` may follow.
fn parse_tile_name(name: &str) -> Result<TileOrigin> {
    let invalid = || DemError::InvalidTileName {
        name: name.to_string(),
    };

    let bytes = name.as_bytes();
    if bytes.len() < 7 {
        return Err(invalid());
    }

    let lat_sign = match bytes[0] {
        b'N' | b'n' => 1.0,
        b'S' | b's' => -1.0,
        _ => return Err(invalid()),
    };
    let lon_sign = match bytes[3] {
        b'E' | b'e' => 1.0,
        b'W' | b'w' => -1.0,
        _ => return Err(invalid()),
    };
    if !bytes[1..3].iter().all(u8::is_ascii_digit) || !bytes[4..7].iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }

    let lat: f64 = name[1..3].parse().map_err(|_| invalid())?;
    let lon: f64 = name[4..7].parse().map_err(|_| invalid())?;

    Ok(TileOrigin {
        min_north: lat_sign * lat * TILE_SPAN_ARCSEC,
        min_east: lon_sign * lon * TILE_SPAN_ARCSEC,
    })
}

/// Load an SRTM tile into a [`Grid`].
///
/// The filename is validated and the origin derived before any sample I/O
/// happens. Raw `.hgt` payloads are memory-mapped; `.zip` inputs are read
/// whole and inflated in memory, leaving nothing on disk.
///
/// # Errors
///
/// - [`DemError::InvalidTileName`] for names not matching `[NS]dd[EW]ddd`
/// - [`DemError::InvalidPayloadSize`] if the decoded payload is neither
///   SRTM1 nor SRTM3 sized
/// - ZIP extraction errors per [`unzip_single_entry`]
pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Grid> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DemError::InvalidTileName {
            name: path.display().to_string(),
        })?;
    let origin = parse_tile_name(name)?;

    if name.to_ascii_lowercase().ends_with(".zip") {
        let raw = std::fs::read(path)?;
        let payload = unzip_single_entry(&raw)?;
        build_grid(&payload, origin)
    } else {
        let file = File::open(path)?;
        // SAFETY: read-only mapping of a file we opened read-only and do
        // not expose; nothing mutates it while mapped.
        let map = unsafe { Mmap::map(&file)? };
        build_grid(&map, origin)
    }
}

fn build_grid(payload: &[u8], origin: TileOrigin) -> Result<Grid> {
    let samples = match payload.len() {
        SRTM1_SIZE => SRTM1_SAMPLES,
        SRTM3_SIZE => SRTM3_SAMPLES,
        size => return Err(DemError::InvalidPayloadSize { size }),
    };
    let resolution = TILE_SPAN_ARCSEC / (samples - 1) as f64; // 1" or 3"

    let bounds = Bounds {
        min_north: origin.min_north,
        max_north: origin.min_north + TILE_SPAN_ARCSEC,
        min_east: origin.min_east,
        max_east: origin.min_east + TILE_SPAN_ARCSEC,
    };
    let mut grid = Grid::new(
        Scale {
            x: resolution,
            y: resolution,
        },
        bounds,
        HorizontalUnit::ArcSeconds,
        VerticalUnit::Meters,
    );

    for col_index in 0..samples {
        let mut column = Column::new(
            bounds.min_east + col_index as f64 * resolution,
            bounds.min_north,
            samples,
        );
        // File rows run north to south; store south-up
        for row in (0..samples).rev() {
            let offset = (row * samples + col_index) * 2;
            let sample = i16::from_be_bytes([payload[offset], payload[offset + 1]]);
            column.push(sample as i32);
        }
        grid.push_column(column);
    }
    Ok(grid)
}
