//! USGS DEM "24k" fixed-layout ASCII grid loading.
//!
//! The format is a sequence of 1024-byte physical records of Fortran-style
//! fixed-width numeric text. Record 0 describes the whole grid (units,
//! zone, corner coordinates); the remaining records hold one elevation
//! profile per grid column, each opened by a short profile header and
//! continued by bare integer samples across as many records as needed.
//!
//! Tokens use Fortran `D` exponent markers, rewritten to `E` before any
//! numeric parsing. Header fields that do not feed a structural decision
//! are allowed to be garbage: they are logged and skipped, and parsing
//! resynchronizes at the next whitespace boundary. Zone, unit codes, and
//! corner coordinates are structural and abort the load when malformed.

use std::fs;
use std::path::Path;

use crate::error::{DemError, Result};
use crate::grid::{
    Bounds, Column, Grid, Hemisphere, HorizontalUnit, Scale, VerticalUnit, Zone,
    INVALID_ELEVATION,
};

/// Physical record length, fixed by the format.
const RECORD_LEN: usize = 1024;

/// Leading free-text name/descriptor field of the header record.
const NAME_FIELD_LEN: usize = 144;

/// Ground unit code meaning projected meters (UTM).
const HORIZONTAL_METERS_CODE: i32 = 2;

/// Default spacing for projected-meters grids, in meters.
const DEFAULT_METERS_SCALE: f64 = 10.0;

/// Default spacing for geographic grids, in arc-seconds.
const DEFAULT_ARCSEC_SCALE: f64 = 3.0;

/// Corner correction for the USGS 10 m series. These datasets carry a
/// known fixed misregistration; the shift below matches them empirically
/// and has no general derivation. Applied only at exactly 10 m spacing.
const TEN_METER_EAST_OFFSET: f64 = -100.0;
const TEN_METER_NORTH_OFFSET: f64 = 200.0;

/// Rewrite Fortran `D` exponent markers to `E` so standard float parsing
/// accepts the tokens. Runs on every record before tokenization.
fn fix_exponentiation(record: &mut [u8]) {
    for byte in record.iter_mut() {
        if *byte == b'D' {
            *byte = b'E';
        }
    }
}

/// Grid-level facts extracted from the header record.
#[derive(Debug)]
struct Header {
    zone: Zone,
    horizontal_unit: HorizontalUnit,
    vertical_unit: VerticalUnit,
    scale: Scale,
    bounds: Bounds,
}

/// Consume `count` tokens that carry no structural weight. Unparseable or
/// missing ones are logged and skipped.
fn skip_fields<'a, I: Iterator<Item = &'a str>>(tokens: &mut I, count: usize, field: &str) {
    for index in 0..count {
        match tokens.next() {
            Some(token) if token.parse::<f64>().is_ok() => {}
            Some(token) => {
                tracing::warn!(field, index, token, "skipping unparseable DEM header field");
            }
            None => tracing::warn!(field, index, "DEM header field missing"),
        }
    }
}

/// Consume one structurally required token.
fn require_f64<'a, I: Iterator<Item = &'a str>>(
    tokens: &mut I,
    field: &'static str,
) -> Result<f64> {
    tokens
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or(DemError::MissingHeaderField { field })
}

fn parse_header(record: &[u8]) -> Result<Header> {
    let text = String::from_utf8_lossy(&record[NAME_FIELD_LEN..]);
    let mut tokens = text.split_whitespace();

    skip_fields(&mut tokens, 3, "type code");
    let zone_number = require_f64(&mut tokens, "zone")?.round() as i32;
    skip_fields(&mut tokens, 15, "projection parameter");

    let horizontal_code = require_f64(&mut tokens, "horizontal unit")?.round() as i32;
    // Read for structure; the stored unit follows the horizontal
    // convention below, and samples are converted to meters on ingest.
    let _vertical_code = require_f64(&mut tokens, "vertical unit")?.round() as i32;

    let (horizontal_unit, vertical_unit, scale) = if horizontal_code == HORIZONTAL_METERS_CODE {
        (
            HorizontalUnit::ProjectedMeters,
            VerticalUnit::Decimeters,
            Scale {
                x: DEFAULT_METERS_SCALE,
                y: DEFAULT_METERS_SCALE,
            },
        )
    } else {
        (
            HorizontalUnit::ArcSeconds,
            VerticalUnit::Meters,
            Scale {
                x: DEFAULT_ARCSEC_SCALE,
                y: DEFAULT_ARCSEC_SCALE,
            },
        )
    };

    skip_fields(&mut tokens, 1, "polygon side count");

    let mut bounds = Bounds {
        min_north: f64::INFINITY,
        max_north: f64::NEG_INFINITY,
        min_east: f64::INFINITY,
        max_east: f64::NEG_INFINITY,
    };
    for _ in 0..4 {
        let east = require_f64(&mut tokens, "corner easting")?;
        let north = require_f64(&mut tokens, "corner northing")?;
        bounds.min_east = bounds.min_east.min(east);
        bounds.max_east = bounds.max_east.max(east);
        bounds.min_north = bounds.min_north.min(north);
        bounds.max_north = bounds.max_north.max(north);
    }

    Ok(Header {
        zone: Zone {
            number: zone_number,
            // The format does not carry a band letter; southern-hemisphere
            // 24k sheets do not exist, so default northern.
            hemisphere: Hemisphere::Northern,
        },
        horizontal_unit,
        vertical_unit,
        scale,
        bounds,
    })
}

/// Body parser state, threaded through record processing.
#[derive(Debug, Clone, Copy)]
enum BodyState {
    /// Cursor sits at the start of a new column's profile header.
    ExpectHeader,
    /// Filling the current column; `remaining` samples still owed.
    Continuation { remaining: usize },
}

fn require_profile_f64<'a, I: Iterator<Item = &'a str>>(
    tokens: &mut I,
    field: &'static str,
) -> Result<f64> {
    tokens
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| DemError::MalformedProfile {
            reason: format!("missing or malformed {field}"),
        })
}

/// Parse one profile header and allocate its column.
fn start_profile<'a, I: Iterator<Item = &'a str>>(
    tokens: &mut I,
    grid: &mut Grid,
) -> Result<BodyState> {
    for field in ["profile row id", "profile column id"] {
        let sentinel = require_profile_f64(tokens, field)?.round() as i64;
        if sentinel != 1 {
            tracing::warn!(field, value = sentinel, "profile sentinel not 1");
        }
    }
    let row_count = require_profile_f64(tokens, "profile row count")?.round();
    if row_count < 0.0 {
        return Err(DemError::MalformedProfile {
            reason: format!("negative row count {row_count}"),
        });
    }
    let row_count = row_count as usize;
    let x = require_profile_f64(tokens, "profile easting")?;
    let south = require_profile_f64(tokens, "profile south bound")?;
    for field in ["datum elevation", "profile minimum", "profile maximum"] {
        let _ = require_profile_f64(tokens, field)?;
    }

    // Profiles may start north of the grid's south edge; pad the gap with
    // sentinel rows so row index still maps linearly from the grid base.
    let scale_y = grid.scale().y;
    let padding = ((south - grid.bounds().min_north) / scale_y)
        .round()
        .max(0.0) as usize;

    let mut column = Column::new(x, south - padding as f64 * scale_y, row_count + padding);
    for _ in 0..padding {
        column.push(INVALID_ELEVATION);
    }
    grid.push_column(column);

    Ok(if row_count > 0 {
        BodyState::Continuation {
            remaining: row_count,
        }
    } else {
        BodyState::ExpectHeader
    })
}

/// Feed samples into the current column until its budget or the record's
/// tokens run out.
fn fill_profile<'a, I: Iterator<Item = &'a str>>(
    tokens: &mut I,
    grid: &mut Grid,
    mut remaining: usize,
) -> Result<BodyState> {
    let vertical_unit = grid.vertical_unit();
    let column = grid
        .last_column_mut()
        .ok_or_else(|| DemError::MalformedProfile {
            reason: "elevation data before any profile header".to_string(),
        })?;

    while remaining > 0 {
        let Some(token) = tokens.next() else {
            return Ok(BodyState::Continuation { remaining });
        };
        let value: i64 = token.parse().map_err(|_| DemError::MalformedProfile {
            reason: format!("unparseable elevation {token:?}"),
        })?;
        let meters = match vertical_unit {
            VerticalUnit::Decimeters => (value as f64 / 10.0).round() as i32,
            VerticalUnit::Meters => value as i32,
        };
        column.push(meters);
        remaining -= 1;
    }
    Ok(BodyState::ExpectHeader)
}

/// Post-pass over a fully parsed grid.
fn finish(grid: &mut Grid) {
    if grid.horizontal_unit() != HorizontalUnit::ProjectedMeters || grid.len() < 2 {
        return;
    }
    let dx = match (grid.column(0), grid.column(1)) {
        (Some(first), Some(second)) => second.x() - first.x(),
        _ => return,
    };
    // Header scale is nominal; the column delta is what the data says.
    grid.set_x_scale(dx);
    if (dx - DEFAULT_METERS_SCALE).abs() < f64::EPSILON {
        grid.offset_coordinates(TEN_METER_EAST_OFFSET, TEN_METER_NORTH_OFFSET);
    }
}

/// Load a USGS DEM 24k file into a [`Grid`].
///
/// For bzip2-compressed sources, run
/// [`crate::compress::decompress_bzip2_to_temp`] first and pass the
/// resulting temporary file (then delete it).
///
/// # Errors
///
/// - [`DemError::Io`] if the file cannot be read
/// - [`DemError::MissingHeaderField`] when a structural header token
///   (zone, unit codes, corners) is missing or malformed
/// - [`DemError::MalformedProfile`] when a profile header or elevation
///   value cannot be parsed, or the file ends mid-profile
pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Grid> {
    let raw = fs::read(path)?;
    parse(&raw)
}

fn parse(raw: &[u8]) -> Result<Grid> {
    if raw.len() < RECORD_LEN {
        return Err(DemError::MissingHeaderField {
            field: "header record",
        });
    }
    let (head, body) = raw.split_at(RECORD_LEN);

    let mut head = head.to_vec();
    fix_exponentiation(&mut head);
    let header = parse_header(&head)?;

    let mut grid = Grid::new(
        header.scale,
        header.bounds,
        header.horizontal_unit,
        header.vertical_unit,
    );
    if header.horizontal_unit == HorizontalUnit::ProjectedMeters {
        grid = grid.with_zone(header.zone);
    }

    let mut state = BodyState::ExpectHeader;
    for record in body.chunks(RECORD_LEN) {
        let mut record = record.to_vec();
        fix_exponentiation(&mut record);
        let text = String::from_utf8_lossy(&record).into_owned();
        let mut tokens = text.split_whitespace().peekable();

        while tokens.peek().is_some() {
            state = match state {
                BodyState::ExpectHeader => start_profile(&mut tokens, &mut grid)?,
                BodyState::Continuation { remaining } => {
                    fill_profile(&mut tokens, &mut grid, remaining)?
                }
            };
        }
    }

    if let BodyState::Continuation { remaining } = state {
        return Err(DemError::MalformedProfile {
            reason: format!("file ended with {remaining} samples outstanding"),
        });
    }

    finish(&mut grid);
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Pad text out to one 1024-byte physical record.
    fn record(text: &str) -> Vec<u8> {
        assert!(text.len() <= RECORD_LEN, "test record too long");
        let mut out = text.as_bytes().to_vec();
        out.resize(RECORD_LEN, b' ');
        out
    }

    /// Header record: blank name field, then the token sequence the parser
    /// expects. Projection parameters use `D` exponents on purpose.
    fn header_record(zone: i32, horizontal_code: i32, corners: [(f64, f64); 4]) -> Vec<u8> {
        let mut text = " ".repeat(NAME_FIELD_LEN);
        text.push_str("1 1 1 "); // three type codes
        text.push_str(&format!("{zone} "));
        for _ in 0..15 {
            text.push_str("0.0D0 "); // projection parameters
        }
        text.push_str(&format!("{horizontal_code} 2 ")); // unit codes
        text.push_str("4 "); // polygon side count
        for (east, north) in corners {
            text.push_str(&format!("{east:.1} {north:.1} "));
        }
        record(&text)
    }

    fn profile_record(row_count: usize, x: f64, south: f64, samples: &[i64]) -> Vec<u8> {
        let mut text = format!("1 1 {row_count} {x:.1} {south:.1} 0.0 0.0 0.0");
        for sample in samples {
            text.push_str(&format!(" {sample}"));
        }
        record(&text)
    }

    fn parse_bytes(records: &[Vec<u8>]) -> Result<Grid> {
        let raw: Vec<u8> = records.concat();
        parse(&raw)
    }

    const ARCSEC_CORNERS: [(f64, f64); 4] = [
        (0.0, 0.0),
        (0.0, 9.0),
        (6.0, 9.0),
        (6.0, 0.0),
    ];

    #[test]
    fn test_fix_exponentiation() {
        let mut buf = b"1.0D5 -2.5D-3 PLAIN".to_vec();
        fix_exponentiation(&mut buf);
        assert_eq!(&buf, b"1.0E5 -2.5E-3 PLAIN");

        let text = String::from_utf8(buf).unwrap();
        let mut tokens = text.split_whitespace();
        assert_eq!(tokens.next().unwrap().parse::<f64>().unwrap(), 1.0e5);
        assert_eq!(tokens.next().unwrap().parse::<f64>().unwrap(), -2.5e-3);
    }

    #[test]
    fn test_d_exponent_matches_e_exponent() {
        let mut fortran = b"1.0D5".to_vec();
        fix_exponentiation(&mut fortran);
        let fortran: f64 = std::str::from_utf8(&fortran).unwrap().parse().unwrap();
        let plain: f64 = "1.0E5".parse().unwrap();
        assert_eq!(fortran, plain);
    }

    #[test]
    fn test_header_arcsec() {
        let mut rec = header_record(12, 3, ARCSEC_CORNERS);
        fix_exponentiation(&mut rec);
        let header = parse_header(&rec).unwrap();

        assert_eq!(header.horizontal_unit, HorizontalUnit::ArcSeconds);
        assert_eq!(header.vertical_unit, VerticalUnit::Meters);
        assert_eq!(header.scale, Scale { x: 3.0, y: 3.0 });
        assert_eq!(header.bounds.min_east, 0.0);
        assert_eq!(header.bounds.max_east, 6.0);
        assert_eq!(header.bounds.min_north, 0.0);
        assert_eq!(header.bounds.max_north, 9.0);
    }

    #[test]
    fn test_header_projected_meters() {
        let corners = [
            (1000.0, 5000.0),
            (1000.0, 5100.0),
            (1050.0, 5100.0),
            (1050.0, 5000.0),
        ];
        let mut rec = header_record(13, 2, corners);
        fix_exponentiation(&mut rec);
        let header = parse_header(&rec).unwrap();

        assert_eq!(header.horizontal_unit, HorizontalUnit::ProjectedMeters);
        assert_eq!(header.vertical_unit, VerticalUnit::Decimeters);
        assert_eq!(header.scale, Scale { x: 10.0, y: 10.0 });
        assert_eq!(header.zone.number, 13);
        assert_eq!(header.zone.hemisphere, Hemisphere::Northern);
    }

    #[test]
    fn test_header_garbage_in_skip_field_is_tolerated() {
        let mut rec = header_record(12, 3, ARCSEC_CORNERS);
        // Corrupt one projection parameter; alignment survives because
        // the bad token still occupies one whitespace-delimited slot
        let pos = rec.windows(5).position(|w| w == b"0.0D0").unwrap();
        rec[pos..pos + 5].copy_from_slice(b"?????");
        assert!(parse_header(&rec).is_ok());
    }

    #[test]
    fn test_header_missing_structural_field() {
        // Cut the record short so the corners are gone
        let text = " ".repeat(NAME_FIELD_LEN) + "1 1 1 12 ";
        let rec = record(&text);
        assert!(matches!(
            parse_header(&rec),
            Err(DemError::MissingHeaderField { .. })
        ));
    }

    #[test]
    fn test_single_profile() {
        let grid = parse_bytes(&[
            header_record(12, 3, ARCSEC_CORNERS),
            profile_record(3, 0.0, 0.0, &[100, 200, 300]),
        ])
        .unwrap();

        assert_eq!(grid.len(), 1);
        let column = grid.column(0).unwrap();
        assert_eq!(column.len(), 3);
        assert_eq!(column.samples(), &[100, 200, 300]);
        assert_eq!(column.y(), 0.0);
    }

    #[test]
    fn test_profile_with_leading_padding() {
        // South bound 9 with min_north 0 and 3" spacing: 3 padding rows
        let grid = parse_bytes(&[
            header_record(12, 3, ARCSEC_CORNERS),
            profile_record(2, 0.0, 9.0, &[100, 200]),
        ])
        .unwrap();

        let column = grid.column(0).unwrap();
        assert_eq!(column.len(), 5);
        assert_eq!(
            column.samples(),
            &[
                INVALID_ELEVATION,
                INVALID_ELEVATION,
                INVALID_ELEVATION,
                100,
                200
            ]
        );
        // Padded column is re-anchored at the grid's south edge
        assert_eq!(column.y(), 0.0);
    }

    #[test]
    fn test_profile_south_of_grid_clamps_padding() {
        let grid = parse_bytes(&[
            header_record(12, 3, ARCSEC_CORNERS),
            profile_record(2, 0.0, -6.0, &[100, 200]),
        ])
        .unwrap();

        let column = grid.column(0).unwrap();
        assert_eq!(column.len(), 2);
        assert_eq!(column.y(), -6.0);
    }

    #[test]
    fn test_profile_continues_across_records() {
        let samples: Vec<i64> = (0..200).collect();
        let (first, rest) = samples.split_at(50);
        let mut continuation = String::new();
        for sample in rest {
            continuation.push_str(&format!("{sample} "));
        }

        let grid = parse_bytes(&[
            header_record(12, 3, ARCSEC_CORNERS),
            profile_record(200, 0.0, 0.0, first),
            record(&continuation),
        ])
        .unwrap();

        let column = grid.column(0).unwrap();
        assert_eq!(column.len(), 200);
        assert_eq!(column.get(0), Some(0));
        assert_eq!(column.get(199), Some(199));
    }

    #[test]
    fn test_two_profiles_back_to_back() {
        let grid = parse_bytes(&[
            header_record(12, 3, ARCSEC_CORNERS),
            profile_record(2, 0.0, 0.0, &[10, 20]),
            profile_record(2, 3.0, 0.0, &[30, 40]),
        ])
        .unwrap();

        assert_eq!(grid.len(), 2);
        assert_eq!(grid.column(0).unwrap().samples(), &[10, 20]);
        assert_eq!(grid.column(1).unwrap().samples(), &[30, 40]);
    }

    #[test]
    fn test_truncated_profile_fails() {
        let result = parse_bytes(&[
            header_record(12, 3, ARCSEC_CORNERS),
            profile_record(10, 0.0, 0.0, &[1, 2, 3]),
        ]);
        assert!(matches!(result, Err(DemError::MalformedProfile { .. })));
    }

    #[test]
    fn test_garbage_elevation_fails() {
        let mut rec = profile_record(3, 0.0, 0.0, &[1, 2]);
        let pos = rec.windows(2).position(|w| w == b" 2").unwrap();
        rec[pos + 1] = b'#';
        let result = parse_bytes(&[header_record(12, 3, ARCSEC_CORNERS), rec]);
        assert!(matches!(result, Err(DemError::MalformedProfile { .. })));
    }

    #[test]
    fn test_decimeter_conversion() {
        let corners = [
            (1000.0, 5000.0),
            (1000.0, 5100.0),
            (1050.0, 5100.0),
            (1050.0, 5000.0),
        ];
        let grid = parse_bytes(&[
            header_record(13, 2, corners),
            profile_record(2, 1000.0, 5000.0, &[12345, 250]),
            profile_record(2, 1030.0, 5000.0, &[10, 20]),
        ])
        .unwrap();

        // 12345 dm -> 1235 m (rounded), 250 dm -> 25 m
        assert_eq!(grid.column(0).unwrap().samples(), &[1235, 25]);
        // Columns 30 m apart: recomputed scale, no 10 m offset patch
        assert_eq!(grid.scale().x, 30.0);
        assert_eq!(grid.bounds().min_east, 1000.0);
    }

    #[test]
    fn test_ten_meter_offset_patch() {
        let corners = [
            (1000.0, 5000.0),
            (1000.0, 5100.0),
            (1050.0, 5100.0),
            (1050.0, 5000.0),
        ];
        let grid = parse_bytes(&[
            header_record(13, 2, corners),
            profile_record(1, 1000.0, 5000.0, &[100]),
            profile_record(1, 1010.0, 5000.0, &[200]),
        ])
        .unwrap();

        assert_eq!(grid.scale().x, 10.0);
        // -100 east / +200 north applied to bounds and columns
        assert_eq!(grid.bounds().min_east, 900.0);
        assert_eq!(grid.bounds().min_north, 5200.0);
        assert_eq!(grid.column(0).unwrap().x(), 900.0);
        assert_eq!(grid.column(0).unwrap().y(), 5200.0);
    }

    #[test]
    fn test_zone_only_on_projected_grids() {
        let arcsec = parse_bytes(&[
            header_record(12, 3, ARCSEC_CORNERS),
            profile_record(1, 0.0, 0.0, &[1]),
        ])
        .unwrap();
        assert!(arcsec.zone().is_none());

        let corners = [
            (1000.0, 5000.0),
            (1000.0, 5100.0),
            (1050.0, 5100.0),
            (1050.0, 5000.0),
        ];
        let projected = parse_bytes(&[
            header_record(13, 2, corners),
            profile_record(1, 1000.0, 5000.0, &[1]),
        ])
        .unwrap();
        assert_eq!(projected.zone().unwrap().number, 13);
    }

    #[test]
    fn test_short_file_fails() {
        assert!(matches!(
            parse(b"too short"),
            Err(DemError::MissingHeaderField { .. })
        ));
    }

    #[test]
    fn test_read_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        let raw: Vec<u8> = [
            header_record(12, 3, ARCSEC_CORNERS),
            profile_record(2, 0.0, 0.0, &[7, 8]),
            profile_record(2, 3.0, 0.0, &[9, 10]),
        ]
        .concat();
        file.write_all(&raw).unwrap();

        let grid = read_from_file(file.path()).unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.elevation_at(3.0, 3.0), Some(10));
    }
}
