use std::path::Path;

use anyhow::Result;
use demgrid::{Grid, Hemisphere, HorizontalUnit, VerticalUnit, INVALID_ELEVATION};

use super::InputFormat;

pub fn run(path: &Path, format: Option<InputFormat>, json: bool) -> Result<()> {
    let grid = super::load_grid(path, format)?;
    let stats = GridStats::collect(&grid);

    if json {
        print_json(path, &grid, &stats);
    } else {
        print_text(path, &grid, &stats);
    }
    Ok(())
}

struct GridStats {
    rows_min: usize,
    rows_max: usize,
    min_elev: Option<i32>,
    max_elev: Option<i32>,
    void_count: u64,
    total_samples: u64,
}

impl GridStats {
    fn collect(grid: &Grid) -> Self {
        let mut stats = GridStats {
            rows_min: usize::MAX,
            rows_max: 0,
            min_elev: None,
            max_elev: None,
            void_count: 0,
            total_samples: 0,
        };
        for column in grid.columns() {
            stats.rows_min = stats.rows_min.min(column.len());
            stats.rows_max = stats.rows_max.max(column.len());
            for &sample in column.samples() {
                stats.total_samples += 1;
                if sample == INVALID_ELEVATION {
                    stats.void_count += 1;
                } else {
                    stats.min_elev = Some(stats.min_elev.map_or(sample, |m: i32| m.min(sample)));
                    stats.max_elev = Some(stats.max_elev.map_or(sample, |m: i32| m.max(sample)));
                }
            }
        }
        if grid.is_empty() {
            stats.rows_min = 0;
        }
        stats
    }
}

fn unit_label(unit: HorizontalUnit) -> &'static str {
    match unit {
        HorizontalUnit::ArcSeconds => "arc-seconds",
        HorizontalUnit::ProjectedMeters => "meters (projected)",
    }
}

fn print_text(path: &Path, grid: &Grid, stats: &GridStats) {
    let bounds = grid.bounds();

    println!("File: {}", path.display());
    println!();
    println!("Horizontal unit: {}", unit_label(grid.horizontal_unit()));
    println!(
        "Source vertical unit: {}",
        match grid.vertical_unit() {
            VerticalUnit::Meters => "meters",
            VerticalUnit::Decimeters => "decimeters",
        }
    );
    if let Some(zone) = grid.zone() {
        println!(
            "UTM zone: {}{}",
            zone.number,
            match zone.hemisphere {
                Hemisphere::Northern => "N",
                Hemisphere::Southern => "S",
            }
        );
    }
    println!("Scale: {} x {}", grid.scale().x, grid.scale().y);
    println!(
        "Bounds: east {}..{}, north {}..{}",
        bounds.min_east, bounds.max_east, bounds.min_north, bounds.max_north
    );
    println!("Columns: {}", grid.len());
    if stats.rows_max == stats.rows_min {
        println!("Rows per column: {}", stats.rows_max);
    } else {
        println!("Rows per column: {}..{}", stats.rows_min, stats.rows_max);
    }
    println!();

    if let (Some(min), Some(max)) = (stats.min_elev, stats.max_elev) {
        println!("Min elevation: {}m", min);
        println!("Max elevation: {}m", max);
    }
    if stats.void_count > 0 {
        let pct = (stats.void_count as f64 / stats.total_samples as f64) * 100.0;
        println!("Void samples: {} ({:.1}%)", stats.void_count, pct);
    }
}

fn print_json(path: &Path, grid: &Grid, stats: &GridStats) {
    let bounds = grid.bounds();
    let out = serde_json::json!({
        "file": path.display().to_string(),
        "horizontal_unit": unit_label(grid.horizontal_unit()),
        "scale": { "x": grid.scale().x, "y": grid.scale().y },
        "bounds": {
            "min_east": bounds.min_east,
            "max_east": bounds.max_east,
            "min_north": bounds.min_north,
            "max_north": bounds.max_north,
        },
        "columns": grid.len(),
        "rows_min": stats.rows_min,
        "rows_max": stats.rows_max,
        "min_elevation": stats.min_elev,
        "max_elevation": stats.max_elev,
        "void_samples": stats.void_count,
        "utm_zone": grid.zone().map(|z| z.number),
    });
    println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
}
