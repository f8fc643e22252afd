use std::path::Path;

use anyhow::Result;
use demgrid::HorizontalUnit;

use super::InputFormat;

pub fn run(path: &Path, format: Option<InputFormat>, x: f64, y: f64) -> Result<()> {
    let grid = super::load_grid(path, format)?;

    match grid.elevation_at(x, y) {
        Some(elevation) => println!("{}m", elevation),
        None => {
            let unit = match grid.horizontal_unit() {
                HorizontalUnit::ArcSeconds => "arc-seconds",
                HorizontalUnit::ProjectedMeters => "meters",
            };
            let bounds = grid.bounds();
            println!(
                "no data at ({x}, {y}); grid covers east {}..{}, north {}..{} ({unit})",
                bounds.min_east, bounds.max_east, bounds.min_north, bounds.max_north
            );
        }
    }
    Ok(())
}
