use std::path::Path;

use anyhow::{bail, Context, Result};
use demgrid::{compress, dem24k, srtm, Grid};

pub mod info;
pub mod query;

/// Which loader to route a file through. Selected per invocation, either
/// explicitly via `--format` or from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Srtm,
    Dem24k,
    Dem24kBzip2,
}

impl InputFormat {
    /// Guess the format from the filename.
    pub fn detect(path: &Path) -> Option<InputFormat> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".hgt") || name.ends_with(".hgt.zip") {
            Some(InputFormat::Srtm)
        } else if name.ends_with(".dem.bz2") {
            Some(InputFormat::Dem24kBzip2)
        } else if name.ends_with(".dem") {
            Some(InputFormat::Dem24k)
        } else {
            None
        }
    }
}

/// Load a grid, resolving the format and handling the bzip2 temp-file
/// lifecycle.
pub fn load_grid(path: &Path, format: Option<InputFormat>) -> Result<Grid> {
    let format = match format.or_else(|| InputFormat::detect(path)) {
        Some(format) => format,
        None => bail!(
            "cannot infer format of {}; pass --format",
            path.display()
        ),
    };

    let grid = match format {
        InputFormat::Srtm => srtm::read_from_file(path),
        InputFormat::Dem24k => dem24k::read_from_file(path),
        InputFormat::Dem24kBzip2 => {
            let temp = compress::decompress_bzip2_to_temp(path)?;
            let result = dem24k::read_from_file(&temp);
            // The extracted temp file is ours to clean up
            let _ = std::fs::remove_file(&temp);
            result
        }
    };
    grid.with_context(|| format!("failed to load DEM {}", path.display()))
}
