use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::InputFormat;

/// Elevation grid inspection tool
#[derive(Parser)]
#[command(name = "demgrid")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input format; detected from the file extension when omitted
    #[arg(short, long, global = true, value_enum)]
    format: Option<FormatArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// SRTM .hgt, plain or zip-wrapped
    Srtm,
    /// USGS DEM 24k ASCII
    Dem24k,
    /// USGS DEM 24k, bzip2-compressed
    Dem24kBz2,
}

impl From<FormatArg> for InputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Srtm => InputFormat::Srtm,
            FormatArg::Dem24k => InputFormat::Dem24k,
            FormatArg::Dem24kBz2 => InputFormat::Dem24kBzip2,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Display metadata and elevation statistics for a grid file
    Info {
        /// Path to the elevation file
        file: PathBuf,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Query elevation at a coordinate
    Query {
        /// Path to the elevation file
        file: PathBuf,

        /// X coordinate (arc-seconds east or projected meters)
        #[arg(long)]
        x: f64,

        /// Y coordinate (arc-seconds north or projected meters)
        #[arg(long)]
        y: f64,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "demgrid=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let format = cli.format.map(InputFormat::from);

    match cli.command {
        Commands::Info { file, json } => commands::info::run(&file, format, json),
        Commands::Query { file, x, y } => commands::query::run(&file, format, x, y),
    }
}
