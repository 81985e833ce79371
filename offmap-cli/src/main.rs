//! Offmap CLI - Command-line interface
//!
//! Downloads map tiles around a point for offline use, inspects and clears
//! the tile cache, and fetches single tiles through the live or offline
//! overlay.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::cache::CacheAction;
use commands::common::{ModeArg, RadiusArg, ZoomArg};
use commands::config::ConfigCommands;
use commands::download::DownloadArgs;
use commands::tile::TileArgs;
use commands::tiles::TilesArgs;

#[derive(Parser)]
#[command(name = "offmap")]
#[command(version)]
#[command(about = "Download and cache map tiles for offline use", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.offmap/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download every tile within a radius of a point
    Download {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Zoom preset
        #[arg(long, value_enum, default_value = "deep")]
        zoom: ZoomArg,

        /// Radius preset
        #[arg(long, value_enum, default_value = "mile")]
        radius: RadiusArg,

        /// Parallel downloads (default from config)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch a single tile and write it to a file
    Tile {
        /// Slippy map zoom level
        #[arg(long)]
        zoom: u8,

        /// Tile column
        #[arg(long, requires = "y", conflicts_with_all = ["lat", "lon"])]
        x: Option<u32>,

        /// Tile row
        #[arg(long, requires = "x")]
        y: Option<u32>,

        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true, requires = "lon")]
        lat: Option<f64>,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lon: Option<f64>,

        /// Overlay mode (default from config)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List the tiles a download would cover
    Tiles {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Zoom preset
        #[arg(long, value_enum, default_value = "deep")]
        zoom: ZoomArg,

        /// Radius preset
        #[arg(long, value_enum, default_value = "mile")]
        radius: RadiusArg,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Cache management
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    let config = cli.config;
    let verbose = cli.verbose;

    let result = match cli.command {
        Commands::Download {
            lat,
            lon,
            zoom,
            radius,
            concurrency,
            json,
        } => commands::download::run(
            DownloadArgs {
                lat,
                lon,
                zoom,
                radius,
                concurrency,
                json,
            },
            config,
            verbose,
        ),
        Commands::Tile {
            zoom,
            x,
            y,
            lat,
            lon,
            mode,
            output,
        } => commands::tile::run(
            TileArgs {
                zoom,
                x,
                y,
                lat,
                lon,
                mode,
                output,
            },
            config,
            verbose,
        ),
        Commands::Tiles {
            lat,
            lon,
            zoom,
            radius,
            json,
        } => commands::tiles::run(TilesArgs {
            lat,
            lon,
            zoom,
            radius,
            json,
        }),
        Commands::Cache { action } => commands::cache::run(action, config, verbose),
        Commands::Config { command } => commands::config::run(command, config),
    };

    if let Err(e) = result {
        e.exit();
    }
}
