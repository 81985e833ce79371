//! Tile command - fetch one tile through the overlay provider.

use std::path::PathBuf;

use offmap::config::format_size;
use offmap::coord::{to_tile_coords, TileCoord};
use offmap::overlay::OverlayMode;

use super::common::ModeArg;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the tile command.
pub struct TileArgs {
    pub zoom: u8,
    pub x: Option<u32>,
    pub y: Option<u32>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub mode: Option<ModeArg>,
    pub output: PathBuf,
}

impl TileArgs {
    /// Resolve the tile from either `--x/--y` or `--lat/--lon`.
    fn coord(&self) -> Result<TileCoord, CliError> {
        let coord = match (self.x, self.y, self.lat, self.lon) {
            (Some(x), Some(y), None, None) => TileCoord::new(self.zoom, x, y),
            (None, None, Some(lat), Some(lon)) => to_tile_coords(lat, lon, self.zoom),
            _ => {
                return Err(CliError::Config(
                    "specify either --x and --y or --lat and --lon".to_string(),
                ))
            }
        };
        coord.map_err(|e| CliError::Manager(e.into()))
    }
}

/// Run the tile command.
pub fn run(args: TileArgs, config: Option<PathBuf>, verbose: bool) -> Result<(), CliError> {
    let coord = args.coord()?;

    let runner = CliRunner::new(config, verbose)?;
    runner.log_startup("tile");
    let manager = runner.manager()?;

    let mode: OverlayMode = args.mode.map(Into::into).unwrap_or_else(|| manager.mode());
    let provider = manager.reload_overlay(mode);

    println!("Fetching tile {} ({})", coord, mode);
    let bytes = runner.block_on(provider.tile(coord))?;

    std::fs::write(&args.output, &bytes).map_err(|e| CliError::FileWrite {
        path: args.output.display().to_string(),
        error: e,
    })?;

    println!(
        "Saved {} to {}",
        format_size(bytes.len()),
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(x: Option<u32>, y: Option<u32>, lat: Option<f64>, lon: Option<f64>) -> TileArgs {
        TileArgs {
            zoom: 16,
            x,
            y,
            lat,
            lon,
            mode: None,
            output: PathBuf::from("tile.png"),
        }
    }

    #[test]
    fn test_coord_from_xy() {
        let coord = args(Some(10), Some(20), None, None).coord().unwrap();
        assert_eq!(coord, TileCoord::new(16, 10, 20).unwrap());
    }

    #[test]
    fn test_coord_from_lat_lon() {
        let coord = args(None, None, Some(37.7749), Some(-122.4194))
            .coord()
            .unwrap();
        assert_eq!(coord.zoom, 16);
    }

    #[test]
    fn test_coord_requires_one_form() {
        assert!(args(Some(1), None, None, None).coord().is_err());
        assert!(args(Some(1), Some(2), Some(0.0), Some(0.0)).coord().is_err());
    }

    #[test]
    fn test_coord_out_of_range_is_invalid_input() {
        let err = args(Some(70_000), Some(0), None, None).coord().unwrap_err();
        assert!(matches!(err, CliError::Manager(offmap::Error::InvalidInput(_))));
    }
}
