//! Tiles command - list the tiles a download would cover.

use offmap::coord::{tiles_for, GeoPoint, RadiusPreset, ZoomLevel};

use super::common::{RadiusArg, ZoomArg};
use crate::error::CliError;

/// Arguments for the tiles command.
pub struct TilesArgs {
    pub lat: f64,
    pub lon: f64,
    pub zoom: ZoomArg,
    pub radius: RadiusArg,
    pub json: bool,
}

/// Run the tiles command. Pure computation, no config or network.
pub fn run(args: TilesArgs) -> Result<(), CliError> {
    let zoom: ZoomLevel = args.zoom.into();
    let radius: RadiusPreset = args.radius.into();
    let tiles = tiles_for(GeoPoint::new(args.lat, args.lon), zoom, radius)
        .map_err(|e| CliError::Manager(e.into()))?;

    if args.json {
        let json = serde_json::to_string_pretty(&tiles)
            .map_err(|e| CliError::Config(format!("Failed to encode tiles: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    for tile in &tiles {
        println!("{}", tile);
    }
    eprintln!("{} tiles at {} within {}", tiles.len(), zoom, radius.name());
    Ok(())
}
