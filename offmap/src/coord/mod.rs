//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator tile coordinates, and enumerates the tiles covering a
//! download region around a center point.

mod types;

pub use types::{
    tiles_per_axis, CoordError, GeoPoint, RadiusPreset, TileCoord, ZoomLevel, MAX_LAT, MAX_LON,
    MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM,
};

use std::collections::BTreeSet;
use std::f64::consts::PI;

/// WGS84 equatorial radius used for the spherical Mercator projection.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Converts geographic coordinates to tile coordinates.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 20)
///
/// # Returns
///
/// A `Result` containing the tile coordinates or an error if inputs are invalid.
#[inline]
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    GeoPoint::new(lat, lon).validate()?;
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let (fx, fy) = fractional_tile(lat, lon, zoom);
    Ok(TileCoord {
        zoom,
        x: clamp_axis(fx, zoom),
        y: clamp_axis(fy, zoom),
    })
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    let n = f64::from(tiles_per_axis(tile.zoom));

    let lon = tile.x as f64 / n * 360.0 - 180.0;

    // Inverse Web Mercator
    let y = tile.y as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lat, lon)
}

/// Computes the set of tiles to fetch for a download request.
///
/// The radius is turned into a latitude/longitude bounding box around
/// `center`, clamped to the Web Mercator domain, and every tile at the
/// requested zoom that intersects the box is returned.
pub fn tiles_for(
    center: GeoPoint,
    zoom: ZoomLevel,
    radius: RadiusPreset,
) -> Result<BTreeSet<TileCoord>, CoordError> {
    tiles_for_radius_m(center, zoom.level(), radius.meters())
}

/// Like [`tiles_for`] but with a raw zoom level and radius in meters.
pub fn tiles_for_radius_m(
    center: GeoPoint,
    zoom: u8,
    radius_m: f64,
) -> Result<BTreeSet<TileCoord>, CoordError> {
    center.validate()?;
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }
    if !radius_m.is_finite() || radius_m < 0.0 {
        return Err(CoordError::InvalidRadius(radius_m));
    }

    let bbox = BoundingBox::around(center, radius_m);

    let (west, north) = fractional_tile(bbox.north, bbox.west, zoom);
    let (east, south) = fractional_tile(bbox.south, bbox.east, zoom);

    let x_min = clamp_axis(west, zoom);
    let x_max = clamp_axis(east, zoom);
    let y_min = clamp_axis(north, zoom);
    let y_max = clamp_axis(south, zoom);

    let mut tiles = BTreeSet::new();
    for x in x_min..=x_max {
        for y in y_min..=y_max {
            tiles.insert(TileCoord { zoom, x, y });
        }
    }
    Ok(tiles)
}

/// Geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BoundingBox {
    north: f64,
    south: f64,
    west: f64,
    east: f64,
}

impl BoundingBox {
    /// Box enclosing a circle of `radius_m` meters, clamped to the projection domain.
    fn around(center: GeoPoint, radius_m: f64) -> Self {
        let dlat = (radius_m / EARTH_RADIUS_M).to_degrees();
        let cos_lat = center.lat.to_radians().cos();
        let dlon = if cos_lat > f64::EPSILON {
            (dlat / cos_lat).min(MAX_LON)
        } else {
            MAX_LON
        };

        Self {
            north: (center.lat + dlat).min(MAX_LAT),
            south: (center.lat - dlat).max(MIN_LAT),
            west: (center.lon - dlon).max(MIN_LON),
            east: (center.lon + dlon).min(MAX_LON),
        }
    }
}

/// Position in tile space, before truncation.
#[inline]
fn fractional_tile(lat: f64, lon: f64, zoom: u8) -> (f64, f64) {
    let n = f64::from(tiles_per_axis(zoom));
    let x = (lon + 180.0) / 360.0 * n;
    let lat_rad = lat * PI / 180.0;
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n;
    (x, y)
}

/// Truncate a fractional tile position into `0..2^zoom`.
#[inline]
fn clamp_axis(value: f64, zoom: u8) -> u32 {
    let max = f64::from(tiles_per_axis(zoom) - 1);
    value.floor().clamp(0.0, max) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_york_city_at_zoom_16() {
        // New York City: 40.7128°N, 74.0060°W
        let tile = to_tile_coords(40.7128, -74.0060, 16).unwrap();
        assert_eq!(tile.y, 24640);
        assert_eq!(tile.x, 19295);
        assert_eq!(tile.zoom, 16);
    }

    #[test]
    fn test_invalid_latitude() {
        let result = to_tile_coords(90.0, 0.0, 10);
        assert!(matches!(result, Err(CoordError::InvalidLatitude(_))));
    }

    #[test]
    fn test_invalid_zoom() {
        let result = to_tile_coords(0.0, 0.0, 21);
        assert!(matches!(result, Err(CoordError::InvalidZoom(21))));
    }

    #[test]
    fn test_east_edge_is_clamped_into_grid() {
        // lon = 180 lands exactly on x = 2^zoom, which is one past the last column
        let tile = to_tile_coords(0.0, 180.0, 4).unwrap();
        assert_eq!(tile.x, 15);
    }

    #[test]
    fn test_tile_to_lat_lon_northwest_corner() {
        let tile = TileCoord {
            zoom: 16,
            x: 19295,
            y: 24640,
        };

        let (lat, lon) = tile_to_lat_lon(&tile);

        assert!((lat - 40.713).abs() < 0.01);
        assert!((lon - (-74.007)).abs() < 0.01);
    }

    #[test]
    fn test_san_francisco_deep_mile_is_bounded() {
        let center = GeoPoint::new(37.7749, -122.4194);
        let tiles = tiles_for(center, ZoomLevel::Deep, RadiusPreset::Mile).unwrap();

        assert!(!tiles.is_empty());
        assert!(tiles.len() <= 64, "got {} tiles", tiles.len());
        assert!(tiles.len() >= 49, "got {} tiles", tiles.len());

        let center_tile = to_tile_coords(center.lat, center.lon, 16).unwrap();
        assert!(tiles.contains(&center_tile));
    }

    #[test]
    fn test_zero_radius_yields_center_tile() {
        let center = GeoPoint::new(51.5074, -0.1278);
        let tiles = tiles_for_radius_m(center, 14, 0.0).unwrap();
        let expected = to_tile_coords(center.lat, center.lon, 14).unwrap();
        assert_eq!(tiles.into_iter().collect::<Vec<_>>(), vec![expected]);
    }

    #[test]
    fn test_larger_radius_covers_smaller() {
        let center = GeoPoint::new(48.8566, 2.3522);
        let small = tiles_for(center, ZoomLevel::Medium, RadiusPreset::HalfMile).unwrap();
        let large = tiles_for(center, ZoomLevel::Medium, RadiusPreset::FiveMiles).unwrap();
        assert!(small.is_subset(&large));
        assert!(large.len() > small.len());
    }

    #[test]
    fn test_region_near_pole_is_clamped() {
        let center = GeoPoint::new(85.0, 0.0);
        let tiles = tiles_for(center, ZoomLevel::Shallow, RadiusPreset::FiveMiles).unwrap();
        assert!(tiles.iter().all(|t| t.y == 0 || t.y < tiles_per_axis(12)));
        assert!(tiles.iter().any(|t| t.y == 0));
    }

    #[test]
    fn test_region_near_antimeridian_is_clamped() {
        let center = GeoPoint::new(0.0, 179.999);
        let tiles = tiles_for(center, ZoomLevel::Deep, RadiusPreset::Mile).unwrap();
        let max = tiles_per_axis(16);
        assert!(tiles.iter().all(|t| t.x < max));
        assert!(tiles.iter().any(|t| t.x == max - 1));
    }

    #[test]
    fn test_rejects_bad_radius() {
        let center = GeoPoint::new(0.0, 0.0);
        assert!(matches!(
            tiles_for_radius_m(center, 10, -1.0),
            Err(CoordError::InvalidRadius(_))
        ));
        assert!(matches!(
            tiles_for_radius_m(center, 10, f64::INFINITY),
            Err(CoordError::InvalidRadius(_))
        ));
    }

    #[test]
    fn test_rejects_bad_center() {
        let center = GeoPoint::new(-86.0, 0.0);
        let result = tiles_for(center, ZoomLevel::Deep, RadiusPreset::Mile);
        assert!(matches!(result, Err(CoordError::InvalidLatitude(_))));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn zoom_level() -> impl Strategy<Value = ZoomLevel> {
            prop_oneof![
                Just(ZoomLevel::Shallow),
                Just(ZoomLevel::Medium),
                Just(ZoomLevel::Deep),
            ]
        }

        fn radius() -> impl Strategy<Value = RadiusPreset> {
            prop_oneof![
                Just(RadiusPreset::Block),
                Just(RadiusPreset::HalfMile),
                Just(RadiusPreset::Mile),
                Just(RadiusPreset::FiveMiles),
            ]
        }

        proptest! {
            #[test]
            fn test_roundtrip_property(
                lat in -85.05..85.05_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=18
            ) {
                let tile = to_tile_coords(lat, lon, zoom)?;
                let (converted_lat, converted_lon) = tile_to_lat_lon(&tile);

                let tile_size = 360.0 / (2.0_f64.powi(zoom as i32));

                prop_assert!((converted_lat - lat).abs() < tile_size);
                prop_assert!((converted_lon - lon).abs() < tile_size);
            }

            #[test]
            fn test_tile_coords_in_bounds(
                lat in -85.05..85.05_f64,
                lon in -180.0..=180.0_f64,
                zoom in 0u8..=20
            ) {
                let tile = to_tile_coords(lat, lon, zoom)?;
                let max_tile = tiles_per_axis(zoom);
                prop_assert!(tile.x < max_tile);
                prop_assert!(tile.y < max_tile);
                prop_assert_eq!(tile.zoom, zoom);
            }

            #[test]
            fn test_tiles_for_non_empty_and_in_grid(
                lat in -85.05..85.05_f64,
                lon in -180.0..=180.0_f64,
                zoom in zoom_level(),
                radius in radius()
            ) {
                let tiles = tiles_for(GeoPoint::new(lat, lon), zoom, radius)?;
                let max = tiles_per_axis(zoom.level());

                prop_assert!(!tiles.is_empty());
                for tile in &tiles {
                    prop_assert_eq!(tile.zoom, zoom.level());
                    prop_assert!(tile.x < max);
                    prop_assert!(tile.y < max);
                }
            }

            #[test]
            fn test_tiles_for_contains_center(
                lat in -85.0..85.0_f64,
                lon in -179.9..179.9_f64,
                zoom in zoom_level(),
                radius in radius()
            ) {
                let tiles = tiles_for(GeoPoint::new(lat, lon), zoom, radius)?;
                let center = to_tile_coords(lat, lon, zoom.level())?;
                prop_assert!(tiles.contains(&center));
            }

            #[test]
            fn test_tiles_for_is_deterministic(
                lat in -80.0..80.0_f64,
                lon in -170.0..170.0_f64,
                zoom in zoom_level(),
                radius in radius()
            ) {
                let center = GeoPoint::new(lat, lon);
                let first = tiles_for(center, zoom, radius)?;
                let second = tiles_for(center, zoom, radius)?;
                prop_assert_eq!(first, second);
            }

            #[test]
            fn test_reject_invalid_longitude(
                lat in -85.0..85.0_f64,
                lon in 180.01..360.0_f64,
                zoom in 0u8..=18
            ) {
                let result = to_tile_coords(lat, lon, zoom);
                prop_assert!(matches!(result, Err(CoordError::InvalidLongitude(_))));
            }
        }
    }
}
