//! Coordinate type definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom range accepted by the raw conversion functions.
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 20;

/// Tile coordinates in the Web Mercator / slippy map grid.
///
/// Ordering is (zoom, x, y), which keeps tile sets deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub zoom: u8,
    /// Column (east-west), 0 at the antimeridian west edge
    pub x: u32,
    /// Row (north-south), 0 at the north edge
    pub y: u32,
}

impl TileCoord {
    /// Create a tile coordinate, checking it lies inside the grid for its zoom.
    pub fn new(zoom: u8, x: u32, y: u32) -> Result<Self, CoordError> {
        if zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(zoom));
        }
        let n = tiles_per_axis(zoom);
        if x >= n || y >= n {
            return Err(CoordError::OutOfGrid { zoom, x, y });
        }
        Ok(Self { zoom, x, y })
    }

    /// Cache key for this tile.
    ///
    /// Format: `{zoom}/{x}/{y}`
    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.zoom, self.x, self.y)
    }

    /// Parse a key produced by [`TileCoord::key`].
    pub fn from_key(key: &str) -> Option<Self> {
        let mut parts = key.split('/');
        let zoom = parts.next()?.parse().ok()?;
        let x = parts.next()?.parse().ok()?;
        let y = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Self::new(zoom, x, y).ok()
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Number of tiles along one axis at the given zoom.
#[inline]
pub fn tiles_per_axis(zoom: u8) -> u32 {
    1u32 << zoom
}

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Check the point is inside the Web Mercator domain.
    pub fn validate(&self) -> Result<(), CoordError> {
        if !self.lat.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&self.lat) {
            return Err(CoordError::InvalidLatitude(self.lat));
        }
        if !self.lon.is_finite() || !(MIN_LON..=MAX_LON).contains(&self.lon) {
            return Err(CoordError::InvalidLongitude(self.lon));
        }
        Ok(())
    }
}

/// Zoom levels offered for bulk downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoomLevel {
    /// City overview
    Shallow,
    /// Neighbourhood
    Medium,
    /// Street detail
    Deep,
}

impl ZoomLevel {
    pub const ALL: [ZoomLevel; 3] = [ZoomLevel::Shallow, ZoomLevel::Medium, ZoomLevel::Deep];

    /// Slippy map zoom for this level.
    pub fn level(&self) -> u8 {
        match self {
            ZoomLevel::Shallow => 12,
            ZoomLevel::Medium => 14,
            ZoomLevel::Deep => 16,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ZoomLevel::Shallow => "shallow",
            ZoomLevel::Medium => "medium",
            ZoomLevel::Deep => "deep",
        }
    }
}

impl TryFrom<u8> for ZoomLevel {
    type Error = CoordError;

    fn try_from(zoom: u8) -> Result<Self, Self::Error> {
        ZoomLevel::ALL
            .into_iter()
            .find(|level| level.level() == zoom)
            .ok_or(CoordError::UnsupportedZoom(zoom))
    }
}

impl FromStr for ZoomLevel {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if let Some(level) = ZoomLevel::ALL.into_iter().find(|l| l.name() == s) {
            return Ok(level);
        }
        match s.parse::<u8>() {
            Ok(zoom) => ZoomLevel::try_from(zoom),
            Err(_) => Err(CoordError::UnknownPreset(s)),
        }
    }
}

impl fmt::Display for ZoomLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (z{})", self.name(), self.level())
    }
}

/// Download radius presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadiusPreset {
    Block,
    HalfMile,
    Mile,
    FiveMiles,
}

impl RadiusPreset {
    pub const ALL: [RadiusPreset; 4] = [
        RadiusPreset::Block,
        RadiusPreset::HalfMile,
        RadiusPreset::Mile,
        RadiusPreset::FiveMiles,
    ];

    /// Radius in meters.
    pub fn meters(&self) -> f64 {
        const METERS_PER_MILE: f64 = 1609.344;
        match self {
            RadiusPreset::Block => 250.0,
            RadiusPreset::HalfMile => METERS_PER_MILE / 2.0,
            RadiusPreset::Mile => METERS_PER_MILE,
            RadiusPreset::FiveMiles => METERS_PER_MILE * 5.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RadiusPreset::Block => "block",
            RadiusPreset::HalfMile => "half-mile",
            RadiusPreset::Mile => "mile",
            RadiusPreset::FiveMiles => "five-miles",
        }
    }
}

impl FromStr for RadiusPreset {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase().replace('_', "-");
        RadiusPreset::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or(CoordError::UnknownPreset(s))
    }
}

impl fmt::Display for RadiusPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("Invalid latitude: {0} (must be between -85.05112878 and 85.05112878)")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    #[error("Invalid zoom level: {0} (must be between 0 and 20)")]
    InvalidZoom(u8),

    /// Zoom is a valid slippy zoom but not one of the download presets.
    #[error("Unsupported download zoom: {0} (expected 12, 14 or 16)")]
    UnsupportedZoom(u8),

    #[error("Invalid radius: {0} meters")]
    InvalidRadius(f64),

    #[error("Tile {zoom}/{x}/{y} is outside the grid")]
    OutOfGrid { zoom: u8, x: u32, y: u32 },

    #[error("Unknown preset: '{0}'")]
    UnknownPreset(String),
}
