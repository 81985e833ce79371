//! Common argument types shared across CLI commands.

use clap::ValueEnum;
use offmap::coord::{RadiusPreset, ZoomLevel};
use offmap::overlay::OverlayMode;

/// Zoom preset selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum ZoomArg {
    /// City overview (z12)
    Shallow,
    /// Neighbourhood (z14)
    Medium,
    /// Street detail (z16)
    Deep,
}

impl From<ZoomArg> for ZoomLevel {
    fn from(zoom: ZoomArg) -> Self {
        match zoom {
            ZoomArg::Shallow => ZoomLevel::Shallow,
            ZoomArg::Medium => ZoomLevel::Medium,
            ZoomArg::Deep => ZoomLevel::Deep,
        }
    }
}

/// Radius preset selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum RadiusArg {
    /// 250 meters
    Block,
    /// Half a mile
    HalfMile,
    /// One mile
    Mile,
    /// Five miles
    FiveMiles,
}

impl From<RadiusArg> for RadiusPreset {
    fn from(radius: RadiusArg) -> Self {
        match radius {
            RadiusArg::Block => RadiusPreset::Block,
            RadiusArg::HalfMile => RadiusPreset::HalfMile,
            RadiusArg::Mile => RadiusPreset::Mile,
            RadiusArg::FiveMiles => RadiusPreset::FiveMiles,
        }
    }
}

/// Overlay mode selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum ModeArg {
    /// Fetch from the remote source
    Live,
    /// Cache only
    Offline,
}

impl From<ModeArg> for OverlayMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Live => OverlayMode::Live,
            ModeArg::Offline => OverlayMode::Offline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_arg_maps_to_levels() {
        assert_eq!(ZoomLevel::from(ZoomArg::Shallow).level(), 12);
        assert_eq!(ZoomLevel::from(ZoomArg::Deep).level(), 16);
    }

    #[test]
    fn test_radius_arg_parses_kebab_case() {
        let radius = RadiusArg::from_str("half-mile", true).unwrap();
        assert_eq!(RadiusPreset::from(radius), RadiusPreset::HalfMile);
    }

    #[test]
    fn test_mode_arg_maps_to_overlay_mode() {
        assert_eq!(OverlayMode::from(ModeArg::Offline), OverlayMode::Offline);
    }
}
