//! Network reachability events.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::overlay::OverlayMode;

/// Network state reported by the platform's reachability observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reachability {
    Wifi,
    Cellular,
    Unreachable,
}

impl Reachability {
    /// Overlay mode to use in this network state.
    pub fn overlay_mode(&self) -> OverlayMode {
        match self {
            Reachability::Wifi | Reachability::Cellular => OverlayMode::Live,
            Reachability::Unreachable => OverlayMode::Offline,
        }
    }
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reachability::Wifi => "wifi",
            Reachability::Cellular => "cellular",
            Reachability::Unreachable => "unreachable",
        };
        f.write_str(name)
    }
}
