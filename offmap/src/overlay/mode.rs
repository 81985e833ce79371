//! Overlay mode and its lock-free holder.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Where overlay tiles come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayMode {
    /// Fetch from the remote tile source.
    Live,
    /// Serve only what is in the cache.
    Offline,
}

impl OverlayMode {
    pub fn name(&self) -> &'static str {
        match self {
            OverlayMode::Live => "live",
            OverlayMode::Offline => "offline",
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            OverlayMode::Live => 0,
            OverlayMode::Offline => 1,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => OverlayMode::Live,
            _ => OverlayMode::Offline,
        }
    }
}

impl fmt::Display for OverlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OverlayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" | "online" => Ok(OverlayMode::Live),
            "offline" | "cached" => Ok(OverlayMode::Offline),
            other => Err(format!("unknown overlay mode '{}'", other)),
        }
    }
}

/// Process-wide current mode: single writer, many readers, no lock.
#[derive(Debug)]
pub struct AtomicOverlayMode(AtomicU8);

impl AtomicOverlayMode {
    pub fn new(mode: OverlayMode) -> Self {
        Self(AtomicU8::new(mode.to_u8()))
    }

    pub fn load(&self) -> OverlayMode {
        OverlayMode::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Store `mode`, returning the previous mode.
    pub fn swap(&self, mode: OverlayMode) -> OverlayMode {
        OverlayMode::from_u8(self.0.swap(mode.to_u8(), Ordering::AcqRel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode() {
        assert_eq!("live".parse::<OverlayMode>().unwrap(), OverlayMode::Live);
        assert_eq!(" OFFLINE ".parse::<OverlayMode>().unwrap(), OverlayMode::Offline);
        assert!("satellite".parse::<OverlayMode>().is_err());
    }

    #[test]
    fn test_display_matches_config_values() {
        assert_eq!(OverlayMode::Live.to_string(), "live");
        assert_eq!(OverlayMode::Offline.to_string(), "offline");
    }

    #[test]
    fn test_atomic_mode_swap() {
        let mode = AtomicOverlayMode::new(OverlayMode::Live);
        assert_eq!(mode.load(), OverlayMode::Live);

        let previous = mode.swap(OverlayMode::Offline);
        assert_eq!(previous, OverlayMode::Live);
        assert_eq!(mode.load(), OverlayMode::Offline);
    }
}
