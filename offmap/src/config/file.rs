//! Reading and writing `~/.offmap/config.ini`.
//!
//! A missing file is not an error: every key has a default. Present keys
//! are validated and the first bad one is reported with its section.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::settings::ConfigFile;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.offmap/config.ini).
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to the default path (~/.offmap/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Render as the INI text `save_to` writes.
    pub fn to_ini_string(&self) -> String {
        super::writer::to_config_string(self)
    }

    /// Create a default config file at `path` if none exists.
    ///
    /// Returns whether a file was created.
    pub fn ensure_exists(path: &Path) -> Result<bool, ConfigFileError> {
        if path.exists() {
            return Ok(false);
        }
        Self::default().save_to(path)?;
        Ok(true)
    }
}

/// Get the path to the config directory (~/.offmap).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".offmap")
}

/// Get the path to the config file (~/.offmap/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheBackend, DEFAULT_PARALLEL_DOWNLOADS};
    use crate::overlay::OverlayMode;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert_eq!(config.cache.backend, CacheBackend::Disk);
        assert!(config.cache.directory.ends_with("offmap"));
        assert_eq!(config.download.parallel_downloads, DEFAULT_PARALLEL_DOWNLOADS);
        assert_eq!(
            config.source.url,
            "https://tile.openstreetmap.org/{z}/{x}/{y}.png"
        );
        assert_eq!(config.overlay.mode, OverlayMode::Live);
        assert!(config.overlay.write_through);
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let config = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_then_load_preserves_values() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested/config.ini");

        let mut config = ConfigFile::default();
        config.cache.directory = temp_dir.path().join("tiles");
        config.cache.backend = CacheBackend::Memory;
        config.cache.memory_size = 64 * 1024 * 1024;
        config.download.parallel_downloads = 3;
        config.source.url = "https://{s}.tiles.example/{z}/{x}/{y}.png".to_string();
        config.source.subdomains = vec!["a".into(), "b".into()];
        config.overlay.mode = OverlayMode::Offline;
        config.overlay.write_through = false;

        config.save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ensure_exists_creates_once() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        assert!(ConfigFile::ensure_exists(&config_path).unwrap());
        assert!(config_path.exists());
        assert!(!ConfigFile::ensure_exists(&config_path).unwrap());
    }

    #[test]
    fn test_load_reports_invalid_value() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, "[overlay]\nmode = sideways\n").unwrap();

        let err = ConfigFile::load_from(&config_path).unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { .. }));
    }
}
