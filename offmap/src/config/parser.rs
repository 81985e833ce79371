//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::{CacheBackend, ConfigFile};
use super::size::parse_size;
use crate::overlay::OverlayMode;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = non_empty(section, "directory") {
            config.cache.directory = expand_tilde(v);
        }
        if let Some(v) = section.get("backend") {
            config.cache.backend = CacheBackend::from_str(v).map_err(|_| {
                invalid("cache", "backend", v, "must be 'disk' or 'memory'")
            })?;
        }
        if let Some(v) = section.get("memory_size") {
            config.cache.memory_size = parse_size(v).map_err(|_| {
                invalid(
                    "cache",
                    "memory_size",
                    v,
                    "expected format like '2GB', '500MB', or '1024KB'",
                )
            })?;
        }
        if let Some(v) = section.get("clear_timeout_ms") {
            config.cache.clear_timeout_ms = parse_number("cache", "clear_timeout_ms", v)?;
        }
    }

    // [download] section
    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = section.get("parallel_downloads") {
            let parallel: usize = parse_number("download", "parallel_downloads", v)?;
            if parallel == 0 {
                return Err(invalid(
                    "download",
                    "parallel_downloads",
                    v,
                    "must be at least 1",
                ));
            }
            config.download.parallel_downloads = parallel;
        }
        if let Some(v) = section.get("max_retries") {
            config.download.max_retries = parse_number("download", "max_retries", v)?;
        }
        if let Some(v) = section.get("timeout") {
            let timeout: u64 = parse_number("download", "timeout", v)?;
            if timeout == 0 {
                return Err(invalid(
                    "download",
                    "timeout",
                    v,
                    "must be a positive integer (seconds)",
                ));
            }
            config.download.timeout = timeout;
        }
        if let Some(v) = section.get("backoff_ms") {
            config.download.backoff_ms = parse_number("download", "backoff_ms", v)?;
        }
    }

    // [source] section
    if let Some(section) = ini.section(Some("source")) {
        if let Some(v) = non_empty(section, "url") {
            for placeholder in ["{z}", "{x}", "{y}"] {
                if !v.contains(placeholder) {
                    return Err(invalid(
                        "source",
                        "url",
                        v,
                        "must contain {z}, {x} and {y} placeholders",
                    ));
                }
            }
            config.source.url = v.to_string();
        }
        if let Some(v) = section.get("subdomains") {
            config.source.subdomains = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = non_empty(section, "user_agent") {
            config.source.user_agent = v.to_string();
        }
    }
    if config.source.url.contains("{s}") && config.source.subdomains.is_empty() {
        return Err(invalid(
            "source",
            "subdomains",
            "",
            "required when url contains {s}",
        ));
    }

    // [overlay] section
    if let Some(section) = ini.section(Some("overlay")) {
        if let Some(v) = section.get("mode") {
            config.overlay.mode = OverlayMode::from_str(v)
                .map_err(|_| invalid("overlay", "mode", v, "must be 'live' or 'offline'"))?;
        }
        if let Some(v) = section.get("write_through") {
            config.overlay.write_through = parse_bool(v)
                .ok_or_else(|| invalid("overlay", "write_through", v, "must be true or false"))?;
        }
    }

    Ok(config)
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number<T: FromStr>(
    section_name: &str,
    key: &str,
    value: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section_name, key, value, "must be a non-negative integer"))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
