//! INI serialization logic for converting `ConfigFile` → INI string.

use super::settings::ConfigFile;
use super::size::format_size;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[cache]
; Directory holding downloaded tiles. Tiles are stored in <directory>/tiles/
; Example: directory = /mnt/sdcard/offmap
directory = {}
; Storage backend:
;   disk   - one file per tile under directory (survives restarts)
;   memory - in-process only, limited by memory_size
backend = {}
; Memory backend size. Supports: KB, MB, GB suffixes (e.g., 256MB, 1GB)
memory_size = {}
; How long a cache clear waits for in-flight reads and writes (milliseconds)
clear_timeout_ms = {}

[download]
; Concurrent tile requests per download
parallel_downloads = {}
; Retries per tile after the first attempt (server errors, timeouts, 408/429)
max_retries = {}
; Timeout for a single tile request (seconds)
timeout = {}
; Base delay before the first retry, doubled for each further retry (milliseconds)
backoff_ms = {}

[source]
; Tile URL template. {{z}}, {{x}} and {{y}} are required; {{s}} rotates through subdomains
url = {}
; Comma-separated subdomains for {{s}} (e.g., a,b,c)
subdomains = {}
; User-Agent sent with every request. Public tile servers require one
user_agent = {}

[overlay]
; Startup tile mode:
;   live    - fetch tiles from the tile server
;   offline - serve only cached tiles
mode = {}
; Store tiles fetched in live mode so they are available offline
write_through = {}
"#,
        config.cache.directory.display(),
        config.cache.backend,
        format_size(config.cache.memory_size),
        config.cache.clear_timeout_ms,
        config.download.parallel_downloads,
        config.download.max_retries,
        config.download.timeout,
        config.download.backoff_ms,
        config.source.url,
        config.source.subdomains.join(","),
        config.source.user_agent,
        config.overlay.mode,
        config.overlay.write_through,
    )
}
