//! Configuration for offmap.
//!
//! The user-facing file is `~/.offmap/config.ini`:
//!
//! ```ini
//! [cache]
//! directory = ~/.cache/offmap
//! backend = disk
//!
//! [download]
//! parallel_downloads = 8
//!
//! [source]
//! url = https://tile.openstreetmap.org/{z}/{x}/{y}.png
//!
//! [overlay]
//! mode = live
//! ```
//!
//! Missing files and keys fall back to the `DEFAULT_*` values.

mod defaults;
mod download;
mod file;
mod parser;
mod settings;
mod size;
mod writer;

pub use defaults::*;
pub use download::DownloadConfig;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    CacheBackend, CacheSettings, ConfigFile, DownloadSettings, OverlaySettings, SourceSettings,
};
pub use size::{format_size, parse_size, SizeParseError};
