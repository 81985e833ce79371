//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show` and `config init`.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use console::style;
use offmap::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective configuration (file values over defaults)
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
///
/// Does not initialize logging so output stays pipeable.
pub fn run(command: ConfigCommands, config: Option<PathBuf>) -> Result<(), CliError> {
    let path = config.unwrap_or_else(config_file_path);
    match command {
        ConfigCommands::Path => run_path(&path),
        ConfigCommands::Show => run_show(&path),
        ConfigCommands::Init { force } => run_init(&path, force),
    }
}

fn run_path(path: &Path) -> Result<(), CliError> {
    println!("{}", path.display());
    Ok(())
}

fn run_show(path: &Path) -> Result<(), CliError> {
    let config = ConfigFile::load_from(path)?;
    if !path.exists() {
        eprintln!("# {} does not exist, showing defaults", path.display());
    }
    print!("{}", config.to_ini_string());
    Ok(())
}

fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if force {
        ConfigFile::default().save_to(path)?;
    } else if !ConfigFile::ensure_exists(path)? {
        println!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
        return Ok(());
    }

    println!("{} Wrote {}", style("✓").green(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_then_keeps_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");

        run_init(&path, false).unwrap();
        assert!(path.exists());

        std::fs::write(&path, "[download]\nparallel_downloads = 3\n").unwrap();
        run_init(&path, false).unwrap();
        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.download.parallel_downloads, 3);

        run_init(&path, true).unwrap();
        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config, ConfigFile::default());
    }
}
