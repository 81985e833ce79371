//! Cache management CLI commands.

use std::path::PathBuf;

use clap::Subcommand;
use console::style;
use dialoguer::Confirm;
use offmap::config::{format_size, CacheBackend};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Remove every cached tile
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show cache statistics
    Stats {
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Run a cache subcommand.
pub fn run(action: CacheAction, config: Option<PathBuf>, verbose: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(config, verbose)?;
    runner.log_startup("cache");

    match action {
        CacheAction::Clear { yes } => run_clear(&runner, yes),
        CacheAction::Stats { json } => run_stats(&runner, json),
    }
}

fn run_clear(runner: &CliRunner, yes: bool) -> Result<(), CliError> {
    let cache = &runner.config().cache;
    if cache.backend == CacheBackend::Memory {
        println!("Memory cache is not persisted, nothing to clear.");
        return Ok(());
    }

    println!("Cache: {}", cache.directory.display());

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt("Remove all cached tiles?")
            .default(false)
            .interact()
            .map_err(|e| CliError::Prompt(e.to_string()))?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let manager = runner.manager()?;
    let result = runner.block_on(manager.clear_cache())?;

    println!(
        "{} Removed {} tiles, freed {}",
        style("✓").green(),
        result.entries_removed,
        format_size(result.bytes_freed as usize)
    );
    Ok(())
}

fn run_stats(runner: &CliRunner, json: bool) -> Result<(), CliError> {
    let manager = runner.manager()?;
    let stats = runner.block_on(manager.cache_stats());

    if json {
        let json = serde_json::to_string_pretty(&stats)
            .map_err(|e| CliError::Config(format!("Failed to encode stats: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    let cache = &runner.config().cache;
    println!("Cache ({})", cache.backend);
    if cache.backend == CacheBackend::Disk {
        println!("  Directory: {}", cache.directory.display());
    }
    println!("  Tiles:     {}", stats.entries);
    println!("  Size:      {}", format_size(stats.size_bytes as usize));
    Ok(())
}
