//! Download command - cache every tile around a point.

use std::path::PathBuf;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use offmap::config::format_size;
use offmap::coord::GeoPoint;
use offmap::download::{JobReport, JobState};
use offmap::DownloadRequest;

use super::common::{RadiusArg, ZoomArg};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the download command.
pub struct DownloadArgs {
    pub lat: f64,
    pub lon: f64,
    pub zoom: ZoomArg,
    pub radius: RadiusArg,
    pub concurrency: Option<usize>,
    pub json: bool,
}

/// Run the download command.
pub fn run(args: DownloadArgs, config: Option<PathBuf>, verbose: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(config, verbose)?;
    runner.log_startup("download");
    let manager = runner.manager()?;

    let mut request = DownloadRequest::new(
        GeoPoint::new(args.lat, args.lon),
        args.zoom.into(),
        args.radius.into(),
    );
    if let Some(concurrency) = args.concurrency {
        request = request.with_max_concurrency(concurrency);
    }

    let handle = manager.start_download(request)?;

    let token = handle.cancellation_token();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Cancelling download...");
        token.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let bar = if args.json {
        ProgressBar::hidden()
    } else {
        println!(
            "Downloading {} tiles around {}, {} ({}, {})",
            handle.progress().total,
            args.lat,
            args.lon,
            request.zoom,
            request.radius.name()
        );
        progress_bar(handle.progress().total as u64)
    };

    let report = runner.block_on(async {
        let mut progress = handle.subscribe();
        loop {
            let snapshot = *progress.borrow_and_update();
            bar.set_position(snapshot.processed() as u64);
            bar.set_message(format!(
                "{} cached, {} failed",
                snapshot.cached_hits, snapshot.failed
            ));
            if snapshot.state.is_terminal() || progress.changed().await.is_err() {
                break;
            }
        }
        handle.wait().await
    });
    bar.finish_and_clear();

    let report = report.map_err(offmap::Error::from)?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::Config(format!("Failed to encode report: {}", e)))?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    match report.state {
        JobState::Completed => Ok(()),
        _ => Err(CliError::DownloadIncomplete(report.to_string())),
    }
}

fn progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )
    .map(|style| style.progress_chars("=> "))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn print_report(report: &JobReport) {
    let state = match report.state {
        JobState::Completed => style(report.state.name()).green(),
        JobState::Cancelled => style(report.state.name()).yellow(),
        _ => style(report.state.name()).red(),
    };

    println!();
    println!("Download {}", state);
    println!("  Tiles:      {}/{}", report.completed, report.total);
    println!("  Cached:     {}", report.cached_hits);
    println!(
        "  Downloaded: {}",
        format_size(report.bytes_downloaded as usize)
    );
    println!("  Elapsed:    {:.1}s", report.elapsed.as_secs_f64());

    if report.pending() > 0 {
        println!("  Pending:    {}", report.pending());
    }

    if !report.failed.is_empty() {
        println!();
        println!("Failed tiles:");
        for failed in report.failed.iter().take(10) {
            println!(
                "  {} {} ({} attempts)",
                style("✗").red(),
                failed.coord,
                failed.attempts
            );
            println!("      {}", failed.error);
        }
        if report.failed.len() > 10 {
            println!("  ... and {} more", report.failed.len() - 10);
        }
    }
}
