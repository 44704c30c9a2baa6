mod commands;
mod logging;
mod progress;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use colored::*;
use commands::Cli;
use dotenv::dotenv;
use progress::CliReporter;
use sanitizer_core::{SanitizeReport, Sanitizer};
use tracing::{debug, error, info};

fn main() -> ExitCode {
    dotenv().ok();

    let args = Cli::parse();
    let _guard = logging::init_logger(args.verbose);

    match run(&args) {
        Ok(report) => {
            print_summary(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Cli) -> anyhow::Result<SanitizeReport> {
    let config = sanitizer_core::config::load_configuration(args.config.as_deref())
        .context("Error loading configuration")?;
    debug!("Configuration: {:?}", config);

    let sanitizer = Sanitizer::new(config);
    let reporter = CliReporter::new();
    match sanitizer.sanitize(&args.source, &args.target, &reporter) {
        Ok(report) => Ok(report),
        Err(err) => {
            reporter.abandon();
            Err(err.into())
        }
    }
}

fn print_summary(report: &SanitizeReport) {
    println!();
    info!(
        "Walk: {}, Synthesis: {}, Link: {}",
        format!("{:.2}s", report.walk_duration.as_secs_f64()).green(),
        format!("{:.2}s", report.synthesis_duration.as_secs_f64()).green(),
        format!("{:.2}s", report.link_duration.as_secs_f64()).green(),
    );
    info!(
        "{} images linked to {} placeholders",
        format!("{}", report.links).cyan(),
        format!("{}", report.placeholders).cyan(),
    );
    info!(
        "{} files copied verbatim ({} bytes), {} directories mirrored",
        format!("{}", report.files_copied).yellow(),
        format!("{}", report.bytes_copied).yellow(),
        report.directories,
    );
    if report.skipped > 0 {
        info!("{} entries skipped", format!("{}", report.skipped).red());
    }
    info!("Sanitized media written to {}", report.target.display());
}
