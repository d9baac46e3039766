//! multi-lookup - Parallel bulk hostname resolution
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use multi_lookup::config::{CliArgs, LookupConfig};
use multi_lookup::progress::{format_secs, print_header, print_summary};
use multi_lookup::LookupCoordinator;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let start = Instant::now();

    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose);

    // Validate and create config
    let config = LookupConfig::from_args(args).context("Invalid configuration")?;
    let quiet = config.quiet;

    if !quiet {
        print_header(
            config.requester_count,
            config.resolver_count,
            config.queue_size,
            config.input_files.len(),
        );
    }

    // Create coordinator (creates and truncates both logs)
    let coordinator = LookupCoordinator::new(config).context("Failed to initialize lookup")?;

    // Run both pools to completion
    let result = coordinator.run().context("Lookup failed")?;

    if !quiet {
        print_summary(&result);
    }

    if result.files_failed > 0 {
        info!(files = result.files_failed, "Some input files could not be serviced");
    }

    println!(
        "./multi-lookup: total time is {} seconds.",
        format_secs(start.elapsed())
    );

    Ok(())
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("multi_lookup=debug,warn")
    } else {
        EnvFilter::new("multi_lookup=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
