mod commands;
mod logging;
mod progress;

use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use commands::Cli;
use dotenv::dotenv;
use progress::CliReporter;
use tracing::{error, info, warn};
use wyzechunk_core::{AppConfig, ChunkEngine, Error};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let config = match wyzechunk_core::config::load_configuration() {
        Ok(config) => apply_overrides(config, &args),
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(2);
        }
    };

    if let Err(err) = run(config, &args) {
        error!("Error: {:#}", err);
        let code = match err.downcast_ref::<Error>() {
            Some(Error::Config(_)) | Some(Error::Settings(_)) => 2,
            Some(Error::Cancelled) => 130,
            _ => 1,
        };
        process::exit(code);
    }
}

fn apply_overrides(mut config: AppConfig, args: &Cli) -> AppConfig {
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    if let Some(secs) = args.gap_threshold {
        config.gap_threshold_secs = secs;
    }
    if let Some(secs) = args.timeout {
        config.render_timeout_secs = Some(secs);
    }
    config
}

fn run(config: AppConfig, args: &Cli) -> Result<()> {
    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("Could not read current directory")?,
    };

    let cancel = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&cancel))
        .context("Could not install Ctrl-C handler")?;
    let engine = ChunkEngine::new(config).with_cancel_flag(cancel);

    if args.dry_run {
        return print_plan(&engine, &args.recordings_dir, &output_dir);
    }

    engine.preflight(&args.recordings_dir)?;
    prepare_output_dir(&output_dir)?;

    let reporter = CliReporter::new();
    let result = engine.run(&args.recordings_dir, &output_dir, &reporter)?;
    drop(reporter);

    info!(
        "Locate: {}, Render: {}",
        format!("{:.2}s", result.locate_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.render_duration.as_secs_f64()).green(),
    );
    info!(
        "{} fragments, {} videos: {} rendered, {} already present",
        format!("{}", result.recordings_found).cyan(),
        format!("{}", result.sessions).cyan(),
        format!("{}", result.rendered.len()).green(),
        format!("{}", result.skipped.len()).yellow(),
    );
    for path in &result.rendered {
        println!("{}", path.display());
    }

    Ok(())
}

/// Create the output directory (one level, like `mkdir`) unless it exists.
fn prepare_output_dir(output_dir: &Path) -> Result<()> {
    match fs::create_dir(output_dir) {
        Ok(()) => {
            info!("Created output directory {}", output_dir.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            if output_dir.is_dir() {
                Ok(())
            } else {
                Err(Error::Config(format!("Not a directory: {}", output_dir.display())).into())
            }
        }
        Err(e) => Err(e).with_context(|| {
            format!("Could not create output directory {}", output_dir.display())
        }),
    }
}

fn print_plan(engine: &ChunkEngine, recordings_dir: &Path, output_dir: &Path) -> Result<()> {
    let sessions = engine.plan(recordings_dir)?;
    if sessions.is_empty() {
        warn!("No fragments found in {}", recordings_dir.display());
        return Ok(());
    }

    for session in &sessions {
        let output = engine.output_path(output_dir, session);
        let status = if output.exists() {
            "exists".yellow()
        } else {
            "new".green()
        };
        println!(
            "{:>6}  {:>3} fragments  {}",
            status,
            session.len(),
            output.display()
        );
    }
    info!(
        "{} videos planned from {} fragments",
        sessions.len(),
        sessions.iter().map(|s| s.len()).sum::<usize>()
    );
    Ok(())
}
