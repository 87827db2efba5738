#![deny(clippy::mod_module_files)]
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod containerfile;
mod detector;
mod engine;
mod error;
mod fingerprint;
mod settings;
mod storage;
mod tags;
mod trigger;

use detector::ChangeDetector;
use engine::ContainerEngine;
use storage::FilesystemDigestStore;
use trigger::{BuildTarget, TriggerOutcome};

fn main() -> ExitCode {
    let args = match cli::Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            // --help and --version also arrive here
            if !e.use_stderr() {
                return ExitCode::SUCCESS;
            }
            let code = error::Error::Usage(e.to_string()).exit_code();
            return ExitCode::from(code as u8);
        }
    };

    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("image-rebuild: {:#}", e);
            ExitCode::from(error::exit_code_for(&e) as u8)
        }
    }
}

/// `RUST_LOG` wins; otherwise each `-v` raises the level one step from `warn`
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(args: &cli::Args) -> Result<()> {
    let now = Utc::now();
    let config = config::RebuildConfig::load()?;
    let settings = settings::Settings::resolve(args, &config, now)?;

    tracing::info!(
        "Using {} at {:?}",
        settings.engine.kind(),
        settings.engine.program()
    );

    let store = FilesystemDigestStore::new(&settings.context_dir, &settings.state_dir);
    let report = ChangeDetector::new(
        &store,
        &settings.engine,
        &settings.build_file,
        settings.algorithm,
    )
    .decide(settings.forced)?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialize change report")?;
        println!("{}", json);
    }

    let target = BuildTarget {
        image: settings.image.clone(),
        tags: settings.tags.clone(),
        labels: settings.labels.clone(),
        build_file: settings.build_file.clone(),
        context_dir: settings.context_dir.clone(),
    };
    let request = target.to_request(&report, now);

    match trigger::run(
        &settings.engine,
        report.decision,
        &request,
        settings.dry_run,
        settings.push,
    )? {
        TriggerOutcome::UpToDate => {
            eprintln!("image-rebuild: {} is up to date", settings.image);
        }
        TriggerOutcome::DryRun => {
            eprintln!(
                "image-rebuild: {} would be rebuilt as {}",
                settings.image,
                request.references().join(", ")
            );
        }
        TriggerOutcome::Built(status) if status.success() => {
            eprintln!("image-rebuild: built {}", request.references().join(", "));
        }
        TriggerOutcome::Built(status) => {
            anyhow::bail!(
                "Build of {} failed (exit code {:?})",
                settings.image,
                status.code
            );
        }
    }

    Ok(())
}
