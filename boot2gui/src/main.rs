// SPDX-License-Identifier: GPL-3.0-only

//! boot2gui - build a bootable Debian live USB stick from scratch

use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result};
use boot2gui::cli::Cli;
use boot2gui::config::BuildConfig;
use boot2gui::pipeline::{BuildContext, clear_cache, run_pipeline};
use boot2gui::{logging, preflight, stages};
use clap::Parser;

fn load_config(cli: &Cli) -> Result<BuildConfig> {
    let mut config = match &cli.config {
        Some(path) => BuildConfig::load(path)?,
        None => BuildConfig::default(),
    };
    config.apply_cli(cli);
    config.validate()?;

    fs::create_dir_all(&config.work_dir)
        .with_context(|| format!("creating work directory {}", config.work_dir.display()))?;
    Ok(config)
}

fn build(cli: &Cli, config: BuildConfig, device: String) -> Result<()> {
    let mut ctx = BuildContext::new(config, device);
    if cli.rebuild {
        clear_cache(&ctx.layout).context("clearing cached build artifacts")?;
    }

    let report = run_pipeline(&stages::default_stages(), &mut ctx)?;
    tracing::info!(
        "Done: {} stage(s) run, {} reused from cache",
        report.executed.len(),
        report.skipped.len()
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Nothing is logged yet, so configuration problems go straight to stderr.
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let log_dir = config.log_to_disk.then_some(config.work_dir.as_path());
    // Flushes the log file when dropped at the end of main.
    let _log_guard = logging::init(config.log_level, log_dir);

    tracing::info!("boot2gui v{}", env!("CARGO_PKG_VERSION"));
    if let Ok(effective) = toml::to_string_pretty(&config) {
        tracing::debug!("Effective configuration:\n{}", effective);
    }

    let device = match preflight::run_all(&cli.device) {
        Ok(device) => device,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match build(&cli, config, device) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
