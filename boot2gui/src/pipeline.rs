// SPDX-License-Identifier: GPL-3.0-only

//! Resumable stage runner
//!
//! A stage that declares an output file is skipped when that file exists and
//! no earlier stage ran in this invocation. Once a stage runs, everything
//! after it is rebuilt, since its cached output was made from older inputs.
//! Stages must publish their output last (and atomically), so its presence
//! means the stage completed. Stages without an output always run.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, bail};
use tracing::info;

use crate::config::BuildConfig;
use crate::layout::Layout;

#[derive(Debug, Clone)]
pub struct BuildContext {
    pub config: BuildConfig,
    pub layout: Layout,
    /// Target whole-disk device.
    pub device: String,
    /// Boot partition on `device`, set by the partitioning stage.
    pub partition: Option<String>,
}

impl BuildContext {
    pub fn new(config: BuildConfig, device: impl Into<String>) -> Self {
        let layout = Layout::new(config.work_dir.clone());
        Self {
            config,
            layout,
            device: device.into(),
            partition: None,
        }
    }
}

pub trait Stage {
    fn name(&self) -> &'static str;

    /// File whose existence marks this stage as done.
    fn output(&self, layout: &Layout) -> Option<PathBuf>;

    fn run(&self, ctx: &mut BuildContext) -> anyhow::Result<()>;
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub executed: Vec<&'static str>,
    pub skipped: Vec<&'static str>,
}

pub fn run_pipeline(
    stages: &[Box<dyn Stage>],
    ctx: &mut BuildContext,
) -> anyhow::Result<PipelineReport> {
    let mut report = PipelineReport::default();

    for stage in stages {
        let output = stage.output(&ctx.layout);
        if let Some(path) = &output
            && path.exists()
            && report.executed.is_empty()
        {
            info!("Skipping {}: {} exists", stage.name(), path.display());
            report.skipped.push(stage.name());
            continue;
        }

        if let Some(path) = &output
            && path.exists()
        {
            info!("Rebuilding {}: an earlier stage changed", stage.name());
        } else {
            info!("Running {}", stage.name());
        }
        stage
            .run(ctx)
            .with_context(|| format!("{} failed", stage.name()))?;

        if let Some(path) = &output
            && !path.exists()
        {
            bail!(
                "{} finished without producing {}",
                stage.name(),
                path.display()
            );
        }

        info!("Finished {}", stage.name());
        report.executed.push(stage.name());
    }

    Ok(report)
}

/// Remove every cached artifact so the next run starts from scratch.
pub fn clear_cache(layout: &Layout) -> std::io::Result<()> {
    for archive in layout.archives() {
        if archive.exists() {
            info!("Removing {}", archive.display());
            fs::remove_file(&archive)?;
        }
    }
    let image_dir = layout.image_dir();
    if image_dir.exists() {
        info!("Removing {}", image_dir.display());
        fs::remove_dir_all(&image_dir)?;
    }
    Ok(())
}
