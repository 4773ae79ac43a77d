// SPDX-License-Identifier: GPL-3.0-only

//! boot2gui - build a Debian live USB stick that boots straight into X
//!
//! The build is a linear pipeline of stages. Every stage that produces a file
//! in the working directory is skipped when that file already exists, so an
//! interrupted run resumes at the first incomplete stage.

pub mod cli;
pub mod config;
pub mod isolinux;
pub mod layout;
pub mod logging;
pub mod payload;
pub mod pipeline;
pub mod preflight;
pub mod rt;
pub mod stages;

pub use config::{BuildConfig, ConfigError, LoggingLevel};
pub use layout::Layout;
pub use pipeline::{BuildContext, PipelineReport, Stage, run_pipeline};
pub use preflight::PreflightError;
