// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Cli;

/// Longest label a FAT volume can carry.
const FAT_LABEL_MAX: usize = 11;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid configuration {path:?}: {reason}")]
    Parse { path: PathBuf, reason: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LoggingLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildConfig {
    pub work_dir: PathBuf,
    pub distro: String,
    pub mirror: String,
    pub hostname: String,
    pub root_password: String,
    /// Kernel, live-boot and init packages.
    pub base_packages: Vec<String>,
    /// X11 and the GUI payload's dependencies.
    pub desktop_packages: Vec<String>,
    pub extra_packages: Vec<String>,
    pub volume_label: String,
    pub syslinux_modules_dir: PathBuf,
    pub syslinux_mbr: PathBuf,
    pub memtest: PathBuf,
    pub pci_ids: PathBuf,
    pub partition_settle_secs: u64,
    pub log_level: LoggingLevel,
    pub log_to_disk: bool,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            distro: "bookworm".to_string(),
            mirror: "http://deb.debian.org/debian".to_string(),
            hostname: "boot2gui".to_string(),
            root_password: "root".to_string(),
            base_packages: strings(&["linux-image-amd64", "live-boot", "systemd-sysv"]),
            desktop_packages: strings(&[
                "network-manager",
                "xserver-xorg-core",
                "xserver-xorg",
                "xinit",
                "xterm",
                "nano",
                "zenity",
            ]),
            extra_packages: Vec::new(),
            volume_label: "BOOT2GUI".to_string(),
            syslinux_modules_dir: PathBuf::from("/usr/lib/syslinux/modules/bios"),
            syslinux_mbr: PathBuf::from("/usr/lib/syslinux/mbr/mbr.bin"),
            memtest: PathBuf::from("/boot/memtest86+.bin"),
            pci_ids: PathBuf::from("/usr/share/misc/pci.ids"),
            partition_settle_secs: 10,
            log_level: LoggingLevel::Info,
            log_to_disk: true,
        }
    }
}

impl BuildConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&raw).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Layer command line overrides on top of the file/default values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(work_dir) = &cli.work_dir {
            self.work_dir = work_dir.clone();
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        if cli.no_log_file {
            self.log_to_disk = false;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.distro.trim().is_empty() {
            return Err(ConfigError::Invalid("distro must not be empty".to_string()));
        }
        if self.mirror.trim().is_empty() {
            return Err(ConfigError::Invalid("mirror must not be empty".to_string()));
        }
        if self.hostname.trim().is_empty() || self.hostname.contains(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "hostname '{}' is not valid",
                self.hostname
            )));
        }
        // chpasswd reads "user:password" lines.
        if self.root_password.is_empty()
            || self.root_password.contains(':')
            || self.root_password.contains('\n')
        {
            return Err(ConfigError::Invalid(
                "root_password must be non-empty and contain no ':' or newline".to_string(),
            ));
        }
        if self.base_packages.is_empty() {
            return Err(ConfigError::Invalid(
                "base_packages must not be empty".to_string(),
            ));
        }
        if self.volume_label.len() > FAT_LABEL_MAX {
            return Err(ConfigError::Invalid(format!(
                "volume_label '{}' is longer than {} characters",
                self.volume_label, FAT_LABEL_MAX
            )));
        }
        Ok(())
    }

    /// Desktop packages followed by any extras.
    pub fn gui_packages(&self) -> Vec<String> {
        self.desktop_packages
            .iter()
            .chain(self.extra_packages.iter())
            .cloned()
            .collect()
    }
}
