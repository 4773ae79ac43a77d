// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use clap::Parser;

use crate::config::LoggingLevel;

#[derive(Debug, Parser)]
#[command(name = "boot2gui", version)]
#[command(about = "Build a bootable Debian live USB stick that starts a GUI application")]
pub struct Cli {
    /// USB stick device, e.g. /dev/sdd. Everything on it is destroyed.
    pub device: String,

    /// TOML build configuration
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the cached stage archives
    #[arg(short, long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub log_level: Option<LoggingLevel>,

    /// Log to stderr only
    #[arg(long)]
    pub no_log_file: bool,

    /// Discard cached archives and the live image and build from scratch
    #[arg(long)]
    pub rebuild: bool,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Cli;
    use crate::config::LoggingLevel;

    #[test]
    fn device_is_the_only_positional() {
        let cli = Cli::try_parse_from(["boot2gui", "/dev/sdd"]).unwrap();
        assert_eq!(cli.device, "/dev/sdd");
        assert!(!cli.rebuild);

        assert!(Cli::try_parse_from(["boot2gui"]).is_err());
        assert!(Cli::try_parse_from(["boot2gui", "/dev/sdd", "/dev/sde"]).is_err());
    }

    #[test]
    fn options_are_parsed() {
        let cli = Cli::try_parse_from([
            "boot2gui",
            "--work-dir",
            "/var/tmp/b2g",
            "--log-level",
            "debug",
            "--no-log-file",
            "--rebuild",
            "/dev/sdb",
        ])
        .unwrap();
        assert_eq!(cli.work_dir.as_deref(), Some(std::path::Path::new("/var/tmp/b2g")));
        assert_eq!(cli.log_level, Some(LoggingLevel::Debug));
        assert!(cli.no_log_file);
        assert!(cli.rebuild);
    }
}
