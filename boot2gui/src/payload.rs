// SPDX-License-Identifier: GPL-3.0-only

//! Files that make the live system log in on tty1 and start X with the
//! sample application.

use thiserror::Error;

/// Launcher for the sample GUI application, relative to the chroot.
pub const LAUNCHER_PATH: &str = "usr/local/bin/boot2gui-app";

pub const XINITRC_PATH: &str = "root/.xinitrc";

pub const BASH_PROFILE_PATH: &str = "root/.bash_profile";

pub const GETTY_UNIT_PATH: &str = "lib/systemd/system/getty@.service";

const LAUNCHER: &str = r#"#!/bin/sh
exec zenity --info --title "Standalone app" --text "This is a sample GUI application"
"#;

const BASH_PROFILE: &str = r#"if [ -z "$DISPLAY" ] && [ "$(tty)" = "/dev/tty1" ]; then
    exec startx
fi
"#;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("no agetty ExecStart= line in getty unit")]
    MissingExecStart,
}

pub fn launcher_script() -> &'static str {
    LAUNCHER
}

pub fn xinitrc() -> String {
    format!("#!/bin/sh\nexec /{LAUNCHER_PATH}\n")
}

pub fn bash_profile() -> &'static str {
    BASH_PROFILE
}

fn autologin_exec_start(program: &str, user: &str) -> String {
    format!(r"ExecStart={program} -o '-p -f -- \\u' --noclear --autologin {user} %I $TERM")
}

/// Rewrite the agetty `ExecStart=` line of a getty unit so `user` is logged
/// in automatically. Units already carrying `--autologin` are returned as is.
pub fn enable_autologin(unit: &str, user: &str) -> Result<String, PatchError> {
    let mut patched = false;
    let mut lines = Vec::new();

    for line in unit.lines() {
        let trimmed = line.trim_start();
        let program = trimmed
            .strip_prefix("ExecStart=")
            .and_then(|command| command.split_whitespace().next())
            .filter(|program| program.ends_with("agetty"));

        match program {
            Some(_) if trimmed.contains("--autologin") => {
                patched = true;
                lines.push(line.to_string());
            }
            Some(program) => {
                patched = true;
                lines.push(autologin_exec_start(program, user));
            }
            None => lines.push(line.to_string()),
        }
    }

    if !patched {
        return Err(PatchError::MissingExecStart);
    }

    let mut output = lines.join("\n");
    if unit.ends_with('\n') {
        output.push('\n');
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::{PatchError, enable_autologin, xinitrc};

    const BOOKWORM_GETTY: &str = "\
[Unit]
Description=Getty on %I

[Service]
ExecStart=-/sbin/agetty -o '-p -- \\\\u' --noclear - $TERM
Type=idle
Restart=always
";

    #[test]
    fn rewrites_agetty_line_only() {
        let patched = enable_autologin(BOOKWORM_GETTY, "root").unwrap();
        assert!(patched.contains(
            "ExecStart=-/sbin/agetty -o '-p -f -- \\\\u' --noclear --autologin root %I $TERM\n"
        ));
        assert!(patched.starts_with("[Unit]\nDescription=Getty on %I\n"));
        assert!(patched.ends_with("Restart=always\n"));
        assert_eq!(patched.matches("ExecStart=").count(), 1);
    }

    #[test]
    fn patching_twice_is_stable() {
        let once = enable_autologin(BOOKWORM_GETTY, "root").unwrap();
        let twice = enable_autologin(&once, "root").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn unit_without_agetty_is_an_error() {
        let unit = "[Service]\nExecStart=/usr/bin/true\n";
        assert_eq!(
            enable_autologin(unit, "root"),
            Err(PatchError::MissingExecStart)
        );
    }

    #[test]
    fn xinitrc_execs_the_launcher() {
        assert_eq!(xinitrc(), "#!/bin/sh\nexec /usr/local/bin/boot2gui-app\n");
    }
}
