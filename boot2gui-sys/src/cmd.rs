// SPDX-License-Identifier: GPL-3.0-only

//! External command execution
//!
//! Every step of the build is a call into a trusted external tool. A [`Cmd`]
//! inherits the terminal, so long running tools like `debootstrap` and
//! `apt-get` stream their progress. A non-zero exit status is always an error.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, SysError};

pub fn render(command: &str, args: &[String]) -> String {
    if args.is_empty() {
        command.to_string()
    } else {
        format!("{} {}", command, args.join(" "))
    }
}

#[derive(Debug, Clone)]
pub struct Cmd {
    program: String,
    args: Vec<OsString>,
    env: Vec<(OsString, OsString)>,
    stdin: Option<Vec<u8>>,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            stdin: None,
        }
    }

    /// Run `program` with its filesystem root redirected to `root`.
    pub fn chroot(root: &Path, program: impl Into<String>) -> Self {
        Self::new("chroot").arg(root).arg(program.into())
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child (and, through `chroot`, the
    /// program run inside it).
    pub fn env(mut self, name: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((name.into(), value.into()));
        self
    }

    /// Feed `input` to the child's stdin instead of inheriting ours.
    pub fn stdin_bytes(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn rendered(&self) -> String {
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        render(&self.program, &args)
    }

    fn expression(&self) -> duct::Expression {
        let mut expression = duct::cmd(&self.program, &self.args).unchecked();
        for (name, value) in &self.env {
            expression = expression.env(name, value);
        }
        if let Some(input) = &self.stdin {
            expression = expression.stdin_bytes(input.clone());
        }
        expression
    }

    /// Run with stdout/stderr attached to the terminal.
    pub fn run(&self) -> Result<()> {
        let rendered = self.rendered();
        debug!("running {}", rendered);

        let output = self.expression().run().map_err(|e| spawn_error(&rendered, e))?;
        if !output.status.success() {
            return Err(SysError::CommandFailed {
                command: rendered,
                detail: output.status.to_string(),
            });
        }
        Ok(())
    }
}

fn spawn_error(command: &str, error: std::io::Error) -> SysError {
    if error.kind() == std::io::ErrorKind::NotFound {
        let program = command.split_whitespace().next().unwrap_or(command);
        SysError::ToolNotFound(program.to_string())
    } else {
        SysError::CommandFailed {
            command: command.to_string(),
            detail: error.to_string(),
        }
    }
}

/// Argument for tools taking `-C <dir>`; an empty path means the current directory.
pub(crate) fn dir_arg(dir: &Path) -> PathBuf {
    if dir.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        dir.to_path_buf()
    }
}
