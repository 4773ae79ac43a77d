// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

/// Error types for host-level operations
#[derive(Error, Debug)]
pub enum SysError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("command failed: {command}: {detail}")]
    CommandFailed { command: String, detail: String },

    #[error("{0} not installed.")]
    ToolNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("invalid mountinfo line: {0}")]
    InvalidMountInfoLine(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type alias for host operations
pub type Result<T> = std::result::Result<T, SysError>;
