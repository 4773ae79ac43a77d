// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiskError {
    #[error("failed to connect to the system bus: {0}")]
    ConnectionFailed(String),

    #[error("D-Bus error: {0}")]
    DBusError(String),

    #[error("UDisks2 does not know device {0}")]
    DeviceNotFound(String),

    #[error("{0}")]
    OperationFailed(String),
}
