// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashMap;

use zbus::{
    Connection,
    zvariant::{OwnedObjectPath, Value},
};
use zbus_macros::proxy;

use crate::error::DiskError;

#[proxy(
    default_service = "org.freedesktop.UDisks2",
    default_path = "/org/freedesktop/UDisks2/Manager",
    interface = "org.freedesktop.UDisks2.Manager"
)]
pub trait UDisks2Manager {
    fn resolve_device(
        &self,
        devspec: HashMap<&str, Value<'_>>,
        options: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<Vec<OwnedObjectPath>>;
}

/// `org.freedesktop.UDisks2.Partition` with the raw flag word.
///
/// `udisks2::partition::PartitionFlags` only models the GPT bits; the dos
/// bootable flag (0x80) has to go over the wire as a plain integer.
#[proxy(
    default_service = "org.freedesktop.UDisks2",
    interface = "org.freedesktop.UDisks2.Partition"
)]
pub trait RawPartition {
    fn set_flags(&self, flags: u64, options: HashMap<&str, Value<'_>>) -> zbus::Result<()>;
}

pub async fn system_connection() -> Result<Connection, DiskError> {
    Connection::system()
        .await
        .map_err(|e| DiskError::ConnectionFailed(e.to_string()))
}

/// Resolve a device path (e.g. "/dev/sdb") to its UDisks2 block object path.
pub async fn resolve_block_object(
    connection: &Connection,
    device: &str,
) -> Result<OwnedObjectPath, DiskError> {
    let manager = UDisks2ManagerProxy::new(connection)
        .await
        .map_err(|e| DiskError::DBusError(e.to_string()))?;

    let mut devspec: HashMap<&str, Value<'_>> = HashMap::new();
    devspec.insert("path", Value::from(device));

    manager
        .resolve_device(devspec, HashMap::new())
        .await
        .map_err(|e| DiskError::DBusError(e.to_string()))?
        .into_iter()
        .next()
        .ok_or_else(|| DiskError::DeviceNotFound(device.to_string()))
}
