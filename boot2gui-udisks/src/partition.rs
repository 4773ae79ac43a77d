// SPDX-License-Identifier: GPL-3.0-only

//! Boot partition creation

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};
use udisks2::{block::BlockProxy, partitiontable::PartitionTableProxy};
use zbus::{
    Connection,
    zvariant::{OwnedObjectPath, Value},
};

use crate::error::DiskError;
use crate::manager::{RawPartitionProxy, resolve_block_object, system_connection};

/// MBR partition type for FAT32 with LBA addressing.
pub const FAT32_LBA_TYPE: &str = "0x0c";

/// Bootable ("active") flag of a dos partition entry.
pub const DOS_BOOTABLE_FLAG: u64 = 0x80;

/// The partition starts at 1 MiB, leaving room for the MBR and alignment.
pub const PARTITION_OFFSET_BYTES: u64 = 1024 * 1024;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct BootPartitionRequest {
    /// Whole-disk device, e.g. "/dev/sdb".
    pub device: String,
    /// FAT volume label.
    pub label: String,
    /// How long to wait for the kernel to publish the partition node.
    pub settle_timeout: Duration,
}

/// Device path of partition `number` on `device`.
///
/// Disks whose name ends in a digit (nvme, mmcblk, loop) separate the
/// partition number with a `p`.
pub fn partition_device_path(device: &str, number: u32) -> String {
    if device.ends_with(|c: char| c.is_ascii_digit()) {
        format!("{device}p{number}")
    } else {
        format!("{device}{number}")
    }
}

/// Usable size for a single partition spanning the disk from
/// [`PARTITION_OFFSET_BYTES`], rounded down to whole MiB.
pub fn single_partition_size(disk_size: u64) -> Option<u64> {
    let usable = disk_size.checked_sub(PARTITION_OFFSET_BYTES)?;
    let size = usable - usable % PARTITION_OFFSET_BYTES;
    (size > 0).then_some(size)
}

async fn block_proxy<'a>(
    connection: &'a Connection,
    path: &'a OwnedObjectPath,
) -> Result<BlockProxy<'a>, DiskError> {
    BlockProxy::builder(connection)
        .path(path)
        .map_err(|e| DiskError::DBusError(e.to_string()))?
        .build()
        .await
        .map_err(|e| DiskError::DBusError(e.to_string()))
}

async fn preferred_device(block: &BlockProxy<'_>) -> Option<String> {
    let bytes = block.preferred_device().await.ok()?;
    let device = String::from_utf8(bytes.into_iter().filter(|&b| b != 0).collect()).ok()?;
    (!device.is_empty()).then_some(device)
}

/// Replace the partition table of `request.device` with a single bootable
/// FAT32 partition and return the partition's device path.
///
/// The caller must have confirmed the device is unmounted.
pub async fn prepare_boot_partition(request: &BootPartitionRequest) -> Result<String, DiskError> {
    let connection = system_connection().await?;
    let disk_path = resolve_block_object(&connection, &request.device).await?;
    let disk = block_proxy(&connection, &disk_path).await?;

    let disk_size = disk
        .size()
        .await
        .map_err(|e| DiskError::DBusError(e.to_string()))?;
    let size = single_partition_size(disk_size).ok_or_else(|| {
        DiskError::OperationFailed(format!(
            "{} is too small ({} bytes) for a boot partition",
            request.device, disk_size
        ))
    })?;

    info!("Creating dos partition table on {}", request.device);
    disk.format("dos", HashMap::new())
        .await
        .map_err(|e| DiskError::OperationFailed(format!("Create partition table failed: {}", e)))?;

    let table = PartitionTableProxy::builder(&connection)
        .path(&disk_path)
        .map_err(|e| DiskError::DBusError(e.to_string()))?
        .build()
        .await
        .map_err(|e| DiskError::DBusError(e.to_string()))?;

    let partition_path = table
        .create_partition(PARTITION_OFFSET_BYTES, size, FAT32_LBA_TYPE, "", HashMap::new())
        .await
        .map_err(|e| DiskError::OperationFailed(format!("Create partition failed: {}", e)))?;
    debug!(
        "Created partition {} at offset {}, size {}",
        partition_path.as_str(),
        PARTITION_OFFSET_BYTES,
        size
    );

    let raw_partition = RawPartitionProxy::builder(&connection)
        .path(&partition_path)
        .map_err(|e| DiskError::DBusError(e.to_string()))?
        .build()
        .await
        .map_err(|e| DiskError::DBusError(e.to_string()))?;
    raw_partition
        .set_flags(DOS_BOOTABLE_FLAG, HashMap::new())
        .await
        .map_err(|e| DiskError::OperationFailed(format!("Set bootable flag failed: {}", e)))?;

    let partition = block_proxy(&connection, &partition_path).await?;
    let mut format_opts: HashMap<&str, Value<'_>> = HashMap::new();
    if !request.label.is_empty() {
        format_opts.insert("label", Value::from(request.label.as_str()));
    }
    info!("Formatting new partition as vfat");
    partition
        .format("vfat", format_opts)
        .await
        .map_err(|e| DiskError::OperationFailed(format!("Format failed: {}", e)))?;

    let device_path = match preferred_device(&partition).await {
        Some(path) => path,
        None => partition_device_path(&request.device, 1),
    };

    wait_for_node(&device_path, request.settle_timeout).await?;
    info!("Boot partition ready at {}", device_path);
    Ok(device_path)
}

async fn wait_for_node(device_path: &str, timeout: Duration) -> Result<(), DiskError> {
    let started = tokio::time::Instant::now();
    while !Path::new(device_path).exists() {
        if started.elapsed() >= timeout {
            return Err(DiskError::OperationFailed(format!(
                "partition {} did not appear within {}s",
                device_path,
                timeout.as_secs()
            )));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{PARTITION_OFFSET_BYTES, partition_device_path, single_partition_size, wait_for_node};

    #[test]
    fn partition_names_follow_kernel_conventions() {
        assert_eq!(partition_device_path("/dev/sdb", 1), "/dev/sdb1");
        assert_eq!(partition_device_path("/dev/nvme0n1", 1), "/dev/nvme0n1p1");
        assert_eq!(partition_device_path("/dev/mmcblk0", 2), "/dev/mmcblk0p2");
    }

    #[test]
    fn partition_spans_whole_mebibytes_after_offset() {
        let disk = 8 * 1024 * 1024 * 1024 + 12345;
        let size = single_partition_size(disk).unwrap();
        assert_eq!(size % PARTITION_OFFSET_BYTES, 0);
        assert!(size + PARTITION_OFFSET_BYTES <= disk);
        assert_eq!(size, 8 * 1024 * 1024 * 1024 - PARTITION_OFFSET_BYTES);
    }

    #[test]
    fn tiny_disks_have_no_room() {
        assert_eq!(single_partition_size(PARTITION_OFFSET_BYTES), None);
        assert_eq!(single_partition_size(512), None);
    }

    #[tokio::test]
    async fn waiting_for_an_existing_node_returns_immediately() {
        let dir = std::env::temp_dir();
        wait_for_node(dir.to_str().unwrap(), Duration::ZERO)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn waiting_for_a_missing_node_times_out() {
        let err = wait_for_node("/dev/boot2gui-missing1", Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("did not appear"));
    }
}
