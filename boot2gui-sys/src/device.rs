// SPDX-License-Identifier: GPL-3.0-only

//! Raw block device access
//!
//! These functions write bytes straight to the target device, bypassing any
//! filesystem. Callers must have verified the device is not mounted.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{Result, SysError};

/// Size of the boot code area of a master boot record. The partition table
/// follows it and must not be overwritten.
pub const MBR_BOOT_CODE_LEN: usize = 440;

fn map_open_error(device: &Path, e: std::io::Error, access: &str) -> SysError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => SysError::PermissionDenied(format!(
            "Cannot open {} for {}",
            device.display(),
            access
        )),
        std::io::ErrorKind::NotFound => SysError::DeviceNotFound(device.display().to_string()),
        _ => SysError::Io(e),
    }
}

/// Verify that `device` can be opened for reading.
pub fn check_readable(device: &Path) -> Result<()> {
    File::open(device)
        .map(drop)
        .map_err(|e| map_open_error(device, e, "reading"))
}

fn open_for_write(device: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .open(device)
        .map_err(|e| map_open_error(device, e, "writing"))
}

/// Overwrite the first `len` bytes of `device` with zeros.
///
/// Clears any previous boot code and partition table so the partitioning
/// step starts from a blank disk.
pub fn zero_leading_bytes(device: &Path, len: usize) -> Result<()> {
    debug!("Zeroing first {} bytes of {}", len, device.display());
    let mut dest = open_for_write(device)?;
    dest.write_all(&vec![0u8; len])?;
    dest.sync_all()?;
    Ok(())
}

/// Copy the boot code of a syslinux `mbr.bin` onto `device`.
///
/// At most [`MBR_BOOT_CODE_LEN`] bytes are written at offset 0; the rest of
/// the device, including the partition table, is left untouched.
pub fn write_boot_code(mbr_image: &Path, device: &Path) -> Result<usize> {
    let mut code = Vec::with_capacity(MBR_BOOT_CODE_LEN);
    File::open(mbr_image)?
        .take(MBR_BOOT_CODE_LEN as u64)
        .read_to_end(&mut code)?;

    if code.is_empty() {
        return Err(SysError::OperationFailed(format!(
            "boot code image {} is empty",
            mbr_image.display()
        )));
    }

    debug!(
        "Writing {} bytes of boot code from {} to {}",
        code.len(),
        mbr_image.display(),
        device.display()
    );

    let mut dest = open_for_write(device)?;
    dest.seek(SeekFrom::Start(0))?;
    dest.write_all(&code)?;
    dest.sync_all()?;
    Ok(code.len())
}

/// Flush all filesystem buffers to disk.
pub fn sync_all() {
    nix::unistd::sync();
}
