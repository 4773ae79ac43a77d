// SPDX-License-Identifier: GPL-3.0-only

//! Checks run before anything touches the target device
//!
//! Each failure carries the message printed to the user before the program
//! terminates.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use boot2gui_sys::{MountEntry, check_readable, missing_tools, mounted_partitions_of};
use thiserror::Error;
use tracing::{debug, info};

use crate::rt;

pub const DEVICE_PREFIX: &str = "/dev/";

/// Host tools the build shells out to.
pub const REQUIRED_TOOLS: &[&str] = &[
    "debootstrap",
    "chroot",
    "tar",
    "mksquashfs",
    "syslinux",
    "mount",
    "umount",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreflightError {
    #[error("Invalid usb stick device: {0}")]
    InvalidDevice(String),
    #[error("Could not read the mount table: {0}")]
    MountTable(String),
    #[error("Partition {partition} on device {device} is mounted.")]
    Mounted { partition: String, device: String },
    #[error("Could not open device {0} for reading.")]
    Unreadable(String),
    #[error("{0} not installed.")]
    MissingTool(String),
    #[error("This program must be run with root privileges.")]
    NotRoot,
    #[error("UDisks2 cannot manage {device}: {reason}")]
    UDisks { device: String, reason: String },
}

pub fn validate_device_path(device: &str) -> Result<(), PreflightError> {
    match device.strip_prefix(DEVICE_PREFIX) {
        Some(name) if !name.is_empty() && !name.ends_with('/') => Ok(()),
        _ => Err(PreflightError::InvalidDevice(device.to_string())),
    }
}

pub fn check_not_mounted(device: &str, mounts: &[MountEntry]) -> Result<(), PreflightError> {
    match mounted_partitions_of(device, mounts).into_iter().next() {
        Some(partition) => Err(PreflightError::Mounted {
            partition,
            device: device.to_string(),
        }),
        None => Ok(()),
    }
}

pub fn check_readable_device(device: &str) -> Result<(), PreflightError> {
    check_readable(Path::new(device)).map_err(|_| PreflightError::Unreadable(device.to_string()))
}

/// `search_path` overrides `$PATH`.
pub fn check_tools(search_path: Option<&OsStr>) -> Result<(), PreflightError> {
    match missing_tools(REQUIRED_TOOLS, search_path).first() {
        Some(tool) => Err(PreflightError::MissingTool(tool.to_string())),
        None => Ok(()),
    }
}

pub fn check_root(euid: u32) -> Result<(), PreflightError> {
    if euid == 0 {
        Ok(())
    } else {
        Err(PreflightError::NotRoot)
    }
}

fn check_udisks(device: &str) -> Result<(), PreflightError> {
    let udisks_error = |reason: String| PreflightError::UDisks {
        device: device.to_string(),
        reason,
    };

    rt::block_on(async {
        let connection = boot2gui_udisks::system_connection().await?;
        boot2gui_udisks::resolve_block_object(&connection, device).await
    })
    .map_err(|e| udisks_error(e.to_string()))?
    .map(drop)
    .map_err(|e| udisks_error(e.to_string()))
}

/// Kernel name of `device`, following symlinks such as
/// `/dev/disk/by-id/...`. The mount table only ever lists kernel names.
pub fn canonical_device(device: &str) -> Result<String, PreflightError> {
    let resolved = fs::canonicalize(device)
        .map_err(|_| PreflightError::Unreadable(device.to_string()))?;
    let resolved = resolved
        .to_str()
        .ok_or_else(|| PreflightError::InvalidDevice(device.to_string()))?
        .to_string();
    if resolved != device {
        debug!("{} resolves to {}", device, resolved);
    }
    Ok(resolved)
}

/// Run every check against the live system, in order, stopping at the first
/// failure. Returns the kernel name of the device, which every later step
/// must use.
pub fn run_all(device: &str) -> Result<String, PreflightError> {
    validate_device_path(device)?;
    let device = canonical_device(device)?;
    validate_device_path(&device)?;

    let mounts = boot2gui_sys::read_mount_table()
        .map_err(|e| PreflightError::MountTable(e.to_string()))?;
    check_not_mounted(&device, &mounts)?;

    check_readable_device(&device)?;
    check_tools(None)?;
    check_root(nix::unistd::geteuid().as_raw())?;
    check_udisks(&device)?;

    debug!("All preflight checks passed for {}", device);
    info!("Target device {} is ready", device);
    Ok(device)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use boot2gui_sys::MountEntry;

    use super::{
        PreflightError, REQUIRED_TOOLS, canonical_device, check_not_mounted, check_root,
        check_tools, validate_device_path,
    };

    fn entry(source: &str, mount_point: &str) -> MountEntry {
        MountEntry {
            source: source.to_string(),
            mount_point: PathBuf::from(mount_point),
            fs_type: "vfat".to_string(),
        }
    }

    #[test]
    fn device_must_live_under_dev() {
        validate_device_path("/dev/sdd").unwrap();
        validate_device_path("/dev/disk/by-id/usb-Stick").unwrap();
        for bad in ["sdd", "/tmp/sdd", "/dev/", "/devsdd", "", "/dev/sdd/"] {
            assert_eq!(
                validate_device_path(bad),
                Err(PreflightError::InvalidDevice(bad.to_string()))
            );
        }
    }

    #[test]
    fn mounted_partition_is_named() {
        let mounts = vec![entry("/dev/sda2", "/"), entry("/dev/sdd1", "/media/stick")];
        let err = check_not_mounted("/dev/sdd", &mounts).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Partition /dev/sdd1 on device /dev/sdd is mounted."
        );
        check_not_mounted("/dev/sde", &mounts).unwrap();
    }

    #[test]
    fn only_root_passes() {
        check_root(0).unwrap();
        assert_eq!(check_root(1000), Err(PreflightError::NotRoot));
        assert_eq!(
            PreflightError::NotRoot.to_string(),
            "This program must be run with root privileges."
        );
    }

    #[test]
    fn first_missing_tool_is_reported() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let bin = tempfile::tempdir().unwrap();
        for tool in REQUIRED_TOOLS.iter().filter(|tool| **tool != "syslinux") {
            let path = bin.path().join(tool);
            fs::write(&path, "#!/bin/sh\n").unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }

        let err = check_tools(Some(bin.path().as_os_str())).unwrap_err();
        assert_eq!(err.to_string(), "syslinux not installed.");

        let syslinux = bin.path().join("syslinux");
        fs::write(&syslinux, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&syslinux, fs::Permissions::from_mode(0o755)).unwrap();
        check_tools(Some(bin.path().as_os_str())).unwrap();
    }

    #[test]
    fn symlinked_device_is_checked_under_its_kernel_name() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("usb-Stick");
        std::os::unix::fs::symlink("/dev/null", &link).unwrap();

        let device = canonical_device(link.to_str().unwrap()).unwrap();
        assert_eq!(device, "/dev/null");

        let mounts = vec![entry("/dev/null", "/media/stick")];
        assert_eq!(
            check_not_mounted(&device, &mounts),
            Err(PreflightError::Mounted {
                partition: "/dev/null".to_string(),
                device: "/dev/null".to_string(),
            })
        );
    }

    #[test]
    fn missing_device_cannot_be_resolved() {
        assert_eq!(
            canonical_device("/dev/boot2gui-missing"),
            Err(PreflightError::Unreadable("/dev/boot2gui-missing".to_string()))
        );
    }
}
