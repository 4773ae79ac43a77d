// SPDX-License-Identifier: GPL-3.0-only

//! Low-level host operations for building a live USB stick
//!
//! This crate provides the pieces the build pipeline shells out to or touches
//! directly on the host, such as:
//! - Running external tools, optionally inside a chroot
//! - Packing and unpacking stage archives
//! - Raw writes to the target block device
//! - Mount table inspection and scoped mounts
//! - Tool lookup on the search path
//!
//! Most operations require elevated privileges.

pub mod archive;
pub mod cmd;
pub mod device;
pub mod error;
pub mod mount;
pub mod mounts;
pub mod tools;

pub use archive::{pack_directory, unpack_archive};
pub use cmd::{Cmd, render};
pub use device::{check_readable, sync_all, write_boot_code, zero_leading_bytes};
pub use error::{Result, SysError};
pub use mount::MountGuard;
pub use mounts::{MountEntry, mounted_partitions_of, parse_mountinfo, read_mount_table};
pub use tools::missing_tools;
