// SPDX-License-Identifier: GPL-3.0-only

//! Stage archives
//!
//! Each pipeline stage persists its root filesystem as a gzip'd tarball. `tar`
//! is used instead of an in-process archiver so device nodes, ownership and
//! permissions of the chroot survive the round trip unchanged.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::cmd::{Cmd, dir_arg};
use crate::error::{Result, SysError};

/// Temporary name an archive is written under until it is complete.
pub fn partial_path(archive: &Path) -> PathBuf {
    let mut name = archive
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".partial");
    archive.with_file_name(name)
}

/// Archive `parent/dir_name` into `archive`.
///
/// The tarball is written next to its destination and renamed into place once
/// `tar` succeeds, so `archive` only ever exists in complete form.
pub fn pack_directory(parent: &Path, dir_name: &str, archive: &Path) -> Result<()> {
    if !parent.join(dir_name).is_dir() {
        return Err(SysError::OperationFailed(format!(
            "cannot archive missing directory {}",
            parent.join(dir_name).display()
        )));
    }

    let partial = partial_path(archive);
    if partial.exists() {
        fs::remove_file(&partial)?;
    }

    info!("Archiving {} into {}", dir_name, archive.display());
    Cmd::new("tar")
        .arg("--numeric-owner")
        .arg("-C")
        .arg(dir_arg(parent))
        .arg("-czf")
        .arg(&partial)
        .arg(dir_name)
        .run()?;

    fs::rename(&partial, archive)?;
    Ok(())
}

/// Unpack `archive` into `dest`.
pub fn unpack_archive(archive: &Path, dest: &Path) -> Result<()> {
    if !archive.is_file() {
        return Err(SysError::OperationFailed(format!(
            "archive {} does not exist",
            archive.display()
        )));
    }

    info!("Unpacking {}", archive.display());
    Cmd::new("tar")
        .arg("--numeric-owner")
        .arg("-C")
        .arg(dir_arg(dest))
        .arg("-xzf")
        .arg(archive)
        .run()
}
