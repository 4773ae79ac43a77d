// SPDX-License-Identifier: GPL-3.0-only

//! Scoped mounts
//!
//! A [`MountGuard`] unmounts its target when dropped, whether the work done
//! while mounted succeeded or not.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::cmd::Cmd;
use crate::error::Result;

#[derive(Debug)]
pub struct MountGuard {
    target: PathBuf,
    remove_target: bool,
}

impl MountGuard {
    /// Mount `device` on `target`, creating the directory. The directory is
    /// removed again on drop.
    pub fn device(device: &Path, target: &Path) -> Result<Self> {
        fs::create_dir_all(target)?;
        Cmd::new("mount")
            .arg(device)
            .arg(target)
            .run()
            .inspect_err(|_| {
                let _ = fs::remove_dir(target);
            })?;
        debug!("Mounted {} on {}", device.display(), target.display());
        Ok(Self {
            target: target.to_path_buf(),
            remove_target: true,
        })
    }

    /// Bind mount `source` onto the existing directory `target`.
    pub fn bind(source: &Path, target: &Path) -> Result<Self> {
        fs::create_dir_all(target)?;
        Cmd::new("mount").arg("--bind").arg(source).arg(target).run()?;
        debug!("Bound {} on {}", source.display(), target.display());
        Ok(Self {
            target: target.to_path_buf(),
            remove_target: false,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }
}

impl Drop for MountGuard {
    fn drop(&mut self) {
        // Never delete the directory while it may still hold the mounted filesystem.
        if let Err(e) = Cmd::new("umount").arg(&self.target).run() {
            warn!("Failed to unmount {}: {}", self.target.display(), e);
            return;
        }
        if self.remove_target
            && let Err(e) = fs::remove_dir(&self.target)
        {
            warn!("Failed to remove {}: {}", self.target.display(), e);
        }
    }
}
