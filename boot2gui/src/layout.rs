// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};

/// Paths of every intermediate artifact, relative to the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    /// Directory name of the chroot inside the working directory and inside
    /// every stage archive.
    pub const CHROOT_DIR: &'static str = "rootdir";

    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: work_dir.into(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.root
    }

    pub fn chroot_dir(&self) -> PathBuf {
        self.root.join(Self::CHROOT_DIR)
    }

    pub fn base_archive(&self) -> PathBuf {
        self.root.join("baseroot.tar.gz")
    }

    pub fn installed_archive(&self) -> PathBuf {
        self.root.join("installed.tar.gz")
    }

    pub fn booting_archive(&self) -> PathBuf {
        self.root.join("booting.tar.gz")
    }

    pub fn image_dir(&self) -> PathBuf {
        self.root.join("image")
    }

    pub fn live_dir(&self) -> PathBuf {
        self.image_dir().join("live")
    }

    pub fn isolinux_dir(&self) -> PathBuf {
        self.image_dir().join("isolinux")
    }

    pub fn isolinux_cfg(&self) -> PathBuf {
        self.isolinux_dir().join("isolinux.cfg")
    }

    pub fn squashfs(&self) -> PathBuf {
        self.live_dir().join("filesystem.squashfs")
    }

    pub fn usb_mount_dir(&self) -> PathBuf {
        self.root.join("usbmount")
    }

    /// Stage archives in pipeline order.
    pub fn archives(&self) -> [PathBuf; 3] {
        [
            self.base_archive(),
            self.installed_archive(),
            self.booting_archive(),
        ]
    }
}
