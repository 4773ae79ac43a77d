// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::PathBuf;

use boot2gui_sys::{Cmd, pack_directory};

use super::remove_chroot;
use crate::layout::Layout;
use crate::pipeline::{BuildContext, Stage};

/// Bootstraps a minimal Debian root filesystem.
pub struct BaseImage;

impl Stage for BaseImage {
    fn name(&self) -> &'static str {
        "base image"
    }

    fn output(&self, layout: &Layout) -> Option<PathBuf> {
        Some(layout.base_archive())
    }

    fn run(&self, ctx: &mut BuildContext) -> anyhow::Result<()> {
        let layout = &ctx.layout;
        let chroot = layout.chroot_dir();
        remove_chroot(layout)?;
        fs::create_dir_all(&chroot)?;

        Cmd::new("debootstrap")
            .arg(&ctx.config.distro)
            .arg(&chroot)
            .arg(&ctx.config.mirror)
            .run()?;

        pack_directory(layout.work_dir(), Layout::CHROOT_DIR, &layout.base_archive())?;
        Ok(())
    }
}
