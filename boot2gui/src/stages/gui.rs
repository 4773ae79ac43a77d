// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use anyhow::Context;
use boot2gui_sys::pack_directory;
use tracing::debug;

use super::{restore_chroot, write_chroot_file};
use crate::layout::Layout;
use crate::payload::{
    BASH_PROFILE_PATH, GETTY_UNIT_PATH, LAUNCHER_PATH, XINITRC_PATH, bash_profile,
    enable_autologin, launcher_script, xinitrc,
};
use crate::pipeline::{BuildContext, Stage};

/// Makes the live system log root in on tty1 and start the GUI payload.
pub struct GuiBoot;

impl Stage for GuiBoot {
    fn name(&self) -> &'static str {
        "gui boot config"
    }

    fn output(&self, layout: &Layout) -> Option<PathBuf> {
        Some(layout.booting_archive())
    }

    fn run(&self, ctx: &mut BuildContext) -> anyhow::Result<()> {
        let layout = &ctx.layout;
        restore_chroot(layout, &layout.installed_archive())?;
        let root = layout.chroot_dir();

        write_chroot_file(&root, LAUNCHER_PATH, launcher_script())?;
        fs::set_permissions(root.join(LAUNCHER_PATH), fs::Permissions::from_mode(0o755))?;
        write_chroot_file(&root, XINITRC_PATH, &xinitrc())?;
        write_chroot_file(&root, BASH_PROFILE_PATH, bash_profile())?;

        let unit_path = root.join(GETTY_UNIT_PATH);
        let unit = fs::read_to_string(&unit_path)
            .with_context(|| format!("reading {}", unit_path.display()))?;
        let patched = enable_autologin(&unit, "root")
            .with_context(|| format!("patching {}", unit_path.display()))?;
        fs::write(&unit_path, patched)?;
        debug!("Enabled root autologin in {}", unit_path.display());

        pack_directory(
            layout.work_dir(),
            Layout::CHROOT_DIR,
            &layout.booting_archive(),
        )?;
        Ok(())
    }
}
