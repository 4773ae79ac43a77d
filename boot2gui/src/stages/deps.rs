// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};

use boot2gui_sys::{Cmd, MountGuard, pack_directory};
use tracing::info;

use super::{restore_chroot, write_chroot_file};
use crate::layout::Layout;
use crate::pipeline::{BuildContext, Stage};

/// Host filesystems the package scripts expect inside the chroot.
const VIRTUAL_FILESYSTEMS: &[&str] = &["proc", "sys", "dev"];

/// Installs the kernel, live-boot and X11 into the bootstrapped system.
pub struct InstallDeps;

fn apt_get(root: &Path) -> Cmd {
    Cmd::chroot(root, "apt-get").env("DEBIAN_FRONTEND", "noninteractive")
}

fn apt_install(root: &Path, packages: &[String]) -> anyhow::Result<()> {
    info!("Installing {}", packages.join(" "));
    apt_get(root)
        .args(["install", "--no-install-recommends", "--yes"])
        .args(packages)
        .run()?;
    Ok(())
}

/// Line fed to `chpasswd` to set `password` for root.
pub(crate) fn chpasswd_input(password: &str) -> String {
    format!("root:{password}\n")
}

fn install_packages(ctx: &BuildContext, root: &Path) -> anyhow::Result<()> {
    let _mounts = VIRTUAL_FILESYSTEMS
        .iter()
        .map(|fs| MountGuard::bind(&Path::new("/").join(fs), &root.join(fs)))
        .collect::<Result<Vec<_>, _>>()?;

    apt_get(root).arg("update").run()?;
    apt_install(root, &ctx.config.base_packages)?;

    let gui_packages = ctx.config.gui_packages();
    if !gui_packages.is_empty() {
        apt_install(root, &gui_packages)?;
    }

    apt_get(root).arg("clean").run()?;
    Ok(())
}

impl Stage for InstallDeps {
    fn name(&self) -> &'static str {
        "dependency install"
    }

    fn output(&self, layout: &Layout) -> Option<PathBuf> {
        Some(layout.installed_archive())
    }

    fn run(&self, ctx: &mut BuildContext) -> anyhow::Result<()> {
        let layout = &ctx.layout;
        restore_chroot(layout, &layout.base_archive())?;
        let root = layout.chroot_dir();

        write_chroot_file(&root, "etc/hostname", &format!("{}\n", ctx.config.hostname))?;

        install_packages(ctx, &root)?;

        Cmd::chroot(&root, "chpasswd")
            .stdin_bytes(chpasswd_input(&ctx.config.root_password))
            .run()?;

        pack_directory(
            layout.work_dir(),
            Layout::CHROOT_DIR,
            &layout.installed_archive(),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::chpasswd_input;

    #[test]
    fn chpasswd_line_targets_root() {
        assert_eq!(chpasswd_input("s3cret"), "root:s3cret\n");
    }
}
