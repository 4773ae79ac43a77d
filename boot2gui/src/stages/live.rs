// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use boot2gui_sys::Cmd;
use tracing::info;

use super::{remove_dir_if_exists, restore_chroot};
use crate::isolinux::{kernel_version, render_config};
use crate::layout::Layout;
use crate::pipeline::{BuildContext, Stage};

/// Compresses the configured system into a squashfs image and stages the
/// kernel, initrd and boot menu next to it.
pub struct LiveImage;

/// The single file in `boot_dir` whose name starts with `prefix`.
pub fn find_boot_file(boot_dir: &Path, prefix: &str) -> anyhow::Result<PathBuf> {
    let mut matches: Vec<PathBuf> = fs::read_dir(boot_dir)
        .with_context(|| format!("reading {}", boot_dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(prefix))
        .map(|entry| entry.path())
        .collect();

    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => bail!("no {}* found in {}", prefix, boot_dir.display()),
        n => bail!(
            "expected exactly one {}* in {}, found {}",
            prefix,
            boot_dir.display(),
            n
        ),
    }
}

impl Stage for LiveImage {
    fn name(&self) -> &'static str {
        "live image"
    }

    fn output(&self, layout: &Layout) -> Option<PathBuf> {
        Some(layout.isolinux_cfg())
    }

    fn run(&self, ctx: &mut BuildContext) -> anyhow::Result<()> {
        let layout = &ctx.layout;
        // mksquashfs appends to an existing image, so never reuse one.
        remove_dir_if_exists(&layout.image_dir())?;
        restore_chroot(layout, &layout.booting_archive())?;
        let root = layout.chroot_dir();

        fs::create_dir_all(layout.live_dir())?;
        fs::create_dir_all(layout.isolinux_dir())?;

        info!("Compressing root filesystem");
        Cmd::new("mksquashfs")
            .arg(&root)
            .arg(layout.squashfs())
            .args(["-e", "boot"])
            .run()?;

        let boot_dir = root.join("boot");
        let kernel = find_boot_file(&boot_dir, "vmlinuz")?;
        let initrd = find_boot_file(&boot_dir, "initrd")?;
        fs::copy(&kernel, layout.live_dir().join("vmlinuz1"))
            .with_context(|| format!("copying {}", kernel.display()))?;
        fs::copy(&initrd, layout.live_dir().join("initrd1"))
            .with_context(|| format!("copying {}", initrd.display()))?;

        let kernel_name = kernel
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let config = render_config(kernel_version(&kernel_name));

        let cfg_path = layout.isolinux_cfg();
        let partial = cfg_path.with_extension("cfg.partial");
        fs::write(&partial, config)?;
        fs::rename(&partial, &cfg_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::find_boot_file;

    #[test]
    fn finds_the_single_kernel() {
        let boot = tempfile::tempdir().unwrap();
        fs::write(boot.path().join("vmlinuz-6.1.0-18-amd64"), b"kernel").unwrap();
        fs::write(boot.path().join("initrd.img-6.1.0-18-amd64"), b"initrd").unwrap();
        fs::write(boot.path().join("config-6.1.0-18-amd64"), b"cfg").unwrap();

        let kernel = find_boot_file(boot.path(), "vmlinuz").unwrap();
        assert!(kernel.ends_with("vmlinuz-6.1.0-18-amd64"));
        let initrd = find_boot_file(boot.path(), "initrd").unwrap();
        assert!(initrd.ends_with("initrd.img-6.1.0-18-amd64"));
    }

    #[test]
    fn ambiguous_or_missing_kernels_fail() {
        let boot = tempfile::tempdir().unwrap();
        assert!(find_boot_file(boot.path(), "vmlinuz").is_err());

        fs::write(boot.path().join("vmlinuz-6.1.0-17-amd64"), b"old").unwrap();
        fs::write(boot.path().join("vmlinuz-6.1.0-18-amd64"), b"new").unwrap();
        let err = find_boot_file(boot.path(), "vmlinuz").unwrap_err();
        assert!(err.to_string().contains("found 2"));
    }
}
