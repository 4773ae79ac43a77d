// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use boot2gui_sys::{Cmd, MountGuard, write_boot_code};
use boot2gui_udisks::partition_device_path;
use tracing::{info, warn};

use crate::layout::Layout;
use crate::pipeline::{BuildContext, Stage};

/// Directory on the stick holding the kernel, initrd and squashfs image.
const LIVE_DIR: &str = "live";

/// Installs syslinux on the boot partition and copies the live system onto it.
pub struct WriteDisk;

fn copy_into(source: &Path, dest_dir: &Path, name: Option<&str>) -> anyhow::Result<()> {
    let file_name = match name {
        Some(name) => name.into(),
        None => source
            .file_name()
            .with_context(|| format!("{} has no file name", source.display()))?
            .to_os_string(),
    };
    fs::copy(source, dest_dir.join(file_name))
        .with_context(|| format!("copying {}", source.display()))?;
    Ok(())
}

/// Regular files in `dir`, optionally restricted to one extension, sorted by
/// name.
pub(crate) fn files_in(dir: &Path, extension: Option<&str>) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            extension.is_none_or(|ext| path.extension().is_some_and(|found| found == ext))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn copy_optional(source: &Path, dest_dir: &Path, name: &str) -> anyhow::Result<()> {
    if source.is_file() {
        copy_into(source, dest_dir, Some(name))
    } else {
        warn!("{} not found, leaving it off the stick", source.display());
        Ok(())
    }
}

/// Everything the stick needs to boot: syslinux modules, the PCI id database
/// for HDT and the menu at the root, the live system and memtest under
/// `live/`, where the menu entries point.
pub(crate) fn copy_boot_files(ctx: &BuildContext, usb_root: &Path) -> anyhow::Result<()> {
    let config = &ctx.config;
    let layout = &ctx.layout;

    let modules = files_in(&config.syslinux_modules_dir, Some("c32"))?;
    if modules.is_empty() {
        warn!(
            "No syslinux modules in {}",
            config.syslinux_modules_dir.display()
        );
    }
    for module in &modules {
        copy_into(module, usb_root, None)?;
    }

    copy_optional(&config.pci_ids, usb_root, "pci.ids")?;
    copy_into(&layout.isolinux_cfg(), usb_root, Some("syslinux.cfg"))?;

    let usb_live = usb_root.join(LIVE_DIR);
    fs::create_dir_all(&usb_live)?;
    copy_optional(&config.memtest, &usb_live, "memtest")?;
    for file in files_in(&layout.live_dir(), None)? {
        info!("Copying {}", file.display());
        copy_into(&file, &usb_live, None)?;
    }
    Ok(())
}

impl Stage for WriteDisk {
    fn name(&self) -> &'static str {
        "disk write"
    }

    fn output(&self, _layout: &Layout) -> Option<PathBuf> {
        None
    }

    fn run(&self, ctx: &mut BuildContext) -> anyhow::Result<()> {
        let partition = ctx
            .partition
            .clone()
            .unwrap_or_else(|| partition_device_path(&ctx.device, 1));

        Cmd::new("syslinux").arg("-i").arg(&partition).run()?;
        write_boot_code(&ctx.config.syslinux_mbr, Path::new(&ctx.device))?;

        let mount = MountGuard::device(Path::new(&partition), &ctx.layout.usb_mount_dir())?;
        copy_boot_files(ctx, mount.target())?;
        drop(mount);

        info!("{} is ready to boot", ctx.device);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{copy_boot_files, files_in};
    use crate::config::BuildConfig;
    use crate::pipeline::BuildContext;

    #[test]
    fn filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("menu.c32"), b"").unwrap();
        fs::write(dir.path().join("hdt.c32"), b"").unwrap();
        fs::write(dir.path().join("README"), b"").unwrap();
        fs::create_dir(dir.path().join("sub.c32")).unwrap();

        let names: Vec<_> = files_in(dir.path(), Some("c32"))
            .unwrap()
            .into_iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["hdt.c32", "menu.c32"]);
    }

    #[test]
    fn stick_receives_modules_menu_and_live_files() {
        let host = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let usb = tempfile::tempdir().unwrap();

        let modules = host.path().join("bios");
        fs::create_dir(&modules).unwrap();
        fs::write(modules.join("menu.c32"), b"menu").unwrap();
        fs::write(host.path().join("memtest86+.bin"), b"memtest").unwrap();

        let config = BuildConfig {
            work_dir: work.path().to_path_buf(),
            syslinux_modules_dir: modules,
            memtest: host.path().join("memtest86+.bin"),
            pci_ids: host.path().join("missing-pci.ids"),
            ..BuildConfig::default()
        };
        let ctx = BuildContext::new(config, "/dev/sdz");

        fs::create_dir_all(ctx.layout.live_dir()).unwrap();
        fs::create_dir_all(ctx.layout.isolinux_dir()).unwrap();
        fs::write(ctx.layout.isolinux_cfg(), "UI menu.c32\n").unwrap();
        for name in ["filesystem.squashfs", "vmlinuz1", "initrd1"] {
            fs::write(ctx.layout.live_dir().join(name), name).unwrap();
        }

        copy_boot_files(&ctx, usb.path()).unwrap();

        for name in [
            "menu.c32",
            "syslinux.cfg",
            "live/memtest",
            "live/filesystem.squashfs",
            "live/vmlinuz1",
            "live/initrd1",
        ] {
            assert!(usb.path().join(name).is_file(), "{name} missing");
        }
        assert!(!usb.path().join("pci.ids").exists());
        assert_eq!(
            fs::read_to_string(usb.path().join("syslinux.cfg")).unwrap(),
            "UI menu.c32\n"
        );
    }
}
