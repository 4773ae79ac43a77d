// SPDX-License-Identifier: GPL-3.0-only

//! The build stages, in dependency order

mod base;
mod deps;
mod disk;
mod gui;
mod live;
mod partition;

use std::fs;
use std::path::Path;

use anyhow::{Context, bail};
use boot2gui_sys::{MountEntry, read_mount_table, unpack_archive};

pub use base::BaseImage;
pub use deps::InstallDeps;
pub use disk::WriteDisk;
pub use gui::GuiBoot;
pub use live::{LiveImage, find_boot_file};
pub use partition::Partition;

use crate::layout::Layout;
use crate::pipeline::Stage;

pub fn default_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(BaseImage),
        Box::new(InstallDeps),
        Box::new(GuiBoot),
        Box::new(LiveImage),
        Box::new(Partition),
        Box::new(WriteDisk),
    ]
}

pub(crate) fn remove_dir_if_exists(dir: &Path) -> anyhow::Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).with_context(|| format!("removing {}", dir.display()))?;
    }
    Ok(())
}

/// Mount points at or below `dir`.
fn mounts_under<'a>(dir: &Path, mounts: &'a [MountEntry]) -> Vec<&'a Path> {
    mounts
        .iter()
        .map(|entry| entry.mount_point.as_path())
        .filter(|mount_point| mount_point.starts_with(dir))
        .collect()
}

/// Delete the chroot, refusing while anything (e.g. a bind mount left by an
/// interrupted run) is still mounted inside it.
pub(crate) fn remove_chroot(layout: &Layout) -> anyhow::Result<()> {
    let chroot = layout.chroot_dir();
    if !chroot.exists() {
        return Ok(());
    }
    let chroot = chroot
        .canonicalize()
        .with_context(|| format!("resolving {}", chroot.display()))?;
    let mounts = read_mount_table()?;
    if let Some(mount_point) = mounts_under(&chroot, &mounts).first() {
        bail!(
            "{} is still mounted; unmount it before rebuilding",
            mount_point.display()
        );
    }
    remove_dir_if_exists(&chroot)
}

/// Replace the chroot with the contents of `archive`.
pub(crate) fn restore_chroot(layout: &Layout, archive: &Path) -> anyhow::Result<()> {
    let chroot = layout.chroot_dir();
    remove_chroot(layout)?;
    unpack_archive(archive, layout.work_dir())?;
    if !chroot.is_dir() {
        bail!(
            "{} did not contain {}/",
            archive.display(),
            Layout::CHROOT_DIR
        );
    }
    Ok(())
}

/// Write `contents` to `path` inside the chroot, creating parent directories.
pub(crate) fn write_chroot_file(root: &Path, path: &str, contents: &str) -> anyhow::Result<()> {
    let target = root.join(path);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, contents).with_context(|| format!("writing {}", target.display()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use std::path::{Path, PathBuf};

    use boot2gui_sys::{MountEntry, parse_mountinfo};

    use super::{default_stages, mounts_under, remove_chroot, write_chroot_file};
    use crate::layout::Layout;

    #[test]
    fn stages_run_in_dependency_order() {
        let names: Vec<_> = default_stages().iter().map(|stage| stage.name()).collect();
        assert_eq!(
            names,
            vec![
                "base image",
                "dependency install",
                "gui boot config",
                "live image",
                "partitioning",
                "disk write"
            ]
        );
    }

    #[test]
    fn archive_stages_declare_their_archive() {
        let layout = Layout::new("/work");
        let outputs: Vec<_> = default_stages()
            .iter()
            .map(|stage| stage.output(&layout))
            .collect();
        assert_eq!(outputs[0], Some(layout.base_archive()));
        assert_eq!(outputs[1], Some(layout.installed_archive()));
        assert_eq!(outputs[2], Some(layout.booting_archive()));
        assert_eq!(outputs[3], Some(layout.isolinux_cfg()));
        assert_eq!(outputs[4], None);
        assert_eq!(outputs[5], None);
    }

    #[test]
    fn chroot_files_get_parent_directories() {
        let root = tempfile::tempdir().unwrap();
        write_chroot_file(root.path(), "root/.xinitrc", "exec true\n").unwrap();
        assert_eq!(
            fs::read_to_string(root.path().join("root/.xinitrc")).unwrap(),
            "exec true\n"
        );
    }

    #[test]
    fn finds_mounts_inside_the_chroot() {
        let entry = |mount_point: &str| MountEntry {
            source: "proc".to_string(),
            mount_point: PathBuf::from(mount_point),
            fs_type: "proc".to_string(),
        };
        let mounts = vec![
            entry("/"),
            entry("/work/rootdir/proc"),
            entry("/work/rootdir-old"),
        ];
        assert_eq!(
            mounts_under(Path::new("/work/rootdir"), &mounts),
            vec![Path::new("/work/rootdir/proc")]
        );
    }

    #[test]
    fn stale_mount_under_non_ascii_work_dir_is_found() {
        let mounts =
            parse_mountinfo("40 25 0:5 / /srv/jos\u{e9}/rootdir/proc rw - proc proc rw\n").unwrap();
        assert_eq!(
            mounts_under(Path::new("/srv/jos\u{e9}/rootdir"), &mounts),
            vec![Path::new("/srv/jos\u{e9}/rootdir/proc")]
        );
    }

    #[test]
    fn unmounted_chroot_is_removed() {
        let work = tempfile::tempdir().unwrap();
        let layout = Layout::new(work.path());
        write_chroot_file(&layout.chroot_dir(), "etc/hostname", "boot2gui\n").unwrap();

        remove_chroot(&layout).unwrap();
        assert!(!layout.chroot_dir().exists());
        remove_chroot(&layout).unwrap();
    }
}
