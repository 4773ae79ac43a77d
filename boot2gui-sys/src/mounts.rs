// SPDX-License-Identifier: GPL-3.0-only

//! Mount table inspection

use std::ffi::OsString;
use std::fs;
use std::os::unix::ffi::OsStringExt;
use std::path::PathBuf;

use crate::error::{Result, SysError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub source: String,
    pub mount_point: PathBuf,
    pub fs_type: String,
}

pub fn read_mount_table() -> Result<Vec<MountEntry>> {
    let mount_info = fs::read_to_string("/proc/self/mountinfo")?;
    parse_mountinfo(&mount_info)
}

pub fn parse_mountinfo(input: &str) -> Result<Vec<MountEntry>> {
    let mut entries = Vec::new();

    for line in input.lines().filter(|line| !line.trim().is_empty()) {
        let (left, right) = line
            .split_once(" - ")
            .ok_or_else(|| SysError::InvalidMountInfoLine(line.to_string()))?;

        let mount_point = left
            .split_whitespace()
            .nth(4)
            .ok_or_else(|| SysError::InvalidMountInfoLine(line.to_string()))?;

        let mut right_fields = right.split_whitespace();
        let fs_type = right_fields
            .next()
            .ok_or_else(|| SysError::InvalidMountInfoLine(line.to_string()))?;
        let source = right_fields
            .next()
            .ok_or_else(|| SysError::InvalidMountInfoLine(line.to_string()))?;

        entries.push(MountEntry {
            source: String::from_utf8_lossy(&unescape_mount_field(source)).into_owned(),
            mount_point: PathBuf::from(OsString::from_vec(unescape_mount_field(mount_point))),
            fs_type: fs_type.to_string(),
        });
    }

    Ok(entries)
}

/// Sources of mounted filesystems that live on `device` (the whole disk or
/// any of its partitions), in mount table order without duplicates.
pub fn mounted_partitions_of(device: &str, entries: &[MountEntry]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for entry in entries {
        if belongs_to_device(device, &entry.source) && !sources.contains(&entry.source) {
            sources.push(entry.source.clone());
        }
    }
    sources
}

fn belongs_to_device(device: &str, source: &str) -> bool {
    let Some(suffix) = source.strip_prefix(device) else {
        return false;
    };
    // "/dev/sda" owns "/dev/sda1" but not "/dev/sdab1".
    let digits = suffix.strip_prefix('p').unwrap_or(suffix);
    suffix.is_empty() || (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Undo the octal escapes mountinfo uses for space, tab, newline and
/// backslash. Every other byte, including non-UTF-8 ones, is passed through.
fn unescape_mount_field(value: &str) -> Vec<u8> {
    let bytes = value.as_bytes();
    let mut output = Vec::with_capacity(bytes.len());
    let mut index = 0;

    while index < bytes.len() {
        if bytes[index] == b'\\'
            && index + 3 < bytes.len()
            && bytes[index + 1..index + 4].iter().all(|b| (b'0'..=b'7').contains(b))
        {
            let octal = &value[index + 1..index + 4];
            if let Ok(num) = u8::from_str_radix(octal, 8) {
                output.push(num);
                index += 4;
                continue;
            }
        }

        output.push(bytes[index]);
        index += 1;
    }

    output
}
