// SPDX-License-Identifier: GPL-3.0-only

//! Bootloader menu configuration

/// Menu shown by syslinux: the live system (default), the hardware
/// detection tool and memtest86+.
pub fn render_config(kernel_version: &str) -> String {
    let label = if kernel_version.is_empty() {
        "Debian Live".to_string()
    } else {
        format!("Debian Live {kernel_version}")
    };

    format!(
        "UI menu.c32

prompt 0
menu title Debian Live

timeout 300

label {label}
menu label ^{label}
menu default
kernel /live/vmlinuz1
append initrd=/live/initrd1 boot=live

label hdt
menu label ^Hardware Detection Tool (HDT)
kernel hdt.c32
text help
HDT displays low-level information about the systems hardware.
endtext

label memtest86+
menu label ^Memory Failure Detection (memtest86+)
kernel /live/memtest
"
    )
}

/// Version suffix of a kernel image name, e.g. `vmlinuz-6.1.0-18-amd64`.
pub fn kernel_version(file_name: &str) -> &str {
    file_name
        .strip_prefix("vmlinuz")
        .map(|rest| rest.trim_start_matches('-'))
        .unwrap_or("")
}
