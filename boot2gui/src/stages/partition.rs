// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};
use std::time::Duration;

use boot2gui_sys::{sync_all, zero_leading_bytes};
use boot2gui_udisks::{BootPartitionRequest, prepare_boot_partition};
use tracing::info;

use crate::layout::Layout;
use crate::pipeline::{BuildContext, Stage};
use crate::rt;

/// Bytes cleared at the start of the device before repartitioning.
const WIPE_BYTES: usize = 1024;

/// Gives the target device a fresh dos table with one bootable FAT32
/// partition.
pub struct Partition;

impl Stage for Partition {
    fn name(&self) -> &'static str {
        "partitioning"
    }

    fn output(&self, _layout: &Layout) -> Option<PathBuf> {
        None
    }

    fn run(&self, ctx: &mut BuildContext) -> anyhow::Result<()> {
        zero_leading_bytes(Path::new(&ctx.device), WIPE_BYTES)?;
        sync_all();

        let request = BootPartitionRequest {
            device: ctx.device.clone(),
            label: ctx.config.volume_label.clone(),
            settle_timeout: Duration::from_secs(ctx.config.partition_settle_secs),
        };
        let partition = rt::block_on(prepare_boot_partition(&request))??;
        sync_all();

        info!("Partitioned {}: {}", ctx.device, partition);
        ctx.partition = Some(partition);
        Ok(())
    }
}
