// SPDX-License-Identifier: GPL-3.0-only

//! UDisks2 partitioning for the target USB device
//!
//! The build pipeline never writes a partition table by hand. UDisks2 (and
//! libblockdev behind it) creates the table, the partition and the FAT32
//! filesystem; this crate sequences those D-Bus calls.

pub mod error;
pub mod manager;
pub mod partition;

pub use error::DiskError;
pub use manager::{resolve_block_object, system_connection};
pub use partition::{
    BootPartitionRequest, DOS_BOOTABLE_FLAG, FAT32_LBA_TYPE, PARTITION_OFFSET_BYTES,
    partition_device_path, prepare_boot_partition, single_partition_size,
};
