use boot2gui_sys::{mounted_partitions_of, read_mount_table};

#[test]
fn live_mount_table_has_a_root_filesystem() {
    let entries = read_mount_table().unwrap();
    assert!(
        entries
            .iter()
            .any(|entry| entry.mount_point == std::path::Path::new("/"))
    );
}

#[test]
fn nonexistent_device_is_never_mounted() {
    let entries = read_mount_table().unwrap();
    assert!(mounted_partitions_of("/dev/boot2gui-none", &entries).is_empty());
}
