use std::path::Path;

use boot2gui::config::{BuildConfig, ConfigError, LoggingLevel};

fn example_config() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/boot2gui.toml"))
}

#[test]
fn bundled_example_loads() {
    let config = BuildConfig::load(example_config()).unwrap();
    assert_eq!(config.work_dir, Path::new("/var/tmp/boot2gui"));
    assert_eq!(config.log_level, LoggingLevel::Info);
    assert_eq!(config.base_packages, BuildConfig::default().base_packages);
    assert_eq!(config.desktop_packages, BuildConfig::default().desktop_packages);
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "distro = [").unwrap();

    let err = BuildConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn invalid_values_are_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty-packages.toml");
    std::fs::write(&path, "base_packages = []\n").unwrap();

    let err = BuildConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}
