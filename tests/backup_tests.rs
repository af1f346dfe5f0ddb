//! Integration tests for the on-disk backup ring.

use falcommand_config::config::{
    BACKUP_GENERATIONS, BackupManager, ConfigPaths, ConfigService, PartialConfig, Scope,
};
use falcommand_config::error::BackupError;
use falcommand_config::platform::{BuildMode, PlatformTag};
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::TempDir;

fn file_service(temp: &TempDir) -> ConfigService {
    let paths = ConfigPaths::with_config_dir(temp.path());
    ConfigService::with_paths(&paths, PlatformTag::Linux, BuildMode::Release)
}

fn set_font_size(service: &ConfigService, size: i64) {
    let mut doc = PartialConfig::default();
    doc.appearance_mut().font_size = Some(size);
    service.persist(Scope::User, None, &doc).unwrap();
}

/// Raw contents of every file in the backup directory, by name.
fn ring_bytes(config_dir: &Path) -> BTreeMap<String, Vec<u8>> {
    std::fs::read_dir(config_dir.join("backups"))
        .unwrap()
        .map(|entry| {
            let entry = entry.unwrap();
            let name = entry.file_name().to_string_lossy().to_string();
            (name, std::fs::read(entry.path()).unwrap())
        })
        .collect()
}

#[test]
fn ring_keeps_last_ten_resolves() {
    let temp = TempDir::new().unwrap();
    let service = file_service(&temp);

    for size in 1..=11 {
        set_font_size(&service, size);
        service.resolve().unwrap();
    }

    let entries = service.backups().list().unwrap();
    assert_eq!(entries.len(), BACKUP_GENERATIONS);
    let sequences: Vec<u64> = entries.iter().map(|e| e.sequence).collect();
    assert_eq!(sequences, (1..=10).collect::<Vec<_>>());

    assert!(matches!(
        service.restore(0),
        Err(BackupError::NotFound { sequence: 0 })
    ));
    assert_eq!(service.restore(1).unwrap().appearance.font_size, 2);
    assert_eq!(service.restore(10).unwrap().appearance.font_size, 11);

    let files = std::fs::read_dir(temp.path().join("backups")).unwrap().count();
    assert_eq!(files, BACKUP_GENERATIONS);
}

#[test]
fn failed_resolve_leaves_ring_untouched() {
    let temp = TempDir::new().unwrap();
    let service = file_service(&temp);
    service.resolve().unwrap();
    service.resolve().unwrap();
    let before = service.backups().list().unwrap();
    let raw_before = ring_bytes(temp.path());

    std::fs::write(temp.path().join("config.local.json"), "not json").unwrap();
    assert!(service.resolve().is_err());

    assert_eq!(service.backups().list().unwrap(), before);
    assert_eq!(ring_bytes(temp.path()), raw_before);
}

#[test]
fn sequences_continue_after_reopen() {
    let temp = TempDir::new().unwrap();
    file_service(&temp).resolve().unwrap();
    file_service(&temp).resolve().unwrap();

    let reopened = BackupManager::open(temp.path().join("backups"));
    let latest = reopened.latest().unwrap().unwrap();
    assert_eq!(latest.sequence, 1);
}

#[test]
fn restored_snapshot_can_be_applied() {
    let temp = TempDir::new().unwrap();
    let service = file_service(&temp);

    set_font_size(&service, 20);
    let first = service.resolve().unwrap().backup.unwrap();
    set_font_size(&service, 9);
    service.resolve().unwrap();

    let restored = service.restore(first.sequence).unwrap();
    service
        .persist(Scope::User, None, &PartialConfig::from(restored))
        .unwrap();

    let resolution = service.resolve().unwrap();
    assert_eq!(resolution.config.appearance.font_size, 20);
}
