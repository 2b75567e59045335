//! Named storage destinations for archives and checksum sidecars.
//!
//! A disk is a logical name bound to a filesystem root; archives and their
//! sidecars live flat under `<root>/backups/`. Disk names are resolved
//! against the configured registry before any path is built from them, so
//! user-supplied names can never escape into arbitrary paths.

use crate::config::AppConfig;
use crate::error::{BackupError, Result};
use crate::services::checksum;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// Logical name of the always-present local destination.
pub const LOCAL_DISK: &str = "local";
/// Disk name reserved for public asset serving; never a backup target.
pub const PUBLIC_DISK: &str = "public";
/// Directory under a disk root that holds archives and sidecars.
pub const BACKUP_DIR: &str = "backups";
/// Archive file extension.
pub const ARCHIVE_EXT: &str = "zip";

/// Listing projection for one archive on one disk. Computed on demand by
/// enumerating the destination, never cached.
#[derive(Debug, Clone)]
pub struct BackupRecord {
    pub disk: String,
    /// Disk-relative path, e.g. `backups/backup-2025-01-01_02-00-00.zip`.
    pub path: String,
    pub name: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub checksum_exists: bool,
}

#[derive(Debug, Clone)]
pub struct DiskRegistry {
    disks: Vec<(String, PathBuf)>,
}

impl DiskRegistry {
    pub fn from_config(config: &AppConfig) -> Self {
        let mut disks = vec![(LOCAL_DISK.to_string(), config.local_disk_root.clone())];
        for (name, root) in &config.remote_disks {
            if name != LOCAL_DISK && name != PUBLIC_DISK {
                disks.push((name.clone(), root.clone()));
            }
        }
        Self { disks }
    }

    /// Allow-list gate: maps a disk name to its root, rejecting anything
    /// that was not explicitly configured.
    pub fn resolve(&self, disk: &str) -> Result<&Path> {
        self.disks
            .iter()
            .find(|(name, _)| name == disk)
            .map(|(_, root)| root.as_path())
            .ok_or_else(|| BackupError::UnknownDisk(disk.to_string()))
    }

    /// Write the archive (and sidecar, when given) under `relative_path` on
    /// `disk`. A failed sidecar write is reported as an error but does not
    /// roll back the already-written archive; the archive stays listable.
    pub fn store(
        &self,
        disk: &str,
        relative_path: &str,
        archive_path: &Path,
        sidecar: Option<&str>,
    ) -> Result<()> {
        let root = self.resolve(disk)?;
        let target = root.join(relative_path);

        let write_err = |source: std::io::Error| BackupError::StorageWrite {
            disk: disk.to_string(),
            source,
        };

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::copy(archive_path, &target).map_err(write_err)?;
        tracing::info!(disk, path = %target.display(), "Stored backup archive");

        if let Some(contents) = sidecar {
            let sidecar_path = checksum::sidecar_path_for(&target);
            fs::write(&sidecar_path, contents).map_err(write_err)?;
        }

        Ok(())
    }

    /// Enumerate archives on `disk`, newest first. A missing backups
    /// directory yields an empty list.
    pub fn list(&self, disk: &str) -> Result<Vec<BackupRecord>> {
        let root = self.resolve(disk)?;
        let dir = root.join(BACKUP_DIR);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(ARCHIVE_EXT)
            {
                continue;
            }

            let meta = entry.metadata()?;
            let last_modified: DateTime<Utc> = meta.modified()?.into();
            let name = entry.file_name().to_string_lossy().into_owned();

            records.push(BackupRecord {
                disk: disk.to_string(),
                path: format!("{BACKUP_DIR}/{name}"),
                size: meta.len(),
                last_modified,
                checksum_exists: checksum::sidecar_path_for(&path).exists(),
                name,
            });
        }

        records.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(records)
    }

    pub fn delete(&self, disk: &str, relative_path: &str) -> Result<()> {
        let root = self.resolve(disk)?;
        fs::remove_file(root.join(relative_path))?;
        Ok(())
    }

    /// Disks eligible as remote replication targets: everything configured
    /// except `local` and the reserved `public` disk.
    pub fn available_remote_disks(&self) -> Vec<String> {
        self.disks
            .iter()
            .map(|(name, _)| name.clone())
            .filter(|name| name != LOCAL_DISK && name != PUBLIC_DISK)
            .collect()
    }
}

/// Strict filename gate applied before any user-supplied archive name is
/// joined onto a disk path.
pub fn is_valid_backup_file_name(name: &str) -> bool {
    name.len() > ".zip".len()
        && name.ends_with(".zip")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry(tmp: &TempDir) -> DiskRegistry {
        let config = AppConfig {
            database_driver: "sqlite".into(),
            database_path: tmp.path().join("database.sqlite"),
            media_dir: tmp.path().join("media"),
            data_dir: tmp.path().to_path_buf(),
            local_disk_root: tmp.path().join("private"),
            remote_disks: vec![("google".into(), tmp.path().join("remote"))],
            log_level: "info".into(),
        };
        DiskRegistry::from_config(&config)
    }

    #[test]
    fn unknown_disks_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let registry = registry(&tmp);
        let result = registry.resolve("../../etc");
        assert!(matches!(result, Err(BackupError::UnknownDisk(_))));
    }

    #[test]
    fn store_writes_archive_and_sidecar() -> Result<()> {
        let tmp = TempDir::new().unwrap();
        let registry = registry(&tmp);

        let archive = tmp.path().join("backup-a.zip");
        fs::write(&archive, b"zip bytes")?;

        registry.store("google", "backups/backup-a.zip", &archive, Some("abc  backup-a.zip\n"))?;

        let stored = tmp.path().join("remote/backups/backup-a.zip");
        assert_eq!(fs::read(&stored)?, b"zip bytes");
        assert_eq!(
            fs::read_to_string(checksum::sidecar_path_for(&stored))?,
            "abc  backup-a.zip\n"
        );
        Ok(())
    }

    #[test]
    fn list_is_empty_for_a_missing_backup_directory() -> Result<()> {
        let tmp = TempDir::new().unwrap();
        let registry = registry(&tmp);
        assert!(registry.list(LOCAL_DISK)?.is_empty());
        Ok(())
    }

    #[test]
    fn list_filters_and_sorts_newest_first() -> Result<()> {
        let tmp = TempDir::new().unwrap();
        let registry = registry(&tmp);
        let dir = tmp.path().join("private/backups");
        fs::create_dir_all(&dir)?;

        fs::write(dir.join("backup-old.zip"), b"old")?;
        std::thread::sleep(std::time::Duration::from_millis(20));
        fs::write(dir.join("backup-new.zip"), b"new")?;
        fs::write(dir.join("backup-new.zip.sha256"), b"digest  backup-new.zip\n")?;
        fs::write(dir.join("notes.txt"), b"ignored")?;

        let records = registry.list(LOCAL_DISK)?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "backup-new.zip");
        assert!(records[0].checksum_exists);
        assert!(!records[1].checksum_exists);
        assert_eq!(records[1].path, "backups/backup-old.zip");
        Ok(())
    }

    #[test]
    fn remote_disks_exclude_local_and_public() {
        let tmp = TempDir::new().unwrap();
        let config = AppConfig {
            database_driver: "sqlite".into(),
            database_path: tmp.path().join("database.sqlite"),
            media_dir: tmp.path().join("media"),
            data_dir: tmp.path().to_path_buf(),
            local_disk_root: tmp.path().join("private"),
            remote_disks: vec![
                ("public".into(), tmp.path().join("public")),
                ("google".into(), tmp.path().join("remote")),
            ],
            log_level: "info".into(),
        };
        let registry = DiskRegistry::from_config(&config);
        assert_eq!(registry.available_remote_disks(), vec!["google".to_string()]);
        assert!(registry.resolve("public").is_err());
    }

    #[test]
    fn filename_gate_rejects_traversal_and_odd_names() {
        assert!(is_valid_backup_file_name("backup-2025-01-01_02-00-00.zip"));
        assert!(!is_valid_backup_file_name("../../etc/passwd"));
        assert!(!is_valid_backup_file_name("backup/evil.zip"));
        assert!(!is_valid_backup_file_name("backup.tar.gz"));
        assert!(!is_valid_backup_file_name(".zip"));
    }
}
