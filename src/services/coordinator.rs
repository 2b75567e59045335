//! Orchestration of the two public operations, `create_backup` and
//! `restore_backup`.

use crate::config::{AppConfig, BackupConfig};
use crate::error::Result;
use crate::services::lock::OperationLock;
use crate::services::storage::{DiskRegistry, ARCHIVE_EXT, BACKUP_DIR, LOCAL_DISK};
use crate::services::workdir::WorkingArea;
use crate::services::{archive, checksum, restore, retention};
use chrono::{Local, Utc};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

pub struct BackupCoordinator {
    config: AppConfig,
    backup: BackupConfig,
    disks: DiskRegistry,
}

impl BackupCoordinator {
    pub fn new(config: AppConfig, backup: BackupConfig) -> Self {
        let disks = DiskRegistry::from_config(&config);
        Self {
            config,
            backup,
            disks,
        }
    }

    pub fn disks(&self) -> &DiskRegistry {
        &self.disks
    }

    pub fn backup_config(&self) -> &BackupConfig {
        &self.backup
    }

    fn local_backup_dir(&self) -> PathBuf {
        self.config.local_disk_root.join(BACKUP_DIR)
    }

    /// Snapshot the live database and media tree into a checksummed archive,
    /// replicate it to the local disk and, when enabled, the remote disk,
    /// then prune expired archives on every disk written to. Returns the
    /// path of the local copy.
    ///
    /// Any failure aborts the whole operation; the working area is removed
    /// on every exit path and the original error propagates unchanged.
    pub fn create_backup(&self) -> Result<PathBuf> {
        let _lock = OperationLock::acquire(&self.local_backup_dir())?;

        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let file_name = format!("backup-{stamp}.{ARCHIVE_EXT}");
        let work = WorkingArea::create(&self.local_backup_dir(), "temp")?;
        let zip_path = work.path().join(&file_name);

        tracing::info!(name = %file_name, "Starting backup");
        archive::build(&self.config, &work.payload_dir(), &zip_path)?;

        let sidecar = if self.backup.checksum_enabled {
            Some(checksum::compute(&zip_path)?)
        } else {
            None
        };

        // Local write first, then remote; both before any pruning.
        let relative = format!("{BACKUP_DIR}/{file_name}");
        self.disks
            .store(LOCAL_DISK, &relative, &zip_path, sidecar.as_deref())?;
        if self.backup.remote_enabled {
            self.disks
                .store(&self.backup.remote_disk, &relative, &zip_path, sidecar.as_deref())?;
        }

        drop(work);

        let now = Utc::now();
        retention::prune(&self.disks, LOCAL_DISK, self.backup.retention_days, now)?;
        if self.backup.remote_enabled {
            retention::prune(
                &self.disks,
                &self.backup.remote_disk,
                self.backup.retention_days,
                now,
            )?;
        }

        Ok(self.local_backup_dir().join(file_name))
    }

    /// Verify, unpack and install an archive over the live state, keeping a
    /// `.bak` copy of the pre-restore database. `live_db` is any open handle
    /// to the live database, released before the file is swapped.
    pub fn restore_backup(
        &self,
        zip_path: &Path,
        checksum_path: Option<&Path>,
        live_db: Option<Connection>,
    ) -> Result<()> {
        let _lock = OperationLock::acquire(&self.local_backup_dir())?;
        let work = WorkingArea::create(&self.local_backup_dir(), "restore")?;

        tracing::info!(archive = %zip_path.display(), "Starting restore");
        restore::run(
            &self.config,
            &self.backup,
            zip_path,
            checksum_path,
            live_db,
            work.path(),
        )
    }
}
