//! Advisory lock serializing backup and restore operations.
//!
//! The engine mutates the live database file and media tree with no other
//! coordination, so at most one create or restore may run at a time. The
//! lock is a `create_new` lock file in the local backups directory, removed
//! on drop.

use crate::error::{BackupError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const LOCK_FILE: &str = ".backup.lock";
const WAIT_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Held for the duration of one backup or restore operation.
pub struct OperationLock {
    path: PathBuf,
}

impl OperationLock {
    pub fn acquire(backups_dir: &Path) -> Result<Self> {
        Self::acquire_with_timeout(backups_dir, WAIT_TIMEOUT)
    }

    pub fn acquire_with_timeout(backups_dir: &Path, timeout: Duration) -> Result<Self> {
        fs::create_dir_all(backups_dir)?;
        let path = backups_dir.join(LOCK_FILE);
        let deadline = Instant::now() + timeout;

        loop {
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(_) => return Ok(Self { path }),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        return Err(BackupError::LockBusy(path));
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Drop for OperationLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
