//! Error types for the backup engine.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("backups currently support the sqlite driver only (active driver: {0})")]
    UnsupportedDatabase(String),

    #[error("database file not found at {0}")]
    MissingDatabase(PathBuf),

    #[error("failed to store backup on disk [{disk}]: {source}")]
    StorageWrite {
        disk: String,
        #[source]
        source: std::io::Error,
    },

    #[error("checksum verification failed for the backup archive")]
    ChecksumMismatch,

    #[error("checksum sidecar not found at {0}")]
    SidecarMissing(PathBuf),

    #[error("checksum file not found for the backup archive")]
    ChecksumNotFound,

    #[error("unable to read or write backup archive: {0}")]
    CorruptArchive(#[from] zip::result::ZipError),

    #[error("invalid backup: database snapshot entry not found")]
    InvalidBackup,

    #[error("unknown backup disk [{0}]")]
    UnknownDisk(String),

    #[error("another backup or restore operation is in progress (lock file {0})")]
    LockBusy(PathBuf),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BackupError>;
