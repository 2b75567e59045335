//! Restore state machine: verify, unpack, validate, install.
//!
//! Failures before the database install leave live state untouched. The
//! database and media installs are two sequential non-transactional copies;
//! a crash between them leaves a restored database next to a stale media
//! tree, with the pre-restore database preserved as `database.sqlite.bak`.

use crate::config::{AppConfig, BackupConfig};
use crate::error::{BackupError, Result};
use crate::services::{archive, checksum, fsops};
use rusqlite::Connection;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Path of the pre-restore safety copy: `<database>.bak`.
pub fn safety_copy_path(database_path: &Path) -> PathBuf {
    let mut name = database_path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

/// Run one restore inside `working_dir`.
///
/// `live_db` is any open handle to the live database; it is dropped before
/// the database file is overwritten.
pub fn run(
    config: &AppConfig,
    backup: &BackupConfig,
    zip_path: &Path,
    checksum_path: Option<&Path>,
    live_db: Option<Connection>,
    working_dir: &Path,
) -> Result<()> {
    archive::ensure_supported_database(config)?;

    if backup.checksum_enabled {
        let sidecar = match checksum_path {
            Some(path) => path.to_path_buf(),
            None => {
                let conventional = checksum::sidecar_path_for(zip_path);
                if !conventional.exists() {
                    return Err(BackupError::ChecksumNotFound);
                }
                conventional
            }
        };
        checksum::verify(zip_path, &sidecar)?;
    }

    unzip(zip_path, working_dir)?;

    let snapshot = working_dir.join(archive::DB_SNAPSHOT_ENTRY);
    if !snapshot.exists() {
        return Err(BackupError::InvalidBackup);
    }

    // Release any open handle before overwriting the database file.
    drop(live_db);

    let current = &config.database_path;
    if current.exists() {
        fs::copy(current, safety_copy_path(current))?;
    }
    fs::copy(&snapshot, current)?;
    tracing::info!(path = %current.display(), "Database restored");

    // Archives taken before media existed have no media entry; in that case
    // the live tree is left as it is.
    let media_payload = working_dir.join(archive::MEDIA_ENTRY);
    if media_payload.exists() {
        if config.media_dir.exists() {
            fsops::clear_directory(&config.media_dir)?;
        }
        fsops::copy_dir_recursive(&media_payload, &config.media_dir)?;
        tracing::info!(path = %config.media_dir.display(), "Media restored");
    }

    Ok(())
}

/// Extract an archive into `destination`, skipping entries whose names would
/// escape the extraction root.
fn unzip(zip_path: &Path, destination: &Path) -> Result<()> {
    let file = fs::File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let target = destination.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut output = fs::File::create(&target)?;
        io::copy(&mut entry, &mut output)?;
    }

    Ok(())
}
