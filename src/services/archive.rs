//! Archive assembly: database snapshot plus media tree into a single zip.

use crate::config::AppConfig;
use crate::error::{BackupError, Result};
use crate::services::fsops;
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

/// Fixed name of the database snapshot entry inside an archive payload.
pub const DB_SNAPSHOT_ENTRY: &str = "database.sqlite";
/// Fixed name of the media tree entry inside an archive payload.
pub const MEDIA_ENTRY: &str = "media";

const SQLITE_DRIVER: &str = "sqlite";

/// Fail unless the active backend is the embedded sqlite file the engine
/// knows how to snapshot. Checked before any I/O on both create and restore.
pub fn ensure_supported_database(config: &AppConfig) -> Result<()> {
    if config.database_driver != SQLITE_DRIVER {
        return Err(BackupError::UnsupportedDatabase(
            config.database_driver.clone(),
        ));
    }
    Ok(())
}

/// Assemble the payload directory from the live state and package it into
/// `zip_path`. The payload and archive are left in the caller's working
/// area; cleanup is the caller's responsibility.
pub fn build(config: &AppConfig, payload_dir: &Path, zip_path: &Path) -> Result<()> {
    ensure_supported_database(config)?;

    fs::create_dir_all(payload_dir)?;

    if !config.database_path.exists() {
        return Err(BackupError::MissingDatabase(config.database_path.clone()));
    }
    fs::copy(&config.database_path, payload_dir.join(DB_SNAPSHOT_ENTRY))?;

    // Backups taken before any media was uploaded simply omit the entry.
    if config.media_dir.exists() {
        fsops::copy_dir_recursive(&config.media_dir, &payload_dir.join(MEDIA_ENTRY))?;
    }

    zip_directory(payload_dir, zip_path)
}

/// Write every regular file under `source` into a zip at `destination`,
/// using paths relative to `source`. Directories are not stored as entries;
/// extraction recreates them from the file paths.
pub fn zip_directory(source: &Path, destination: &Path) -> Result<()> {
    let file = fs::File::create(destination)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source) {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        zip.start_file(relative.to_string_lossy().into_owned(), options)?;

        let mut input = fs::File::open(entry.path())?;
        io::copy(&mut input, &mut zip)?;
    }

    zip.finish()?;
    Ok(())
}
