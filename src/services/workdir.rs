//! Per-operation scratch directories.

use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

/// A uniquely named temporary directory owned by a single backup or restore
/// operation. The directory is removed when the value is dropped, so scratch
/// space is reclaimed on success, caught failure and unwind alike.
#[derive(Debug)]
pub struct WorkingArea {
    path: PathBuf,
}

impl WorkingArea {
    /// Create `<base>/<prefix>_<YYYY-MM-DD_HH-MM-SS>`.
    ///
    /// Names are timestamp-derived; concurrent operations are kept apart by
    /// the operation lock, not by the name itself.
    pub fn create(base: &Path, prefix: &str) -> std::io::Result<Self> {
        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let path = base.join(format!("{prefix}_{stamp}"));
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn payload_dir(&self) -> PathBuf {
        self.path.join("payload")
    }
}

impl Drop for WorkingArea {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}
