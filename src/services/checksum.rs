//! Archive integrity binding via SHA-256 sidecar files.
//!
//! Sidecars follow the `sha256sum` convention so external tooling can verify
//! archives independently: `<hex-digest>  <archive-basename>\n`.

use crate::error::{BackupError, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Extension appended to an archive path to form its sidecar path.
pub const SIDECAR_EXT: &str = "sha256";

/// Conventional sidecar path for an archive: `<archive>.sha256`.
pub fn sidecar_path_for(archive_path: &Path) -> PathBuf {
    let mut name = archive_path.as_os_str().to_os_string();
    name.push(".");
    name.push(SIDECAR_EXT);
    PathBuf::from(name)
}

/// Hash the archive and format the sidecar contents.
pub fn compute(archive_path: &Path) -> Result<String> {
    let digest = hash_file(archive_path)?;
    let name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(format!("{digest}  {name}\n"))
}

/// Verify `archive_path` against the hash recorded in `sidecar_path`.
///
/// The first whitespace-delimited token of the sidecar is the expected
/// digest; comparison is constant-time. This is a hard gate: restore must
/// not proceed past a failure here.
pub fn verify(archive_path: &Path, sidecar_path: &Path) -> Result<()> {
    if !sidecar_path.exists() {
        return Err(BackupError::SidecarMissing(sidecar_path.to_path_buf()));
    }

    let contents = fs::read_to_string(sidecar_path)?;
    let expected = contents.split_whitespace().next().unwrap_or("");
    let actual = hash_file(archive_path)?;

    if !constant_time_eq(expected.as_bytes(), actual.as_bytes()) {
        return Err(BackupError::ChecksumMismatch);
    }
    Ok(())
}

fn hash_file(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    let mut diff = left.len() ^ right.len();
    let max_len = left.len().max(right.len());
    let mut index = 0usize;
    while index < max_len {
        let left_byte = left.get(index).copied().unwrap_or(0);
        let right_byte = right.get(index).copied().unwrap_or(0);
        diff |= (left_byte ^ right_byte) as usize;
        index += 1;
    }
    diff == 0
}
