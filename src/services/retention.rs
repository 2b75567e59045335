//! Retention pruning for backup destinations.

use crate::error::Result;
use crate::services::checksum;
use crate::services::storage::DiskRegistry;
use chrono::{DateTime, Duration, Utc};

/// Delete every archive on `disk` whose last-modified time is strictly older
/// than `now - days`, together with its sidecar (best-effort; a missing
/// sidecar is not an error). A disabled policy returns without touching the
/// destination at all. Returns the number of archives removed.
pub fn prune(
    registry: &DiskRegistry,
    disk: &str,
    days: Option<u32>,
    now: DateTime<Utc>,
) -> Result<usize> {
    let Some(days) = days else {
        return Ok(0);
    };

    let cutoff = now - Duration::days(i64::from(days));
    let mut removed = 0;

    for record in registry.list(disk)? {
        if record.last_modified < cutoff {
            registry.delete(disk, &record.path)?;
            let _ = registry.delete(disk, &format!("{}.{}", record.path, checksum::SIDECAR_EXT));
            tracing::info!(disk, name = %record.name, "Pruned expired backup");
            removed += 1;
        }
    }

    Ok(removed)
}
