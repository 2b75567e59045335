//! Key-value settings stored in the live database.
//!
//! The CMS keeps its runtime configuration in a `settings` table. A small
//! JSON file cache fronts the table so repeated CLI invocations do not hit
//! the database; the cache is invalidated after writes and after a restore
//! swaps the database file out from under it.

use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;

/// Setting keys consumed by the backup engine.
pub mod keys {
    pub const RETENTION_DAYS: &str = "backups.retention_days";
    pub const CHECKSUM_ENABLED: &str = "backups.checksum_enabled";
    pub const REMOTE_ENABLED: &str = "backups.remote_enabled";
    pub const REMOTE_DISK: &str = "backups.remote_disk";
    pub const SCHEDULE_ENABLED: &str = "backups.schedule_enabled";
    pub const SCHEDULE_CRON: &str = "backups.schedule_cron";
}

pub fn ensure_table(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
        [],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, key: &str) -> anyhow::Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM settings WHERE key = ?")?;
    let mut rows = stmt.query_map(params![key], |row| row.get::<_, String>(0))?;
    Ok(rows.next().and_then(|r| r.ok()))
}

pub fn set(conn: &Connection, key: &str, value: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn get_all(conn: &Connection) -> anyhow::Result<HashMap<String, String>> {
    let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    let mut map = HashMap::new();
    for r in rows {
        let (k, v) = r?;
        map.insert(k, v);
    }
    Ok(map)
}

/// Load all settings, preferring the JSON cache file when it is readable.
/// On a cache miss the table is queried and the cache rewritten.
pub fn load_cached(conn: &Connection, cache_path: &Path) -> anyhow::Result<HashMap<String, String>> {
    if let Ok(raw) = std::fs::read_to_string(cache_path) {
        if let Ok(map) = serde_json::from_str::<HashMap<String, String>>(&raw) {
            return Ok(map);
        }
    }

    let map = get_all(conn)?;
    if let Ok(raw) = serde_json::to_string(&map) {
        // Cache writes are best-effort; the table remains authoritative.
        let _ = std::fs::write(cache_path, raw);
    }
    Ok(map)
}

pub fn clear_cache(cache_path: &Path) {
    let _ = std::fs::remove_file(cache_path);
}
