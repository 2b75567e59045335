//! Application configuration.
//!
//! [`AppConfig`] describes the deployment (paths, configured disks) and is
//! read once from the environment. [`BackupConfig`] is the snapshot of the
//! `backups.*` runtime settings handed to the coordinator at construction;
//! the engine never reaches into the settings store itself.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use crate::settings::keys;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Active database driver; only `sqlite` is supported by the engine.
    pub database_driver: String,
    /// Path of the live SQLite database file.
    pub database_path: PathBuf,
    /// Root of the live media tree.
    pub media_dir: PathBuf,
    /// Application data directory (settings cache lives here).
    pub data_dir: PathBuf,
    /// Root of the `local` storage disk. Archives are kept in a `backups/`
    /// directory underneath it, which also hosts per-operation scratch space.
    pub local_disk_root: PathBuf,
    /// Remote disks by logical name, declared as `REMOTE_DISK_<NAME>=<root>`.
    pub remote_disks: Vec<(String, PathBuf)>,
    pub log_level: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".into()));

        let mut remote_disks: Vec<(String, PathBuf)> = env::vars()
            .filter_map(|(key, value)| {
                let name = key.strip_prefix("REMOTE_DISK_")?;
                if name.is_empty() || value.is_empty() {
                    return None;
                }
                Some((name.to_lowercase(), PathBuf::from(value)))
            })
            .collect();
        remote_disks.sort();

        Self {
            database_driver: env::var("DATABASE_DRIVER").unwrap_or_else(|_| "sqlite".into()),
            database_path: env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("database.sqlite")),
            media_dir: env::var("MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("media")),
            local_disk_root: env::var("LOCAL_DISK_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("private")),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            data_dir,
            remote_disks,
        }
    }

    pub fn settings_cache_path(&self) -> PathBuf {
        self.data_dir.join("settings-cache.json")
    }
}

/// Runtime backup settings, sourced from the `settings` table.
///
/// The schedule fields do not drive the engine; they are persisted for the
/// host cron that invokes `create` externally.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// Retention window in days; `None` disables pruning.
    pub retention_days: Option<u32>,
    pub checksum_enabled: bool,
    pub remote_enabled: bool,
    pub remote_disk: String,
    pub schedule_enabled: bool,
    pub schedule_cron: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            retention_days: Some(30),
            checksum_enabled: true,
            remote_enabled: true,
            remote_disk: "google".into(),
            schedule_enabled: false,
            schedule_cron: "0 2 * * *".into(),
        }
    }
}

impl BackupConfig {
    pub fn from_settings(settings: &HashMap<String, String>) -> Self {
        let defaults = Self::default();

        // A present but non-numeric or non-positive value disables pruning;
        // an absent key falls back to the default window.
        let retention_days = match settings.get(keys::RETENTION_DAYS) {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|days| *days > 0)
                .map(|days| days as u32),
            None => defaults.retention_days,
        };

        Self {
            retention_days,
            checksum_enabled: settings
                .get(keys::CHECKSUM_ENABLED)
                .map(|raw| parse_bool(raw))
                .unwrap_or(defaults.checksum_enabled),
            remote_enabled: settings
                .get(keys::REMOTE_ENABLED)
                .map(|raw| parse_bool(raw))
                .unwrap_or(defaults.remote_enabled),
            remote_disk: settings
                .get(keys::REMOTE_DISK)
                .filter(|disk| !disk.is_empty())
                .cloned()
                .unwrap_or(defaults.remote_disk),
            schedule_enabled: settings
                .get(keys::SCHEDULE_ENABLED)
                .map(|raw| parse_bool(raw))
                .unwrap_or(defaults.schedule_enabled),
            schedule_cron: settings
                .get(keys::SCHEDULE_CRON)
                .filter(|cron| !cron.is_empty())
                .cloned()
                .unwrap_or(defaults.schedule_cron),
        }
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_settings_are_absent() {
        let config = BackupConfig::from_settings(&HashMap::new());
        assert_eq!(config.retention_days, Some(30));
        assert!(config.checksum_enabled);
        assert!(config.remote_enabled);
        assert_eq!(config.remote_disk, "google");
        assert!(!config.schedule_enabled);
    }

    #[test]
    fn non_positive_retention_disables_pruning() {
        let config = BackupConfig::from_settings(&settings(&[(keys::RETENTION_DAYS, "0")]));
        assert_eq!(config.retention_days, None);

        let config = BackupConfig::from_settings(&settings(&[(keys::RETENTION_DAYS, "-3")]));
        assert_eq!(config.retention_days, None);
    }

    #[test]
    fn non_numeric_retention_disables_pruning() {
        let config = BackupConfig::from_settings(&settings(&[(keys::RETENTION_DAYS, "soon")]));
        assert_eq!(config.retention_days, None);
    }

    #[test]
    fn boolean_settings_accept_common_spellings() {
        let config = BackupConfig::from_settings(&settings(&[
            (keys::CHECKSUM_ENABLED, "0"),
            (keys::REMOTE_ENABLED, "true"),
        ]));
        assert!(!config.checksum_enabled);
        assert!(config.remote_enabled);
    }

    #[test]
    fn empty_remote_disk_falls_back_to_default() {
        let config = BackupConfig::from_settings(&settings(&[(keys::REMOTE_DISK, "")]));
        assert_eq!(config.remote_disk, "google");
    }
}
