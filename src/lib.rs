//! Backup and restore engine for the Flexhibition museum CMS.
//!
//! The engine snapshots the live SQLite database and the media tree into a
//! single checksummed zip archive, replicates it to one or more storage
//! destinations, enforces a retention window, and restores a previously
//! produced archive over the live state while keeping a `.bak` safety copy.

pub mod config;
pub mod error;
pub mod services;
pub mod settings;

pub use config::{AppConfig, BackupConfig};
pub use error::{BackupError, Result};
pub use services::coordinator::BackupCoordinator;
