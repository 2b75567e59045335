//! Command-line entry points for the backup engine.

use anyhow::Result;
use clap::{Parser, Subcommand};
use flexhibition_backup::config::{AppConfig, BackupConfig};
use flexhibition_backup::services::coordinator::BackupCoordinator;
use flexhibition_backup::services::storage::{self, BackupRecord, DiskRegistry, BACKUP_DIR, LOCAL_DISK};
use flexhibition_backup::settings::{self, keys};
use rusqlite::Connection;
use std::io::Write as _;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "flexhibition-backup", version, about = "Backup and restore for the Flexhibition CMS")]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a full backup of database and media files
    Create,
    /// Restore the system from a backup zip file
    Restore {
        /// Path to the backup zip file
        file: PathBuf,
        /// Path to the checksum file (defaults to <file>.sha256 when present)
        #[arg(long)]
        checksum: Option<PathBuf>,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// List stored backups per destination
    List,
    /// Show or update backup settings
    Settings {
        #[arg(long)]
        retention_days: Option<u32>,
        #[arg(long)]
        checksum_enabled: Option<bool>,
        #[arg(long)]
        remote_enabled: Option<bool>,
        #[arg(long)]
        remote_disk: Option<String>,
        #[arg(long)]
        schedule_enabled: Option<bool>,
        #[arg(long)]
        schedule_cron: Option<String>,
    },
    /// Copy a stored backup from a destination into the current directory
    Download {
        /// Destination disk name
        disk: String,
        /// Archive file name
        file: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let config = AppConfig::from_env();

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(cli.command, config) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(command: Command, config: AppConfig) -> Result<()> {
    match command {
        Command::Create => create(config),
        Command::Restore { file, checksum, yes } => restore(config, file, checksum, yes),
        Command::List => list(config),
        Command::Settings {
            retention_days,
            checksum_enabled,
            remote_enabled,
            remote_disk,
            schedule_enabled,
            schedule_cron,
        } => update_settings(
            config,
            retention_days,
            checksum_enabled,
            remote_enabled,
            remote_disk,
            schedule_enabled,
            schedule_cron,
        ),
        Command::Download { disk, file } => download(config, disk, file),
    }
}

fn create(config: AppConfig) -> Result<()> {
    let (conn, backup) = load_backup_config(&config)?;
    // The builder copies the database file; no handle needs to stay open.
    drop(conn);

    println!("Starting backup process...");
    let coordinator = BackupCoordinator::new(config, backup);
    let path = coordinator.create_backup()?;
    println!("Backup created successfully at: {}", path.display());
    Ok(())
}

fn restore(
    config: AppConfig,
    file: PathBuf,
    checksum: Option<PathBuf>,
    yes: bool,
) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }

    if !yes && !confirm("This will overwrite the current database and media. Are you sure?")? {
        return Ok(());
    }

    let (conn, backup) = load_backup_config(&config)?;

    println!("Starting restore process...");
    let coordinator = BackupCoordinator::new(config.clone(), backup);
    coordinator.restore_backup(&file, checksum.as_deref(), conn)?;
    println!("System restored successfully.");

    // The restored database carries its own settings; the cached copy of the
    // old ones is no longer valid.
    settings::clear_cache(&config.settings_cache_path());
    println!("Cache cleared.");
    Ok(())
}

fn list(config: AppConfig) -> Result<()> {
    let (conn, backup) = load_backup_config(&config)?;
    drop(conn);

    let registry = DiskRegistry::from_config(&config);

    println!("Disk [{LOCAL_DISK}]:");
    print_records(&registry.list(LOCAL_DISK)?);

    if backup.remote_enabled
        && registry
            .available_remote_disks()
            .contains(&backup.remote_disk)
    {
        println!("Disk [{}]:", backup.remote_disk);
        print_records(&registry.list(&backup.remote_disk)?);
    }
    Ok(())
}

fn print_records(records: &[BackupRecord]) {
    if records.is_empty() {
        println!("  (no backups)");
        return;
    }
    for record in records {
        println!(
            "  {}  {} bytes  {}  checksum: {}",
            record.name,
            record.size,
            record.last_modified.format("%Y-%m-%d %H:%M:%S"),
            if record.checksum_exists { "yes" } else { "no" },
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn update_settings(
    config: AppConfig,
    retention_days: Option<u32>,
    checksum_enabled: Option<bool>,
    remote_enabled: Option<bool>,
    remote_disk: Option<String>,
    schedule_enabled: Option<bool>,
    schedule_cron: Option<String>,
) -> Result<()> {
    let conn = Connection::open(&config.database_path)?;
    settings::ensure_table(&conn)?;

    let mut changed = false;
    let mut write = |key: &str, value: Option<String>| -> Result<()> {
        if let Some(value) = value {
            settings::set(&conn, key, &value)?;
            changed = true;
        }
        Ok(())
    };

    write(keys::RETENTION_DAYS, retention_days.map(|d| d.to_string()))?;
    write(keys::CHECKSUM_ENABLED, checksum_enabled.map(|b| bool_setting(b)))?;
    write(keys::REMOTE_ENABLED, remote_enabled.map(|b| bool_setting(b)))?;
    write(keys::REMOTE_DISK, remote_disk)?;
    write(keys::SCHEDULE_ENABLED, schedule_enabled.map(|b| bool_setting(b)))?;
    write(keys::SCHEDULE_CRON, schedule_cron)?;

    if changed {
        settings::clear_cache(&config.settings_cache_path());
        println!("Backup settings updated successfully.");
    }

    let backup = BackupConfig::from_settings(&settings::get_all(&conn)?);
    println!("retention_days:   {}", match backup.retention_days {
        Some(days) => days.to_string(),
        None => "disabled".into(),
    });
    println!("checksum_enabled: {}", backup.checksum_enabled);
    println!("remote_enabled:   {}", backup.remote_enabled);
    println!("remote_disk:      {}", backup.remote_disk);
    println!("schedule_enabled: {}", backup.schedule_enabled);
    println!("schedule_cron:    {}", backup.schedule_cron);
    Ok(())
}

fn download(config: AppConfig, disk: String, file: String) -> Result<()> {
    if !storage::is_valid_backup_file_name(&file) {
        anyhow::bail!("Invalid backup filename.");
    }

    let registry = DiskRegistry::from_config(&config);
    let root = registry.resolve(&disk)?;
    let source = root.join(BACKUP_DIR).join(&file);
    if !source.exists() {
        anyhow::bail!("Backup file not found.");
    }

    std::fs::copy(&source, &file)?;
    println!("Downloaded {file} from disk [{disk}].");
    Ok(())
}

fn bool_setting(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

/// Read runtime settings from the live database, keeping the connection open
/// so a restore can release it at the install step. When the database does
/// not exist yet the defaults apply and no connection is returned.
fn load_backup_config(config: &AppConfig) -> Result<(Option<Connection>, BackupConfig)> {
    if !config.database_path.exists() {
        return Ok((None, BackupConfig::default()));
    }

    let conn = Connection::open(&config.database_path)?;
    let map = settings::load_cached(&conn, &config.settings_cache_path()).unwrap_or_default();
    Ok((Some(conn), BackupConfig::from_settings(&map)))
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
