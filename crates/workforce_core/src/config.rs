//! Core runtime configuration.
//!
//! # Responsibility
//! - Carry storage, queue and logging settings into core entry points.
//! - Normalize caller-provided values to supported ranges.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const DEFAULT_DB_FILE_NAME: &str = "workforce.sqlite3";
pub const DEFAULT_NOTIFICATION_CAP: usize = 50;
pub const NOTIFICATION_CAP_MAX: usize = 500;

/// Settings for the process-wide core runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite database file holding attendance records and notifications.
    pub db_path: PathBuf,
    /// Maximum retained notifications. Defaults to 50 and clamps to 500.
    pub notification_cap: usize,
    pub log_level: String,
    /// Absolute directory for rolling log files. Logging stays off when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            notification_cap: DEFAULT_NOTIFICATION_CAP,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Default settings rooted at a data directory.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            db_path: data_dir.join(DEFAULT_DB_FILE_NAME),
            log_dir: Some(data_dir.join("logs")),
            ..Self::default()
        }
    }

    /// Effective cap after normalization.
    pub fn effective_notification_cap(&self) -> usize {
        normalize_notification_cap(self.notification_cap)
    }
}

/// Normalizes the notification cap according to the queue contract.
pub fn normalize_notification_cap(cap: usize) -> usize {
    match cap {
        0 => DEFAULT_NOTIFICATION_CAP,
        value if value > NOTIFICATION_CAP_MAX => NOTIFICATION_CAP_MAX,
        value => value,
    }
}
