//! Process-wide notification center.
//!
//! # Responsibility
//! - Load the persisted queue once at startup.
//! - Serialize every queue mutation through a single lock.
//!
//! # Invariants
//! - Initialization is idempotent for the same database path.
//! - Re-initialization with a different database path is rejected.
//! - There is no teardown; each mutation persists before the lock is released.

use crate::clock::SystemClock;
use crate::config::CoreConfig;
use crate::repo::notification_repo::SqliteFileNotificationStore;
use crate::service::notification_service::NotificationCenter;
use log::info;
use once_cell::sync::OnceCell;
use std::sync::Mutex;

/// Notification center type held in process-wide state.
pub type SharedNotificationCenter = NotificationCenter<SqliteFileNotificationStore, SystemClock>;

static NOTIFICATION_CENTER: OnceCell<Mutex<SharedNotificationCenter>> = OnceCell::new();

/// Creates the process-wide notification center from `config`.
///
/// # Errors
/// - Returns an error when the persisted queue cannot be loaded.
/// - Returns an error when already initialized with another database path.
pub fn init_notification_center(config: &CoreConfig) -> Result<(), String> {
    let center = NOTIFICATION_CENTER.get_or_try_init(|| -> Result<_, String> {
        let store = SqliteFileNotificationStore::new(config.db_path.clone());
        let center = NotificationCenter::try_init(
            store,
            SystemClock,
            config.effective_notification_cap(),
        )
        .map_err(|err| format!("failed to load notification queue: {err}"))?;
        info!("event=runtime_init module=runtime status=ok");
        Ok(Mutex::new(center))
    })?;

    with_center_lock(center, |center| {
        let active = center.store().db_path();
        if active == config.db_path.as_path() {
            Ok(())
        } else {
            Err(format!(
                "notification center already initialized at `{}`; refusing to switch to `{}`",
                active.display(),
                config.db_path.display()
            ))
        }
    })?
}

/// Runs `f` with exclusive access to the process-wide notification center.
///
/// # Errors
/// - Returns an error when the center was never initialized.
/// - Returns an error when a previous holder panicked mid-mutation.
pub fn with_notification_center<T>(
    f: impl FnOnce(&mut SharedNotificationCenter) -> T,
) -> Result<T, String> {
    let center = NOTIFICATION_CENTER
        .get()
        .ok_or_else(|| "notification center is not initialized".to_string())?;
    with_center_lock(center, f)
}

fn with_center_lock<T>(
    center: &Mutex<SharedNotificationCenter>,
    f: impl FnOnce(&mut SharedNotificationCenter) -> T,
) -> Result<T, String> {
    let mut guard = center
        .lock()
        .map_err(|_| "notification center lock is poisoned".to_string())?;
    Ok(f(&mut guard))
}
