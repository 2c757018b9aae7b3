//! Core attendance and notification logic for the workforce app.
//! This crate is the single source of truth for session and queue invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod runtime;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::attendance::{
    AttendanceRecord, AttendanceSession, AttendanceValidationError, EmployeeId,
};
pub use model::notification::{
    Notification, NotificationDraft, NotificationId, NotificationKind,
    NotificationValidationError, Priority,
};
pub use model::task::{Task, TaskStatus};
pub use repo::attendance_repo::{AttendanceRepository, SqliteAttendanceRepository};
pub use repo::notification_repo::{
    NotificationRepository, SqliteFileNotificationStore, SqliteNotificationRepository,
};
pub use repo::{RepoError, RepoResult};
pub use runtime::{init_notification_center, with_notification_center};
pub use service::attendance_service::{
    derive_session, format_elapsed, AttendanceError, AttendanceTracker, AttendanceUpdate,
};
pub use service::notification_service::{
    add_notification, mark_all_read, mark_read, reconcile_overdue, relative_time, remove,
    unread_count, NotificationAdded, NotificationCenter, SweepReport,
};
pub use service::persist::{PersistOutcome, PersistenceWarning};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
