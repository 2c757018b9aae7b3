//! Notification queue repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Load the full ordered notification queue.
//! - Replace the whole queue atomically.
//!
//! # Invariants
//! - `replace_queue` runs in one IMMEDIATE transaction; readers observe either
//!   the old queue or the new one, never a mix.
//! - Queue order is persisted through `position` (0 = newest).

use crate::db::open_db;
use crate::model::notification::{Notification, NotificationKind, Priority};
use crate::repo::{bool_to_int, ensure_table, from_epoch_ms, to_epoch_ms, RepoError, RepoResult};
use rusqlite::{params, Connection, Row, TransactionBehavior};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Record store for the notification queue.
pub trait NotificationRepository {
    /// Returns the persisted queue, newest first.
    fn load_queue(&self) -> RepoResult<Vec<Notification>>;
    /// Replaces the persisted queue with `queue` in one atomic write.
    fn replace_queue(&mut self, queue: &[Notification]) -> RepoResult<()>;
}

/// SQLite-backed notification repository over a borrowed connection.
pub struct SqliteNotificationRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNotificationRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_table(conn, "notifications")?;
        Ok(Self { conn })
    }
}

impl NotificationRepository for SqliteNotificationRepository<'_> {
    fn load_queue(&self) -> RepoResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                id,
                kind,
                title,
                message,
                created_at_ms,
                is_read,
                task_id,
                user_id,
                priority
             FROM notifications
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut queue = Vec::new();
        while let Some(row) = rows.next()? {
            queue.push(parse_notification_row(row)?);
        }
        Ok(queue)
    }

    fn replace_queue(&mut self, queue: &[Notification]) -> RepoResult<()> {
        for notification in queue {
            notification.validate()?;
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM notifications;", [])?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO notifications (
                    id,
                    position,
                    kind,
                    title,
                    message,
                    created_at_ms,
                    is_read,
                    task_id,
                    user_id,
                    priority
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            )?;
            for (position, notification) in queue.iter().enumerate() {
                let position = i64::try_from(position).map_err(|_| {
                    RepoError::InvalidData(format!("queue position {position} overflows"))
                })?;
                insert.execute(params![
                    notification.id.to_string(),
                    position,
                    notification.kind.as_str(),
                    notification.title.as_str(),
                    notification.message.as_str(),
                    to_epoch_ms(notification.timestamp),
                    bool_to_int(notification.read),
                    notification.task_id.as_deref(),
                    notification.user_id.as_deref(),
                    notification.priority.map(Priority::as_str),
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }
}

/// Notification store bound to a database file.
///
/// Opens a fresh migrated connection per call, so it can live in
/// process-wide state without borrowing a connection.
#[derive(Debug, Clone)]
pub struct SqliteFileNotificationStore {
    db_path: PathBuf,
}

impl SqliteFileNotificationStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        self.db_path.as_path()
    }
}

impl NotificationRepository for SqliteFileNotificationStore {
    fn load_queue(&self) -> RepoResult<Vec<Notification>> {
        let mut conn = open_db(&self.db_path)?;
        SqliteNotificationRepository::try_new(&mut conn)?.load_queue()
    }

    fn replace_queue(&mut self, queue: &[Notification]) -> RepoResult<()> {
        let mut conn = open_db(&self.db_path)?;
        SqliteNotificationRepository::try_new(&mut conn)?.replace_queue(queue)
    }
}

fn parse_notification_row(row: &Row<'_>) -> RepoResult<Notification> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in notifications.id"))
    })?;

    let kind_text: String = row.get("kind")?;
    let kind = NotificationKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid kind `{kind_text}` in notifications.kind"))
    })?;

    let priority = match row.get::<_, Option<String>>("priority")? {
        Some(value) => Some(Priority::parse(&value).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid priority `{value}` in notifications.priority"
            ))
        })?),
        None => None,
    };

    let read = match row.get::<_, i64>("is_read")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_read value `{other}` in notifications.is_read"
            )));
        }
    };

    let notification = Notification {
        id,
        kind,
        title: row.get("title")?,
        message: row.get("message")?,
        timestamp: from_epoch_ms(row.get("created_at_ms")?, "notifications.created_at_ms")?,
        read,
        task_id: row.get("task_id")?,
        user_id: row.get("user_id")?,
        priority,
    };
    notification.validate()?;
    Ok(notification)
}
