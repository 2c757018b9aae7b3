//! Notification domain model.
//!
//! # Responsibility
//! - Define the queued notification record and the draft used to create it.
//! - Provide constructors for every notification kind the host emits.
//!
//! # Invariants
//! - `id` is stable and never reused for another notification.
//! - `read` only moves from `false` to `true`.
//! - Task-deadline kinds (`task_overdue`, `task_due_soon`) always carry a
//!   `task_id`, so per-task deduplication keys never collide.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one queued notification.
pub type NotificationId = Uuid;

/// Category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TaskAssigned,
    TaskStatusChanged,
    TaskComment,
    TaskOverdue,
    UserCreated,
    TaskDueSoon,
}

impl NotificationKind {
    /// Stable storage/wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TaskAssigned => "task_assigned",
            Self::TaskStatusChanged => "task_status_changed",
            Self::TaskComment => "task_comment",
            Self::TaskOverdue => "task_overdue",
            Self::UserCreated => "user_created",
            Self::TaskDueSoon => "task_due_soon",
        }
    }

    /// Parses a stable storage/wire name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "task_assigned" => Some(Self::TaskAssigned),
            "task_status_changed" => Some(Self::TaskStatusChanged),
            "task_comment" => Some(Self::TaskComment),
            "task_overdue" => Some(Self::TaskOverdue),
            "user_created" => Some(Self::UserCreated),
            "task_due_soon" => Some(Self::TaskDueSoon),
            _ => None,
        }
    }

    /// Kinds derived from task deadlines by the reconciliation sweep.
    pub fn requires_task_id(self) -> bool {
        matches!(self, Self::TaskOverdue | Self::TaskDueSoon)
    }
}

/// Optional urgency hint rendered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Validation error for notification drafts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationValidationError {
    MissingTaskId(NotificationKind),
    EmptyTitle,
}

impl Display for NotificationValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTaskId(kind) => {
                write!(f, "notification kind `{}` requires a task id", kind.as_str())
            }
            Self::EmptyTitle => write!(f, "notification title cannot be empty"),
        }
    }
}

impl Error for NotificationValidationError {}

/// Caller-supplied notification content, before id/timestamp assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub task_id: Option<String>,
    pub user_id: Option<String>,
    pub priority: Option<Priority>,
}

impl NotificationDraft {
    /// Creates a draft without task/user links or priority.
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            task_id: None,
            user_id: None,
            priority: None,
        }
    }

    pub fn with_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// A task was assigned to a user.
    pub fn task_assigned(task_id: &str, task_title: &str, assignee_id: &str) -> Self {
        Self::new(
            NotificationKind::TaskAssigned,
            "New Task Assigned",
            format!("You have been assigned to \"{task_title}\""),
        )
        .with_task(task_id)
        .with_user(assignee_id)
        .with_priority(Priority::Medium)
    }

    /// A task moved to a different status.
    pub fn task_status_changed(task_id: &str, task_title: &str, new_status: &str) -> Self {
        Self::new(
            NotificationKind::TaskStatusChanged,
            "Task Status Updated",
            format!("\"{task_title}\" is now {new_status}"),
        )
        .with_task(task_id)
        .with_priority(Priority::Low)
    }

    /// Someone commented on a task.
    pub fn task_comment(task_id: &str, task_title: &str, author: &str) -> Self {
        Self::new(
            NotificationKind::TaskComment,
            "New Comment",
            format!("{author} commented on \"{task_title}\""),
        )
        .with_task(task_id)
        .with_priority(Priority::Low)
    }

    /// A new user account was created.
    pub fn user_created(user_id: &str, display_name: &str) -> Self {
        Self::new(
            NotificationKind::UserCreated,
            "New User Created",
            format!("{display_name} has joined the workspace"),
        )
        .with_user(user_id)
        .with_priority(Priority::Low)
    }

    /// Checks draft-level invariants.
    pub fn validate(&self) -> Result<(), NotificationValidationError> {
        validate_content(self.kind, &self.title, self.task_id.as_deref())
    }
}

/// Queued notification as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    pub task_id: Option<String>,
    pub user_id: Option<String>,
    pub priority: Option<Priority>,
}

impl Notification {
    /// Materializes a draft as a fresh unread notification.
    pub fn from_draft(
        draft: NotificationDraft,
        id: NotificationId,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind: draft.kind,
            title: draft.title,
            message: draft.message,
            timestamp,
            read: false,
            task_id: draft.task_id,
            user_id: draft.user_id,
            priority: draft.priority,
        }
    }

    /// Checks the same invariants as `NotificationDraft::validate`.
    pub fn validate(&self) -> Result<(), NotificationValidationError> {
        validate_content(self.kind, &self.title, self.task_id.as_deref())
    }
}

fn validate_content(
    kind: NotificationKind,
    title: &str,
    task_id: Option<&str>,
) -> Result<(), NotificationValidationError> {
    if title.trim().is_empty() {
        return Err(NotificationValidationError::EmptyTitle);
    }
    let has_task = task_id.is_some_and(|task_id| !task_id.trim().is_empty());
    if kind.requires_task_id() && !has_task {
        return Err(NotificationValidationError::MissingTaskId(kind));
    }
    Ok(())
}
