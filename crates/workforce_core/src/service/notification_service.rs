//! Notification queue reconciliation.
//!
//! # Responsibility
//! - Apply add/read/remove transformations to the capped queue.
//! - Derive overdue and due-soon drafts from task deadlines.
//! - Render relative timestamps for queue display.
//! - Keep an in-memory queue and persist it on every mutation.
//!
//! # Invariants
//! - The queue is newest-first and never longer than the cap; eviction drops
//!   the oldest entries from the tail.
//! - Read/remove operations preserve order and every untouched field; an
//!   absent id is a no-op.
//! - At most one deadline notification per `(kind, task_id, UTC day)`.

use crate::clock::Clock;
use crate::config::normalize_notification_cap;
use crate::model::notification::{
    Notification, NotificationDraft, NotificationId, NotificationKind,
    NotificationValidationError, Priority,
};
use crate::model::task::Task;
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::RepoResult;
use crate::service::persist::{persist_best_effort, PersistOutcome};
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info};
use std::collections::HashSet;
use uuid::Uuid;

const RELATIVE_DATE_FORMAT: &str = "%-m/%-d/%Y";

/// Prepends a fresh unread notification built from `draft`.
///
/// The new entry gets a random id and `now` as its timestamp. The result is
/// truncated to `cap` (at least one) by dropping the oldest entries.
pub fn add_notification(
    queue: &[Notification],
    draft: NotificationDraft,
    now: DateTime<Utc>,
    cap: usize,
) -> Result<Vec<Notification>, NotificationValidationError> {
    draft.validate()?;
    let notification = Notification::from_draft(draft, Uuid::new_v4(), now);

    let mut next = Vec::with_capacity(queue.len() + 1);
    next.push(notification);
    next.extend(queue.iter().cloned());
    next.truncate(cap.max(1));
    Ok(next)
}

/// Marks one notification read. Absent ids leave the queue unchanged.
pub fn mark_read(queue: &[Notification], id: NotificationId) -> Vec<Notification> {
    queue
        .iter()
        .map(|notification| {
            let mut notification = notification.clone();
            if notification.id == id {
                notification.read = true;
            }
            notification
        })
        .collect()
}

/// Marks every notification read.
pub fn mark_all_read(queue: &[Notification]) -> Vec<Notification> {
    queue
        .iter()
        .map(|notification| Notification {
            read: true,
            ..notification.clone()
        })
        .collect()
}

/// Removes one notification. Absent ids leave the queue unchanged.
pub fn remove(queue: &[Notification], id: NotificationId) -> Vec<Notification> {
    queue
        .iter()
        .filter(|notification| notification.id != id)
        .cloned()
        .collect()
}

pub fn unread_count(queue: &[Notification]) -> usize {
    queue.iter().filter(|notification| !notification.read).count()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DedupKey {
    kind: NotificationKind,
    task_id: String,
    day: NaiveDate,
}

impl DedupKey {
    fn of_draft(draft: &NotificationDraft, day: NaiveDate) -> Option<Self> {
        let task_id = draft.task_id.as_ref()?;
        Some(Self {
            kind: draft.kind,
            task_id: task_id.clone(),
            day,
        })
    }

    fn of(notification: &Notification) -> Option<Self> {
        let task_id = notification.task_id.as_ref()?;
        Some(Self {
            kind: notification.kind,
            task_id: task_id.clone(),
            day: notification.timestamp.date_naive(),
        })
    }
}

/// Derives deadline drafts for unfinished tasks, one sweep at `now`.
///
/// - Due before today: `task_overdue` with the whole-day count.
/// - Due today: `task_due_soon`.
///
/// A draft is skipped when the queue already holds the same kind for the
/// same task stamped on today's UTC day. Task order is preserved.
pub fn reconcile_overdue(
    tasks: &[Task],
    queue: &[Notification],
    now: DateTime<Utc>,
) -> Vec<NotificationDraft> {
    let today = now.date_naive();
    let mut seen = queue
        .iter()
        .filter_map(DedupKey::of)
        .filter(|key| key.day == today)
        .collect::<HashSet<_>>();

    let mut drafts = Vec::new();
    for task in tasks {
        if task.is_completed() || task.id.trim().is_empty() {
            continue;
        }
        let Some(due_date) = task.due_date else {
            continue;
        };

        let draft = if due_date < today {
            overdue_draft(task, (today - due_date).num_days())
        } else if due_date == today {
            due_soon_draft(task)
        } else {
            continue;
        };

        let key = DedupKey {
            kind: draft.kind,
            task_id: task.id.clone(),
            day: today,
        };
        if seen.insert(key) {
            drafts.push(draft);
        }
    }
    drafts
}

fn overdue_draft(task: &Task, days: i64) -> NotificationDraft {
    let unit = if days == 1 { "day" } else { "days" };
    NotificationDraft::new(
        NotificationKind::TaskOverdue,
        "Task Overdue",
        format!("Task \"{}\" is overdue by {days} {unit}", task.title),
    )
    .with_task(task.id.as_str())
    .with_priority(Priority::High)
}

fn due_soon_draft(task: &Task) -> NotificationDraft {
    NotificationDraft::new(
        NotificationKind::TaskDueSoon,
        "Task Due Soon",
        format!("Task \"{}\" is due today", task.title),
    )
    .with_task(task.id.as_str())
    .with_priority(Priority::Medium)
}

/// Renders `timestamp` relative to `now`.
///
/// Lower bounds are inclusive: exactly 60 seconds is `"1m ago"`. Future
/// timestamps render as `"just now"`; a week or older renders as `M/D/YYYY`.
pub fn relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - timestamp;
    if elapsed.num_seconds() < 60 {
        return "just now".to_string();
    }
    let minutes = elapsed.num_minutes();
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = elapsed.num_hours();
    if hours < 24 {
        return format!("{hours}h ago");
    }
    let days = elapsed.num_days();
    if days < 7 {
        return format!("{days}d ago");
    }
    timestamp.format(RELATIVE_DATE_FORMAT).to_string()
}

/// Result of an accepted `NotificationCenter::add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAdded {
    pub id: NotificationId,
    pub persistence: PersistOutcome,
}

/// Result of one deadline sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Ids of the notifications the sweep added and the queue still holds,
    /// in task order.
    pub added: Vec<NotificationId>,
    pub persistence: PersistOutcome,
}

/// Stateful notification queue over a record store and a clock.
pub struct NotificationCenter<R: NotificationRepository, C: Clock> {
    repo: R,
    clock: C,
    cap: usize,
    queue: Vec<Notification>,
    /// Deadline keys emitted by sweeps on `swept_day`.
    swept: HashSet<DedupKey>,
    swept_day: Option<NaiveDate>,
}

impl<R: NotificationRepository, C: Clock> NotificationCenter<R, C> {
    /// Loads the persisted queue and trims it to the normalized cap.
    pub fn try_init(repo: R, clock: C, cap: usize) -> RepoResult<Self> {
        let cap = normalize_notification_cap(cap);
        let mut queue = repo.load_queue()?;
        queue.truncate(cap);
        info!(
            "event=notification_init module=service status=ok queued={} cap={cap}",
            queue.len()
        );
        Ok(Self {
            repo,
            clock,
            cap,
            queue,
            swept: HashSet::new(),
            swept_day: None,
        })
    }

    /// In-memory queue, newest first.
    pub fn queue(&self) -> &[Notification] {
        &self.queue
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Backing record store.
    pub fn store(&self) -> &R {
        &self.repo
    }

    pub fn unread_count(&self) -> usize {
        unread_count(&self.queue)
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.queue.iter().find(|notification| notification.id == id)
    }

    /// Relative label for one queued notification at the clock's `now`.
    pub fn relative_label(&self, id: NotificationId) -> Option<String> {
        self.get(id)
            .map(|notification| relative_time(notification.timestamp, self.clock.now()))
    }

    pub fn add(
        &mut self,
        draft: NotificationDraft,
    ) -> Result<NotificationAdded, NotificationValidationError> {
        let kind = draft.kind;
        let next = add_notification(&self.queue, draft, self.clock.now(), self.cap)?;
        let id = next[0].id;
        let persistence = self.replace("notification_add", next);
        info!(
            "event=notification_add module=service status=ok kind={} queued={}",
            kind.as_str(),
            self.queue.len()
        );
        Ok(NotificationAdded { id, persistence })
    }

    pub fn mark_read(&mut self, id: NotificationId) -> PersistOutcome {
        let next = mark_read(&self.queue, id);
        self.replace("notification_mark_read", next)
    }

    pub fn mark_all_read(&mut self) -> PersistOutcome {
        let next = mark_all_read(&self.queue);
        self.replace("notification_mark_all_read", next)
    }

    pub fn remove(&mut self, id: NotificationId) -> PersistOutcome {
        let next = remove(&self.queue, id);
        self.replace("notification_remove", next)
    }

    /// Runs one deadline sweep over `tasks` and queues its drafts.
    ///
    /// All drafts land in a single persisted write. At most `cap` drafts are
    /// queued per sweep, in task order; the rest are dropped for the day.
    /// Keys emitted today are remembered even after eviction, so a repeat
    /// sweep on the same UTC day never re-emits them.
    pub fn sweep(&mut self, tasks: &[Task]) -> SweepReport {
        let now = self.clock.now();
        let today = now.date_naive();
        if self.swept_day != Some(today) {
            self.swept_day = Some(today);
            self.swept.clear();
        }

        let swept = &mut self.swept;
        let drafts = reconcile_overdue(tasks, &self.queue, now)
            .into_iter()
            .filter(|draft| {
                DedupKey::of_draft(draft, today).is_some_and(|key| swept.insert(key))
            })
            .collect::<Vec<_>>();
        let dropped = drafts.len().saturating_sub(self.cap);

        let mut next = self.queue.clone();
        let mut added = Vec::with_capacity(drafts.len().min(self.cap));
        for draft in drafts.into_iter().take(self.cap) {
            match add_notification(&next, draft, now, self.cap) {
                Ok(queue) => {
                    added.push(queue[0].id);
                    next = queue;
                }
                Err(err) => {
                    debug!("event=notification_sweep module=service status=skip error={err}");
                }
            }
        }
        added.retain(|id| next.iter().any(|notification| notification.id == *id));

        let persistence = self.replace("notification_sweep", next);
        info!(
            "event=notification_sweep module=service status=ok tasks={} added={} dropped={dropped}",
            tasks.len(),
            added.len()
        );
        SweepReport { added, persistence }
    }

    fn replace(&mut self, operation: &'static str, next: Vec<Notification>) -> PersistOutcome {
        if next == self.queue {
            return PersistOutcome::Unchanged;
        }
        self.queue = next;

        let repo = &mut self.repo;
        let queue = &self.queue;
        persist_best_effort("service", operation, || repo.replace_queue(queue))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        add_notification, mark_all_read, mark_read, reconcile_overdue, relative_time, remove,
        unread_count,
    };
    use crate::model::notification::{Notification, NotificationDraft, NotificationKind};
    use crate::model::task::{Task, TaskStatus};
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 4, 10, 0, 0).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn comment(n: usize) -> NotificationDraft {
        NotificationDraft::task_comment(&format!("T{n}"), &format!("task {n}"), "ada")
    }

    fn queue_of(len: usize) -> Vec<Notification> {
        let mut queue = Vec::new();
        for n in 0..len {
            queue = add_notification(&queue, comment(n), now(), 100).unwrap();
        }
        queue
    }

    #[test]
    fn add_prepends_unread_and_evicts_oldest_at_cap() {
        let queue = queue_of(50);
        let oldest = queue.last().unwrap().id;

        let next = add_notification(&queue, comment(99), now(), 50).unwrap();

        assert_eq!(next.len(), 50);
        assert_eq!(next[0].task_id.as_deref(), Some("T99"));
        assert!(!next[0].read);
        assert_eq!(next[0].timestamp, now());
        assert!(next.iter().all(|notification| notification.id != oldest));
        assert_eq!(next[1].id, queue[0].id);
    }

    #[test]
    fn add_rejects_deadline_kind_without_task() {
        let draft = NotificationDraft::new(NotificationKind::TaskDueSoon, "Task Due Soon", "soon");
        assert!(add_notification(&[], draft, now(), 50).is_err());
    }

    #[test]
    fn mark_read_touches_only_target_and_ignores_absent_ids() {
        let queue = queue_of(3);
        let target = queue[1].id;

        let next = mark_read(&queue, target);
        assert!(next[1].read);
        assert!(!next[0].read && !next[2].read);
        assert_eq!(unread_count(&next), 2);

        assert_eq!(mark_read(&next, target), next);
        assert_eq!(mark_read(&queue, Uuid::new_v4()), queue);
    }

    #[test]
    fn mark_all_read_is_idempotent() {
        let queue = queue_of(4);
        let once = mark_all_read(&queue);
        let twice = mark_all_read(&once);

        assert_eq!(once, twice);
        assert_eq!(unread_count(&once), 0);
    }

    #[test]
    fn remove_preserves_order_and_ignores_absent_ids() {
        let queue = queue_of(3);

        let next = remove(&queue, queue[1].id);
        assert_eq!(next, vec![queue[0].clone(), queue[2].clone()]);
        assert_eq!(remove(&next, Uuid::new_v4()), next);
    }

    #[test]
    fn overdue_message_counts_whole_days() {
        let tasks = vec![Task::new("T1", "Quarterly report", TaskStatus::Pending).due_on(date(1))];

        let drafts = reconcile_overdue(&tasks, &[], now());

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].kind, NotificationKind::TaskOverdue);
        assert_eq!(drafts[0].task_id.as_deref(), Some("T1"));
        assert!(drafts[0].message.contains("is overdue by 3 days"));
    }

    #[test]
    fn overdue_by_one_day_is_singular() {
        let tasks = vec![Task::new("T1", "Payroll", TaskStatus::InProgress).due_on(date(3))];

        let drafts = reconcile_overdue(&tasks, &[], now());

        assert!(drafts[0].message.ends_with("is overdue by 1 day"));
    }

    #[test]
    fn due_today_is_due_soon_and_future_or_completed_tasks_are_skipped() {
        let tasks = vec![
            Task::new("T1", "today", TaskStatus::Pending).due_on(date(4)),
            Task::new("T2", "tomorrow", TaskStatus::Pending).due_on(date(5)),
            Task::new("T3", "done", TaskStatus::Completed).due_on(date(1)),
            Task::new("T4", "no deadline", TaskStatus::Pending),
        ];

        let drafts = reconcile_overdue(&tasks, &[], now());

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].kind, NotificationKind::TaskDueSoon);
        assert_eq!(drafts[0].task_id.as_deref(), Some("T1"));
    }

    #[test]
    fn dedup_is_same_day_only() {
        let tasks = vec![Task::new("T1", "late", TaskStatus::Pending).due_on(date(1))];

        let first = reconcile_overdue(&tasks, &[], now());
        let queue = add_notification(&[], first[0].clone(), now(), 50).unwrap();

        let later_today = now() + Duration::hours(13);
        assert!(reconcile_overdue(&tasks, &queue, later_today).is_empty());

        let next_day = now() + Duration::days(1);
        let again = reconcile_overdue(&tasks, &queue, next_day);
        assert_eq!(again.len(), 1);
        assert!(again[0].message.contains("is overdue by 4 days"));
    }

    #[test]
    fn dedup_keys_on_kind_and_task() {
        let tasks = vec![
            Task::new("T1", "late", TaskStatus::Pending).due_on(date(1)),
            Task::new("T2", "also late", TaskStatus::Pending).due_on(date(2)),
        ];
        let due_soon_for_t1 = NotificationDraft::new(
            NotificationKind::TaskDueSoon,
            "Task Due Soon",
            "due today",
        )
        .with_task("T1");
        let overdue_for_t2 = NotificationDraft::new(
            NotificationKind::TaskOverdue,
            "Task Overdue",
            "late",
        )
        .with_task("T2");
        let queue = add_notification(&[], due_soon_for_t1, now(), 50).unwrap();
        let queue = add_notification(&queue, overdue_for_t2, now(), 50).unwrap();

        let drafts = reconcile_overdue(&tasks, &queue, now());

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].task_id.as_deref(), Some("T1"));
        assert_eq!(drafts[0].kind, NotificationKind::TaskOverdue);
    }

    #[test]
    fn repeated_task_in_one_sweep_emits_once_and_order_is_preserved() {
        let tasks = vec![
            Task::new("T2", "b", TaskStatus::Pending).due_on(date(4)),
            Task::new("T1", "a", TaskStatus::Pending).due_on(date(2)),
            Task::new("T2", "b", TaskStatus::Pending).due_on(date(4)),
        ];

        let drafts = reconcile_overdue(&tasks, &[], now());

        let ids = drafts
            .iter()
            .map(|draft| draft.task_id.as_deref().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["T2", "T1"]);
    }

    #[test]
    fn relative_time_boundaries() {
        let now = now();
        assert_eq!(relative_time(now - Duration::seconds(45), now), "just now");
        assert_eq!(relative_time(now - Duration::seconds(59), now), "just now");
        assert_eq!(relative_time(now - Duration::seconds(60), now), "1m ago");
        assert_eq!(relative_time(now - Duration::seconds(90), now), "1m ago");
        assert_eq!(relative_time(now - Duration::minutes(60), now), "1h ago");
        assert_eq!(relative_time(now - Duration::hours(23), now), "23h ago");
        assert_eq!(relative_time(now - Duration::days(2), now), "2d ago");
        assert_eq!(relative_time(now - Duration::days(7), now), "12/28/2023");
        assert_eq!(relative_time(now + Duration::minutes(5), now), "just now");
    }
}
