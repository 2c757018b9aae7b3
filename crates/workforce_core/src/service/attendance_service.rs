//! Attendance session tracking.
//!
//! # Responsibility
//! - Derive today's check-in state and elapsed duration for an employee.
//! - Apply check-in/check-out transitions to the record set.
//! - Keep an in-memory record snapshot and persist it best-effort.
//!
//! # Invariants
//! - `derive_session` is pure: same inputs, same output, inputs untouched.
//! - A record never gets a second check-in or a second check-out.
//! - `check_out >= check_in` for every record these operations produce,
//!   even if the clock steps backwards.

use crate::clock::Clock;
use crate::model::attendance::{
    AttendanceRecord, AttendanceSession, AttendanceValidationError,
};
use crate::repo::attendance_repo::AttendanceRepository;
use crate::repo::RepoResult;
use crate::service::persist::{persist_best_effort, PersistOutcome};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejected attendance transition. No state changes when returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceError {
    AlreadyCheckedIn { employee_id: String, date: NaiveDate },
    NotCheckedIn { employee_id: String, date: NaiveDate },
    AlreadyCheckedOut { employee_id: String, date: NaiveDate },
    Invalid(AttendanceValidationError),
}

impl Display for AttendanceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyCheckedIn { employee_id, date } => {
                write!(f, "employee `{employee_id}` already checked in on {date}")
            }
            Self::NotCheckedIn { employee_id, date } => {
                write!(f, "employee `{employee_id}` has not checked in on {date}")
            }
            Self::AlreadyCheckedOut { employee_id, date } => {
                write!(f, "employee `{employee_id}` already checked out on {date}")
            }
            Self::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AttendanceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AttendanceValidationError> for AttendanceError {
    fn from(value: AttendanceValidationError) -> Self {
        Self::Invalid(value)
    }
}

impl AttendanceError {
    fn code(&self) -> &'static str {
        match self {
            Self::AlreadyCheckedIn { .. } => "already_checked_in",
            Self::NotCheckedIn { .. } => "not_checked_in",
            Self::AlreadyCheckedOut { .. } => "already_checked_out",
            Self::Invalid(_) => "invalid_record",
        }
    }
}

/// Derives today's session for `employee_id` at `now`.
///
/// Only the record keyed on the UTC calendar day of `now` is considered; a
/// check-in left open on an earlier day does not count as checked in.
pub fn derive_session(
    records: &[AttendanceRecord],
    employee_id: &str,
    now: DateTime<Utc>,
) -> AttendanceSession {
    let today = now.date_naive();
    let Some(record) = records.iter().find(|record| record.is_for(employee_id, today)) else {
        return AttendanceSession::idle();
    };

    match (record.check_in, record.check_out) {
        (Some(check_in), None) => AttendanceSession {
            is_checked_in: true,
            check_in_time: Some(check_in),
            elapsed_label: format_elapsed(now - check_in),
            worked_label: None,
        },
        (Some(check_in), Some(check_out)) => AttendanceSession {
            worked_label: Some(format_elapsed(check_out - check_in)),
            ..AttendanceSession::idle()
        },
        _ => AttendanceSession::idle(),
    }
}

/// Renders a duration as `"{h}h {m}m"` from one hour up, `"{m}m"` below.
///
/// Minutes are truncated; negative durations render as `"0m"`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_minutes = elapsed.num_minutes().max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Returns today's record with `check_in = now`.
///
/// # Errors
/// - `AlreadyCheckedIn` when today's record already has a check-in.
/// - `Invalid` when `employee_id` is blank.
pub fn check_in(
    records: &[AttendanceRecord],
    employee_id: &str,
    now: DateTime<Utc>,
) -> Result<AttendanceRecord, AttendanceError> {
    let today = now.date_naive();
    let mut record = records
        .iter()
        .find(|record| record.is_for(employee_id, today))
        .cloned()
        .unwrap_or_else(|| AttendanceRecord::new(employee_id, today));

    if record.check_in.is_some() {
        return Err(AttendanceError::AlreadyCheckedIn {
            employee_id: employee_id.to_string(),
            date: today,
        });
    }

    record.check_in = Some(now);
    record.validate()?;
    Ok(record)
}

/// Returns today's record with `check_out` set.
///
/// `check_out` is clamped to `check_in` so a backwards clock step can never
/// produce an inverted record.
///
/// # Errors
/// - `NotCheckedIn` when today has no check-in.
/// - `AlreadyCheckedOut` when today's record is already closed.
pub fn check_out(
    records: &[AttendanceRecord],
    employee_id: &str,
    now: DateTime<Utc>,
) -> Result<AttendanceRecord, AttendanceError> {
    let today = now.date_naive();
    let existing = records
        .iter()
        .find(|record| record.is_for(employee_id, today))
        .and_then(|record| record.check_in.map(|check_in_at| (record.clone(), check_in_at)));

    let Some((mut record, check_in_at)) = existing else {
        return Err(AttendanceError::NotCheckedIn {
            employee_id: employee_id.to_string(),
            date: today,
        });
    };

    if record.check_out.is_some() {
        return Err(AttendanceError::AlreadyCheckedOut {
            employee_id: employee_id.to_string(),
            date: today,
        });
    }

    record.check_out = Some(now.max(check_in_at));
    record.validate()?;
    Ok(record)
}

/// Result of an accepted check-in or check-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceUpdate {
    pub record: AttendanceRecord,
    pub persistence: PersistOutcome,
}

/// Stateful attendance tracker over a record store and a clock.
pub struct AttendanceTracker<R: AttendanceRepository, C: Clock> {
    repo: R,
    clock: C,
    records: Vec<AttendanceRecord>,
}

impl<R: AttendanceRepository, C: Clock> AttendanceTracker<R, C> {
    /// Loads the full record set from `repo`.
    pub fn try_init(repo: R, clock: C) -> RepoResult<Self> {
        let records = repo.load_records()?;
        info!(
            "event=attendance_init module=service status=ok records={}",
            records.len()
        );
        Ok(Self {
            repo,
            clock,
            records,
        })
    }

    /// In-memory record snapshot.
    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    /// Current session for `employee_id`, recomputed from the snapshot.
    pub fn session(&self, employee_id: &str) -> AttendanceSession {
        derive_session(&self.records, employee_id, self.clock.now())
    }

    /// Records for one employee, most recent day first.
    pub fn history(&self, employee_id: &str) -> Vec<&AttendanceRecord> {
        let mut history = self
            .records
            .iter()
            .filter(|record| record.employee_id == employee_id)
            .collect::<Vec<_>>();
        history.sort_by(|left, right| right.date.cmp(&left.date));
        history
    }

    pub fn check_in(&mut self, employee_id: &str) -> Result<AttendanceUpdate, AttendanceError> {
        let result = check_in(&self.records, employee_id, self.clock.now());
        self.commit("attendance_check_in", result)
    }

    pub fn check_out(&mut self, employee_id: &str) -> Result<AttendanceUpdate, AttendanceError> {
        let result = check_out(&self.records, employee_id, self.clock.now());
        self.commit("attendance_check_out", result)
    }

    fn commit(
        &mut self,
        operation: &'static str,
        result: Result<AttendanceRecord, AttendanceError>,
    ) -> Result<AttendanceUpdate, AttendanceError> {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                info!(
                    "event={operation} module=service status=rejected reason={}",
                    err.code()
                );
                return Err(err);
            }
        };

        match self
            .records
            .iter_mut()
            .find(|current| current.is_for(&record.employee_id, record.date))
        {
            Some(current) => *current = record.clone(),
            None => self.records.push(record.clone()),
        }

        let repo = &mut self.repo;
        let persistence = persist_best_effort("service", operation, || repo.upsert_record(&record));
        info!("event={operation} module=service status=ok date={}", record.date);

        Ok(AttendanceUpdate {
            record,
            persistence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{check_in, check_out, derive_session, format_elapsed, AttendanceError};
    use crate::model::attendance::AttendanceRecord;
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 4, hour, minute, 0).unwrap()
    }

    fn open_record(employee_id: &str, check_in_at: DateTime<Utc>) -> AttendanceRecord {
        let mut record = AttendanceRecord::new(employee_id, check_in_at.date_naive());
        record.check_in = Some(check_in_at);
        record
    }

    #[test]
    fn format_elapsed_switches_to_hours_at_sixty_minutes() {
        assert_eq!(format_elapsed(Duration::seconds(59)), "0m");
        assert_eq!(format_elapsed(Duration::minutes(59)), "59m");
        assert_eq!(format_elapsed(Duration::minutes(60)), "1h 0m");
        assert_eq!(format_elapsed(Duration::minutes(135)), "2h 15m");
        assert_eq!(format_elapsed(Duration::minutes(-5)), "0m");
    }

    #[test]
    fn derive_session_reports_open_check_in() {
        let records = vec![open_record("emp-1", at(9, 0))];

        let session = derive_session(&records, "emp-1", at(10, 30));

        assert!(session.is_checked_in);
        assert_eq!(session.check_in_time, Some(at(9, 0)));
        assert_eq!(session.elapsed_label, "1h 30m");
        assert_eq!(session.worked_label, None);
    }

    #[test]
    fn derive_session_is_pure() {
        let records = vec![open_record("emp-1", at(9, 0)), open_record("emp-2", at(8, 0))];
        let before = records.clone();

        let first = derive_session(&records, "emp-1", at(9, 45));
        let second = derive_session(&records, "emp-1", at(9, 45));

        assert_eq!(first, second);
        assert_eq!(records, before);
    }

    #[test]
    fn derive_session_ignores_other_days_and_employees() {
        let yesterday = Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap();
        let records = vec![open_record("emp-1", yesterday), open_record("emp-2", at(9, 0))];

        let session = derive_session(&records, "emp-1", at(10, 0));

        assert!(!session.is_checked_in);
        assert_eq!(session.check_in_time, None);
        assert!(session.elapsed_label.is_empty());
    }

    #[test]
    fn derive_session_reports_worked_time_after_check_out() {
        let mut record = open_record("emp-1", at(9, 0));
        record.check_out = Some(at(17, 20));

        let session = derive_session(&[record], "emp-1", at(18, 0));

        assert!(!session.is_checked_in);
        assert_eq!(session.worked_label.as_deref(), Some("8h 20m"));
    }

    #[test]
    fn check_in_rejects_second_check_in_without_changing_records() {
        let records = vec![open_record("emp-1", at(9, 0))];

        let err = check_in(&records, "emp-1", at(9, 5)).unwrap_err();

        assert_eq!(
            err,
            AttendanceError::AlreadyCheckedIn {
                employee_id: "emp-1".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            }
        );
        assert_eq!(records[0].check_in, Some(at(9, 0)));
    }

    #[test]
    fn check_in_fills_existing_empty_record() {
        let records = vec![AttendanceRecord::new("emp-1", at(0, 0).date_naive())];

        let record = check_in(&records, "emp-1", at(8, 55)).unwrap();

        assert_eq!(record.check_in, Some(at(8, 55)));
        assert_eq!(record.check_out, None);
    }

    #[test]
    fn check_in_rejects_blank_employee() {
        assert!(matches!(
            check_in(&[], " ", at(9, 0)),
            Err(AttendanceError::Invalid(_))
        ));
    }

    #[test]
    fn check_out_requires_check_in_and_rejects_repeat() {
        assert!(matches!(
            check_out(&[], "emp-1", at(17, 0)),
            Err(AttendanceError::NotCheckedIn { .. })
        ));

        let closed = check_out(&[open_record("emp-1", at(9, 0))], "emp-1", at(17, 0)).unwrap();
        assert_eq!(closed.check_out, Some(at(17, 0)));

        assert!(matches!(
            check_out(&[closed], "emp-1", at(17, 5)),
            Err(AttendanceError::AlreadyCheckedOut { .. })
        ));
    }

    #[test]
    fn check_out_never_precedes_check_in() {
        let records = vec![open_record("emp-1", at(9, 0))];

        let record = check_out(&records, "emp-1", at(8, 59)).unwrap();

        assert_eq!(record.check_out, Some(at(9, 0)));
        assert!(record.validate().is_ok());
    }
}
