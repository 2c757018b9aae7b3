//! Attendance domain model.
//!
//! # Responsibility
//! - Define the stored per-day attendance record.
//! - Define the derived, never-persisted session view.
//!
//! # Invariants
//! - `date` is a UTC calendar day.
//! - `check_out` requires `check_in` and must not be earlier than it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable employee identifier supplied by the host application.
pub type EmployeeId = String;

/// One employee's attendance for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub employee_id: EmployeeId,
    /// UTC calendar day this record is keyed on.
    pub date: NaiveDate,
    pub check_in: Option<DateTime<Utc>>,
    /// Should be >= `check_in` when set.
    pub check_out: Option<DateTime<Utc>>,
}

/// Validation error for attendance record invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceValidationError {
    EmptyEmployeeId,
    CheckOutWithoutCheckIn,
    CheckOutBeforeCheckIn {
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    },
}

impl Display for AttendanceValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyEmployeeId => write!(f, "employee id cannot be empty"),
            Self::CheckOutWithoutCheckIn => write!(f, "check-out is set without a check-in"),
            Self::CheckOutBeforeCheckIn {
                check_in,
                check_out,
            } => write!(
                f,
                "check-out {} is earlier than check-in {}",
                check_out.to_rfc3339(),
                check_in.to_rfc3339()
            ),
        }
    }
}

impl Error for AttendanceValidationError {}

impl AttendanceRecord {
    /// Creates an empty record for one employee and day.
    pub fn new(employee_id: impl Into<EmployeeId>, date: NaiveDate) -> Self {
        Self {
            employee_id: employee_id.into(),
            date,
            check_in: None,
            check_out: None,
        }
    }

    /// Checks record-level invariants.
    ///
    /// Repository writes and reads both call this, so an invalid record can
    /// neither be stored nor silently loaded.
    pub fn validate(&self) -> Result<(), AttendanceValidationError> {
        if self.employee_id.trim().is_empty() {
            return Err(AttendanceValidationError::EmptyEmployeeId);
        }

        match (self.check_in, self.check_out) {
            (None, Some(_)) => Err(AttendanceValidationError::CheckOutWithoutCheckIn),
            (Some(check_in), Some(check_out)) if check_out < check_in => {
                Err(AttendanceValidationError::CheckOutBeforeCheckIn {
                    check_in,
                    check_out,
                })
            }
            _ => Ok(()),
        }
    }

    /// Returns whether this record belongs to `employee_id` on `date`.
    pub fn is_for(&self, employee_id: &str, date: NaiveDate) -> bool {
        self.employee_id == employee_id && self.date == date
    }

    /// True while a check-in exists without a matching check-out.
    pub fn is_open(&self) -> bool {
        self.check_in.is_some() && self.check_out.is_none()
    }
}

/// Derived check-in state for one employee at one instant.
///
/// Recomputed on every read; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSession {
    pub is_checked_in: bool,
    pub check_in_time: Option<DateTime<Utc>>,
    /// `"{h}h {m}m"` or `"{m}m"` while checked in, empty otherwise.
    pub elapsed_label: String,
    /// Worked duration once today's record is closed.
    pub worked_label: Option<String>,
}

impl AttendanceSession {
    /// Session for an employee without an open check-in today.
    pub fn idle() -> Self {
        Self {
            is_checked_in: false,
            check_in_time: None,
            elapsed_label: String::new(),
            worked_label: None,
        }
    }
}
