//! Attendance repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Load the full attendance record set.
//! - Insert or replace one `(employee_id, date)` record.
//!
//! # Invariants
//! - Write paths call `AttendanceRecord::validate()` before SQL mutations.
//! - `(employee_id, work_date)` is the primary key, so duplicates cannot exist.

use crate::model::attendance::AttendanceRecord;
use crate::repo::{ensure_table, from_epoch_ms, to_epoch_ms, RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

const RECORD_SELECT_SQL: &str = "SELECT
    employee_id,
    work_date,
    check_in_ms,
    check_out_ms
FROM attendance_records";

const WORK_DATE_FORMAT: &str = "%Y-%m-%d";

/// Record store for attendance data.
pub trait AttendanceRepository {
    /// Returns every stored record ordered by day, then employee.
    fn load_records(&self) -> RepoResult<Vec<AttendanceRecord>>;
    /// Gets one record by employee and day.
    fn get_record(&self, employee_id: &str, date: NaiveDate)
        -> RepoResult<Option<AttendanceRecord>>;
    /// Inserts the record or replaces the stored one for the same key.
    fn upsert_record(&mut self, record: &AttendanceRecord) -> RepoResult<()>;
}

/// SQLite-backed attendance repository.
pub struct SqliteAttendanceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAttendanceRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table(conn, "attendance_records")?;
        Ok(Self { conn })
    }
}

impl AttendanceRepository for SqliteAttendanceRepository<'_> {
    fn load_records(&self) -> RepoResult<Vec<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RECORD_SELECT_SQL} ORDER BY work_date ASC, employee_id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }
        Ok(records)
    }

    fn get_record(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> RepoResult<Option<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RECORD_SELECT_SQL}
             WHERE employee_id = ?1
               AND work_date = ?2;"
        ))?;
        let mut rows = stmt.query(params![employee_id, format_work_date(date)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_record_row(row)?));
        }
        Ok(None)
    }

    fn upsert_record(&mut self, record: &AttendanceRecord) -> RepoResult<()> {
        record.validate()?;

        self.conn.execute(
            "INSERT INTO attendance_records (
                employee_id,
                work_date,
                check_in_ms,
                check_out_ms
            ) VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (employee_id, work_date) DO UPDATE SET
                check_in_ms = excluded.check_in_ms,
                check_out_ms = excluded.check_out_ms,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                record.employee_id.as_str(),
                format_work_date(record.date),
                record.check_in.map(to_epoch_ms),
                record.check_out.map(to_epoch_ms),
            ],
        )?;

        Ok(())
    }
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<AttendanceRecord> {
    let date_text: String = row.get("work_date")?;
    let date = NaiveDate::parse_from_str(&date_text, WORK_DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date `{date_text}` in attendance_records.work_date"
        ))
    })?;

    let check_in = row
        .get::<_, Option<i64>>("check_in_ms")?
        .map(|ms| from_epoch_ms(ms, "attendance_records.check_in_ms"))
        .transpose()?;
    let check_out = row
        .get::<_, Option<i64>>("check_out_ms")?
        .map(|ms| from_epoch_ms(ms, "attendance_records.check_out_ms"))
        .transpose()?;

    let record = AttendanceRecord {
        employee_id: row.get("employee_id")?,
        date,
        check_in,
        check_out,
    };
    record.validate()?;
    Ok(record)
}

fn format_work_date(date: NaiveDate) -> String {
    date.format(WORK_DATE_FORMAT).to_string()
}
