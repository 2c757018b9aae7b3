//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `workforce_core` linkage and storage bootstrap end to end.
//! - Keep output deterministic by driving a fixed clock.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use std::process::ExitCode;
use workforce_core::db::open_db_in_memory;
use workforce_core::{
    AttendanceTracker, ManualClock, NotificationCenter, SqliteAttendanceRepository,
    SqliteNotificationRepository, Task, TaskStatus,
};

fn main() -> ExitCode {
    println!("workforce_core ping={}", workforce_core::ping());
    println!("workforce_core version={}", workforce_core::core_version());

    match smoke() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("workforce_core smoke run failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn smoke() -> Result<(), Box<dyn std::error::Error>> {
    let start = Utc
        .with_ymd_and_hms(2024, 1, 4, 9, 0, 0)
        .single()
        .ok_or("invalid smoke start time")?;
    let clock = ManualClock::new(start);
    let mut conn = open_db_in_memory()?;

    {
        let repo = SqliteAttendanceRepository::try_new(&conn)?;
        let mut tracker = AttendanceTracker::try_init(repo, clock.clone())?;
        tracker.check_in("smoke")?;
        clock.advance(Duration::minutes(75));
        println!("attendance elapsed={}", tracker.session("smoke").elapsed_label);
    }

    let repo = SqliteNotificationRepository::try_new(&mut conn)?;
    let mut center = NotificationCenter::try_init(repo, clock, 50)?;
    let due_date = NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("invalid smoke due date")?;
    let task = Task::new("smoke-task", "Smoke", TaskStatus::Pending).due_on(due_date);
    let report = center.sweep(&[task]);
    println!(
        "notifications added={} unread={}",
        report.added.len(),
        center.unread_count()
    );
    Ok(())
}
