//! Domain model for attendance, notification and task data.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep validation rules next to the shapes they protect.
//!
//! # Invariants
//! - At most one attendance record exists per `(employee_id, date)`.
//! - Every notification is identified by a stable `NotificationId`.
//! - Tasks are read-only inputs; core never mutates them.

pub mod attendance;
pub mod notification;
pub mod task;
