//! Core use-case services.
//!
//! # Responsibility
//! - Hold the pure attendance and notification derivations.
//! - Wrap them in trackers that own the in-memory snapshot and persist
//!   through repository contracts.
//!
//! # Invariants
//! - Pure functions never read the wall clock or touch storage.
//! - Every tracker mutation applies in memory even when persistence fails.

pub mod attendance_service;
pub mod notification_service;
pub mod persist;
