//! Best-effort persistence policy shared by the trackers.
//!
//! A failed write never rolls back the in-memory mutation; it is logged and
//! reported to the caller as a `PersistenceWarning`.

use crate::repo::RepoResult;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store write failure reported alongside an applied mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceWarning {
    /// Operation whose write failed, e.g. `notification_add`.
    pub operation: &'static str,
    pub message: String,
}

impl Display for PersistenceWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "failed to persist `{}` (in-memory state kept): {}",
            self.operation, self.message
        )
    }
}

impl Error for PersistenceWarning {}

/// Persistence result of one tracker mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum PersistOutcome {
    /// The store now mirrors the in-memory state.
    Saved,
    /// The mutation was a no-op; nothing was written.
    Unchanged,
    /// The write failed; the in-memory state is ahead of the store.
    Warning(PersistenceWarning),
}

impl PersistOutcome {
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning(_))
    }

    pub fn warning(&self) -> Option<&PersistenceWarning> {
        match self {
            Self::Warning(warning) => Some(warning),
            _ => None,
        }
    }
}

pub(crate) fn persist_best_effort(
    module: &'static str,
    operation: &'static str,
    write: impl FnOnce() -> RepoResult<()>,
) -> PersistOutcome {
    match write() {
        Ok(()) => {
            debug!("event=persist module={module} operation={operation} status=ok");
            PersistOutcome::Saved
        }
        Err(err) => {
            warn!(
                "event=persist_failed module={module} operation={operation} status=warn error={err}"
            );
            PersistOutcome::Warning(PersistenceWarning {
                operation,
                message: err.to_string(),
            })
        }
    }
}
