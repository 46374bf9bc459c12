//! Task lifecycle.
//!
//! ```text
//! PENDING ──claim──▶ IN_PROGRESS ──ok──▶ COMPLETED
//!                         │
//!                         └──error──▶ FLAGGED
//! ```
//!
//! These are the only transitions the scheduler may perform. Manual verdicts
//! and requeues are direct writes on [`Task`](super::Task) and bypass this
//! table.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Awaiting analysis.
    Pending,
    /// Claimed by the scheduler, analysis call outstanding.
    InProgress,
    /// Analysis succeeded, or a reviewer supplied a verdict.
    Completed,
    /// Analysis failed.
    Flagged,
}

impl TaskStatus {
    /// Whether the scheduler may move a task from `self` to `next`.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::InProgress)
                | (TaskStatus::InProgress, TaskStatus::Completed)
                | (TaskStatus::InProgress, TaskStatus::Flagged)
        )
    }

    /// Terminal for the scheduler. Only an external requeue leaves these.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Flagged)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Flagged => "FLAGGED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
