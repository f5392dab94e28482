// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job status state machine shared by both queues.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Lifecycle status of a queued job (execution or inference task).
///
/// `Pending` and `CancelRequested`-without-a-lease are schedulable or
/// reapable; `Running` (and `CancelRequested` while a worker winds down)
/// are leased; the remaining three are terminal and immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    CancelRequested,
    Completed,
    Failed,
    Canceled,
}

impl JobStatus {
    /// Stable string form, as persisted in the status column.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::CancelRequested => "CANCEL_REQUESTED",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Canceled => "CANCELED",
        }
    }

    /// Parse the persisted string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(JobStatus::Pending),
            "RUNNING" => Some(JobStatus::Running),
            "CANCEL_REQUESTED" => Some(JobStatus::CancelRequested),
            "COMPLETED" => Some(JobStatus::Completed),
            "FAILED" => Some(JobStatus::Failed),
            "CANCELED" => Some(JobStatus::Canceled),
            _ => None,
        }
    }

    /// Check whether this status is terminal (no field mutates after it).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Canceled
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal disposition a worker writes exactly once per leased job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed { result: Value },
    Failed { error: String },
    Canceled,
}

impl JobOutcome {
    /// The terminal status this outcome finalizes to.
    pub fn status(&self) -> JobStatus {
        match self {
            JobOutcome::Completed { .. } => JobStatus::Completed,
            JobOutcome::Failed { .. } => JobStatus::Failed,
            JobOutcome::Canceled => JobStatus::Canceled,
        }
    }

    /// Result blob to persist, if any.
    pub fn result(&self) -> Option<&Value> {
        match self {
            JobOutcome::Completed { result } => Some(result),
            _ => None,
        }
    }

    /// Error log to persist, if any.
    pub fn error_log(&self) -> Option<&str> {
        match self {
            JobOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
