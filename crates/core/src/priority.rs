// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Priority policy: base priorities by job source and anti-starvation aging.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Upper bound aging can lift a priority to. Chosen so a long-waiting
/// trigger job can overtake internal agent→agent work (50) but never
/// pre-empt a manual run (70) or interactive chat (90).
pub const AGING_CAP: i64 = 65;

/// Priority boost applied per aging tick. Coarse on purpose; the
/// `enqueue_ts` tie-break handles fine ordering among equals.
pub const AGING_BOOST: i64 = 10;

/// How long a job must sit PENDING before aging starts lifting it.
pub const AGING_THRESHOLD_MS: i64 = 300_000;

/// Period of the aging loop.
pub const AGING_INTERVAL: Duration = Duration::from_secs(60);

/// Where a job came from. Determines its base priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobSource {
    /// Interactive chat request.
    Chat,
    /// Explicit "run now" from a user.
    ManualRun,
    /// Spawned by another execution (agent→agent).
    InternalNode,
    /// Scheduled trigger or webhook.
    Trigger,
}

impl JobSource {
    /// Base priority for jobs from this source.
    pub fn base_priority(&self) -> i64 {
        match self {
            JobSource::Chat => 90,
            JobSource::ManualRun => 70,
            JobSource::InternalNode => 50,
            JobSource::Trigger => 30,
        }
    }
}

impl fmt::Display for JobSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobSource::Chat => "CHAT",
            JobSource::ManualRun => "MANUAL_RUN",
            JobSource::InternalNode => "INTERNAL_NODE",
            JobSource::Trigger => "TRIGGER",
        };
        write!(f, "{s}")
    }
}

/// Priority assigned at enqueue time.
///
/// A child is never scheduled below its parent, but an explicit user
/// source always anchors its own floor.
pub fn effective_priority(source: JobSource, parent_priority: Option<i64>) -> i64 {
    let base = source.base_priority();
    match parent_priority {
        Some(parent) => base.max(parent),
        None => base,
    }
}

#[cfg(test)]
#[path = "priority_tests.rs"]
mod tests;
