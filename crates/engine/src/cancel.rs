// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-local registry of cancellation handles for in-flight jobs.
//!
//! Cancellation is cooperative: the API layer signals the token, the
//! executor or runner observes it at its next checkpoint. There is no
//! forcible interrupt, and a durable CANCEL_REQUESTED row covers jobs
//! not running in this process.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Map from job id to the cancellation token its worker handed out.
#[derive(Clone, Default)]
pub struct CancelRegistry {
    inner: Arc<Mutex<HashMap<String, CancellationToken>>>,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a fresh token for a job about to run.
    /// A worker registers before invoking the executor and unregisters
    /// after finalization.
    pub fn register(&self, job_id: &str) -> CancellationToken {
        let token = CancellationToken::new();
        self.inner.lock().insert(job_id.to_string(), token.clone());
        token
    }

    /// Signal the job's token if it is running locally. Returns whether
    /// a token was found.
    pub fn signal(&self, job_id: &str) -> bool {
        match self.inner.lock().get(job_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn unregister(&self, job_id: &str) {
        self.inner.lock().remove(job_id);
    }

    /// Number of registered in-flight jobs.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
