// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store error type.

use thiserror::Error;

/// Errors surfaced by the durable store.
///
/// Transient `SQLITE_BUSY` contention is absorbed by the connection's
/// busy timeout and never reaches callers; what does arrive here is a
/// real failure of the in-flight operation (the row itself stays in a
/// safe state).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}
