// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes for queue entities.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

/// Define a string-backed identifier newtype.
///
/// Generates `new()` for wrapping an existing string, `as_str()`,
/// `Display`, `From<String>`, `From<&str>`, `PartialEq<str>`,
/// `PartialEq<&str>`, and `Borrow<str>` implementations. Fresh-id
/// generation is type-specific and implemented per type.
macro_rules! declare_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap an existing identifier string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the string value of this identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

declare_id! {
    /// Unique identifier for an agent execution.
    pub struct ExecutionId;
}

declare_id! {
    /// Unique identifier for a model-inference task.
    pub struct TaskId;
}

declare_id! {
    /// Transient claim token a worker holds over a leased job row.
    pub struct LeaseId;
}

impl ExecutionId {
    /// Generate a fresh, time-ordered execution id.
    ///
    /// UUIDv7 sorts lexicographically by creation time, so among
    /// equal-priority rows the id itself is a FIFO tie-break.
    pub fn generate() -> Self {
        Self(format!("exec-{}", Uuid::now_v7().simple()))
    }
}

impl TaskId {
    /// Generate a fresh, time-ordered task id.
    pub fn generate() -> Self {
        Self(format!("task-{}", Uuid::now_v7().simple()))
    }
}

impl LeaseId {
    /// Generate a fresh random lease token.
    pub fn generate() -> Self {
        Self(nanoid::nanoid!())
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
