// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hub-engine: scheduling engine over the durable store.
//!
//! Hosts the in-process pieces: the event hub, the cancellation
//! registry, the enqueue service, the two worker loops, and the aging
//! loop, plus the contracts the external agent executor and model
//! runner plug into.

pub mod aging;
pub mod cancel;
pub mod contract;
pub mod emit;
pub mod enqueue;
mod error;
pub mod hub;
mod runtime;
pub mod worker;

pub use aging::run_aging;
pub use cancel::CancelRegistry;
pub use contract::{
    AgentExecutor, ChatOutcome, ConfigLoader, GraphContext, LoopbackExecutor, LoopbackRunner,
    ModelRunner, RunError, StaticConfigLoader,
};
pub use emit::NodeEmitter;
pub use enqueue::{EnqueueExecution, EnqueueInference};
pub use error::EngineError;
pub use hub::EventHub;
pub use runtime::{Engine, RecoveryReport};
pub use worker::{
    AgentWorker, InferenceWorker, DEFAULT_POLL_INTERVAL, EXECUTION_LEASE_TTL_MS,
    INFERENCE_LEASE_TTL_MS,
};
