// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process pub/sub hub for per-job event channels.
//!
//! Topics are opaque strings (`execution:{id}`, `inference:{id}`); each
//! maps to a broadcast channel. Publishing is synchronous, so events on
//! one channel reach every subscriber in publish order. The hub is not
//! durable: events published with no subscriber are dropped, and the
//! node-event log remains the authoritative history for executions.

use hub_core::StreamEvent;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::broadcast;

/// Per-channel buffer size. A subscriber that lags further than this
/// observes a `Lagged` error instead of blocking the publisher.
const CHANNEL_CAPACITY: usize = 256;

/// Topic-keyed broadcast fan-out. Thread-safe; share via `Arc`.
pub struct EventHub {
    channels: Mutex<HashMap<String, broadcast::Sender<StreamEvent>>>,
    capacity: usize,
}

impl EventHub {
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { channels: Mutex::new(HashMap::new()), capacity }
    }

    /// Subscribe to a channel, creating it if needed. Dropping the
    /// returned receiver is the unsubscribe.
    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<StreamEvent> {
        let mut channels = self.channels.lock();
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Deliver an event to every current subscriber of a channel.
    /// Subscriber failures (lag, dropped receivers) never propagate to
    /// the publisher.
    pub fn publish(&self, channel: &str, event: StreamEvent) {
        let channels = self.channels.lock();
        match channels.get(channel) {
            Some(sender) => {
                if sender.send(event).is_err() {
                    tracing::trace!(channel, "event dropped: subscribers gone");
                }
            }
            None => tracing::trace!(channel, "event dropped: no channel"),
        }
    }

    /// Drop channels whose subscribers have all gone away.
    pub fn cleanup(&self) {
        let mut channels = self.channels.lock();
        channels.retain(|_, sender| sender.receiver_count() > 0);
    }

    #[cfg(test)]
    pub(crate) fn channel_count(&self) -> usize {
        self.channels.lock().len()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
