// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-channel decay timers.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::state::Channel;

/// Capacity of the timer expiry channel.
const FIRED_CHANNEL_CAPACITY: usize = 16;

/// Expiry notice posted back to the bridge loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    /// Channel the timer was scheduled for.
    pub channel: Channel,
    /// Generation of the timer at scheduling time.
    pub generation: u64,
}

#[derive(Debug)]
struct PendingTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

/// At most one pending timer per channel.
///
/// Each timer is a small sleeper task that posts a [`TimerFired`] when it
/// elapses. Scheduling a channel aborts the previous timer for it, and an
/// expiry only counts if its generation is still the current one, so a timer
/// that fired concurrently with its replacement is discarded.
///
/// Must be used inside a tokio runtime.
#[derive(Debug)]
pub struct DecayTimers {
    tx: mpsc::Sender<TimerFired>,
    pending: HashMap<Channel, PendingTimer>,
    next_generation: u64,
}

impl DecayTimers {
    /// Creates an empty timer set and the receiver its expiries arrive on.
    #[must_use]
    pub fn new() -> (Self, mpsc::Receiver<TimerFired>) {
        let (tx, rx) = mpsc::channel(FIRED_CHANNEL_CAPACITY);
        let timers = Self {
            tx,
            pending: HashMap::new(),
            next_generation: 0,
        };
        (timers, rx)
    }

    /// Schedules a timer for the channel, replacing any pending one.
    ///
    /// Returns the generation of the new timer.
    pub fn schedule(&mut self, channel: Channel, after: Duration) -> u64 {
        self.cancel(channel);

        self.next_generation += 1;
        let generation = self.next_generation;
        let tx = self.tx.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            // Receiver gone means the bridge stopped
            let _ = tx.send(TimerFired { channel, generation }).await;
        });

        tracing::trace!(%channel, generation, delay = ?after, "Scheduled decay timer");
        self.pending
            .insert(channel, PendingTimer { generation, handle });
        generation
    }

    /// Cancels the pending timer for the channel.
    ///
    /// Returns `true` if a timer was pending.
    pub fn cancel(&mut self, channel: Channel) -> bool {
        match self.pending.remove(&channel) {
            Some(timer) => {
                timer.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Consumes an expiry notice.
    ///
    /// Returns `true` if the notice belongs to the channel's current timer,
    /// which is then cleared. Stale notices return `false`.
    pub fn take_if_current(&mut self, fired: TimerFired) -> bool {
        let current = self
            .pending
            .get(&fired.channel)
            .is_some_and(|timer| timer.generation == fired.generation);
        if current {
            self.pending.remove(&fired.channel);
        }
        current
    }

    /// Returns `true` if a timer is pending for the channel.
    #[must_use]
    pub fn is_pending(&self, channel: Channel) -> bool {
        self.pending.contains_key(&channel)
    }

    /// Cancels every pending timer.
    pub fn cancel_all(&mut self) {
        for (_, timer) in self.pending.drain() {
            timer.handle.abort();
        }
    }
}

impl Drop for DecayTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
