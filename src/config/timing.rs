// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reporting cadence for the synchronization engine.

use std::time::Duration;

/// Decay and refresh intervals.
///
/// # Examples
///
/// ```
/// use kiosk_sync::config::SyncTiming;
/// use std::time::Duration;
///
/// let timing = SyncTiming::default().with_motion_decay(Duration::from_secs(3));
/// assert_eq!(timing.motion_decay(), Duration::from_secs(3));
/// assert_eq!(timing.idle_refresh(), SyncTiming::DEFAULT_IDLE_REFRESH);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTiming {
    motion_decay: Duration,
    idle_refresh: Duration,
}

impl SyncTiming {
    /// How long motion stays `on` after the last motion event.
    pub const DEFAULT_MOTION_DECAY: Duration = Duration::from_millis(5000);
    /// Interval of the consolidated refresh while no motion is seen.
    pub const DEFAULT_IDLE_REFRESH: Duration = Duration::from_millis(10_000);

    /// Creates the default timing.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            motion_decay: Self::DEFAULT_MOTION_DECAY,
            idle_refresh: Self::DEFAULT_IDLE_REFRESH,
        }
    }

    /// Sets the motion decay interval.
    #[must_use]
    pub const fn with_motion_decay(mut self, decay: Duration) -> Self {
        self.motion_decay = decay;
        self
    }

    /// Sets the idle refresh interval.
    #[must_use]
    pub const fn with_idle_refresh(mut self, refresh: Duration) -> Self {
        self.idle_refresh = refresh;
        self
    }

    /// Returns the motion decay interval.
    #[must_use]
    pub const fn motion_decay(&self) -> Duration {
        self.motion_decay
    }

    /// Returns the idle refresh interval.
    #[must_use]
    pub const fn idle_refresh(&self) -> Duration {
        self.idle_refresh
    }
}

impl Default for SyncTiming {
    fn default() -> Self {
        Self::new()
    }
}
