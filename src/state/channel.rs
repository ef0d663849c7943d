// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tracked state dimensions.

use std::fmt;

use crate::config::EntityMap;

/// One of the state dimensions mirrored to the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Camera motion, time-bounded by a decay timer.
    Motion,
    /// External power.
    Plug,
    /// Screensaver, mirrored as a light.
    Screensaver,
    /// Media playback.
    Media,
}

impl Channel {
    /// All channels, in publication order.
    pub const ALL: [Self; 4] = [Self::Motion, Self::Plug, Self::Screensaver, Self::Media];

    /// Channels refreshed alongside motion decay.
    pub const REFRESHED: [Self; 3] = [Self::Plug, Self::Screensaver, Self::Media];

    /// Returns the hub entity mapped to this channel, if any.
    #[must_use]
    pub fn entity<'a>(&self, entities: &'a EntityMap) -> Option<&'a str> {
        match self {
            Self::Motion => entities.motion_sensor.as_deref(),
            Self::Plug => entities.plug_sensor.as_deref(),
            Self::Screensaver => entities.screensaver.as_deref(),
            Self::Media => entities.media_player.as_deref(),
        }
    }

    /// Returns the channel name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Motion => "motion",
            Self::Plug => "plug",
            Self::Screensaver => "screensaver",
            Self::Media => "media",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a channel is in its publication cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelPhase {
    /// Reported `off` (or not yet reported).
    #[default]
    Idle,
    /// Reported `on`.
    Active,
    /// A publish is in flight.
    Publishing,
}
