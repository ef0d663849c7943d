// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Discrete changes to the kiosk's live state.

use crate::device::{DeviceSnapshot, Position};
use crate::types::Volume;

use super::Channel;

/// A change to [`LiveState`](super::LiveState).
///
/// Hardware events and successful commands are both expressed as changes,
/// so the engine applies them through one path.
///
/// # Examples
///
/// ```
/// use kiosk_sync::state::{Channel, LiveState, StateChange};
///
/// let mut state = LiveState::new();
///
/// assert!(state.apply(&StateChange::Screensaver(true)));
/// assert!(!state.apply(&StateChange::Screensaver(true)));
/// assert_eq!(StateChange::Screensaver(true).channel(), Some(Channel::Screensaver));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    /// Motion detected or decayed.
    Motion(bool),
    /// External power connected or removed.
    Plugged(bool),
    /// Screensaver started or stopped.
    Screensaver(bool),
    /// Playback started or paused.
    MediaPlaying(bool),
    /// A new media source started playing.
    MediaContent(String),
    /// Playback volume changed.
    Volume(Volume),
    /// Screen brightness changed.
    Brightness(u8),
    /// Screen turned on or off.
    ScreenOn(bool),
    /// Battery level changed.
    BatteryLevel(u8),
    /// New geolocation fix.
    Position(Position),
    /// Fresh sample of the ambient hardware state.
    Snapshot(DeviceSnapshot),
}

impl StateChange {
    /// Returns the channel whose published state this change affects.
    ///
    /// Ambient attributes (battery, screen, position) ride along with any
    /// publish and return `None`.
    #[must_use]
    pub fn channel(&self) -> Option<Channel> {
        match self {
            Self::Motion(_) => Some(Channel::Motion),
            Self::Plugged(_) => Some(Channel::Plug),
            Self::Screensaver(_) | Self::Brightness(_) => Some(Channel::Screensaver),
            Self::MediaPlaying(_) | Self::MediaContent(_) | Self::Volume(_) => Some(Channel::Media),
            Self::ScreenOn(_) | Self::BatteryLevel(_) | Self::Position(_) | Self::Snapshot(_) => {
                None
            }
        }
    }
}
