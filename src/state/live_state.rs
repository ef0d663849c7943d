// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Locally observed kiosk state.

use crate::device::Position;
use crate::types::Volume;

use super::StateChange;

/// Current state of the kiosk as seen by the bridge.
///
/// Owned by the synchronization engine; it is the only writer. Changes go
/// through [`apply`](Self::apply), which reports whether anything changed so
/// that level-triggered channels publish once per transition.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveState {
    motion_detected: bool,
    plugged_in: bool,
    screensaver_on: bool,
    media_playing: bool,
    battery_level: u8,
    screen_brightness: u8,
    screen_on: bool,
    volume: Volume,
    media_content_id: Option<String>,
    last_known_position: Option<Position>,
}

impl LiveState {
    /// Creates the startup state: nothing detected, screen on, full volume.
    #[must_use]
    pub fn new() -> Self {
        Self {
            motion_detected: false,
            plugged_in: false,
            screensaver_on: false,
            media_playing: false,
            battery_level: 0,
            screen_brightness: 0,
            screen_on: true,
            volume: Volume::default(),
            media_content_id: None,
            last_known_position: None,
        }
    }

    /// Applies a change.
    ///
    /// Returns `true` if the state actually changed.
    pub fn apply(&mut self, change: &StateChange) -> bool {
        match change {
            StateChange::Motion(on) => replace(&mut self.motion_detected, *on),
            StateChange::Plugged(on) => replace(&mut self.plugged_in, *on),
            StateChange::Screensaver(on) => replace(&mut self.screensaver_on, *on),
            StateChange::MediaPlaying(on) => replace(&mut self.media_playing, *on),
            StateChange::MediaContent(id) => {
                replace(&mut self.media_content_id, Some(id.clone()))
            }
            StateChange::Volume(volume) => replace(&mut self.volume, *volume),
            StateChange::Brightness(level) => replace(&mut self.screen_brightness, *level),
            StateChange::ScreenOn(on) => replace(&mut self.screen_on, *on),
            StateChange::BatteryLevel(level) => replace(&mut self.battery_level, *level),
            StateChange::Position(position) => {
                replace(&mut self.last_known_position, Some(*position))
            }
            StateChange::Snapshot(snapshot) => {
                let battery = replace(&mut self.battery_level, snapshot.battery_level);
                let brightness = replace(&mut self.screen_brightness, snapshot.screen_brightness);
                let screen = replace(&mut self.screen_on, snapshot.screen_on);
                battery || brightness || screen
            }
        }
    }

    /// Returns `true` while motion is reported.
    #[must_use]
    pub fn motion_detected(&self) -> bool {
        self.motion_detected
    }

    /// Returns `true` while external power is connected.
    #[must_use]
    pub fn plugged_in(&self) -> bool {
        self.plugged_in
    }

    /// Returns `true` while the screensaver runs.
    #[must_use]
    pub fn screensaver_on(&self) -> bool {
        self.screensaver_on
    }

    /// Returns `true` while media plays.
    #[must_use]
    pub fn media_playing(&self) -> bool {
        self.media_playing
    }

    /// Returns the battery level in percent.
    #[must_use]
    pub fn battery_level(&self) -> u8 {
        self.battery_level
    }

    /// Returns the screen brightness (0-255).
    #[must_use]
    pub fn screen_brightness(&self) -> u8 {
        self.screen_brightness
    }

    /// Returns `true` while the screen is on.
    #[must_use]
    pub fn screen_on(&self) -> bool {
        self.screen_on
    }

    /// Returns the playback volume.
    #[must_use]
    pub fn volume(&self) -> Volume {
        self.volume
    }

    /// Returns the last media source played.
    #[must_use]
    pub fn media_content_id(&self) -> Option<&str> {
        self.media_content_id.as_deref()
    }

    /// Returns the last geolocation fix.
    #[must_use]
    pub fn last_known_position(&self) -> Option<Position> {
        self.last_known_position
    }
}

impl Default for LiveState {
    fn default() -> Self {
        Self::new()
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}
