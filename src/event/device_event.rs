// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Kiosk hardware event types.

/// Hardware events emitted by a kiosk.
///
/// Each physical occurrence is delivered exactly once. Motion events are
/// rate-limited by the kiosk to at most one per second.
///
/// # Examples
///
/// ```
/// use kiosk_sync::event::{DeviceEvent, PowerSource};
///
/// let event = DeviceEvent::Plugged(PowerSource::Ac);
/// assert_eq!(event.name(), "pluggedAC");
/// assert_eq!(DeviceEvent::from_name("onMotion"), Some(DeviceEvent::Motion));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// The screen turned on.
    ScreenOn,
    /// The screen turned off.
    ScreenOff,
    /// The network connection was lost.
    NetworkDisconnect,
    /// The network connection came back.
    NetworkReconnect,
    /// Internet access was lost.
    InternetDisconnect,
    /// Internet access came back.
    InternetReconnect,
    /// External power was removed.
    Unplugged,
    /// External power was connected.
    Plugged(PowerSource),
    /// The screensaver started.
    ScreensaverStart,
    /// The screensaver stopped.
    ScreensaverStop,
    /// The battery level changed.
    BatteryLevelChanged(u8),
    /// The camera detected motion.
    Motion,
    /// The device itself was moved.
    Movement,
    /// A beacon came into range.
    BeaconProximity {
        /// Beacon UUID.
        uuid: String,
        /// Beacon major number.
        major: u16,
        /// Beacon minor number.
        minor: u16,
        /// Estimated distance in meters.
        distance: f64,
    },
}

/// Kind of external power.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerSource {
    /// Wall charger.
    Ac,
    /// USB port.
    Usb,
    /// Connected, but the kiosk did not say how.
    Unknown,
}

impl DeviceEvent {
    /// Returns the kiosk's name for this event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ScreenOn => "screenOn",
            Self::ScreenOff => "screenOff",
            Self::NetworkDisconnect => "networkDisconnect",
            Self::NetworkReconnect => "networkReconnect",
            Self::InternetDisconnect => "internetDisconnect",
            Self::InternetReconnect => "internetReconnect",
            Self::Unplugged => "unplugged",
            Self::Plugged(PowerSource::Ac) => "pluggedAC",
            Self::Plugged(PowerSource::Usb) => "pluggedUSB",
            Self::Plugged(PowerSource::Unknown) => "plugged",
            Self::ScreensaverStart => "onScreensaverStart",
            Self::ScreensaverStop => "onScreensaverStop",
            Self::BatteryLevelChanged(_) => "onBatteryLevelChanged",
            Self::Motion => "onMotion",
            Self::Movement => "onMovement",
            Self::BeaconProximity { .. } => "onIBeacon",
        }
    }

    /// Parses a parameterless event from the kiosk's event name.
    ///
    /// Events that carry data (battery level, beacons) return `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let event = match name {
            "screenOn" => Self::ScreenOn,
            "screenOff" => Self::ScreenOff,
            "networkDisconnect" => Self::NetworkDisconnect,
            "networkReconnect" => Self::NetworkReconnect,
            "internetDisconnect" => Self::InternetDisconnect,
            "internetReconnect" => Self::InternetReconnect,
            "unplugged" => Self::Unplugged,
            "pluggedAC" => Self::Plugged(PowerSource::Ac),
            "pluggedUSB" => Self::Plugged(PowerSource::Usb),
            "plugged" | "pluggedWireless" => Self::Plugged(PowerSource::Unknown),
            "onScreensaverStart" => Self::ScreensaverStart,
            "onScreensaverStop" => Self::ScreensaverStop,
            "onMotion" => Self::Motion,
            "onMovement" => Self::Movement,
            _ => return None,
        };
        Some(event)
    }

    /// Returns `true` for events that change connectivity.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::NetworkDisconnect
                | Self::NetworkReconnect
                | Self::InternetDisconnect
                | Self::InternetReconnect
        )
    }
}
