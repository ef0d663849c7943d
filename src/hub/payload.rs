// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound entity state record.

use serde::Serialize;

/// State written to one hub entity.
///
/// Every payload carries the full set of kiosk attributes, whichever
/// channel it was built for, so the hub always sees current ambient values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatePayload {
    /// Entity state, e.g. `on`, `off`, `playing`, `idle`.
    pub state: String,
    /// Light brightness (0-255), only for the screensaver entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    /// Kiosk attributes.
    pub attributes: StateAttributes,
}

/// Kiosk attributes attached to every payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateAttributes {
    /// Playback volume (0.0-1.0).
    pub volume_level: f64,
    /// Last media played.
    pub media_content_id: Option<String>,
    /// IPv4 address of the kiosk.
    pub address: String,
    /// Hardware address of the kiosk.
    pub mac_address: String,
    /// Hardware serial number.
    pub serial_number: String,
    /// Kiosk application device id.
    pub device_id: String,
    /// Battery charge in percent.
    pub battery_level: u8,
    /// Screen brightness (0-255).
    pub screen_brightness: u8,
    /// Latitude of the last geolocation fix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Longitude of the last geolocation fix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Whether the screen is on.
    #[serde(rename = "_isScreenOn")]
    pub is_screen_on: bool,
    /// Whether external power is connected.
    #[serde(rename = "_isPluggedIn")]
    pub is_plugged_in: bool,
    /// Whether motion is currently detected.
    #[serde(rename = "_isMotionDetected")]
    pub is_motion_detected: bool,
    /// Whether the screensaver is running.
    #[serde(rename = "_isScreensaverOn")]
    pub is_screensaver_on: bool,
}
