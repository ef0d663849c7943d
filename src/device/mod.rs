// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Kiosk capability surface.
//!
//! The [`DeviceProvider`] trait is everything the bridge needs from the
//! kiosk: identity, a sample of the current hardware state, the actuators
//! that inbound commands drive, and a typed event stream.
//!
//! [`FullyKioskClient`] implements it over the Fully Kiosk Browser remote
//! admin REST API. Its hardware events come from polling, plus the kiosk's
//! MQTT push events (camera motion included) through
//! [`FullyEventStream`]. Embedders with direct access to the kiosk (for example a
//! JavaScript bridge) implement the trait themselves.
//!
//! ```no_run
//! use kiosk_sync::device::{DeviceProvider, FullyConfig, FullyKioskClient};
//!
//! # async fn example() -> kiosk_sync::Result<()> {
//! let kiosk = FullyKioskClient::new(FullyConfig::new("192.168.1.60").with_password("secret"))?;
//! let info = kiosk.device_info().await?;
//! println!("kiosk {} at {}", info.mac_address, info.ip4);
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "http")]
mod fully;

#[cfg(feature = "mqtt")]
mod fully_events;

#[cfg(feature = "http")]
pub use fully::{FullyConfig, FullyKioskClient};
#[cfg(feature = "mqtt")]
pub use fully_events::{FullyEventConfig, FullyEventStream};

use serde::Serialize;
use tokio::sync::broadcast;

use crate::error::Error;
use crate::event::DeviceEvent;
use crate::types::Volume;

/// Identifiers of the kiosk that do not change during a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Hardware (MAC) address, as reported by the kiosk.
    pub mac_address: String,
    /// Hardware serial number.
    pub serial_number: String,
    /// Kiosk application device id.
    pub device_id: String,
    /// Current locale, e.g. `en_US`.
    pub locale: String,
    /// IPv4 address.
    pub ip4: String,
    /// IPv6 address.
    pub ip6: String,
    /// Wi-Fi network name.
    pub wifi_ssid: String,
    /// Start URL configured in the kiosk.
    pub start_url: String,
}

/// Sample of the kiosk's ambient hardware state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceSnapshot {
    /// Battery charge in percent.
    pub battery_level: u8,
    /// Screen brightness (0-255).
    pub screen_brightness: u8,
    /// Whether the screen is on.
    pub screen_on: bool,
    /// Whether external power is connected.
    pub plugged_in: bool,
    /// Whether the screensaver is running.
    pub screensaver_on: bool,
}

/// A geolocation fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// The kiosk's capability surface.
///
/// All operations may suspend. Actuators return `Err` when the kiosk
/// refuses or is unreachable; the bridge logs and carries on.
#[allow(async_fn_in_trait)]
pub trait DeviceProvider {
    /// Reads the kiosk's identifiers.
    ///
    /// # Errors
    ///
    /// Returns error if the kiosk API is unavailable.
    async fn device_info(&self) -> Result<DeviceInfo, Error>;

    /// Samples battery, brightness, screen and power state.
    ///
    /// # Errors
    ///
    /// Returns error if the kiosk API is unavailable.
    async fn snapshot(&self) -> Result<DeviceSnapshot, Error>;

    /// Sets the screen brightness (0-255).
    ///
    /// # Errors
    ///
    /// Returns error if the kiosk rejects the command.
    async fn set_screen_brightness(&self, brightness: u8) -> Result<(), Error>;

    /// Starts the screensaver.
    ///
    /// # Errors
    ///
    /// Returns error if the kiosk rejects the command.
    async fn start_screensaver(&self) -> Result<(), Error>;

    /// Stops the screensaver.
    ///
    /// # Errors
    ///
    /// Returns error if the kiosk rejects the command.
    async fn stop_screensaver(&self) -> Result<(), Error>;

    /// Speaks text through the kiosk's text-to-speech engine.
    ///
    /// # Errors
    ///
    /// Returns error if the kiosk rejects the command.
    async fn speak(&self, text: &str) -> Result<(), Error>;

    /// Plays the given media reference (usually a URL).
    ///
    /// # Errors
    ///
    /// Returns error if the kiosk rejects the command.
    async fn play(&self, media: &str) -> Result<(), Error>;

    /// Resumes the current media without a new source.
    ///
    /// # Errors
    ///
    /// Returns error if the kiosk rejects the command.
    async fn resume(&self) -> Result<(), Error>;

    /// Pauses playback.
    ///
    /// # Errors
    ///
    /// Returns error if the kiosk rejects the command.
    async fn pause(&self) -> Result<(), Error>;

    /// Sets the playback volume.
    ///
    /// # Errors
    ///
    /// Returns error if the kiosk rejects the command.
    async fn set_volume(&self, volume: Volume) -> Result<(), Error>;

    /// Returns the current geolocation fix.
    ///
    /// Kiosks without location support keep the default, which reports
    /// the position as unavailable.
    async fn current_position(&self) -> Option<Position> {
        None
    }

    /// Subscribes to the kiosk's hardware events.
    fn subscribe(&self) -> broadcast::Receiver<DeviceEvent>;
}
