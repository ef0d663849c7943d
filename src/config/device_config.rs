// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device table entries and entity mapping.

use serde::Deserialize;

/// One entry of the device table.
///
/// Each entry ties a kiosk's hardware (MAC) address to the hub entities that
/// represent it. Every role is optional; a missing role simply disables the
/// matching channel for that device.
///
/// Entities may be given explicitly per role, or as a flat `entities` list
/// from which roles are inferred by domain prefix. Explicit roles win.
///
/// # Examples
///
/// ```
/// use kiosk_sync::config::DeviceConfig;
///
/// let config = DeviceConfig::new("AA:BB:CC:DD:EE:FF")
///     .with_motion_sensor("binary_sensor.hall_motion")
///     .with_media_player("media_player.hall_tablet");
///
/// let entities = config.entity_map();
/// assert_eq!(entities.motion_sensor.as_deref(), Some("binary_sensor.hall_motion"));
/// assert!(entities.screensaver.is_none());
/// ```
///
/// Loading from JSON (any serde format works the same way):
///
/// ```
/// use kiosk_sync::config::DeviceConfig;
///
/// let table: Vec<DeviceConfig> = serde_json::from_str(r#"[
///     { "address": "aa:bb", "entities": ["binary_sensor.m1", "media_player.p1"] }
/// ]"#).unwrap();
///
/// assert_eq!(table[0].entity_map().media_player.as_deref(), Some("media_player.p1"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeviceConfig {
    /// Hardware address of the kiosk. Compared case-insensitively.
    pub address: String,
    /// Binary sensor reporting camera motion.
    #[serde(default)]
    pub motion_sensor: Option<String>,
    /// Binary sensor reporting whether the kiosk is on external power.
    #[serde(default)]
    pub plug_sensor: Option<String>,
    /// Light entity driving the screensaver.
    #[serde(default)]
    pub screensaver: Option<String>,
    /// Media player entity backed by the kiosk speaker.
    #[serde(default)]
    pub media_player: Option<String>,
    /// Untyped entity list; roles are inferred from the domain prefix.
    #[serde(default)]
    pub entities: Vec<String>,
}

impl DeviceConfig {
    /// Creates an entry with no entities mapped.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Sets the motion sensor entity.
    #[must_use]
    pub fn with_motion_sensor(mut self, entity_id: impl Into<String>) -> Self {
        self.motion_sensor = Some(entity_id.into());
        self
    }

    /// Sets the plugged-in sensor entity.
    #[must_use]
    pub fn with_plug_sensor(mut self, entity_id: impl Into<String>) -> Self {
        self.plug_sensor = Some(entity_id.into());
        self
    }

    /// Sets the screensaver light entity.
    #[must_use]
    pub fn with_screensaver(mut self, entity_id: impl Into<String>) -> Self {
        self.screensaver = Some(entity_id.into());
        self
    }

    /// Sets the media player entity.
    #[must_use]
    pub fn with_media_player(mut self, entity_id: impl Into<String>) -> Self {
        self.media_player = Some(entity_id.into());
        self
    }

    /// Adds an untyped entity whose role is inferred from its domain.
    #[must_use]
    pub fn with_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entities.push(entity_id.into());
        self
    }

    /// Returns `true` if this entry belongs to the given hardware address.
    #[must_use]
    pub fn matches_address(&self, address: &str) -> bool {
        self.address.to_lowercase() == address.to_lowercase()
    }

    /// Resolves the role of every entity.
    ///
    /// Plug sensors cannot be inferred (they share the `binary_sensor`
    /// domain with motion sensors), so they must be set explicitly.
    #[must_use]
    pub fn entity_map(&self) -> EntityMap {
        EntityMap {
            motion_sensor: self
                .motion_sensor
                .clone()
                .or_else(|| self.infer("binary_sensor.")),
            plug_sensor: self.plug_sensor.clone(),
            screensaver: self.screensaver.clone().or_else(|| self.infer("light.")),
            media_player: self
                .media_player
                .clone()
                .or_else(|| self.infer("media_player.")),
        }
    }

    fn infer(&self, prefix: &str) -> Option<String> {
        self.entities.iter().find(|e| e.starts_with(prefix)).cloned()
    }
}

/// Hub entities representing one kiosk, by role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityMap {
    /// Motion binary sensor.
    pub motion_sensor: Option<String>,
    /// Plugged-in binary sensor.
    pub plug_sensor: Option<String>,
    /// Screensaver light.
    pub screensaver: Option<String>,
    /// Media player.
    pub media_player: Option<String>,
}

impl EntityMap {
    /// Returns `true` if no role is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.motion_sensor.is_none()
            && self.plug_sensor.is_none()
            && self.screensaver.is_none()
            && self.media_player.is_none()
    }
}
