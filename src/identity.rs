// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resolving which device table entry describes the running kiosk.

use crate::config::{DeviceConfig, EntityMap};
use crate::device::{DeviceInfo, DeviceProvider};

/// Immutable identity of the running kiosk for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Hub entities representing this kiosk.
    pub entities: EntityMap,
    /// Identifiers read from the kiosk at startup.
    pub info: DeviceInfo,
}

impl DeviceIdentity {
    /// Combines a table entry with the kiosk's own identifiers.
    #[must_use]
    pub fn new(config: &DeviceConfig, info: DeviceInfo) -> Self {
        Self {
            entities: config.entity_map(),
            info,
        }
    }
}

/// Finds the first table entry for the given hardware address.
///
/// Addresses are compared case-insensitively.
///
/// # Examples
///
/// ```
/// use kiosk_sync::config::DeviceConfig;
/// use kiosk_sync::identity::match_device;
///
/// let table = vec![
///     DeviceConfig::new("AA:BB").with_motion_sensor("binary_sensor.m1"),
///     DeviceConfig::new("aa:bb").with_motion_sensor("binary_sensor.m2"),
/// ];
///
/// let found = match_device("aa:bb", &table).unwrap();
/// assert_eq!(found.motion_sensor.as_deref(), Some("binary_sensor.m1"));
/// assert!(match_device("cc:dd", &table).is_none());
/// ```
#[must_use]
pub fn match_device<'a>(address: &str, table: &'a [DeviceConfig]) -> Option<&'a DeviceConfig> {
    table.iter().find(|entry| entry.matches_address(address))
}

/// Reads the kiosk's identifiers and resolves its table entry.
///
/// Returns `None` when the kiosk API is unavailable or the kiosk is not
/// in the table. Both are expected states for a device that has not been
/// provisioned, so they are logged at info level only.
pub async fn resolve<P: DeviceProvider>(
    provider: &P,
    table: &[DeviceConfig],
) -> Option<DeviceIdentity> {
    let info = match provider.device_info().await {
        Ok(info) => info,
        Err(e) => {
            tracing::info!(error = %e, "Kiosk API unavailable, staying inactive");
            return None;
        }
    };

    let Some(config) = match_device(&info.mac_address, table) else {
        tracing::info!(address = %info.mac_address, "Kiosk not in device table, staying inactive");
        return None;
    };

    let identity = DeviceIdentity::new(config, info);
    if identity.entities.is_empty() {
        tracing::warn!(
            address = %identity.info.mac_address,
            "Kiosk matched but no entities are mapped, nothing will be synced"
        );
    } else {
        tracing::info!(address = %identity.info.mac_address, "Resolved kiosk identity");
    }
    Some(identity)
}
