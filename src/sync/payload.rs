// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building outbound payloads.

use crate::device::DeviceSnapshot;
use crate::hub::{StateAttributes, StatePayload};
use crate::identity::DeviceIdentity;
use crate::state::{Channel, LiveState};

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

/// Builds the payload for a channel's entity.
///
/// Channel state comes from `state`; the ambient attributes come from the
/// `snapshot` sampled just before publishing.
#[must_use]
pub fn build_payload(
    channel: Channel,
    state: &LiveState,
    identity: &DeviceIdentity,
    snapshot: &DeviceSnapshot,
) -> StatePayload {
    let entity_state = match channel {
        Channel::Motion => on_off(state.motion_detected()),
        Channel::Plug => on_off(state.plugged_in()),
        Channel::Screensaver => on_off(state.screensaver_on()),
        Channel::Media => {
            if state.media_playing() {
                "playing"
            } else {
                "idle"
            }
        }
    };

    let brightness = (channel == Channel::Screensaver).then(|| state.screen_brightness());
    let position = state.last_known_position();

    StatePayload {
        state: entity_state.to_string(),
        brightness,
        attributes: StateAttributes {
            volume_level: state.volume().value(),
            media_content_id: state.media_content_id().map(str::to_string),
            address: identity.info.ip4.clone(),
            mac_address: identity.info.mac_address.clone(),
            serial_number: identity.info.serial_number.clone(),
            device_id: identity.info.device_id.clone(),
            battery_level: snapshot.battery_level,
            screen_brightness: snapshot.screen_brightness,
            latitude: position.map(|p| p.latitude),
            longitude: position.map(|p| p.longitude),
            is_screen_on: snapshot.screen_on,
            is_plugged_in: snapshot.plugged_in,
            is_motion_detected: state.motion_detected(),
            is_screensaver_on: state.screensaver_on(),
        },
    }
}
