// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed hardware events from the kiosk.
//!
//! Providers publish [`DeviceEvent`]s on an [`EventBus`] (a tokio broadcast
//! channel); the bridge subscribes once at startup.

mod device_event;
mod event_bus;

pub use device_event::{DeviceEvent, PowerSource};
pub use event_bus::EventBus;
