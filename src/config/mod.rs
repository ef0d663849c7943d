// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration types.
//!
//! The device table is plain data implementing [`serde::Deserialize`]; the
//! host decides where it comes from. Transport settings live next to their
//! clients ([`HubConfig`](crate::hub::HubConfig),
//! [`EventStreamConfig`](crate::hub::EventStreamConfig),
//! [`FullyConfig`](crate::device::FullyConfig)).

mod device_config;
mod timing;

pub use device_config::{DeviceConfig, EntityMap};
pub use timing::SyncTiming;
