// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State synchronization between the kiosk and the hub.

mod engine;
mod payload;
mod timers;

pub use engine::SyncEngine;
pub use payload::build_payload;
pub use timers::{DecayTimers, TimerFired};
