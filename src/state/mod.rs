// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Kiosk live state.
//!
//! [`LiveState`] holds what the bridge currently believes about the kiosk.
//! [`StateChange`] is the only way to modify it, and each change names the
//! [`Channel`] whose hub entity has to be republished.

mod channel;
mod live_state;
mod state_change;

pub use channel::{Channel, ChannelPhase};
pub use live_state::LiveState;
pub use state_change::StateChange;
