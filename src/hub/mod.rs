// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The home-automation hub side of the bridge.
//!
//! # Outbound
//!
//! [`StatePublisher`] writes a [`StatePayload`] to an entity. [`HassClient`]
//! implements it over the hub's REST API.
//!
//! # Inbound
//!
//! Commands arrive as [`ServiceCall`]s on a tokio `mpsc` channel.
//! [`EventStreamSubscriber`] fills that channel from the hub's MQTT event
//! stream; any other source works as long as it sends `ServiceCall`s.

#[cfg(feature = "mqtt")]
mod eventstream;
mod payload;
#[cfg(feature = "http")]
mod rest;
mod service_call;

#[cfg(feature = "mqtt")]
pub use eventstream::{EventStreamConfig, EventStreamSubscriber};
pub use payload::{StateAttributes, StatePayload};
#[cfg(feature = "http")]
pub use rest::{HassClient, HubConfig};
pub use service_call::{CALL_SERVICE_EVENT, ServiceCall, Target};

use crate::error::ProtocolError;

/// Trait for transports that can write entity states to the hub.
#[allow(async_fn_in_trait)]
pub trait StatePublisher {
    /// Writes the payload as the new state of the entity.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the hub cannot be reached or refuses the
    /// write.
    async fn publish_state(
        &self,
        entity_id: &str,
        payload: &StatePayload,
    ) -> Result<(), ProtocolError>;
}
