// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `kiosk_sync` - Keep a wall-mounted kiosk tablet in sync with a
//! home-automation hub.
//!
//! The kiosk is exposed to the hub as a handful of entities: a motion
//! sensor, a plug (power) sensor, a light standing for the screensaver and
//! a media player. This crate mirrors the kiosk's hardware state onto those
//! entities and turns the hub's service calls on them back into kiosk
//! actions.
//!
//! # Features
//!
//! - **Motion**: `on` immediately, `off` after a quiet period, with a
//!   periodic refresh of every entity while idle
//! - **Power, screensaver, media**: published once per transition
//! - **Commands**: `light.turn_on`/`turn_off` drive the screensaver,
//!   `media_player.*` drive playback and volume, `tts.*_say` speaks
//! - **Best effort**: unprovisioned kiosks stay inert, transport failures
//!   are logged and retried on the next refresh
//!
//! # Cargo features
//!
//! - `http` (default): [`HassClient`](hub::HassClient) REST publisher and
//!   [`FullyKioskClient`](device::FullyKioskClient) kiosk provider
//! - `mqtt` (default): [`EventStreamSubscriber`](hub::EventStreamSubscriber)
//!   command source and [`FullyEventStream`](device::FullyEventStream) kiosk
//!   push events
//!
//! # Quick Start
//!
//! ```no_run
//! use kiosk_sync::bridge::Bridge;
//! use kiosk_sync::config::DeviceConfig;
//! use kiosk_sync::device::{FullyConfig, FullyEventConfig, FullyKioskClient};
//! use kiosk_sync::hub::{EventStreamConfig, EventStreamSubscriber, HubConfig};
//!
//! #[tokio::main]
//! async fn main() -> kiosk_sync::Result<()> {
//!     let kiosk = FullyKioskClient::new(FullyConfig::new("192.168.1.60").with_password("admin"))?;
//!     let _poller = kiosk.spawn_event_poller();
//!     let _push = kiosk.connect_push_events(FullyEventConfig::new("mqtt://homeassistant.local:1883"))?;
//!
//!     let hub = HubConfig::new("http://homeassistant.local:8123")
//!         .with_token("long-lived-token")
//!         .into_client()?;
//!     let (_subscriber, commands) = EventStreamSubscriber::connect(
//!         EventStreamConfig::new("mqtt://homeassistant.local:1883"),
//!     )
//!     .await?;
//!
//!     // Usually deserialized from the host's configuration
//!     let table = vec![
//!         DeviceConfig::new("AA:BB:CC:DD:EE:FF")
//!             .with_motion_sensor("binary_sensor.hall_tablet_motion")
//!             .with_plug_sensor("binary_sensor.hall_tablet_plugged")
//!             .with_screensaver("light.hall_tablet_screensaver")
//!             .with_media_player("media_player.hall_tablet"),
//!     ];
//!
//!     Bridge::new(kiosk, hub, commands).start(&table).await;
//!     Ok(())
//! }
//! ```
//!
//! # Custom kiosks and hubs
//!
//! Implement [`DeviceProvider`] for another kiosk API, or [`StatePublisher`]
//! for another hub transport. Commands can come from any source that sends
//! [`ServiceCall`]s on a tokio `mpsc` channel.

pub mod bridge;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod hub;
pub mod identity;
#[cfg(feature = "mqtt")]
mod mqtt;
pub mod state;
pub mod sync;
pub mod types;

pub use bridge::{Bridge, BridgeExit};
pub use config::{DeviceConfig, EntityMap, SyncTiming};
pub use device::{DeviceInfo, DeviceProvider, DeviceSnapshot, Position};
pub use dispatch::{Dispatch, Dispatcher};
pub use error::{DeviceError, Error, ParseError, ProtocolError, Result, ValueError};
pub use event::{DeviceEvent, EventBus, PowerSource};
pub use hub::{ServiceCall, StatePayload, StatePublisher, Target};
pub use identity::{DeviceIdentity, match_device, resolve};
pub use state::{Channel, LiveState, StateChange};
pub use types::Volume;
