// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The bridge event loop.
//!
//! [`Bridge`] resolves the kiosk against the device table and, if it is
//! provisioned, runs the [`SyncEngine`] and [`Dispatcher`] on a single task:
//!
//! ```text
//!  DeviceProvider ──events──┐
//!  hub commands ────────────┼──▶ select! ──▶ SyncEngine ──▶ StatePublisher
//!  decay timers ────────────┘        │
//!                                    └──▶ Dispatcher ──▶ DeviceProvider
//! ```
//!
//! Each input is handled to completion before the next is taken, so the
//! live state never sees interleaved writers.

use std::future::Future;

use tokio::sync::{broadcast, mpsc};

use crate::config::{DeviceConfig, SyncTiming};
use crate::device::DeviceProvider;
use crate::dispatch::{Dispatch, Dispatcher};
use crate::hub::{ServiceCall, StatePublisher};
use crate::identity;
use crate::sync::SyncEngine;

/// Why the bridge loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeExit {
    /// The kiosk is not provisioned or its API is unavailable.
    Inert,
    /// The shutdown future completed.
    Shutdown,
    /// The kiosk's event stream closed.
    EventsClosed,
}

/// Synchronizes one kiosk with the hub.
///
/// # Examples
///
/// ```no_run
/// use kiosk_sync::bridge::Bridge;
/// use kiosk_sync::config::DeviceConfig;
/// use kiosk_sync::device::{FullyConfig, FullyKioskClient};
/// use kiosk_sync::hub::{EventStreamConfig, EventStreamSubscriber, HubConfig};
///
/// # async fn example() -> kiosk_sync::Result<()> {
/// let kiosk = FullyKioskClient::new(FullyConfig::new("192.168.1.60").with_password("secret"))?;
/// let _poller = kiosk.spawn_event_poller();
///
/// let hub = HubConfig::new("http://homeassistant.local:8123")
///     .with_token("long-lived-token")
///     .into_client()?;
/// let (_events, commands) =
///     EventStreamSubscriber::connect(EventStreamConfig::new("mqtt://homeassistant.local:1883"))
///         .await?;
///
/// let table = vec![
///     DeviceConfig::new("AA:BB:CC:DD:EE:FF")
///         .with_motion_sensor("binary_sensor.hall_tablet_motion")
///         .with_screensaver("light.hall_tablet"),
/// ];
///
/// Bridge::new(kiosk, hub, commands).start(&table).await;
/// # Ok(())
/// # }
/// ```
pub struct Bridge<P, B> {
    provider: P,
    publisher: B,
    commands: mpsc::Receiver<ServiceCall>,
    timing: SyncTiming,
}

impl<P: DeviceProvider, B: StatePublisher> Bridge<P, B> {
    /// Creates a bridge from a kiosk, a hub publisher and a command source.
    #[must_use]
    pub fn new(provider: P, publisher: B, commands: mpsc::Receiver<ServiceCall>) -> Self {
        Self {
            provider,
            publisher,
            commands,
            timing: SyncTiming::default(),
        }
    }

    /// Overrides the decay and refresh intervals.
    #[must_use]
    pub fn with_timing(mut self, timing: SyncTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Runs the bridge until the kiosk's event stream closes.
    ///
    /// Returns immediately with [`BridgeExit::Inert`] if the kiosk is not
    /// in `table`.
    pub async fn start(self, table: &[DeviceConfig]) -> BridgeExit {
        self.run_until(table, std::future::pending()).await
    }

    /// Runs the bridge until `shutdown` completes.
    ///
    /// The returned future is not `Send`; await it directly or run it on a
    /// `LocalSet`.
    pub async fn run_until<F>(self, table: &[DeviceConfig], shutdown: F) -> BridgeExit
    where
        F: Future<Output = ()>,
    {
        let Self {
            provider,
            publisher,
            mut commands,
            timing,
        } = self;

        let Some(identity) = identity::resolve(&provider, table).await else {
            return BridgeExit::Inert;
        };

        let mut events = provider.subscribe();
        let dispatcher = Dispatcher::new(identity.entities.clone());
        let (mut engine, mut fired) = SyncEngine::new(&provider, &publisher, identity, timing);

        engine.start().await;

        tokio::pin!(shutdown);
        let mut commands_open = true;

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("Bridge shutting down");
                    return BridgeExit::Shutdown;
                }
                event = events.recv() => match event {
                    Ok(event) => engine.handle_device_event(&event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Device events lagged, some were dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Device event stream closed");
                        return BridgeExit::EventsClosed;
                    }
                },
                Some(timer) = fired.recv() => engine.handle_timer(timer).await,
                call = commands.recv(), if commands_open => match call {
                    Some(call) => {
                        if let Dispatch::Applied(changes) = dispatcher.dispatch(&provider, &call).await {
                            engine.apply_changes(&changes).await;
                        }
                    }
                    None => {
                        tracing::debug!("Command source closed, continuing without commands");
                        commands_open = false;
                    }
                },
            }
        }
    }
}
