// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The synchronization engine.

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::config::SyncTiming;
use crate::device::{DeviceProvider, DeviceSnapshot};
use crate::event::DeviceEvent;
use crate::hub::StatePublisher;
use crate::identity::DeviceIdentity;
use crate::state::{Channel, ChannelPhase, LiveState, StateChange};

use super::payload::build_payload;
use super::timers::{DecayTimers, TimerFired};

/// Keeps [`LiveState`] current and mirrors it to the hub.
///
/// The engine is the only writer of the live state. It reacts to three
/// inputs, each handled to completion before the next:
///
/// - hardware events ([`handle_device_event`](Self::handle_device_event)),
/// - timer expiries ([`handle_timer`](Self::handle_timer)),
/// - effects of applied commands ([`apply_changes`](Self::apply_changes)).
///
/// Motion is the only timer-driven channel. Motion `on` is published
/// immediately and decays to `off` after [`SyncTiming::motion_decay`]. Every
/// decay, and every [`SyncTiming::idle_refresh`] after it, republishes
/// motion `off` together with the plug, screensaver and media channels.
/// The other channels publish once per observed transition.
///
/// A failed publish is logged and otherwise ignored; the motion timer keeps
/// its cadence, so the next cycle retries.
pub struct SyncEngine<'a, P, B> {
    provider: &'a P,
    publisher: &'a B,
    identity: DeviceIdentity,
    timing: SyncTiming,
    state: LiveState,
    phases: HashMap<Channel, ChannelPhase>,
    timers: DecayTimers,
    geolocation_reported: bool,
}

impl<'a, P: DeviceProvider, B: StatePublisher> SyncEngine<'a, P, B> {
    /// Creates an engine for a resolved kiosk.
    ///
    /// Timer expiries arrive on the returned receiver and must be fed back
    /// through [`handle_timer`](Self::handle_timer).
    #[must_use]
    pub fn new(
        provider: &'a P,
        publisher: &'a B,
        identity: DeviceIdentity,
        timing: SyncTiming,
    ) -> (Self, mpsc::Receiver<TimerFired>) {
        let (timers, fired) = DecayTimers::new();
        let engine = Self {
            provider,
            publisher,
            identity,
            timing,
            state: LiveState::new(),
            phases: HashMap::new(),
            timers,
            geolocation_reported: false,
        };
        (engine, fired)
    }

    /// Returns the live state.
    #[must_use]
    pub fn state(&self) -> &LiveState {
        &self.state
    }

    /// Returns the resolved identity.
    #[must_use]
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Returns the publication phase of a channel.
    #[must_use]
    pub fn phase(&self, channel: Channel) -> ChannelPhase {
        self.phases.get(&channel).copied().unwrap_or_default()
    }

    /// Returns `true` if a decay timer is pending for the channel.
    #[must_use]
    pub fn timer_pending(&self, channel: Channel) -> bool {
        self.timers.is_pending(channel)
    }

    fn is_mapped(&self, channel: Channel) -> bool {
        channel.entity(&self.identity.entities).is_some()
    }

    /// Publishes the initial state of every mapped channel.
    ///
    /// The plug and screensaver levels are seeded from the kiosk before
    /// publishing. When the motion sensor is mapped, the idle refresh cycle
    /// is armed.
    pub async fn start(&mut self) {
        if let Ok(snapshot) = self.provider.snapshot().await {
            self.state.apply(&StateChange::Plugged(snapshot.plugged_in));
            self.state
                .apply(&StateChange::Screensaver(snapshot.screensaver_on));
            self.state.apply(&StateChange::Snapshot(snapshot));
        }

        for channel in Channel::ALL {
            self.publish_channel(channel).await;
        }

        if self.is_mapped(Channel::Motion) {
            self.timers
                .schedule(Channel::Motion, self.timing.idle_refresh());
        }
    }

    /// Reacts to a hardware event.
    pub async fn handle_device_event(&mut self, event: &DeviceEvent) {
        tracing::debug!(event = event.name(), "Handling device event");

        let change = match event {
            DeviceEvent::Motion => {
                self.on_motion().await;
                return;
            }
            DeviceEvent::Plugged(_) => StateChange::Plugged(true),
            DeviceEvent::Unplugged => StateChange::Plugged(false),
            DeviceEvent::ScreensaverStart => StateChange::Screensaver(true),
            DeviceEvent::ScreensaverStop => StateChange::Screensaver(false),
            DeviceEvent::ScreenOn => StateChange::ScreenOn(true),
            DeviceEvent::ScreenOff => StateChange::ScreenOn(false),
            DeviceEvent::BatteryLevelChanged(level) => StateChange::BatteryLevel(*level),
            DeviceEvent::NetworkDisconnect
            | DeviceEvent::NetworkReconnect
            | DeviceEvent::InternetDisconnect
            | DeviceEvent::InternetReconnect
            | DeviceEvent::Movement
            | DeviceEvent::BeaconProximity { .. } => return,
        };

        self.apply_changes(std::slice::from_ref(&change)).await;
    }

    async fn on_motion(&mut self) {
        if !self.is_mapped(Channel::Motion) {
            tracing::trace!("Motion sensor not mapped, ignoring motion");
            return;
        }

        self.timers
            .schedule(Channel::Motion, self.timing.motion_decay());

        if self.state.apply(&StateChange::Motion(true)) {
            self.publish_channel(Channel::Motion).await;
        } else {
            tracing::trace!("Motion already reported, decay re-armed");
        }
    }

    /// Reacts to a timer expiry.
    ///
    /// Expiries of replaced or cancelled timers are ignored.
    pub async fn handle_timer(&mut self, fired: TimerFired) {
        if !self.timers.take_if_current(fired) {
            tracing::trace!(channel = %fired.channel, generation = fired.generation, "Ignoring stale timer");
            return;
        }

        match fired.channel {
            Channel::Motion => self.refresh_after_decay().await,
            channel => tracing::debug!(%channel, "No decay behaviour for channel"),
        }
    }

    async fn refresh_after_decay(&mut self) {
        self.timers
            .schedule(Channel::Motion, self.timing.idle_refresh());

        self.state.apply(&StateChange::Motion(false));
        self.publish_channel(Channel::Motion).await;

        for channel in Channel::REFRESHED {
            self.publish_channel(channel).await;
        }
    }

    /// Applies changes to the live state and republishes affected channels.
    ///
    /// Each channel is published at most once, and only if one of its
    /// changes was an actual transition. Motion changes bypass the decay
    /// timer here; hardware motion goes through
    /// [`handle_device_event`](Self::handle_device_event).
    pub async fn apply_changes(&mut self, changes: &[StateChange]) {
        let mut dirty: Vec<Channel> = Vec::new();
        for change in changes {
            if self.state.apply(change)
                && let Some(channel) = change.channel()
                && !dirty.contains(&channel)
            {
                dirty.push(channel);
            }
        }

        for channel in dirty {
            self.publish_channel(channel).await;
        }
    }

    /// Samples the kiosk's ambient state, folding it into the live state.
    ///
    /// Falls back to the last known values when the kiosk is unreachable.
    async fn sample(&mut self) -> DeviceSnapshot {
        let plugged_in = match self.provider.snapshot().await {
            Ok(snapshot) => {
                self.state.apply(&StateChange::Snapshot(snapshot));
                snapshot.plugged_in
            }
            Err(e) => {
                tracing::debug!(error = %e, "Kiosk snapshot unavailable, using last known values");
                self.state.plugged_in()
            }
        };

        match self.provider.current_position().await {
            Some(position) => {
                self.state.apply(&StateChange::Position(position));
            }
            None if !self.geolocation_reported => {
                tracing::info!("Geolocation unavailable, publishing without position");
                self.geolocation_reported = true;
            }
            None => {}
        }

        DeviceSnapshot {
            battery_level: self.state.battery_level(),
            screen_brightness: self.state.screen_brightness(),
            screen_on: self.state.screen_on(),
            plugged_in,
            screensaver_on: self.state.screensaver_on(),
        }
    }

    /// Publishes the channel's entity, if it is mapped.
    async fn publish_channel(&mut self, channel: Channel) {
        let Some(entity) = channel.entity(&self.identity.entities) else {
            return;
        };
        let entity = entity.to_string();

        let settled = if self.channel_on(channel) {
            ChannelPhase::Active
        } else {
            ChannelPhase::Idle
        };
        self.phases.insert(channel, ChannelPhase::Publishing);

        let snapshot = self.sample().await;
        let payload = build_payload(channel, &self.state, &self.identity, &snapshot);

        match self.publisher.publish_state(&entity, &payload).await {
            Ok(()) => {
                tracing::debug!(%channel, entity = %entity, state = %payload.state, "Published state");
            }
            Err(e) => {
                tracing::warn!(%channel, entity = %entity, error = %e, "Failed to publish state");
            }
        }

        self.phases.insert(channel, settled);
    }

    fn channel_on(&self, channel: Channel) -> bool {
        match channel {
            Channel::Motion => self.state.motion_detected(),
            Channel::Plug => self.state.plugged_in(),
            Channel::Screensaver => self.state.screensaver_on(),
            Channel::Media => self.state.media_playing(),
        }
    }
}
