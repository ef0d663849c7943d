// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hardware events pushed by the kiosk's MQTT integration.
//!
//! With MQTT enabled, Fully Kiosk Browser publishes every hardware event
//! to `<prefix>/event/<event>/<deviceId>`. This is the only source of
//! camera motion; the REST API has no equivalent.

use std::ops::ControlFlow;
use std::time::Duration;

use rumqttc::{AsyncClient, MqttOptions, Publish};
use serde::Deserialize;

use crate::error::ProtocolError;
use crate::event::{DeviceEvent, EventBus};
use crate::mqtt;

/// Settings for the kiosk's event topics.
///
/// # Examples
///
/// ```
/// use kiosk_sync::device::FullyEventConfig;
///
/// let config = FullyEventConfig::new("mqtt://192.168.1.50:1883")
///     .with_device_id("a1b2c3");
///
/// assert_eq!(config.filter(), "fully/event/+/a1b2c3");
/// ```
#[derive(Debug, Clone)]
pub struct FullyEventConfig {
    broker: String,
    topic_prefix: String,
    device_id: Option<String>,
    credentials: Option<(String, String)>,
    client_id: Option<String>,
    keep_alive: Duration,
    retry_delay: Duration,
}

impl FullyEventConfig {
    /// Topic prefix the kiosk uses unless reconfigured.
    pub const DEFAULT_TOPIC_PREFIX: &'static str = "fully";
    /// Default keep-alive interval.
    pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);
    /// Default delay before the first reconnect attempt.
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

    /// Creates a configuration for the given broker URL.
    #[must_use]
    pub fn new(broker: impl Into<String>) -> Self {
        Self {
            broker: broker.into(),
            topic_prefix: Self::DEFAULT_TOPIC_PREFIX.to_string(),
            device_id: None,
            credentials: None,
            client_id: None,
            keep_alive: Self::DEFAULT_KEEP_ALIVE,
            retry_delay: Self::DEFAULT_RETRY_DELAY,
        }
    }

    /// Only listens to events of this kiosk (its `deviceID`).
    #[must_use]
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Sets the topic prefix configured in the kiosk.
    #[must_use]
    pub fn with_topic_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.topic_prefix = prefix.into();
        self
    }

    /// Sets broker credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets a custom client ID.
    #[must_use]
    pub fn with_client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Sets the delay before the first reconnect attempt.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Returns the subscription filter for the event topics.
    #[must_use]
    pub fn filter(&self) -> String {
        let device = self.device_id.as_deref().unwrap_or("+");
        format!("{}/event/+/{device}", self.topic_prefix)
    }
}

/// Subscription to the kiosk's event topics.
///
/// Received events are published on the [`EventBus`] given to
/// [`connect`](Self::connect), usually the one of a
/// [`FullyKioskClient`](super::FullyKioskClient). Broker outages are
/// retried with backoff.
#[derive(Debug, Clone)]
pub struct FullyEventStream {
    client: AsyncClient,
    filter: String,
}

impl FullyEventStream {
    /// Starts the subscription in the background.
    ///
    /// Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns error if the broker URL is invalid.
    pub fn connect(config: FullyEventConfig, events: EventBus) -> Result<Self, ProtocolError> {
        let (host, port) = mqtt::parse_mqtt_url(&config.broker)?;
        let filter = config.filter();

        let client_id = config
            .client_id
            .clone()
            .unwrap_or_else(|| mqtt::next_client_id("kiosk_sync_device"));

        let mut mqtt_options = MqttOptions::new(&client_id, host, port);
        mqtt_options.set_keep_alive(config.keep_alive);
        mqtt_options.set_clean_session(true);

        if let Some((username, password)) = config.credentials {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);

        let prefix = config.topic_prefix;
        tokio::spawn(mqtt::drive(
            event_loop,
            client.clone(),
            filter.clone(),
            config.retry_delay,
            std::future::pending(),
            move |publish: Publish| {
                if let Some(event) = parse_event(&prefix, &publish.topic, &publish.payload) {
                    events.publish(event);
                }
                std::future::ready(ControlFlow::Continue(()))
            },
        ));

        tracing::info!(%filter, "Subscribing to kiosk events");

        Ok(Self { client, filter })
    }

    /// Returns the subscription filter.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Disconnects from the broker, which stops the subscription.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request cannot be queued.
    pub async fn disconnect(&self) -> Result<(), ProtocolError> {
        self.client.disconnect().await.map_err(ProtocolError::Mqtt)
    }
}

/// Body of an `onBatteryLevelChanged` message.
#[derive(Debug, Deserialize)]
struct BatteryPayload {
    level: BatteryLevel,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BatteryLevel {
    Number(u8),
    Text(String),
}

/// Maps an event topic (and its body, for events that carry data) to a
/// [`DeviceEvent`].
fn parse_event(prefix: &str, topic: &str, payload: &[u8]) -> Option<DeviceEvent> {
    let rest = topic.strip_prefix(prefix)?.strip_prefix("/event/")?;
    let (name, _device_id) = rest.split_once('/')?;

    if name == "onBatteryLevelChanged" {
        let body: BatteryPayload = match serde_json::from_slice(payload) {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed battery event");
                return None;
            }
        };
        let level = match body.level {
            BatteryLevel::Number(level) => Some(level),
            BatteryLevel::Text(text) => text.trim().parse().ok(),
        };
        return level.map(DeviceEvent::BatteryLevelChanged);
    }

    let event = DeviceEvent::from_name(name);
    if event.is_none() {
        tracing::trace!(name, "Ignoring unhandled kiosk event");
    }
    event
}
