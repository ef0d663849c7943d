// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound commands from the hub's MQTT event stream.

use std::ops::ControlFlow;
use std::time::Duration;

use rumqttc::{AsyncClient, MqttOptions, Publish};
use tokio::sync::mpsc;

use crate::error::ProtocolError;
use crate::hub::ServiceCall;
use crate::mqtt;

/// Capacity of the forwarded command channel.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Settings for the event-stream subscription.
///
/// # Examples
///
/// ```
/// use kiosk_sync::hub::EventStreamConfig;
///
/// let config = EventStreamConfig::new("mqtt://192.168.1.50:1883")
///     .with_topic("ha/events")
///     .with_credentials("kiosk", "secret");
///
/// assert_eq!(config.topic(), "ha/events");
/// ```
#[derive(Debug, Clone)]
pub struct EventStreamConfig {
    broker: String,
    topic: String,
    credentials: Option<(String, String)>,
    client_id: Option<String>,
    keep_alive: Duration,
    retry_delay: Duration,
}

impl EventStreamConfig {
    /// Default event-stream topic.
    pub const DEFAULT_TOPIC: &'static str = "homeassistant/events";
    /// Default keep-alive interval.
    pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);
    /// Default delay before the first reconnect attempt.
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

    /// Creates a configuration for the given broker URL.
    #[must_use]
    pub fn new(broker: impl Into<String>) -> Self {
        Self {
            broker: broker.into(),
            topic: Self::DEFAULT_TOPIC.to_string(),
            credentials: None,
            client_id: None,
            keep_alive: Self::DEFAULT_KEEP_ALIVE,
            retry_delay: Self::DEFAULT_RETRY_DELAY,
        }
    }

    /// Sets the topic the hub publishes events to.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
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

    /// Sets the keep-alive interval.
    #[must_use]
    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Sets the delay before the first reconnect attempt. Later attempts
    /// back off up to one minute.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Returns the topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Subscription to the hub's event stream.
///
/// `call_service` events are parsed into [`ServiceCall`]s and forwarded on
/// the channel returned by [`connect`](Self::connect). Other events and
/// malformed messages are dropped.
///
/// Broker outages do not end the stream: the connection is retried with
/// backoff and the topic is subscribed again on every reconnect. The
/// stream ends only after [`disconnect`](Self::disconnect) or once the
/// receiver is dropped.
#[derive(Debug, Clone)]
pub struct EventStreamSubscriber {
    client: AsyncClient,
    topic: String,
}

impl EventStreamSubscriber {
    /// Starts the subscription in the background.
    ///
    /// Returns as soon as the connection task is spawned; the broker does
    /// not need to be reachable yet.
    ///
    /// # Errors
    ///
    /// Returns error if the broker URL is invalid.
    #[allow(clippy::unused_async)]
    pub async fn connect(
        config: EventStreamConfig,
    ) -> Result<(Self, mpsc::Receiver<ServiceCall>), ProtocolError> {
        let (host, port) = mqtt::parse_mqtt_url(&config.broker)?;

        let client_id = config
            .client_id
            .unwrap_or_else(|| mqtt::next_client_id("kiosk_sync"));

        let mut mqtt_options = MqttOptions::new(&client_id, host, port);
        mqtt_options.set_keep_alive(config.keep_alive);
        mqtt_options.set_clean_session(true);

        if let Some((username, password)) = config.credentials {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        let topic = config.topic.clone();
        let watch = command_tx.clone();
        tokio::spawn(mqtt::drive(
            event_loop,
            client.clone(),
            config.topic.clone(),
            config.retry_delay,
            async move { watch.closed().await },
            move |publish: Publish| {
                let topic = topic.clone();
                let command_tx = command_tx.clone();
                async move { forward(&topic, &publish, &command_tx).await }
            },
        ));

        tracing::info!(topic = %config.topic, "Subscribing to hub event stream");

        Ok((
            Self {
                client,
                topic: config.topic,
            },
            command_rx,
        ))
    }

    /// Returns the subscribed topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Disconnects from the broker, which ends the command stream.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request cannot be queued.
    pub async fn disconnect(&self) -> Result<(), ProtocolError> {
        self.client.disconnect().await.map_err(ProtocolError::Mqtt)
    }
}

/// Parses one event-stream message into a command, if it is one.
fn parse_message(payload: &[u8]) -> Option<ServiceCall> {
    let Ok(text) = std::str::from_utf8(payload) else {
        tracing::debug!("Ignoring non-UTF-8 event message");
        return None;
    };

    match ServiceCall::parse_event(text) {
        Ok(call) => call,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed event message");
            None
        }
    }
}

/// Forwards one published message as a command, if it is one.
async fn forward(
    topic: &str,
    publish: &Publish,
    command_tx: &mpsc::Sender<ServiceCall>,
) -> ControlFlow<()> {
    if publish.topic != topic {
        return ControlFlow::Continue(());
    }
    let Some(call) = parse_message(&publish.payload) else {
        return ControlFlow::Continue(());
    };

    tracing::trace!(domain = %call.domain, action = %call.action, "Received service call");
    if command_tx.send(call).await.is_err() {
        tracing::debug!("Command receiver dropped, stopping event stream");
        return ControlFlow::Break(());
    }
    ControlFlow::Continue(())
}
