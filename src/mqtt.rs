// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT plumbing shared by the subscription-based event sources.

use std::future::Future;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Outgoing, Packet, Publish, QoS};

use crate::error::ProtocolError;

/// Global counter for generating unique client IDs.
static CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Upper bound for the reconnect backoff.
pub(crate) const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Generates a client ID unique within this process.
pub(crate) fn next_client_id(prefix: &str) -> String {
    let counter = CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{}_{counter}", std::process::id())
}

/// Parses an MQTT URL into host and port.
pub(crate) fn parse_mqtt_url(url: &str) -> Result<(String, u16), ProtocolError> {
    let url = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let (host, port) = if let Some((h, p)) = url.rsplit_once(':') {
        let port = p
            .parse()
            .map_err(|_| ProtocolError::InvalidAddress(format!("Invalid port: {p}")))?;
        (h.to_string(), port)
    } else {
        (url.to_string(), 1883)
    };

    if host.is_empty() {
        return Err(ProtocolError::InvalidAddress("empty broker host".to_string()));
    }

    Ok((host, port))
}

/// Delay before the next reconnect attempt: doubles per failure, capped.
pub(crate) fn next_retry_delay(current: Duration) -> Duration {
    current.saturating_mul(2).min(MAX_RETRY_DELAY)
}

/// Drives an MQTT event loop until `stop` resolves, the client disconnects
/// or `on_publish` breaks.
///
/// Connection errors are logged and retried with backoff; the next
/// `poll()` reconnects. `filter` is subscribed on every `ConnAck`, since
/// clean sessions drop subscriptions with the connection.
pub(crate) async fn drive<S, F, Fut>(
    mut event_loop: EventLoop,
    client: AsyncClient,
    filter: String,
    retry_delay: Duration,
    stop: S,
    mut on_publish: F,
) where
    S: Future<Output = ()>,
    F: FnMut(Publish) -> Fut,
    Fut: Future<Output = ControlFlow<()>>,
{
    tokio::pin!(stop);
    let mut delay = retry_delay;

    loop {
        let event = tokio::select! {
            () = &mut stop => {
                tracing::debug!(%filter, "Event consumer gone, stopping MQTT loop");
                break;
            }
            event = event_loop.poll() => event,
        };

        match event {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, %filter, "MQTT connected");
                delay = retry_delay;
                if let Err(e) = client.try_subscribe(filter.as_str(), QoS::AtLeastOnce) {
                    tracing::warn!(error = %e, %filter, "Failed to queue MQTT subscription");
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                if on_publish(publish).await.is_break() {
                    break;
                }
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::debug!(%filter, "MQTT disconnect requested");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, retry_in = ?delay, "MQTT connection error");
                tokio::select! {
                    () = &mut stop => break,
                    () = tokio::time::sleep(delay) => {}
                }
                delay = next_retry_delay(delay);
            }
        }
    }
}
