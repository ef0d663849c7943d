// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fully Kiosk Browser remote-admin REST provider.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::device::{DeviceInfo, DeviceProvider, DeviceSnapshot};
use crate::error::{DeviceError, Error, ParseError, ProtocolError};
use crate::event::{DeviceEvent, EventBus, PowerSource};
use crate::types::Volume;

// ============================================================================
// FullyConfig
// ============================================================================

/// Connection settings for the kiosk's remote-admin API.
///
/// # Examples
///
/// ```
/// use kiosk_sync::device::FullyConfig;
/// use std::time::Duration;
///
/// let config = FullyConfig::new("192.168.1.60")
///     .with_password("secret")
///     .with_poll_interval(Duration::from_secs(2));
///
/// assert_eq!(config.base_url(), "http://192.168.1.60:2323");
/// ```
#[derive(Debug, Clone)]
pub struct FullyConfig {
    host: String,
    port: u16,
    password: String,
    timeout: Duration,
    poll_interval: Duration,
}

impl FullyConfig {
    /// Default remote-admin port.
    pub const DEFAULT_PORT: u16 = 2323;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default interval between `deviceInfo` polls.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

    /// Creates a configuration for the given host.
    ///
    /// The host may carry a scheme (`http://`, `https://`) and port; if it
    /// does, [`with_port`](Self::with_port) is ignored.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            password: String::new(),
            timeout: Self::DEFAULT_TIMEOUT,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the remote-admin password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the event polling interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Returns the polling interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Builds the base URL.
    #[must_use]
    pub fn base_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            self.host.trim_end_matches('/').to_string()
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

// ============================================================================
// Wire format
// ============================================================================

/// Subset of the `deviceInfo` answer this crate uses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawDeviceInfo {
    #[serde(rename = "Mac")]
    mac: String,
    #[serde(rename = "deviceID")]
    device_id: String,
    serial: String,
    locale: String,
    ip4: String,
    ip6: String,
    #[serde(rename = "SSID")]
    ssid: String,
    start_url: String,
    battery_level: u8,
    screen_brightness: u8,
    screen_on: bool,
    is_plugged: bool,
    is_in_screensaver: bool,
}

impl RawDeviceInfo {
    fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            battery_level: self.battery_level,
            screen_brightness: self.screen_brightness,
            screen_on: self.screen_on,
            plugged_in: self.is_plugged,
            screensaver_on: self.is_in_screensaver,
        }
    }
}

impl From<RawDeviceInfo> for DeviceInfo {
    fn from(raw: RawDeviceInfo) -> Self {
        Self {
            mac_address: raw.mac,
            serial_number: raw.serial,
            device_id: raw.device_id,
            locale: raw.locale,
            ip4: raw.ip4,
            ip6: raw.ip6,
            wifi_ssid: raw.ssid,
            start_url: raw.start_url,
        }
    }
}

/// Answer to a remote-admin command.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommandStatus {
    status: String,
    #[serde(default)]
    status_text: String,
}

/// Derives the hardware events between two consecutive polls.
fn diff_events(prev: &DeviceSnapshot, next: &DeviceSnapshot) -> Vec<DeviceEvent> {
    let mut events = Vec::new();

    if prev.screen_on != next.screen_on {
        events.push(if next.screen_on {
            DeviceEvent::ScreenOn
        } else {
            DeviceEvent::ScreenOff
        });
    }
    if prev.plugged_in != next.plugged_in {
        events.push(if next.plugged_in {
            DeviceEvent::Plugged(PowerSource::Unknown)
        } else {
            DeviceEvent::Unplugged
        });
    }
    if prev.screensaver_on != next.screensaver_on {
        events.push(if next.screensaver_on {
            DeviceEvent::ScreensaverStart
        } else {
            DeviceEvent::ScreensaverStop
        });
    }
    if prev.battery_level != next.battery_level {
        events.push(DeviceEvent::BatteryLevelChanged(next.battery_level));
    }

    events
}

// ============================================================================
// FullyKioskClient
// ============================================================================

/// [`DeviceProvider`] backed by the Fully Kiosk Browser REST API.
///
/// Commands are sent as `GET /?cmd=<command>&type=json&password=<pw>`.
///
/// Hardware events reach the client's bus two ways:
///
/// - [`spawn_event_poller`](Self::spawn_event_poller) derives screen,
///   power, screensaver and battery events from consecutive `deviceInfo`
///   answers
/// - [`connect_push_events`](Self::connect_push_events) relays the events
///   the kiosk publishes over MQTT; camera motion only arrives this way
#[derive(Debug, Clone)]
pub struct FullyKioskClient {
    base_url: String,
    password: String,
    client: Client,
    timeout: Duration,
    events: EventBus,
    poll_interval: Duration,
    last_media: Arc<Mutex<Option<String>>>,
}

impl FullyKioskClient {
    /// Creates a client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: FullyConfig) -> Result<Self, ProtocolError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(Self {
            base_url: config.base_url(),
            password: config.password,
            client,
            timeout: config.timeout,
            events: EventBus::new(),
            poll_interval: config.poll_interval,
            last_media: Arc::new(Mutex::new(None)),
        })
    }

    /// Returns the base URL of the kiosk.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the event bus this client publishes derived events on.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Builds the URL for a command with extra query parameters.
    fn build_url(&self, command: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}/?cmd={}&type=json&password={}",
            self.base_url,
            urlencoding::encode(command),
            urlencoding::encode(&self.password)
        );
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    async fn get(&self, command: &str, params: &[(&str, &str)]) -> Result<String, ProtocolError> {
        let url = self.build_url(command, params);

        tracing::debug!(command = %command, "Sending kiosk command");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProtocolError::from_request(e, self.timeout))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProtocolError::AuthenticationFailed);
        }

        if !response.status().is_success() {
            return Err(ProtocolError::ConnectionFailed(format!(
                "HTTP {} - {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .text()
            .await
            .map_err(|e| ProtocolError::from_request(e, self.timeout))
    }

    /// Sends a command and checks the kiosk's status answer.
    async fn command(&self, command: &str, params: &[(&str, &str)]) -> Result<(), Error> {
        let body = self.get(command, params).await?;
        let status: CommandStatus = serde_json::from_str(&body).map_err(ParseError::Json)?;

        if status.status.eq_ignore_ascii_case("ok") {
            Ok(())
        } else {
            Err(DeviceError::CommandRejected(format!("{command}: {}", status.status_text)).into())
        }
    }

    async fn raw_device_info(&self) -> Result<RawDeviceInfo, Error> {
        let body = self.get("deviceInfo", &[]).await?;
        serde_json::from_str(&body).map_err(|e| ParseError::Json(e).into())
    }

    /// Spawns a task that polls `deviceInfo` and publishes the derived
    /// events on this client's bus.
    ///
    /// The first successful poll only records a baseline. Failed polls are
    /// logged and skipped. Abort the returned handle to stop polling.
    #[must_use]
    pub fn spawn_event_poller(&self) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(this.poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut previous: Option<DeviceSnapshot> = None;

            loop {
                interval.tick().await;
                let raw = match this.raw_device_info().await {
                    Ok(raw) => raw,
                    Err(e) => {
                        tracing::debug!(error = %e, "Kiosk poll failed");
                        continue;
                    }
                };

                let current = raw.snapshot();
                if let Some(prev) = previous {
                    for event in diff_events(&prev, &current) {
                        this.events.publish(event);
                    }
                }
                previous = Some(current);
            }
        })
    }
}

#[cfg(feature = "mqtt")]
impl FullyKioskClient {
    /// Subscribes to the events the kiosk publishes over MQTT and relays
    /// them on this client's bus.
    ///
    /// Requires MQTT to be enabled in the kiosk's settings. Events that
    /// the poller also derives arrive twice; the bridge only reacts to
    /// changes of those.
    ///
    /// # Errors
    ///
    /// Returns error if the broker URL is invalid.
    pub fn connect_push_events(
        &self,
        config: super::FullyEventConfig,
    ) -> Result<super::FullyEventStream, ProtocolError> {
        super::FullyEventStream::connect(config, self.events.clone())
    }
}

impl DeviceProvider for FullyKioskClient {
    async fn device_info(&self) -> Result<DeviceInfo, Error> {
        self.raw_device_info().await.map(DeviceInfo::from)
    }

    async fn snapshot(&self) -> Result<DeviceSnapshot, Error> {
        self.raw_device_info().await.map(|raw| raw.snapshot())
    }

    async fn set_screen_brightness(&self, brightness: u8) -> Result<(), Error> {
        let value = brightness.to_string();
        self.command(
            "setStringSetting",
            &[("key", "screenBrightness"), ("value", value.as_str())],
        )
        .await
    }

    async fn start_screensaver(&self) -> Result<(), Error> {
        self.command("startScreensaver", &[]).await
    }

    async fn stop_screensaver(&self) -> Result<(), Error> {
        self.command("stopScreensaver", &[]).await
    }

    async fn speak(&self, text: &str) -> Result<(), Error> {
        self.command("textToSpeech", &[("text", text)]).await
    }

    async fn play(&self, media: &str) -> Result<(), Error> {
        self.command("playSound", &[("url", media), ("loop", "false")])
            .await?;
        *self.last_media.lock() = Some(media.to_string());
        Ok(())
    }

    async fn resume(&self) -> Result<(), Error> {
        let media = self.last_media.lock().clone();
        match media {
            Some(media) => {
                self.command("playSound", &[("url", media.as_str()), ("loop", "false")])
                    .await
            }
            None => Err(DeviceError::CommandRejected("no media to resume".to_string()).into()),
        }
    }

    async fn pause(&self) -> Result<(), Error> {
        self.command("stopSound", &[]).await
    }

    async fn set_volume(&self, volume: Volume) -> Result<(), Error> {
        let level = volume.as_percent().to_string();
        // Stream 3 is the Android music stream, which playSound uses.
        self.command("setAudioVolume", &[("level", level.as_str()), ("stream", "3")])
            .await
    }

    fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.events.subscribe()
    }
}
