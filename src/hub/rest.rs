// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! REST state publisher for the home-automation hub.

use std::time::Duration;

use reqwest::Client;

use crate::error::ProtocolError;
use crate::hub::{StatePayload, StatePublisher};

/// Connection settings for the hub's REST API.
///
/// # Examples
///
/// ```
/// use kiosk_sync::hub::HubConfig;
/// use std::time::Duration;
///
/// let config = HubConfig::new("http://homeassistant.local:8123/")
///     .with_token("long-lived-token")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.base_url(), "http://homeassistant.local:8123");
/// ```
#[derive(Debug, Clone)]
pub struct HubConfig {
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl HubConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration for the given base URL.
    ///
    /// A missing scheme defaults to `http://`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = if base_url.starts_with("http://") || base_url.starts_with("https://") {
            base_url
        } else {
            format!("http://{base_url}")
        };

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets the access token sent as a bearer credential.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Creates a [`HassClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn into_client(self) -> Result<HassClient, ProtocolError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(HassClient {
            base_url: self.base_url,
            token: self.token,
            timeout: self.timeout,
            client,
        })
    }
}

/// Writes entity states through the hub's `/api/states` endpoint.
///
/// # Examples
///
/// ```no_run
/// use kiosk_sync::hub::{HubConfig, StatePublisher};
///
/// # async fn example(payload: kiosk_sync::hub::StatePayload) -> kiosk_sync::Result<()> {
/// let hub = HubConfig::new("http://homeassistant.local:8123")
///     .with_token("token")
///     .into_client()?;
/// hub.publish_state("binary_sensor.hall_motion", &payload).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HassClient {
    base_url: String,
    token: Option<String>,
    timeout: Duration,
    client: Client,
}

impl HassClient {
    /// Returns the base URL of the hub.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn state_url(&self, entity_id: &str) -> String {
        format!(
            "{}/api/states/{}",
            self.base_url,
            urlencoding::encode(entity_id)
        )
    }
}

impl StatePublisher for HassClient {
    async fn publish_state(
        &self,
        entity_id: &str,
        payload: &StatePayload,
    ) -> Result<(), ProtocolError> {
        let url = self.state_url(entity_id);

        tracing::debug!(entity = %entity_id, state = %payload.state, "Publishing entity state");

        let mut request = self.client.post(&url).json(payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
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

        Ok(())
    }
}
