// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound automation commands.
//!
//! The hub announces every service invocation as a `call_service` event.
//! [`ServiceCall`] is that event with the target entity split out of the
//! service data.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ParseError;

/// Event type the hub uses for service invocations.
pub const CALL_SERVICE_EVENT: &str = "call_service";

/// Entity (or entities) a command is aimed at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Target {
    /// No entity given.
    #[default]
    None,
    /// A single entity id.
    One(String),
    /// A list of entity ids.
    Many(Vec<String>),
}

impl Target {
    /// Returns `true` if the target names the given entity.
    #[must_use]
    pub fn contains(&self, entity_id: &str) -> bool {
        match self {
            Self::None => false,
            Self::One(id) => id == entity_id,
            Self::Many(ids) => ids.iter().any(|id| id == entity_id),
        }
    }
}

impl From<&str> for Target {
    fn from(id: &str) -> Self {
        Self::One(id.to_string())
    }
}

impl From<Vec<String>> for Target {
    fn from(ids: Vec<String>) -> Self {
        Self::Many(ids)
    }
}

/// A service invocation observed on the hub.
///
/// # Examples
///
/// ```
/// use kiosk_sync::hub::ServiceCall;
///
/// let call = ServiceCall::parse_event(r#"{
///     "event_type": "call_service",
///     "event_data": {
///         "domain": "media_player",
///         "service": "volume_set",
///         "service_data": { "entity_id": ["media_player.tablet"], "volume_level": 0.3 }
///     }
/// }"#).unwrap().unwrap();
///
/// assert_eq!(call.action, "volume_set");
/// assert!(call.target.contains("media_player.tablet"));
/// assert_eq!(call.param_f64("volume_level"), Some(0.3));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCall {
    /// Service domain, e.g. `light` or `media_player`.
    pub domain: String,
    /// Service name within the domain, e.g. `turn_on`.
    pub action: String,
    /// Target entity ids.
    pub target: Target,
    /// Remaining service data.
    pub params: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    event_type: String,
    #[serde(default)]
    event_data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawServiceCall {
    domain: String,
    service: String,
    #[serde(default)]
    service_data: Map<String, Value>,
}

impl ServiceCall {
    /// Creates a call with no target and no parameters.
    #[must_use]
    pub fn new(domain: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            action: action.into(),
            target: Target::None,
            params: Map::new(),
        }
    }

    /// Sets the target.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<Target>) -> Self {
        self.target = target.into();
        self
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Parses the `event_data` of a `call_service` event.
    ///
    /// # Errors
    ///
    /// Returns error if the data lacks `domain` or `service`, or if
    /// `entity_id` is neither a string nor a list of strings.
    pub fn from_event_data(data: Value) -> Result<Self, ParseError> {
        let raw: RawServiceCall = serde_json::from_value(data)?;
        let mut params = raw.service_data;

        let target = match params.remove("entity_id") {
            Some(value) => parse_target(value)?,
            None => Target::None,
        };

        Ok(Self {
            domain: raw.domain,
            action: raw.service,
            target,
            params,
        })
    }

    /// Parses an event-stream message.
    ///
    /// Returns `Ok(None)` for events other than `call_service`.
    ///
    /// # Errors
    ///
    /// Returns error if the message is not a valid event envelope or the
    /// service call inside it is malformed.
    pub fn parse_event(message: &str) -> Result<Option<Self>, ParseError> {
        let envelope: EventEnvelope = serde_json::from_str(message)?;
        if envelope.event_type != CALL_SERVICE_EVENT {
            return Ok(None);
        }

        let data = envelope
            .event_data
            .ok_or_else(|| ParseError::MissingField("event_data".to_string()))?;
        Self::from_event_data(data).map(Some)
    }

    /// Returns a string parameter.
    #[must_use]
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    /// Returns a numeric parameter.
    #[must_use]
    pub fn param_f64(&self, key: &str) -> Option<f64> {
        self.params.get(key).and_then(Value::as_f64)
    }

    /// Returns an integer parameter.
    #[must_use]
    pub fn param_i64(&self, key: &str) -> Option<i64> {
        self.params.get(key).and_then(Value::as_i64)
    }
}

fn parse_target(value: Value) -> Result<Target, ParseError> {
    match serde_json::from_value::<Target>(value) {
        Ok(target) => Ok(target),
        Err(e) => Err(ParseError::InvalidValue {
            field: "entity_id".to_string(),
            message: e.to_string(),
        }),
    }
}
