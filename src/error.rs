// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `kiosk_sync` library.
//!
//! Failures are grouped by where they come from: value validation, transport
//! to the hub or the kiosk, payload parsing, and device-side rejections.
//! The bridge loop absorbs all of them; they surface to callers only from
//! the individual clients.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred while talking to the hub or the kiosk.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a payload.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The kiosk rejected or could not perform an operation.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    /// A volume level is outside the allowed range.
    #[error("volume level {0} is out of range [0.0, 1.0]")]
    InvalidVolume(f64),

    /// A brightness value is outside the allowed range.
    #[error("brightness {actual} is out of range [0, {max}]")]
    InvalidBrightness {
        /// Maximum allowed value.
        max: u16,
        /// The value that was provided.
        actual: i64,
    },
}

/// Errors related to transport (HTTP/MQTT).
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// MQTT client operation failed.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection failed or the peer answered with an unexpected status.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,
}

#[cfg(feature = "http")]
impl ProtocolError {
    /// Classifies a failed HTTP request, reporting timeouts separately.
    pub(crate) fn from_request(error: reqwest::Error, timeout: std::time::Duration) -> Self {
        if error.is_timeout() {
            Self::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))
        } else {
            Self::Http(error)
        }
    }
}

/// Errors related to parsing hub or kiosk payloads.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing.
    #[error("missing field: {0}")]
    MissingField(String),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// Errors reported by the kiosk itself.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The kiosk answered a command with an error status.
    #[error("command rejected: {0}")]
    CommandRejected(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
