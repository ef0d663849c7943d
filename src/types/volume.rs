// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Playback volume as a fraction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Playback volume level between 0.0 (muted) and 1.0 (full).
///
/// This is the scale the hub uses for `volume_level`. Kiosk APIs that work
/// in percent can convert with [`Volume::as_percent`].
///
/// # Examples
///
/// ```
/// use kiosk_sync::types::Volume;
///
/// let vol = Volume::new(0.3).unwrap();
/// assert_eq!(vol.as_percent(), 30);
///
/// assert!(Volume::new(1.2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Volume(f64);

impl Volume {
    /// Muted.
    pub const MIN: Self = Self(0.0);

    /// Full volume.
    pub const MAX: Self = Self(1.0);

    /// Creates a new volume level.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidVolume` if the level is not a finite
    /// number within [0.0, 1.0].
    pub fn new(level: f64) -> Result<Self, ValueError> {
        if !level.is_finite() || !(0.0..=1.0).contains(&level) {
            return Err(ValueError::InvalidVolume(level));
        }
        Ok(Self(level))
    }

    /// Returns the volume as a fraction.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.0
    }

    /// Returns the volume as a whole percentage (0-100).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn as_percent(&self) -> u8 {
        // Safe: value is within [0.0, 1.0]
        (self.0 * 100.0).round() as u8
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::MAX
    }
}

impl TryFrom<f64> for Volume {
    type Error = ValueError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Volume> for f64 {
    fn from(volume: Volume) -> Self {
        volume.0
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percent())
    }
}
