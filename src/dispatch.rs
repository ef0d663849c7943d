// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Applying hub commands to the kiosk.
//!
//! The hub announces every service call in the house. [`Dispatcher`] keeps
//! only the ones aimed at this kiosk's entities, drives the matching
//! [`DeviceProvider`] action and reports the resulting [`StateChange`]s.
//!
//! | domain | action | kiosk action |
//! |---|---|---|
//! | `light` | `turn_on` | start screensaver, optionally set `brightness` |
//! | `light` | `turn_off` | stop screensaver |
//! | `media_player` | `play_media` | play `media_content_id` |
//! | `media_player` | `media_play` | resume |
//! | `media_player` | `media_pause`, `media_stop` | pause |
//! | `media_player` | `volume_set` | set `volume_level` |
//! | `tts` | `*_say`, `speak` | speak `message` |

use crate::config::EntityMap;
use crate::device::DeviceProvider;
use crate::error::{Error, ValueError};
use crate::hub::ServiceCall;
use crate::state::StateChange;
use crate::types::Volume;

/// Domain of the screensaver light.
pub const LIGHT_DOMAIN: &str = "light";
/// Domain of the media player.
pub const MEDIA_PLAYER_DOMAIN: &str = "media_player";
/// Domain of text-to-speech services.
pub const TTS_DOMAIN: &str = "tts";

/// Maximum light brightness on the hub's scale.
const MAX_BRIGHTNESS: u16 = 255;

/// Outcome of dispatching one service call.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// The call is not aimed at this kiosk.
    Ignored,
    /// The kiosk performed the action; these changes follow from it.
    Applied(Vec<StateChange>),
    /// The call targets this kiosk but the action is not handled.
    Unsupported,
    /// The call targets this kiosk but could not be carried out.
    Failed,
}

/// Filters service calls for one kiosk and applies them.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    entities: EntityMap,
}

impl Dispatcher {
    /// Creates a dispatcher for the given entity mapping.
    #[must_use]
    pub fn new(entities: EntityMap) -> Self {
        Self { entities }
    }

    /// Returns the entity a domain must target to reach this kiosk.
    fn entity_for(&self, domain: &str) -> Option<&str> {
        match domain {
            LIGHT_DOMAIN => self.entities.screensaver.as_deref(),
            MEDIA_PLAYER_DOMAIN | TTS_DOMAIN => self.entities.media_player.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` if the call is aimed at this kiosk.
    #[must_use]
    pub fn is_relevant(&self, call: &ServiceCall) -> bool {
        self.entity_for(&call.domain)
            .is_some_and(|entity| call.target.contains(entity))
    }

    /// Applies the call to the kiosk if it is aimed at it.
    pub async fn dispatch<P: DeviceProvider>(&self, provider: &P, call: &ServiceCall) -> Dispatch {
        if !self.is_relevant(call) {
            tracing::trace!(domain = %call.domain, action = %call.action, "Ignoring service call");
            return Dispatch::Ignored;
        }

        let result = match call.domain.as_str() {
            LIGHT_DOMAIN => dispatch_light(provider, call).await,
            MEDIA_PLAYER_DOMAIN => dispatch_media(provider, call).await,
            TTS_DOMAIN => dispatch_tts(provider, call).await,
            _ => return Dispatch::Ignored,
        };

        match result {
            Ok(Some(changes)) => {
                tracing::debug!(domain = %call.domain, action = %call.action, "Applied service call");
                Dispatch::Applied(changes)
            }
            Ok(None) => {
                tracing::warn!(domain = %call.domain, action = %call.action, "Unsupported service call");
                Dispatch::Unsupported
            }
            Err(e) => {
                tracing::warn!(
                    domain = %call.domain,
                    action = %call.action,
                    error = %e,
                    "Service call failed"
                );
                Dispatch::Failed
            }
        }
    }
}

async fn dispatch_light<P: DeviceProvider>(
    provider: &P,
    call: &ServiceCall,
) -> Result<Option<Vec<StateChange>>, Error> {
    match call.action.as_str() {
        "turn_on" => {
            let brightness = brightness_param(call)?;
            provider.start_screensaver().await?;

            let mut changes = vec![StateChange::Screensaver(true)];
            if let Some(level) = brightness {
                match provider.set_screen_brightness(level).await {
                    Ok(()) => changes.push(StateChange::Brightness(level)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Screensaver started but brightness not set");
                    }
                }
            }
            Ok(Some(changes))
        }
        "turn_off" => {
            provider.stop_screensaver().await?;
            Ok(Some(vec![StateChange::Screensaver(false)]))
        }
        _ => Ok(None),
    }
}

async fn dispatch_media<P: DeviceProvider>(
    provider: &P,
    call: &ServiceCall,
) -> Result<Option<Vec<StateChange>>, Error> {
    match call.action.as_str() {
        "play_media" => {
            let media = required_str(call, "media_content_id")?;
            provider.play(media).await?;
            Ok(Some(vec![
                StateChange::MediaContent(media.to_string()),
                StateChange::MediaPlaying(true),
            ]))
        }
        "media_play" => {
            provider.resume().await?;
            Ok(Some(vec![StateChange::MediaPlaying(true)]))
        }
        "media_pause" | "media_stop" => {
            provider.pause().await?;
            Ok(Some(vec![StateChange::MediaPlaying(false)]))
        }
        "volume_set" => {
            let level = call
                .param_f64("volume_level")
                .ok_or_else(|| missing_param("volume_level"))?;
            let volume = Volume::new(level)?;
            provider.set_volume(volume).await?;
            Ok(Some(vec![StateChange::Volume(volume)]))
        }
        _ => Ok(None),
    }
}

async fn dispatch_tts<P: DeviceProvider>(
    provider: &P,
    call: &ServiceCall,
) -> Result<Option<Vec<StateChange>>, Error> {
    if !(call.action.ends_with("_say") || call.action == "speak") {
        return Ok(None);
    }
    let message = required_str(call, "message")?;
    provider.speak(message).await?;
    Ok(Some(Vec::new()))
}

fn missing_param(name: &str) -> Error {
    crate::error::ParseError::MissingField(name.to_string()).into()
}

fn required_str<'a>(call: &'a ServiceCall, name: &str) -> Result<&'a str, Error> {
    call.param_str(name).ok_or_else(|| missing_param(name))
}

/// Reads the optional `brightness` parameter (0-255).
#[allow(clippy::cast_possible_truncation)]
fn brightness_param(call: &ServiceCall) -> Result<Option<u8>, Error> {
    let Some(value) = call.params.get("brightness") else {
        return Ok(None);
    };
    let actual = call
        .param_i64("brightness")
        .or_else(|| call.param_f64("brightness").map(|f| f.round() as i64))
        .ok_or_else(|| crate::error::ParseError::InvalidValue {
            field: "brightness".to_string(),
            message: format!("not a number: {value}"),
        })?;

    u8::try_from(actual).map(Some).map_err(|_| {
        ValueError::InvalidBrightness {
            max: MAX_BRIGHTNESS,
            actual,
        }
        .into()
    })
}
