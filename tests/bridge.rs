// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the bridge loop, the sync engine and the command
//! dispatcher, using recording in-memory kiosk and hub doubles and tokio's
//! paused clock.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use kiosk_sync::config::{DeviceConfig, SyncTiming};
use kiosk_sync::device::{DeviceInfo, DeviceProvider, DeviceSnapshot};
use kiosk_sync::dispatch::{Dispatch, Dispatcher};
use kiosk_sync::error::{DeviceError, Error, ProtocolError};
use kiosk_sync::event::{DeviceEvent, EventBus, PowerSource};
use kiosk_sync::hub::{ServiceCall, StatePayload, StatePublisher};
use kiosk_sync::identity::DeviceIdentity;
use kiosk_sync::state::{Channel, ChannelPhase};
use kiosk_sync::sync::SyncEngine;
use kiosk_sync::types::Volume;
use kiosk_sync::{Bridge, BridgeExit};
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;

// ============================================================================
// Test doubles
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum KioskCall {
    SetBrightness(u8),
    StartScreensaver,
    StopScreensaver,
    Speak(String),
    Play(String),
    Resume,
    Pause,
    SetVolume(f64),
}

#[derive(Clone)]
struct MockKiosk {
    info: DeviceInfo,
    snapshot: Arc<Mutex<DeviceSnapshot>>,
    bus: EventBus,
    calls: Arc<Mutex<Vec<KioskCall>>>,
    reject: bool,
}

impl MockKiosk {
    fn new(mac_address: &str) -> Self {
        Self {
            info: DeviceInfo {
                mac_address: mac_address.to_string(),
                serial_number: "SN-001".to_string(),
                device_id: "kiosk-1".to_string(),
                ip4: "192.168.1.60".to_string(),
                ..DeviceInfo::default()
            },
            snapshot: Arc::new(Mutex::new(DeviceSnapshot {
                battery_level: 80,
                screen_brightness: 120,
                screen_on: true,
                plugged_in: true,
                screensaver_on: false,
            })),
            bus: EventBus::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            reject: false,
        }
    }

    fn rejecting(mut self) -> Self {
        self.reject = true;
        self
    }

    fn calls(&self) -> Vec<KioskCall> {
        self.calls.lock().clone()
    }

    fn record(&self, call: KioskCall) -> Result<(), Error> {
        if self.reject {
            return Err(DeviceError::CommandRejected("rejected".to_string()).into());
        }
        self.calls.lock().push(call);
        Ok(())
    }
}

impl DeviceProvider for MockKiosk {
    async fn device_info(&self) -> Result<DeviceInfo, Error> {
        Ok(self.info.clone())
    }

    async fn snapshot(&self) -> Result<DeviceSnapshot, Error> {
        Ok(*self.snapshot.lock())
    }

    async fn set_screen_brightness(&self, brightness: u8) -> Result<(), Error> {
        self.record(KioskCall::SetBrightness(brightness))?;
        self.snapshot.lock().screen_brightness = brightness;
        Ok(())
    }

    async fn start_screensaver(&self) -> Result<(), Error> {
        self.record(KioskCall::StartScreensaver)
    }

    async fn stop_screensaver(&self) -> Result<(), Error> {
        self.record(KioskCall::StopScreensaver)
    }

    async fn speak(&self, text: &str) -> Result<(), Error> {
        self.record(KioskCall::Speak(text.to_string()))
    }

    async fn play(&self, media: &str) -> Result<(), Error> {
        self.record(KioskCall::Play(media.to_string()))
    }

    async fn resume(&self) -> Result<(), Error> {
        self.record(KioskCall::Resume)
    }

    async fn pause(&self) -> Result<(), Error> {
        self.record(KioskCall::Pause)
    }

    async fn set_volume(&self, volume: Volume) -> Result<(), Error> {
        self.record(KioskCall::SetVolume(volume.value()))
    }

    fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.bus.subscribe()
    }
}

#[derive(Debug, Clone)]
struct Published {
    entity: String,
    payload: StatePayload,
    at: Duration,
}

impl Published {
    fn state(&self) -> &str {
        &self.payload.state
    }

    fn at_ms(&self) -> u128 {
        self.at.as_millis()
    }
}

#[derive(Clone)]
struct MockHub {
    published: Arc<Mutex<Vec<Published>>>,
    failing: Arc<AtomicBool>,
    epoch: Instant,
}

impl MockHub {
    fn new() -> Self {
        Self {
            published: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(AtomicBool::new(false)),
            epoch: Instant::now(),
        }
    }

    fn failing() -> Self {
        let hub = Self::new();
        hub.failing.store(true, Ordering::SeqCst);
        hub
    }

    fn published(&self) -> Vec<Published> {
        self.published.lock().clone()
    }

    fn published_to(&self, entity: &str) -> Vec<Published> {
        self.published()
            .into_iter()
            .filter(|p| p.entity == entity)
            .collect()
    }
}

impl StatePublisher for MockHub {
    async fn publish_state(
        &self,
        entity_id: &str,
        payload: &StatePayload,
    ) -> Result<(), ProtocolError> {
        self.published.lock().push(Published {
            entity: entity_id.to_string(),
            payload: payload.clone(),
            at: self.epoch.elapsed(),
        });

        if self.failing.load(Ordering::SeqCst) {
            Err(ProtocolError::ConnectionFailed("hub offline".to_string()))
        } else {
            Ok(())
        }
    }
}

const MOTION: &str = "binary_sensor.tablet_motion";
const PLUG: &str = "binary_sensor.tablet_plugged";
const SCREENSAVER: &str = "light.tablet_screensaver";
const MEDIA: &str = "media_player.tablet";

fn full_table() -> Vec<DeviceConfig> {
    vec![
        DeviceConfig::new("AA:BB:CC:DD:EE:FF")
            .with_motion_sensor(MOTION)
            .with_plug_sensor(PLUG)
            .with_screensaver(SCREENSAVER)
            .with_media_player(MEDIA),
    ]
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Runs the bridge alongside `driver`, shutting it down once the driver is
/// done.
async fn run_bridge<D>(
    kiosk: &MockKiosk,
    hub: &MockHub,
    table: &[DeviceConfig],
    commands: mpsc::Receiver<ServiceCall>,
    driver: D,
) -> BridgeExit
where
    D: Future<Output = ()>,
{
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let bridge = Bridge::new(kiosk.clone(), hub.clone(), commands).run_until(table, async move {
        let _ = stop_rx.await;
    });
    let driver = async move {
        // Let the bridge resolve and publish its initial state first
        tokio::task::yield_now().await;
        driver.await;
        let _ = stop_tx.send(());
    };

    let (exit, ()) = tokio::join!(bridge, driver);
    exit
}

fn no_commands() -> mpsc::Receiver<ServiceCall> {
    mpsc::channel(1).1
}

// ============================================================================
// Identity and startup
// ============================================================================

mod startup {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn unprovisioned_kiosk_stays_inert() {
        let kiosk = MockKiosk::new("11:22:33:44:55:66");
        let hub = MockHub::new();
        let bus = kiosk.bus.clone();

        let exit = run_bridge(&kiosk, &hub, &full_table(), no_commands(), async move {
            bus.publish(DeviceEvent::Motion);
            tokio::time::sleep(ms(30_000)).await;
        })
        .await;

        assert_eq!(exit, BridgeExit::Inert);
        assert!(hub.published().is_empty());
        assert!(kiosk.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_initial_state_of_every_mapped_channel() {
        let kiosk = MockKiosk::new("aa:bb:cc:dd:ee:ff");
        let hub = MockHub::new();

        let exit = run_bridge(&kiosk, &hub, &full_table(), no_commands(), async {}).await;
        assert_eq!(exit, BridgeExit::Shutdown);

        let published = hub.published();
        let entities: Vec<&str> = published.iter().map(|p| p.entity.as_str()).collect();
        assert_eq!(entities, vec![MOTION, PLUG, SCREENSAVER, MEDIA]);

        assert_eq!(published[0].state(), "off");
        assert_eq!(published[1].state(), "on");
        assert_eq!(published[2].state(), "off");
        assert_eq!(published[2].payload.brightness, Some(120));
        assert_eq!(published[3].state(), "idle");
        assert!(published.iter().all(|p| p.at_ms() == 0));

        let attributes = &published[0].payload.attributes;
        assert_eq!(attributes.mac_address, "aa:bb:cc:dd:ee:ff");
        assert_eq!(attributes.serial_number, "SN-001");
        assert_eq!(attributes.address, "192.168.1.60");
        assert_eq!(attributes.battery_level, 80);
        assert!(attributes.is_plugged_in);
        assert_eq!(attributes.latitude, None);
    }

    #[tokio::test(start_paused = true)]
    async fn running_screensaver_is_seeded_and_kept_by_refresh() {
        let kiosk = MockKiosk::new("aa:bb:cc:dd:ee:ff");
        kiosk.snapshot.lock().screensaver_on = true;
        let hub = MockHub::new();
        let bus = kiosk.bus.clone();

        run_bridge(&kiosk, &hub, &full_table(), no_commands(), async move {
            tokio::time::sleep(ms(25_000)).await;
            bus.publish(DeviceEvent::ScreensaverStop);
            tokio::time::sleep(ms(100)).await;
        })
        .await;

        let states: Vec<String> = hub
            .published_to(SCREENSAVER)
            .iter()
            .map(|p| p.state().to_string())
            .collect();
        assert_eq!(states, vec!["on", "on", "on", "off"]);
    }

    #[tokio::test(start_paused = true)]
    async fn kiosk_without_entities_publishes_nothing() {
        let kiosk = MockKiosk::new("aa:bb");
        let hub = MockHub::new();
        let table = vec![DeviceConfig::new("AA:BB")];
        let bus = kiosk.bus.clone();

        let exit = run_bridge(&kiosk, &hub, &table, no_commands(), async move {
            bus.publish(DeviceEvent::Motion);
            tokio::time::sleep(ms(30_000)).await;
        })
        .await;

        assert_eq!(exit, BridgeExit::Shutdown);
        assert!(hub.published().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unmapped_channels_are_skipped() {
        let kiosk = MockKiosk::new("aa:bb");
        let hub = MockHub::new();
        let table = vec![DeviceConfig::new("AA:BB").with_screensaver(SCREENSAVER)];
        let bus = kiosk.bus.clone();

        run_bridge(&kiosk, &hub, &table, no_commands(), async move {
            bus.publish(DeviceEvent::Motion);
            bus.publish(DeviceEvent::Unplugged);
            tokio::time::sleep(ms(30_000)).await;
        })
        .await;

        let published = hub.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].entity, SCREENSAVER);
    }
}

// ============================================================================
// Motion timing
// ============================================================================

mod motion {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn end_to_end_motion_on_then_off_after_decay() {
        let kiosk = MockKiosk::new("aa:bb");
        let hub = MockHub::new();
        let table = vec![DeviceConfig::new("AA:BB").with_motion_sensor("binary_sensor.m1")];
        let bus = kiosk.bus.clone();

        run_bridge(&kiosk, &hub, &table, no_commands(), async move {
            bus.publish(DeviceEvent::Motion);
            tokio::time::sleep(ms(6000)).await;
        })
        .await;

        let published = hub.published_to("binary_sensor.m1");
        let timeline: Vec<(&str, u128)> =
            published.iter().map(|p| (p.state(), p.at_ms())).collect();

        // Initial state, motion, decay
        assert_eq!(timeline, vec![("off", 0), ("on", 0), ("off", 5000)]);
        assert!(published[1].payload.attributes.is_motion_detected);
        assert!(!published[2].payload.attributes.is_motion_detected);
    }

    #[tokio::test(start_paused = true)]
    async fn decay_refreshes_other_channels_at_the_same_instant() {
        let kiosk = MockKiosk::new("aa:bb:cc:dd:ee:ff");
        let hub = MockHub::new();
        let bus = kiosk.bus.clone();

        run_bridge(&kiosk, &hub, &full_table(), no_commands(), async move {
            bus.publish(DeviceEvent::Motion);
            tokio::time::sleep(ms(6000)).await;
        })
        .await;

        let at_decay: Vec<String> = hub
            .published()
            .into_iter()
            .filter(|p| p.at_ms() == 5000)
            .map(|p| p.entity)
            .collect();
        assert_eq!(at_decay, vec![MOTION, PLUG, SCREENSAVER, MEDIA]);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_motion_rearms_without_duplicate_publish() {
        let kiosk = MockKiosk::new("aa:bb");
        let hub = MockHub::new();
        let table = vec![DeviceConfig::new("AA:BB").with_motion_sensor(MOTION)];
        let bus = kiosk.bus.clone();

        run_bridge(&kiosk, &hub, &table, no_commands(), async move {
            bus.publish(DeviceEvent::Motion);
            tokio::time::sleep(ms(3000)).await;
            bus.publish(DeviceEvent::Motion);
            tokio::time::sleep(ms(1000)).await;
            bus.publish(DeviceEvent::Motion);
            tokio::time::sleep(ms(6000)).await;
        })
        .await;

        let timeline: Vec<(String, u128)> = hub
            .published_to(MOTION)
            .iter()
            .map(|p| (p.state().to_string(), p.at_ms()))
            .collect();

        assert_eq!(
            timeline,
            vec![
                ("off".to_string(), 0),
                ("on".to_string(), 0),
                ("off".to_string(), 9000),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn idle_refresh_repeats_at_steady_cadence() {
        let kiosk = MockKiosk::new("aa:bb");
        let hub = MockHub::new();
        let table = vec![DeviceConfig::new("AA:BB").with_motion_sensor(MOTION)];
        let bus = kiosk.bus.clone();

        run_bridge(&kiosk, &hub, &table, no_commands(), async move {
            bus.publish(DeviceEvent::Motion);
            tokio::time::sleep(ms(26_000)).await;
        })
        .await;

        let offs: Vec<u128> = hub
            .published_to(MOTION)
            .iter()
            .filter(|p| p.state() == "off")
            .map(Published::at_ms)
            .collect();
        assert_eq!(offs, vec![0, 5000, 15_000, 25_000]);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_refresh_runs_without_motion() {
        let kiosk = MockKiosk::new("aa:bb");
        let hub = MockHub::new();
        let table = vec![DeviceConfig::new("AA:BB").with_motion_sensor(MOTION)];

        run_bridge(&kiosk, &hub, &table, no_commands(), async {
            tokio::time::sleep(ms(21_000)).await;
        })
        .await;

        let times: Vec<u128> = hub.published_to(MOTION).iter().map(Published::at_ms).collect();
        assert_eq!(times, vec![0, 10_000, 20_000]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_publish_keeps_timer_chain() {
        let kiosk = MockKiosk::new("aa:bb");
        let hub = MockHub::failing();
        let table = vec![DeviceConfig::new("AA:BB").with_motion_sensor(MOTION)];
        let bus = kiosk.bus.clone();

        run_bridge(&kiosk, &hub, &table, no_commands(), async move {
            bus.publish(DeviceEvent::Motion);
            tokio::time::sleep(ms(16_000)).await;
        })
        .await;

        let attempts: Vec<(String, u128)> = hub
            .published_to(MOTION)
            .iter()
            .map(|p| (p.state().to_string(), p.at_ms()))
            .collect();
        assert_eq!(
            attempts,
            vec![
                ("off".to_string(), 0),
                ("on".to_string(), 0),
                ("off".to_string(), 5000),
                ("off".to_string(), 15_000),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn custom_timing_is_honoured() {
        let kiosk = MockKiosk::new("aa:bb");
        let hub = MockHub::new();
        let table = vec![DeviceConfig::new("AA:BB").with_motion_sensor(MOTION)];
        let bus = kiosk.bus.clone();
        let timing = SyncTiming::new()
            .with_motion_decay(ms(1000))
            .with_idle_refresh(ms(2000));

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let bridge = Bridge::new(kiosk.clone(), hub.clone(), no_commands())
            .with_timing(timing)
            .run_until(&table, async move {
                let _ = stop_rx.await;
            });
        let driver = async move {
            tokio::task::yield_now().await;
            bus.publish(DeviceEvent::Motion);
            tokio::time::sleep(ms(3500)).await;
            let _ = stop_tx.send(());
        };
        tokio::join!(bridge, driver);

        let offs: Vec<u128> = hub
            .published_to(MOTION)
            .iter()
            .filter(|p| p.state() == "off")
            .map(Published::at_ms)
            .collect();
        assert_eq!(offs, vec![0, 1000, 3000]);
    }
}

// ============================================================================
// Level-triggered channels
// ============================================================================

mod level_channels {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn plug_publishes_once_per_transition() {
        let kiosk = MockKiosk::new("aa:bb:cc:dd:ee:ff");
        let hub = MockHub::new();
        let bus = kiosk.bus.clone();

        run_bridge(&kiosk, &hub, &full_table(), no_commands(), async move {
            bus.publish(DeviceEvent::Unplugged);
            bus.publish(DeviceEvent::Unplugged);
            bus.publish(DeviceEvent::Plugged(PowerSource::Ac));
            bus.publish(DeviceEvent::Plugged(PowerSource::Usb));
            tokio::time::sleep(ms(100)).await;
        })
        .await;

        let states: Vec<String> = hub
            .published_to(PLUG)
            .iter()
            .map(|p| p.state().to_string())
            .collect();
        assert_eq!(states, vec!["on", "off", "on"]);
    }

    #[tokio::test(start_paused = true)]
    async fn screensaver_events_publish_light_state() {
        let kiosk = MockKiosk::new("aa:bb:cc:dd:ee:ff");
        let hub = MockHub::new();
        let bus = kiosk.bus.clone();

        run_bridge(&kiosk, &hub, &full_table(), no_commands(), async move {
            bus.publish(DeviceEvent::ScreensaverStart);
            tokio::time::sleep(ms(100)).await;
            bus.publish(DeviceEvent::ScreensaverStop);
            tokio::time::sleep(ms(100)).await;
        })
        .await;

        let published = hub.published_to(SCREENSAVER);
        let states: Vec<&str> = published.iter().map(Published::state).collect();
        assert_eq!(states, vec!["off", "on", "off"]);
        assert!(published[1].payload.attributes.is_screensaver_on);
    }

    #[tokio::test(start_paused = true)]
    async fn ambient_events_do_not_publish() {
        let kiosk = MockKiosk::new("aa:bb:cc:dd:ee:ff");
        let hub = MockHub::new();
        let bus = kiosk.bus.clone();

        run_bridge(&kiosk, &hub, &full_table(), no_commands(), async move {
            bus.publish(DeviceEvent::ScreenOff);
            bus.publish(DeviceEvent::BatteryLevelChanged(12));
            bus.publish(DeviceEvent::NetworkDisconnect);
            bus.publish(DeviceEvent::Movement);
            tokio::time::sleep(ms(100)).await;
        })
        .await;

        // Only the four startup publishes
        assert_eq!(hub.published().len(), 4);
    }
}

// ============================================================================
// Commands through the bridge
// ============================================================================

mod commands {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn volume_set_updates_kiosk_and_media_entity() {
        let kiosk = MockKiosk::new("aa:bb:cc:dd:ee:ff");
        let hub = MockHub::new();
        let (tx, rx) = mpsc::channel(8);

        run_bridge(&kiosk, &hub, &full_table(), rx, async move {
            tx.send(
                ServiceCall::new("media_player", "volume_set")
                    .with_target(MEDIA)
                    .with_param("volume_level", 0.3),
            )
            .await
            .unwrap();
            tokio::time::sleep(ms(100)).await;
        })
        .await;

        assert_eq!(kiosk.calls(), vec![KioskCall::SetVolume(0.3)]);

        let media = hub.published_to(MEDIA);
        assert_eq!(media.len(), 2);
        assert!((media[1].payload.attributes.volume_level - 0.3).abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn turn_on_with_brightness() {
        let kiosk = MockKiosk::new("aa:bb:cc:dd:ee:ff");
        let hub = MockHub::new();
        let (tx, rx) = mpsc::channel(8);

        run_bridge(&kiosk, &hub, &full_table(), rx, async move {
            tx.send(
                ServiceCall::new("light", "turn_on")
                    .with_target(SCREENSAVER)
                    .with_param("brightness", 200),
            )
            .await
            .unwrap();
            tokio::time::sleep(ms(100)).await;
        })
        .await;

        assert_eq!(
            kiosk.calls(),
            vec![KioskCall::StartScreensaver, KioskCall::SetBrightness(200)]
        );

        let light = hub.published_to(SCREENSAVER);
        assert_eq!(light.len(), 2);
        assert_eq!(light[1].state(), "on");
        assert_eq!(light[1].payload.brightness, Some(200));
    }

    #[tokio::test(start_paused = true)]
    async fn play_media_then_pause() {
        let kiosk = MockKiosk::new("aa:bb:cc:dd:ee:ff");
        let hub = MockHub::new();
        let (tx, rx) = mpsc::channel(8);

        run_bridge(&kiosk, &hub, &full_table(), rx, async move {
            tx.send(
                ServiceCall::new("media_player", "play_media")
                    .with_target(MEDIA)
                    .with_param("media_content_id", "http://nas/chime.mp3"),
            )
            .await
            .unwrap();
            tx.send(ServiceCall::new("media_player", "media_pause").with_target(MEDIA))
                .await
                .unwrap();
            tokio::time::sleep(ms(100)).await;
        })
        .await;

        assert_eq!(
            kiosk.calls(),
            vec![
                KioskCall::Play("http://nas/chime.mp3".to_string()),
                KioskCall::Pause
            ]
        );

        let media = hub.published_to(MEDIA);
        let states: Vec<&str> = media.iter().map(Published::state).collect();
        assert_eq!(states, vec!["idle", "playing", "idle"]);
        assert_eq!(
            media[1].payload.attributes.media_content_id.as_deref(),
            Some("http://nas/chime.mp3")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn closed_command_source_does_not_stop_sync() {
        let kiosk = MockKiosk::new("aa:bb:cc:dd:ee:ff");
        let hub = MockHub::new();
        let (tx, rx) = mpsc::channel::<ServiceCall>(8);
        drop(tx);
        let bus = kiosk.bus.clone();

        let exit = run_bridge(&kiosk, &hub, &full_table(), rx, async move {
            tokio::time::sleep(ms(100)).await;
            bus.publish(DeviceEvent::Motion);
            tokio::time::sleep(ms(100)).await;
        })
        .await;

        assert_eq!(exit, BridgeExit::Shutdown);
        let states: Vec<String> = hub
            .published_to(MOTION)
            .iter()
            .map(|p| p.state().to_string())
            .collect();
        assert_eq!(states, vec!["off", "on"]);
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

mod dispatcher {
    use super::*;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(full_table()[0].entity_map())
    }

    #[tokio::test]
    async fn turn_on_for_other_entity_makes_no_calls() {
        let kiosk = MockKiosk::new("aa:bb");
        let call = ServiceCall::new("light", "turn_on").with_target("light.kitchen");

        assert_eq!(dispatcher().dispatch(&kiosk, &call).await, Dispatch::Ignored);
        assert!(kiosk.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_domain_is_ignored() {
        let kiosk = MockKiosk::new("aa:bb");
        let call = ServiceCall::new("switch", "turn_on").with_target(SCREENSAVER);

        assert_eq!(dispatcher().dispatch(&kiosk, &call).await, Dispatch::Ignored);
        assert!(kiosk.calls().is_empty());
    }

    #[tokio::test]
    async fn volume_set_calls_set_volume_exactly_once() {
        let kiosk = MockKiosk::new("aa:bb");
        let call = ServiceCall::new("media_player", "volume_set")
            .with_target(MEDIA)
            .with_param("volume_level", 0.3);

        let outcome = dispatcher().dispatch(&kiosk, &call).await;

        assert_eq!(kiosk.calls(), vec![KioskCall::SetVolume(0.3)]);
        assert_eq!(
            outcome,
            Dispatch::Applied(vec![kiosk_sync::StateChange::Volume(
                Volume::new(0.3).unwrap()
            )])
        );
    }

    #[tokio::test]
    async fn invalid_volume_is_rejected_without_calls() {
        let kiosk = MockKiosk::new("aa:bb");
        let call = ServiceCall::new("media_player", "volume_set")
            .with_target(MEDIA)
            .with_param("volume_level", 1.5);

        assert_eq!(dispatcher().dispatch(&kiosk, &call).await, Dispatch::Failed);
        assert!(kiosk.calls().is_empty());
    }

    #[tokio::test]
    async fn play_media_requires_content_id() {
        let kiosk = MockKiosk::new("aa:bb");
        let call = ServiceCall::new("media_player", "play_media").with_target(MEDIA);

        assert_eq!(dispatcher().dispatch(&kiosk, &call).await, Dispatch::Failed);
        assert!(kiosk.calls().is_empty());
    }

    #[tokio::test]
    async fn media_actions() {
        let kiosk = MockKiosk::new("aa:bb");
        let d = dispatcher();

        for action in ["media_play", "media_pause", "media_stop"] {
            let call = ServiceCall::new("media_player", action).with_target(MEDIA);
            assert!(matches!(d.dispatch(&kiosk, &call).await, Dispatch::Applied(_)));
        }

        assert_eq!(
            kiosk.calls(),
            vec![KioskCall::Resume, KioskCall::Pause, KioskCall::Pause]
        );
    }

    #[tokio::test]
    async fn unsupported_media_action() {
        let kiosk = MockKiosk::new("aa:bb");
        let call = ServiceCall::new("media_player", "shuffle_set").with_target(MEDIA);

        assert_eq!(dispatcher().dispatch(&kiosk, &call).await, Dispatch::Unsupported);
        assert!(kiosk.calls().is_empty());
    }

    #[tokio::test]
    async fn action_names_are_case_sensitive() {
        let kiosk = MockKiosk::new("aa:bb");
        let call = ServiceCall::new("light", "Turn_On").with_target(SCREENSAVER);

        assert_eq!(dispatcher().dispatch(&kiosk, &call).await, Dispatch::Unsupported);
        assert!(kiosk.calls().is_empty());
    }

    #[tokio::test]
    async fn turn_off_stops_screensaver() {
        let kiosk = MockKiosk::new("aa:bb");
        let call = ServiceCall::new("light", "turn_off").with_target(SCREENSAVER);

        assert_eq!(
            dispatcher().dispatch(&kiosk, &call).await,
            Dispatch::Applied(vec![kiosk_sync::StateChange::Screensaver(false)])
        );
        assert_eq!(kiosk.calls(), vec![KioskCall::StopScreensaver]);
    }

    #[tokio::test]
    async fn tts_speaks_message() {
        let kiosk = MockKiosk::new("aa:bb");
        let call = ServiceCall::new("tts", "google_say")
            .with_target(MEDIA)
            .with_param("message", "Dinner is ready");

        assert_eq!(
            dispatcher().dispatch(&kiosk, &call).await,
            Dispatch::Applied(Vec::new())
        );
        assert_eq!(
            kiosk.calls(),
            vec![KioskCall::Speak("Dinner is ready".to_string())]
        );
    }

    #[tokio::test]
    async fn rejected_command_fails() {
        let kiosk = MockKiosk::new("aa:bb").rejecting();
        let call = ServiceCall::new("light", "turn_on").with_target(SCREENSAVER);

        assert_eq!(dispatcher().dispatch(&kiosk, &call).await, Dispatch::Failed);
    }
}

// ============================================================================
// Engine
// ============================================================================

mod engine {
    use super::*;

    fn identity(kiosk: &MockKiosk) -> DeviceIdentity {
        DeviceIdentity::new(&full_table()[0], kiosk.info.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn motion_phase_follows_decay() {
        let kiosk = MockKiosk::new("aa:bb:cc:dd:ee:ff");
        let hub = MockHub::new();
        let (mut engine, mut fired) =
            SyncEngine::new(&kiosk, &hub, identity(&kiosk), SyncTiming::default());

        assert_eq!(engine.phase(Channel::Motion), ChannelPhase::Idle);
        assert!(!engine.timer_pending(Channel::Motion));

        engine.handle_device_event(&DeviceEvent::Motion).await;
        assert_eq!(engine.phase(Channel::Motion), ChannelPhase::Active);
        assert!(engine.state().motion_detected());
        assert!(engine.timer_pending(Channel::Motion));

        let timer = fired.recv().await.unwrap();
        engine.handle_timer(timer).await;

        assert_eq!(engine.phase(Channel::Motion), ChannelPhase::Idle);
        assert!(!engine.state().motion_detected());
        // Idle refresh armed
        assert!(engine.timer_pending(Channel::Motion));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_timer_has_no_effect() {
        let kiosk = MockKiosk::new("aa:bb:cc:dd:ee:ff");
        let hub = MockHub::new();
        let (mut engine, mut fired) =
            SyncEngine::new(&kiosk, &hub, identity(&kiosk), SyncTiming::default());

        engine.handle_device_event(&DeviceEvent::Motion).await;
        let first = fired.recv().await.unwrap();
        engine.handle_device_event(&DeviceEvent::Motion).await;

        let before = hub.published().len();
        engine.handle_timer(first).await;
        assert_eq!(hub.published().len(), before);

        // Re-armed motion still fires
        let fired_again = fired.recv().await.unwrap();
        assert!(engine.state().motion_detected());
        engine.handle_timer(fired_again).await;
        assert!(!engine.state().motion_detected());
    }
}
