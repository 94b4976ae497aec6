//! The device: storage, configuration, lights and connectivity owned in
//! one place and driven from a single thread.

use crate::config::{DeviceConfig, Timings};
use crate::lights::{LightBank, LightError};
use crate::storage::{ConfigStore, Storage};
use crate::wifi::{
    last_connected_ssid, ConnectError, ConnectivityManager, ConnectivityState, WifiCredentials,
    WifiRadio,
};
use embedded_hal::digital::OutputPin;
use log::info;
use std::net::Ipv4Addr;
use std::thread;
use std::time::{Duration, Instant};

/// What the main loop should do after a [`Device::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Supervision {
    /// Keep serving.
    Running,
    /// A scheduled restart is due.
    Restart,
}

/// Everything the control API operates on.
pub struct Device<S: Storage, R, P> {
    store: ConfigStore<S>,
    config: DeviceConfig,
    lights: LightBank<P>,
    wifi: ConnectivityManager<R>,
    timings: Timings,
    restart_at: Option<Instant>,
}

impl<S, R, P> Device<S, R, P>
where
    S: Storage,
    R: WifiRadio,
    P: OutputPin,
{
    /// Boot sequence: stamp the storage schema, load the configuration,
    /// restore the outputs, bring up WiFi and run a first scan.
    ///
    /// Blocks for the boot settle delay plus at most one connection attempt.
    pub fn boot(storage: S, radio: R, pins: Vec<(u8, P)>, timings: Timings) -> Self {
        let store = ConfigStore::new(storage);
        store.ensure_schema();

        let config = DeviceConfig::load(&store);
        info!(
            "Device '{}' with {} light(s)",
            config.device_name, config.num_lights
        );

        let mut lights = LightBank::new(&config, pins);
        lights.restore(&store);

        thread::sleep(timings.boot_settle);

        let mut wifi = ConnectivityManager::new(radio, timings);
        let state = wifi.bootstrap(&store);
        info!("Connectivity: {}", state);
        wifi.rescan(Instant::now());

        Self {
            store,
            config,
            lights,
            wifi,
            timings,
            restart_at: None,
        }
    }

    /// One pass of background supervision.
    pub fn tick(&mut self, now: Instant) -> Supervision {
        if self.restart_at.is_some_and(|at| now >= at) {
            return Supervision::Restart;
        }
        self.wifi.supervise(&self.store, now);
        Supervision::Running
    }

    /// Restart `delay` after `now`. A later request replaces an earlier one.
    pub fn schedule_restart(&mut self, now: Instant, delay: Duration) {
        info!("Restart scheduled in {:?}", delay);
        self.restart_at = Some(now + delay);
    }

    pub fn restart_pending(&self) -> bool {
        self.restart_at.is_some()
    }

    /// Switch light `index`, saving the new state if `persist`.
    pub fn toggle_light(&mut self, index: usize, on: bool, persist: bool) -> Result<(), LightError> {
        self.lights.toggle(&self.store, index, on, persist)
    }

    /// Join a network on a client's behalf; see [`ConnectivityManager::provision`].
    pub fn connect(&mut self, credentials: &WifiCredentials) -> Result<(), ConnectError> {
        self.wifi.provision(&self.store, credentials)
    }

    /// Refresh the network list, subject to the rescan throttle.
    pub fn rescan(&mut self, now: Instant) -> bool {
        self.wifi.rescan(now)
    }

    pub fn networks(&self) -> &[String] {
        self.wifi.networks()
    }

    /// SSID of the saved network, if any.
    pub fn last_connected(&self) -> Option<String> {
        last_connected_ssid(&self.store)
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.wifi.state()
    }

    pub fn station_ip(&self) -> Option<Ipv4Addr> {
        self.wifi.station_ip()
    }

    /// Configuration the device booted with.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn lights(&self) -> &LightBank<P> {
        &self.lights
    }

    pub fn store(&self) -> &ConfigStore<S> {
        &self.store
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn radio(&self) -> &R {
        self.wifi.radio()
    }

    pub fn radio_mut(&mut self) -> &mut R {
        self.wifi.radio_mut()
    }

    /// Take the device apart so it can be booted again from the same
    /// storage and hardware.
    pub fn shutdown(self) -> (S, R, Vec<(u8, P)>) {
        (
            self.store.into_inner(),
            self.wifi.into_radio(),
            self.lights.into_pins(),
        )
    }
}
