//! Connectivity state machine.
//!
//! Decides between station mode and the provisioning access point:
//!
//! ```text
//! Disconnected --(saved credentials)--> Connecting --(associated)--> ConnectedStation
//!      |                                    |                              |
//!      +--(none saved)--> AccessPoint <--(timeout)                (link lost: reconnect)
//! ```
//!
//! A failed station connection is never fatal: every failure path ends in
//! [`ConnectivityState::AccessPoint`], so the device stays reachable.
//! Connection attempts poll the radio until a deadline; the calling thread
//! blocks for at most the attempt's timeout.

use super::config::{AccessPointSettings, ConnectivityState, WifiCredentials};
use super::radio::{RadioError, WifiRadio};
use super::scan::ScanCache;
use super::storage::{load_credentials, save_credentials};
use crate::config::Timings;
use crate::storage::{ConfigStore, Storage};
use log::{error, info, warn};
use std::fmt;
use std::net::Ipv4Addr;
use std::thread;
use std::time::{Duration, Instant};

/// Owns the radio and the connectivity state.
pub struct ConnectivityManager<R> {
    radio: R,
    state: ConnectivityState,
    access_point: AccessPointSettings,
    timings: Timings,
    scan: ScanCache,
    last_health_check: Option<Instant>,
}

impl<R: WifiRadio> ConnectivityManager<R> {
    /// Create a manager in the `Disconnected` state.
    pub fn new(radio: R, timings: Timings) -> Self {
        Self {
            radio,
            state: ConnectivityState::Disconnected,
            access_point: AccessPointSettings::default(),
            timings,
            scan: ScanCache::new(timings.min_rescan_interval),
            last_health_check: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    /// Station address when connected as a client.
    pub fn station_ip(&self) -> Option<Ipv4Addr> {
        match self.state {
            ConnectivityState::ConnectedStation => self.radio.station_ip(),
            _ => None,
        }
    }

    /// Cached SSIDs from the last scan.
    pub fn networks(&self) -> &[String] {
        self.scan.networks()
    }

    /// Borrow the radio.
    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// Mutably borrow the radio.
    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Give the radio back (used when the device shuts down).
    pub fn into_radio(self) -> R {
        self.radio
    }

    /// Boot-time bootstrap: join the saved network, or host the access point.
    pub fn bootstrap<S: Storage>(&mut self, store: &ConfigStore<S>) -> ConnectivityState {
        match load_credentials(store) {
            Some(credentials) => {
                info!("Found saved WiFi credentials for '{}'", credentials.ssid);
                if let Err(e) = self.attempt(&credentials, self.timings.boot_connect_timeout) {
                    warn!("Boot connection failed: {}", e);
                }
            }
            None => {
                info!("No saved WiFi credentials. Starting AP mode...");
                self.enter_access_point();
            }
        }
        self.last_health_check = Some(Instant::now());
        self.state
    }

    /// Try new credentials on behalf of a client request.
    ///
    /// On success the credentials are saved and the device stays in station
    /// mode. On failure the previously saved credentials are left untouched
    /// and the device is back in access-point mode.
    pub fn provision<S: Storage>(
        &mut self,
        store: &ConfigStore<S>,
        credentials: &WifiCredentials,
    ) -> Result<(), ConnectError> {
        info!("Trying new credentials for '{}'", credentials.ssid);
        self.attempt(credentials, self.timings.provision_connect_timeout)?;

        if let Err(e) = save_credentials(store, credentials) {
            warn!("Connected, but failed to save credentials: {}", e);
        } else {
            info!("Credentials for '{}' saved", credentials.ssid);
        }
        Ok(())
    }

    /// Periodic health check, called from the main loop.
    ///
    /// Runs at most once per health-check interval and returns whether it
    /// ran. Only a lost station link triggers action: reconnect with the
    /// saved credentials, or fall back to the access point without them.
    /// Access-point mode is left alone until a client provisions a network.
    pub fn supervise<S: Storage>(&mut self, store: &ConfigStore<S>, now: Instant) -> bool {
        let last = *self.last_health_check.get_or_insert(now);
        if now.saturating_duration_since(last) < self.timings.health_check_interval {
            return false;
        }
        self.last_health_check = Some(now);

        if self.state != ConnectivityState::ConnectedStation || self.radio.is_associated() {
            return true;
        }

        warn!("WiFi disconnected. Trying to reconnect...");
        match load_credentials(store) {
            Some(credentials) => {
                if let Err(e) = self.attempt(&credentials, self.timings.reconnect_timeout) {
                    warn!("Reconnect failed: {}", e);
                }
            }
            None => self.enter_access_point(),
        }
        true
    }

    /// Refresh the cached network list, at most once per rescan interval.
    pub fn rescan(&mut self, now: Instant) -> bool {
        self.scan.refresh(&mut self.radio, now)
    }

    /// Host the provisioning network.
    pub fn enter_access_point(&mut self) {
        match self.radio.start_access_point(&self.access_point) {
            Ok(()) => info!(
                "Access point '{}' up at {}",
                self.access_point.ssid, self.access_point.address
            ),
            Err(e) => error!("Failed to start access point: {}", e),
        }
        self.state = ConnectivityState::AccessPoint;
    }

    fn attempt(&mut self, credentials: &WifiCredentials, timeout: Duration) -> Result<(), ConnectError> {
        // Keep the provisioning network up while a client-initiated attempt runs.
        let keep_access_point = self.state == ConnectivityState::AccessPoint;
        self.state = ConnectivityState::Connecting;
        info!("Connecting to WiFi '{}'...", credentials.ssid);

        if let Err(e) = self.radio.begin_station(credentials, keep_access_point) {
            warn!("Radio rejected connection to '{}': {}", credentials.ssid, e);
            self.enter_access_point();
            return Err(ConnectError::Radio(e));
        }

        if !self.wait_for_association(timeout) {
            warn!(
                "No connection to '{}' after {:?}. Falling back to AP mode.",
                credentials.ssid, timeout
            );
            self.enter_access_point();
            return Err(ConnectError::Timeout {
                ssid: credentials.ssid.clone(),
                after: timeout,
            });
        }

        if keep_access_point {
            if let Err(e) = self.radio.settle_station() {
                warn!("Failed to stop access point after connecting: {}", e);
            }
        }
        self.state = ConnectivityState::ConnectedStation;
        match self.radio.station_ip() {
            Some(ip) => info!("WiFi connected, IP: {}", ip),
            None => info!("WiFi connected"),
        }
        Ok(())
    }

    fn wait_for_association(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.radio.is_associated() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(self.timings.connect_poll_interval.min(deadline - now));
        }
    }
}

/// Why a station connection attempt failed.
#[derive(Debug)]
pub enum ConnectError {
    /// The network did not associate before the deadline.
    Timeout { ssid: String, after: Duration },
    /// The radio refused to start the attempt.
    Radio(RadioError),
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { ssid, after } => {
                write!(f, "could not connect to '{}' within {:?}", ssid, after)
            }
            Self::Radio(e) => write!(f, "radio error: {}", e),
        }
    }
}

impl std::error::Error for ConnectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Radio(e) => Some(e),
            Self::Timeout { .. } => None,
        }
    }
}
