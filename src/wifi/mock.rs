//! Scripted radio for connectivity tests.

use super::config::{AccessPointSettings, WifiCredentials};
use super::radio::{RadioError, WifiRadio};
use std::cell::Cell;
use std::net::Ipv4Addr;

/// What the radio is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RadioMode {
    Off,
    AccessPoint,
    Station,
    Mixed,
}

/// Radio whose reachable networks and timing are set by the test.
pub(crate) struct ScriptedRadio {
    /// Networks that accept a connection, as (ssid, password).
    pub reachable: Vec<(String, String)>,
    /// Status polls before a reachable network reports associated.
    pub polls_needed: usize,
    /// SSIDs returned by `scan`.
    pub visible: Vec<String>,
    pub fail_scan: bool,
    pub mode: RadioMode,
    pub ap_starts: usize,
    pub ap_ssid: Option<String>,
    pub attempts: Vec<String>,
    pub scans: usize,
    will_associate: bool,
    polls: Cell<usize>,
    associated: Cell<bool>,
}

impl ScriptedRadio {
    pub fn new() -> Self {
        Self {
            reachable: Vec::new(),
            polls_needed: 1,
            visible: Vec::new(),
            fail_scan: false,
            mode: RadioMode::Off,
            ap_starts: 0,
            ap_ssid: None,
            attempts: Vec::new(),
            scans: 0,
            will_associate: false,
            polls: Cell::new(0),
            associated: Cell::new(false),
        }
    }

    /// Radio that can join `ssid` with `password`.
    pub fn with_network(ssid: &str, password: &str) -> Self {
        let mut radio = Self::new();
        radio.reachable.push((ssid.to_string(), password.to_string()));
        radio
    }

    /// Simulate the access point going away.
    pub fn drop_link(&mut self) {
        self.associated.set(false);
        self.will_associate = false;
    }
}

impl WifiRadio for ScriptedRadio {
    fn start_access_point(&mut self, settings: &AccessPointSettings) -> Result<(), RadioError> {
        self.mode = RadioMode::AccessPoint;
        self.ap_starts += 1;
        self.ap_ssid = Some(settings.ssid.clone());
        self.will_associate = false;
        self.associated.set(false);
        Ok(())
    }

    fn begin_station(
        &mut self,
        credentials: &WifiCredentials,
        keep_access_point: bool,
    ) -> Result<(), RadioError> {
        self.mode = if keep_access_point {
            RadioMode::Mixed
        } else {
            RadioMode::Station
        };
        self.attempts.push(credentials.ssid.clone());
        self.will_associate = self
            .reachable
            .iter()
            .any(|(ssid, password)| *ssid == credentials.ssid && *password == credentials.password);
        self.polls.set(0);
        self.associated.set(false);
        Ok(())
    }

    fn is_associated(&self) -> bool {
        if !self.associated.get() && self.will_associate {
            self.polls.set(self.polls.get() + 1);
            if self.polls.get() >= self.polls_needed {
                self.associated.set(true);
            }
        }
        self.associated.get()
    }

    fn settle_station(&mut self) -> Result<(), RadioError> {
        self.mode = RadioMode::Station;
        Ok(())
    }

    fn scan(&mut self) -> Result<Vec<String>, RadioError> {
        self.scans += 1;
        if self.fail_scan {
            return Err(RadioError::Unavailable("scan failed".into()));
        }
        Ok(self.visible.clone())
    }

    fn station_ip(&self) -> Option<Ipv4Addr> {
        self.associated
            .get()
            .then(|| Ipv4Addr::new(192, 168, 1, 50))
    }
}
