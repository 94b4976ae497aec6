//! Host radio.
//!
//! On host systems the OS owns the network, so this radio only simulates
//! association. It accepts either any credentials or a fixed list of known
//! networks, and reports the machine's real local address once "connected".

use super::config::{AccessPointSettings, WifiCredentials};
use super::radio::{RadioError, WifiRadio};
use log::info;
use std::net::{IpAddr, Ipv4Addr};

/// Simulated radio for host builds.
pub struct HostRadio {
    known: Option<Vec<(String, String)>>,
    associated: bool,
    hosting: bool,
}

impl HostRadio {
    /// Create a host radio. With `known == None` every network associates.
    pub fn new(known: Option<Vec<(String, String)>>) -> Self {
        Self {
            known,
            associated: false,
            hosting: false,
        }
    }

    /// Whether the simulated provisioning network is up.
    pub fn is_hosting(&self) -> bool {
        self.hosting
    }

    fn accepts(&self, credentials: &WifiCredentials) -> bool {
        match &self.known {
            None => true,
            Some(known) => known
                .iter()
                .any(|(ssid, password)| *ssid == credentials.ssid && *password == credentials.password),
        }
    }

    /// Get the primary local IP address.
    ///
    /// "Connecting" a UDP socket sends nothing but makes the OS pick the
    /// local address of the default route.
    fn detect_local_ip() -> Option<Ipv4Addr> {
        use std::net::UdpSocket;

        let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
        socket.connect("8.8.8.8:80").ok()?;
        match socket.local_addr().ok()?.ip() {
            IpAddr::V4(ip) => Some(ip),
            IpAddr::V6(_) => None,
        }
    }
}

impl Default for HostRadio {
    fn default() -> Self {
        Self::new(None)
    }
}

impl WifiRadio for HostRadio {
    fn start_access_point(&mut self, settings: &AccessPointSettings) -> Result<(), RadioError> {
        info!("Host radio: hosting '{}' (simulated)", settings.ssid);
        self.associated = false;
        self.hosting = true;
        Ok(())
    }

    fn begin_station(
        &mut self,
        credentials: &WifiCredentials,
        keep_access_point: bool,
    ) -> Result<(), RadioError> {
        self.hosting = self.hosting && keep_access_point;
        self.associated = self.accepts(credentials);
        Ok(())
    }

    fn is_associated(&self) -> bool {
        self.associated
    }

    fn settle_station(&mut self) -> Result<(), RadioError> {
        self.hosting = false;
        Ok(())
    }

    fn scan(&mut self) -> Result<Vec<String>, RadioError> {
        Ok(self
            .known
            .iter()
            .flatten()
            .map(|(ssid, _)| ssid.clone())
            .collect())
    }

    fn station_ip(&self) -> Option<Ipv4Addr> {
        if !self.associated {
            return None;
        }
        Some(Self::detect_local_ip().unwrap_or(Ipv4Addr::LOCALHOST))
    }
}
