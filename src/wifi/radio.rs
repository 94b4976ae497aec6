//! Radio abstraction used by the connectivity manager.
//!
//! The underlying WiFi stacks only offer "begin connecting" and "poll
//! status" primitives, so that is all this trait exposes. Waiting with a
//! deadline is the manager's job.

use super::config::{AccessPointSettings, WifiCredentials};
use std::fmt;
use std::net::Ipv4Addr;

/// Platform WiFi radio.
pub trait WifiRadio {
    /// Host the provisioning network. Any station link is dropped.
    fn start_access_point(&mut self, settings: &AccessPointSettings) -> Result<(), RadioError>;

    /// Start joining a network and return without waiting.
    ///
    /// With `keep_access_point` the provisioning network stays up while the
    /// attempt runs, so the client that requested it is not cut off.
    fn begin_station(
        &mut self,
        credentials: &WifiCredentials,
        keep_access_point: bool,
    ) -> Result<(), RadioError>;

    /// Whether the station interface is associated and has an address.
    fn is_associated(&self) -> bool;

    /// Switch to station-only operation after a verified connection.
    fn settle_station(&mut self) -> Result<(), RadioError>;

    /// Scan for visible networks and return their SSIDs.
    fn scan(&mut self) -> Result<Vec<String>, RadioError>;

    /// Station address, when associated.
    fn station_ip(&self) -> Option<Ipv4Addr>;
}

/// Errors that can occur during radio operations.
#[derive(Debug)]
pub enum RadioError {
    /// SSID is too long for the driver.
    InvalidSsid,
    /// Password is too long for the driver.
    InvalidPassword,
    /// The radio refused the operation.
    Unavailable(String),
    /// ESP-IDF error.
    #[cfg(feature = "esp32")]
    Esp(esp_idf_sys::EspError),
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "invalid SSID"),
            Self::InvalidPassword => write!(f, "invalid password"),
            Self::Unavailable(reason) => write!(f, "radio unavailable: {}", reason),
            #[cfg(feature = "esp32")]
            Self::Esp(e) => write!(f, "ESP error: {:?}", e),
        }
    }
}

impl std::error::Error for RadioError {}

#[cfg(feature = "esp32")]
impl From<esp_idf_sys::EspError> for RadioError {
    fn from(e: esp_idf_sys::EspError) -> Self {
        Self::Esp(e)
    }
}
