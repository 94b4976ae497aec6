//! WiFi connectivity.
//!
//! # Components
//!
//! - [`config`] - credentials, access-point settings and state types
//! - [`storage`] - persistence of station credentials
//! - [`manager`] - the station / access-point state machine
//! - [`scan`] - throttled network scan cache
//! - [`radio`] - the platform radio trait, with an ESP-IDF implementation
//!   (`esp32` feature) and a simulated one for host builds

pub mod config;
pub mod manager;
pub mod radio;
pub mod scan;
pub mod storage;

#[cfg(feature = "esp32")]
mod connection;
#[cfg(not(feature = "esp32"))]
mod host;
#[cfg(test)]
pub(crate) mod mock;

pub use config::{
    AccessPointSettings, ConfigError, ConnectivityState, WifiCredentials, MAX_PASSWORD_LEN,
    MAX_SSID_LEN, MIN_PASSWORD_LEN,
};
#[cfg(feature = "esp32")]
pub use connection::EspWifiRadio;
#[cfg(not(feature = "esp32"))]
pub use host::HostRadio;
pub use manager::{ConnectError, ConnectivityManager};
pub use radio::{RadioError, WifiRadio};
pub use scan::ScanCache;
pub use storage::{clear_credentials, last_connected_ssid, load_credentials, save_credentials};
