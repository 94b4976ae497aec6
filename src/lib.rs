//! Smart light ESP32 firmware library.
//!
//! A network-attached light controller: a small bank of output channels
//! switched over HTTP, with WiFi provisioning (station mode with an
//! access-point fallback) and settings that survive reboots.
//!
//! Everything except the ESP-IDF backends is platform independent and
//! tested on the host machine without ESP32 hardware.
//!
//! # Layout
//!
//! - [`storage`] - namespaced key/value persistence (NVS, files, memory)
//! - [`config`] - constants, timings and the persisted device configuration
//! - [`wifi`] - the connectivity state machine and radio backends
//! - [`lights`] - the light bank
//! - [`api`] - the HTTP control routes
//! - [`device`] - boot sequence and background supervision
//! - [`network`] - the HTTP server

pub mod api;
pub mod config;
pub mod device;
pub mod lights;
pub mod network;
pub mod storage;
pub mod wifi;

// Re-export commonly used items
pub use api::{ApiError, ApiRequest, ApiResponse, ControlApi};
pub use config::{DeviceConfig, Timings};
pub use device::{Device, Supervision};
pub use lights::{LightBank, LightError};
pub use network::{HttpServer, ServeOutcome};
pub use storage::{ConfigStore, Namespace, Storage, StorageError};
pub use wifi::{ConnectivityManager, ConnectivityState, WifiCredentials, WifiRadio};
