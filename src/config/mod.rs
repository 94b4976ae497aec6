//! Device configuration.
//!
//! # Components
//!
//! - [`settings`] - compile-time constants, [`Timings`] and host settings
//! - [`device`] - the persisted device name, light count and light names

pub mod device;
pub mod settings;

pub use device::{
    light_name_key, validate_light_name, validate_name, ConfigUpdate, DeviceConfig, NameError,
};
pub use settings::{
    default_light_name, HostSettings, Timings, AP_ADDRESS, AP_GATEWAY, AP_PASSWORD, AP_PREFIX_LEN,
    AP_SSID, DEFAULT_DEVICE_NAME, DEFAULT_HOST_PORT, DEFAULT_LIGHT_PINS, DEVICE_HTTP_PORT, HOSTNAME,
    MAX_LIGHTS, MAX_NAME_LEN,
};
