//! Device constants and timing parameters.
//!
//! Everything that the firmware treats as a fixed property of the hardware
//! lives here, together with [`Timings`], which collects every interval the
//! connectivity supervisor and the control API depend on.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

/// Capacity of the light bank (number of physical output channels).
pub const MAX_LIGHTS: usize = 4;

/// GPIO numbers driving each output channel, by index.
pub const DEFAULT_LIGHT_PINS: [u8; MAX_LIGHTS] = [2, 4, 5, 18];

/// Device name used until one is saved.
pub const DEFAULT_DEVICE_NAME: &str = "esp-light";

/// Maximum length of a device or light name in bytes.
pub const MAX_NAME_LEN: usize = 32;

/// SSID broadcast in access-point mode.
pub const AP_SSID: &str = "Smart Light";

/// WPA2 passphrase of the provisioning access point.
pub const AP_PASSWORD: &str = "12345678";

/// Network hostname for both station and access-point interfaces.
pub const HOSTNAME: &str = "smart-light";

/// Static address of the device while it hosts its own network.
pub const AP_ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);

/// Gateway announced to access-point clients.
pub const AP_GATEWAY: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);

/// Access-point subnet prefix length (255.255.255.0).
pub const AP_PREFIX_LEN: u8 = 24;

/// HTTP port on the device.
pub const DEVICE_HTTP_PORT: u16 = 80;

/// HTTP port when running on the host.
pub const DEFAULT_HOST_PORT: u16 = 8080;

/// Default name for light `index` (`Light 1`, `Light 2`, ...).
pub fn default_light_name(index: usize) -> String {
    format!("Light {}", index + 1)
}

/// Intervals and timeouts used across the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Minimum spacing between accepted toggle requests.
    pub debounce: Duration,
    /// Station connect timeout during boot.
    pub boot_connect_timeout: Duration,
    /// Station connect timeout for `/connect` and `/newWiFiCredentials`.
    pub provision_connect_timeout: Duration,
    /// Station connect timeout when the health check finds the link down.
    pub reconnect_timeout: Duration,
    /// How often association status is polled while connecting.
    pub connect_poll_interval: Duration,
    /// How often the main loop checks the station link.
    pub health_check_interval: Duration,
    /// Minimum spacing between real network scans.
    pub min_rescan_interval: Duration,
    /// Pause between restoring outputs and bringing up WiFi.
    pub boot_settle: Duration,
    /// Delay before restarting after a configuration save.
    pub config_restart_delay: Duration,
    /// Delay before restarting after an explicit `/restart`.
    pub restart_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            boot_connect_timeout: Duration::from_secs(5),
            provision_connect_timeout: Duration::from_secs(10),
            reconnect_timeout: Duration::from_secs(10),
            connect_poll_interval: Duration::from_millis(500),
            health_check_interval: Duration::from_secs(10),
            min_rescan_interval: Duration::from_secs(5),
            boot_settle: Duration::from_secs(1),
            config_restart_delay: Duration::from_secs(3),
            restart_delay: Duration::from_millis(500),
        }
    }
}

impl Timings {
    /// Short timings for tests: same debounce and rescan semantics, but
    /// connection attempts finish in milliseconds and boot does not pause.
    pub fn fast() -> Self {
        Self {
            boot_connect_timeout: Duration::from_millis(30),
            provision_connect_timeout: Duration::from_millis(30),
            reconnect_timeout: Duration::from_millis(30),
            connect_poll_interval: Duration::from_millis(2),
            boot_settle: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Runtime settings for host builds, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSettings {
    /// Port the HTTP server binds to (`SMART_LIGHT_PORT`).
    pub port: u16,
    /// Directory holding the persisted namespaces (`SMART_LIGHT_DATA_DIR`).
    pub data_dir: PathBuf,
    /// Networks the simulated radio can join (`SMART_LIGHT_NETWORKS`).
    /// `None` means any credentials associate.
    pub networks: Option<Vec<(String, String)>>,
}

impl HostSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        let port = match std::env::var("SMART_LIGHT_PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid SMART_LIGHT_PORT '{}'", raw);
                DEFAULT_HOST_PORT
            }),
            Err(_) => DEFAULT_HOST_PORT,
        };

        let data_dir = std::env::var_os("SMART_LIGHT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let networks = std::env::var("SMART_LIGHT_NETWORKS")
            .ok()
            .map(|raw| parse_network_list(&raw));

        Self {
            port,
            data_dir,
            networks,
        }
    }
}

/// `~/.smart-light`, or `./.smart-light` when `HOME` is unset.
fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".smart-light")
}

/// Parse `ssid:password;ssid2:password2`. Entries without a colon are skipped.
fn parse_network_list(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|entry| entry.split_once(':'))
        .filter(|(ssid, _)| !ssid.is_empty())
        .map(|(ssid, password)| (ssid.to_string(), password.to_string()))
        .collect()
}
