//! WiFi configuration data structures.
//!
//! Platform-independent types for station credentials, the provisioning
//! access point and the connectivity state machine. Host-testable.
//!
//! # Example
//!
//! ```
//! use smart_light_esp32::wifi::{ConnectivityState, WifiCredentials};
//!
//! let credentials = WifiCredentials::new("MyNetwork", "MyPassword").unwrap();
//! assert!(credentials.validate().is_ok());
//! assert_eq!(ConnectivityState::AccessPoint.as_str(), "access_point");
//! ```

use crate::config::{AP_ADDRESS, AP_GATEWAY, AP_PASSWORD, AP_PREFIX_LEN, AP_SSID, HOSTNAME};
use std::fmt;
use std::net::Ipv4Addr;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Maximum SSID length per IEEE 802.11 standard.
pub const MAX_SSID_LEN: usize = 32;

/// Maximum password length for WPA2.
pub const MAX_PASSWORD_LEN: usize = 64;

/// Minimum password length for WPA2.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Station credentials. The password is wiped from memory on drop and
/// never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct WifiCredentials {
    /// Network SSID (1-32 bytes).
    pub ssid: String,
    /// WPA2 passphrase (8-64 bytes).
    pub password: String,
}

impl WifiCredentials {
    /// Create validated credentials.
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Result<Self, ConfigError> {
        let credentials = Self {
            ssid: ssid.into(),
            password: password.into(),
        };
        credentials.validate()?;
        Ok(credentials)
    }

    /// Validate SSID and password lengths.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.is_empty() {
            return Err(ConfigError::SsidEmpty);
        }
        if self.ssid.len() > MAX_SSID_LEN {
            return Err(ConfigError::SsidTooLong {
                len: self.ssid.len(),
                max: MAX_SSID_LEN,
            });
        }

        if self.password.is_empty() {
            return Err(ConfigError::PasswordEmpty);
        }
        if self.password.len() < MIN_PASSWORD_LEN {
            return Err(ConfigError::PasswordTooShort {
                len: self.password.len(),
                min: MIN_PASSWORD_LEN,
            });
        }
        if self.password.len() > MAX_PASSWORD_LEN {
            return Err(ConfigError::PasswordTooLong {
                len: self.password.len(),
                max: MAX_PASSWORD_LEN,
            });
        }

        Ok(())
    }
}

impl fmt::Debug for WifiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiCredentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The provisioning access point the device falls back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPointSettings {
    pub ssid: String,
    pub password: String,
    pub hostname: String,
    pub address: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub prefix_len: u8,
}

impl Default for AccessPointSettings {
    fn default() -> Self {
        Self {
            ssid: AP_SSID.to_string(),
            password: AP_PASSWORD.to_string(),
            hostname: HOSTNAME.to_string(),
            address: AP_ADDRESS,
            gateway: AP_GATEWAY,
            prefix_len: AP_PREFIX_LEN,
        }
    }
}

/// Connectivity state machine. Exactly one state is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    /// Initial state before the boot bootstrap runs.
    Disconnected,
    /// A station connection attempt is in progress.
    Connecting,
    /// Associated with an external network as a client.
    ConnectedStation,
    /// Hosting the provisioning network.
    AccessPoint,
}

impl ConnectivityState {
    /// Stable lowercase name, used in logs and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::ConnectedStation => "station",
            Self::AccessPoint => "access_point",
        }
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while validating credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// SSID is empty.
    SsidEmpty,
    /// SSID exceeds maximum length.
    SsidTooLong { len: usize, max: usize },
    /// Password is empty.
    PasswordEmpty,
    /// Password is too short for WPA2.
    PasswordTooShort { len: usize, min: usize },
    /// Password exceeds maximum length.
    PasswordTooLong { len: usize, max: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SsidEmpty => write!(f, "SSID cannot be empty"),
            Self::SsidTooLong { len, max } => {
                write!(f, "SSID too long: {} bytes (max {})", len, max)
            }
            Self::PasswordEmpty => write!(f, "password cannot be empty"),
            Self::PasswordTooShort { len, min } => {
                write!(f, "password too short: {} bytes (min {})", len, min)
            }
            Self::PasswordTooLong { len, max } => {
                write!(f, "password too long: {} bytes (max {})", len, max)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== WifiCredentials Tests ====================

    #[test]
    fn test_valid_credentials() {
        let credentials = WifiCredentials::new("TestNetwork", "password123").unwrap();
        assert_eq!(credentials.ssid, "TestNetwork");
        assert_eq!(credentials.password, "password123");
    }

    #[test]
    fn test_empty_ssid() {
        let result = WifiCredentials::new("", "password123");
        assert_eq!(result, Err(ConfigError::SsidEmpty));
    }

    #[test]
    fn test_empty_password() {
        let result = WifiCredentials::new("TestNetwork", "");
        assert_eq!(result, Err(ConfigError::PasswordEmpty));
    }

    #[test]
    fn test_ssid_too_long() {
        let result = WifiCredentials::new("a".repeat(33), "password123");
        assert!(matches!(result, Err(ConfigError::SsidTooLong { .. })));
    }

    #[test]
    fn test_ssid_max_length() {
        assert!(WifiCredentials::new("a".repeat(32), "password123").is_ok());
    }

    #[test]
    fn test_password_too_short() {
        let result = WifiCredentials::new("TestNetwork", "short");
        assert!(matches!(result, Err(ConfigError::PasswordTooShort { .. })));
    }

    #[test]
    fn test_password_bounds() {
        assert!(WifiCredentials::new("TestNetwork", "12345678").is_ok());
        assert!(WifiCredentials::new("TestNetwork", "a".repeat(64)).is_ok());
        let result = WifiCredentials::new("TestNetwork", "a".repeat(65));
        assert!(matches!(result, Err(ConfigError::PasswordTooLong { .. })));
    }

    #[test]
    fn test_debug_redacts_password() {
        let credentials = WifiCredentials::new("TestNetwork", "supersecret").unwrap();
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("TestNetwork"));
        assert!(!debug.contains("supersecret"));
    }

    // ==================== Access Point Tests ====================

    #[test]
    fn test_default_access_point() {
        let ap = AccessPointSettings::default();
        assert_eq!(ap.ssid, "Smart Light");
        assert_eq!(ap.password, "12345678");
        assert_eq!(ap.address, Ipv4Addr::new(192, 168, 4, 1));
        assert_eq!(ap.prefix_len, 24);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(ConnectivityState::ConnectedStation.as_str(), "station");
        assert_eq!(ConnectivityState::AccessPoint.to_string(), "access_point");
    }
}
