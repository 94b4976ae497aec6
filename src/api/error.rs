//! Control API errors and their HTTP mapping.

use crate::config::NameError;
use crate::lights::LightError;
use crate::storage::StorageError;
use crate::wifi::{ConfigError, ConnectError};
use std::fmt;

/// Broad class of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or unacceptable input. Nothing was changed.
    InvalidInput,
    /// Toggle inside the debounce window. Nothing was changed.
    RateLimited,
    /// A requested station connection failed; the device is back in AP mode.
    ConnectivityFailure,
    /// No such route or light.
    NotFound,
    /// Known route, wrong method.
    MethodNotAllowed,
    /// The device could not complete an otherwise valid request.
    Internal,
}

impl ErrorKind {
    /// HTTP status code for this kind.
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidInput => 400,
            Self::RateLimited => 429,
            Self::ConnectivityFailure => 500,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::Internal => 500,
        }
    }
}

/// A request the API refused or could not complete.
#[derive(Debug)]
pub enum ApiError {
    /// Body is not valid JSON.
    InvalidJson,
    /// `action` missing or not `"on"` / `"off"`.
    UnknownAction,
    /// `light` missing, not an integer, or not an active channel.
    InvalidLightIndex,
    /// `ssid` or `password` absent.
    MissingCredentials,
    /// `ssid` or `password` empty.
    EmptyCredentials,
    /// Credentials present but outside WiFi limits.
    InvalidCredentials(ConfigError),
    /// A device or light name was refused.
    InvalidName(NameError),
    /// Request body exceeds the server limit.
    BodyTooLarge { limit: usize },
    /// Toggle inside the debounce window.
    RateLimited,
    /// Station connection attempt failed.
    ConnectFailed(ConnectError),
    /// Unknown path or light.
    NotFound,
    /// Method not supported on this path.
    MethodNotAllowed { allow: &'static str },
    /// Persisting a change failed.
    Storage(StorageError),
    /// A pin write failed.
    Light(LightError),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidJson
            | Self::UnknownAction
            | Self::InvalidLightIndex
            | Self::MissingCredentials
            | Self::EmptyCredentials
            | Self::InvalidCredentials(_)
            | Self::InvalidName(_)
            | Self::BodyTooLarge { .. } => ErrorKind::InvalidInput,
            Self::RateLimited => ErrorKind::RateLimited,
            Self::ConnectFailed(_) => ErrorKind::ConnectivityFailure,
            Self::NotFound => ErrorKind::NotFound,
            Self::MethodNotAllowed { .. } => ErrorKind::MethodNotAllowed,
            Self::Storage(_) | Self::Light(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> u16 {
        self.kind().status()
    }

    /// Methods to advertise in an `Allow` header, for 405 responses.
    pub fn allow(&self) -> Option<&'static str> {
        match self {
            Self::MethodNotAllowed { allow } => Some(allow),
            _ => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson => write!(f, "Invalid JSON"),
            Self::UnknownAction => write!(f, "Unknown action"),
            Self::InvalidLightIndex => write!(f, "Invalid light index"),
            Self::MissingCredentials => write!(f, "Missing SSID or password"),
            Self::EmptyCredentials => write!(f, "SSID and password cannot be empty"),
            Self::InvalidCredentials(e) => write!(f, "Invalid credentials: {}", e),
            Self::InvalidName(e) => write!(f, "Invalid name: {}", e),
            Self::BodyTooLarge { limit } => write!(f, "Body too large (max {} bytes)", limit),
            Self::RateLimited => write!(f, "Too many requests"),
            Self::ConnectFailed(_) => write!(f, "Failed to connect"),
            Self::NotFound => write!(f, "Not found"),
            Self::MethodNotAllowed { .. } => write!(f, "Method not allowed"),
            Self::Storage(_) => write!(f, "Failed to save configuration"),
            Self::Light(_) => write!(f, "Failed to switch light"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidCredentials(e) => Some(e),
            Self::InvalidName(e) => Some(e),
            Self::ConnectFailed(e) => Some(e),
            Self::Storage(e) => Some(e),
            Self::Light(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::SsidEmpty | ConfigError::PasswordEmpty => Self::EmptyCredentials,
            other => Self::InvalidCredentials(other),
        }
    }
}

impl From<NameError> for ApiError {
    fn from(e: NameError) -> Self {
        Self::InvalidName(e)
    }
}

impl From<ConnectError> for ApiError {
    fn from(e: ConnectError) -> Self {
        Self::ConnectFailed(e)
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<LightError> for ApiError {
    fn from(e: LightError) -> Self {
        match e {
            LightError::OutOfRange { .. } => Self::InvalidLightIndex,
            other => Self::Light(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_status_codes() {
        assert_eq!(ApiError::InvalidJson.status(), 400);
        assert_eq!(ApiError::UnknownAction.status(), 400);
        assert_eq!(ApiError::RateLimited.status(), 429);
        assert_eq!(ApiError::NotFound.status(), 404);
        assert_eq!(ApiError::MethodNotAllowed { allow: "GET" }.status(), 405);
        let failed = ApiError::ConnectFailed(ConnectError::Timeout {
            ssid: "x".into(),
            after: std::time::Duration::from_secs(10),
        });
        assert_eq!(failed.kind(), ErrorKind::ConnectivityFailure);
        assert_eq!(failed.status(), 500);
    }

    #[test]
    fn test_messages() {
        assert_eq!(ApiError::RateLimited.to_string(), "Too many requests");
        assert_eq!(ApiError::MissingCredentials.to_string(), "Missing SSID or password");
    }

    #[test]
    fn test_empty_credential_errors_collapse() {
        assert!(matches!(ApiError::from(ConfigError::PasswordEmpty), ApiError::EmptyCredentials));
        assert!(matches!(
            ApiError::from(ConfigError::PasswordTooShort { len: 3, min: 8 }),
            ApiError::InvalidCredentials(_)
        ));
    }

    #[test]
    fn test_out_of_range_light_is_invalid_index() {
        let e = ApiError::from(LightError::OutOfRange { index: 9, len: 4 });
        assert!(matches!(e, ApiError::InvalidLightIndex));
    }
}
