//! JSON bodies exchanged with clients.
//!
//! Request bodies are read as untyped [`serde_json::Value`] first: a body
//! that is valid JSON but has the wrong shape must be reported as an
//! unknown action or bad index, not as invalid JSON.

use super::error::ApiError;
use serde::Serialize;
use serde_json::Value;

/// `GET /id`
#[derive(Debug, Serialize)]
pub struct IdResponse<'a> {
    pub device: &'a str,
    pub lights: Vec<LightRoute<'a>>,
}

#[derive(Debug, Serialize)]
pub struct LightRoute<'a> {
    pub name: &'a str,
    pub api: String,
}

/// `GET /status`
#[derive(Debug, Serialize)]
pub struct StatusResponse<'a> {
    pub states: Vec<LightState<'a>>,
}

#[derive(Debug, Serialize)]
pub struct LightState<'a> {
    pub name: &'a str,
    pub state: &'static str,
}

/// `POST /testToggle`
#[derive(Debug, Serialize)]
pub struct TestToggleResponse<'a> {
    pub light: usize,
    pub name: &'a str,
    pub state: u8,
}

/// `GET /networks`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworksResponse<'a> {
    pub networks: &'a [String],
    pub last_connected: Option<String>,
}

/// `GET /config`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse<'a> {
    pub device: &'a str,
    pub num_lights: usize,
    pub max_lights: usize,
    pub lights: &'a [String],
}

/// `{"status": ...}`
#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub status: &'static str,
}

/// `{"error": ...}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Requested output level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    On,
    Off,
}

impl Action {
    /// Read `action` from a toggle body.
    pub fn from_body(body: &Value) -> Result<Self, ApiError> {
        match body.get("action").and_then(Value::as_str) {
            Some("on") => Ok(Self::On),
            Some("off") => Ok(Self::Off),
            _ => Err(ApiError::UnknownAction),
        }
    }

    pub fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }
}

/// Parse a request body as JSON.
pub fn parse_body(body: &[u8]) -> Result<Value, ApiError> {
    serde_json::from_slice(body).map_err(|_| ApiError::InvalidJson)
}

/// Read `light` from a `testToggle` body as a non-negative integer.
pub fn light_index(body: &Value) -> Result<usize, ApiError> {
    body.get("light")
        .and_then(Value::as_u64)
        .and_then(|i| usize::try_from(i).ok())
        .ok_or(ApiError::InvalidLightIndex)
}

/// Read `ssid` and `password` from a credentials body.
pub fn credential_fields(body: &Value) -> Result<(&str, &str), ApiError> {
    match (
        body.get("ssid").and_then(Value::as_str),
        body.get("password").and_then(Value::as_str),
    ) {
        (Some(ssid), Some(password)) => Ok((ssid, password)),
        _ => Err(ApiError::MissingCredentials),
    }
}
