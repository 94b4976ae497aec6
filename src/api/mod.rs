//! HTTP control surface.
//!
//! [`ControlApi::handle`] maps one request onto the [`Device`] and returns
//! the response to send. It does no I/O, so the HTTP server stays a thin
//! loop and every route is testable without sockets.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | GET  | `/id` | device name and per-light toggle paths |
//! | GET  | `/status` | current light states |
//! | POST | `/<light>/toggle` | `{"action":"on"\|"off"}`, persisted, rate limited |
//! | POST | `/testToggle` | `{"light":i,"action":...}`, not persisted, rate limited |
//! | GET  | `/rescan` | refresh the network list |
//! | GET  | `/networks` | cached network list and saved SSID |
//! | GET  | `/connect?ssid=&password=` | join a network |
//! | POST | `/newWiFiCredentials` | `{"ssid","password"}`, join a network |
//! | GET  | `/config` | persisted configuration |
//! | GET  | `/saveConfig?device=&numLights=&light<i>=` | save, then restart |
//! | GET  | `/restart` | restart shortly |

mod dto;
mod error;
mod query;
mod rate_limit;

pub use dto::Action;
pub use error::{ApiError, ErrorKind};
pub use query::{encode_segment, parse_query};
pub use rate_limit::RateLimitWindow;

use crate::config::{ConfigUpdate, DeviceConfig, Timings, MAX_LIGHTS};
use crate::device::Device;
use crate::storage::Storage;
use crate::wifi::{WifiCredentials, WifiRadio};
use dto::{
    ConfigResponse, ErrorBody, IdResponse, LightRoute, LightState, NetworksResponse,
    StatusMessage, StatusResponse, TestToggleResponse,
};
use embedded_hal::digital::OutputPin;
use log::{debug, error, info};
use serde::Serialize;
use std::time::Instant;
use tiny_http::Method;

const JSON: &str = "application/json";
const TEXT: &str = "text/plain";

/// A request as seen by the API: method, raw target and body.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path plus optional query, as sent by the client.
    pub url: String,
    pub body: Vec<u8>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method,
            url: url.into(),
            body: body.into(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url, Vec::new())
    }

    pub fn post_json(url: impl Into<String>, body: &str) -> Self {
        Self::new(Method::Post, url, body.as_bytes())
    }
}

/// A response ready to be written by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    /// `Allow` header value, for 405 responses.
    pub allow: Option<&'static str>,
}

impl ApiResponse {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self {
                status,
                content_type: JSON,
                body,
                allow: None,
            },
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                Self {
                    status: 500,
                    content_type: JSON,
                    body: r#"{"error":"Internal error"}"#.to_string(),
                    allow: None,
                }
            }
        }
    }

    fn ok<T: Serialize>(value: &T) -> Self {
        Self::json(200, value)
    }

    fn text(body: &str) -> Self {
        Self {
            status: 200,
            content_type: TEXT,
            body: body.to_string(),
            allow: None,
        }
    }
}

impl From<ApiError> for ApiResponse {
    fn from(e: ApiError) -> Self {
        let mut response = Self::json(
            e.status(),
            &ErrorBody {
                error: e.to_string(),
            },
        );
        response.allow = e.allow();
        response
    }
}

/// Known routes. Light segments are already percent-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    Id,
    Status,
    Toggle(String),
    TestToggle,
    Rescan,
    Networks,
    Connect,
    NewCredentials,
    Config,
    SaveConfig,
    Restart,
}

impl Route {
    fn parse(path: &str) -> Option<Self> {
        let route = match path {
            "/id" => Self::Id,
            "/status" => Self::Status,
            "/testToggle" => Self::TestToggle,
            "/rescan" => Self::Rescan,
            "/networks" => Self::Networks,
            "/connect" => Self::Connect,
            "/newWiFiCredentials" => Self::NewCredentials,
            "/config" => Self::Config,
            "/saveConfig" => Self::SaveConfig,
            "/restart" => Self::Restart,
            _ => {
                let segment = path.strip_prefix('/')?.strip_suffix("/toggle")?;
                if segment.is_empty() || segment.contains('/') {
                    return None;
                }
                Self::Toggle(query::decode_segment(segment))
            }
        };
        Some(route)
    }

    fn method(&self) -> Method {
        match self {
            Self::Toggle(_) | Self::TestToggle | Self::NewCredentials => Method::Post,
            _ => Method::Get,
        }
    }

    fn allow(&self) -> &'static str {
        match self.method() {
            Method::Post => "POST",
            _ => "GET",
        }
    }
}

/// Request dispatcher. Owns the toggle rate limiter.
pub struct ControlApi {
    toggle_window: RateLimitWindow,
}

impl ControlApi {
    pub fn new(timings: &Timings) -> Self {
        Self {
            toggle_window: RateLimitWindow::new(timings.debounce),
        }
    }

    /// Handle one request at time `now`.
    pub fn handle<S, R, P>(
        &mut self,
        device: &mut Device<S, R, P>,
        request: &ApiRequest,
        now: Instant,
    ) -> ApiResponse
    where
        S: Storage,
        R: WifiRadio,
        P: OutputPin,
    {
        let (path, query) = query::split_url(&request.url);
        let result = match Route::parse(path) {
            None => Err(ApiError::NotFound),
            Some(route) if route.method() != request.method => Err(ApiError::MethodNotAllowed {
                allow: route.allow(),
            }),
            Some(route) => self.dispatch(device, route, query, &request.body, now),
        };

        result.unwrap_or_else(|e| {
            debug!("{} {} rejected: {}", request.method, path, e);
            e.into()
        })
    }

    fn dispatch<S, R, P>(
        &mut self,
        device: &mut Device<S, R, P>,
        route: Route,
        query: &str,
        body: &[u8],
        now: Instant,
    ) -> Result<ApiResponse, ApiError>
    where
        S: Storage,
        R: WifiRadio,
        P: OutputPin,
    {
        match route {
            Route::Id => Ok(identity(device)),
            Route::Status => Ok(status(device)),
            Route::Toggle(segment) => self.toggle(device, &segment, body, now),
            Route::TestToggle => self.test_toggle(device, body, now),
            Route::Rescan => {
                device.rescan(now);
                Ok(ApiResponse::text("ok"))
            }
            Route::Networks => Ok(ApiResponse::ok(&NetworksResponse {
                networks: device.networks(),
                last_connected: device.last_connected(),
            })),
            Route::Connect => {
                let params = parse_query(query);
                let ssid = query::param(&params, "ssid");
                let password = query::param(&params, "password");
                match (ssid, password) {
                    (Some(ssid), Some(password)) => connect(device, ssid, password),
                    _ => Err(ApiError::MissingCredentials),
                }
            }
            Route::NewCredentials => {
                let json = dto::parse_body(body)?;
                let (ssid, password) = dto::credential_fields(&json)?;
                connect(device, ssid, password)
            }
            Route::Config => {
                let saved = DeviceConfig::load(device.store());
                Ok(ApiResponse::ok(&ConfigResponse {
                    device: &saved.device_name,
                    num_lights: saved.num_lights,
                    max_lights: MAX_LIGHTS,
                    lights: &saved.light_names,
                }))
            }
            Route::SaveConfig => save_config(device, query, now),
            Route::Restart => {
                let delay = device.timings().restart_delay;
                device.schedule_restart(now, delay);
                Ok(ApiResponse::text("Restarting..."))
            }
        }
    }

    fn toggle<S, R, P>(
        &mut self,
        device: &mut Device<S, R, P>,
        segment: &str,
        body: &[u8],
        now: Instant,
    ) -> Result<ApiResponse, ApiError>
    where
        S: Storage,
        R: WifiRadio,
        P: OutputPin,
    {
        let index = device.lights().find(segment).ok_or(ApiError::NotFound)?;
        if !self.toggle_window.allows(now) {
            return Err(ApiError::RateLimited);
        }

        let json = dto::parse_body(body)?;
        let action = Action::from_body(&json)?;
        device.toggle_light(index, action.is_on(), true)?;
        self.toggle_window.record(now);

        Ok(ApiResponse::ok(&StatusMessage { status: "success" }))
    }

    fn test_toggle<S, R, P>(
        &mut self,
        device: &mut Device<S, R, P>,
        body: &[u8],
        now: Instant,
    ) -> Result<ApiResponse, ApiError>
    where
        S: Storage,
        R: WifiRadio,
        P: OutputPin,
    {
        if !self.toggle_window.allows(now) {
            return Err(ApiError::RateLimited);
        }

        let json = dto::parse_body(body)?;
        let index = dto::light_index(&json)?;
        if index >= device.lights().active() {
            return Err(ApiError::InvalidLightIndex);
        }
        let action = Action::from_body(&json)?;
        device.toggle_light(index, action.is_on(), false)?;
        self.toggle_window.record(now);

        let lights = device.lights();
        Ok(ApiResponse::ok(&TestToggleResponse {
            light: index,
            name: lights.name(index).unwrap_or_default(),
            state: u8::from(lights.state(index).unwrap_or(false)),
        }))
    }
}

fn identity<S, R, P>(device: &Device<S, R, P>) -> ApiResponse
where
    S: Storage,
    R: WifiRadio,
    P: OutputPin,
{
    // Routes come from the bank so they match what /status and toggles accept.
    let snapshot = device.lights().snapshot();
    let lights = snapshot
        .iter()
        .map(|light| LightRoute {
            name: &light.name,
            api: format!("/{}/toggle", encode_segment(&light.name)),
        })
        .collect();
    ApiResponse::ok(&IdResponse {
        device: &device.config().device_name,
        lights,
    })
}

fn status<S, R, P>(device: &Device<S, R, P>) -> ApiResponse
where
    S: Storage,
    R: WifiRadio,
    P: OutputPin,
{
    let snapshot = device.lights().snapshot();
    let states = snapshot
        .iter()
        .map(|light| LightState {
            name: &light.name,
            state: if light.state { "on" } else { "off" },
        })
        .collect();
    ApiResponse::ok(&StatusResponse { states })
}

fn connect<S, R, P>(
    device: &mut Device<S, R, P>,
    ssid: &str,
    password: &str,
) -> Result<ApiResponse, ApiError>
where
    S: Storage,
    R: WifiRadio,
    P: OutputPin,
{
    if ssid.is_empty() || password.is_empty() {
        return Err(ApiError::EmptyCredentials);
    }
    let credentials = WifiCredentials::new(ssid, password)?;
    info!("Received WiFi credentials for '{}'", credentials.ssid);

    device.connect(&credentials)?;
    Ok(ApiResponse::ok(&StatusMessage {
        status: "connected",
    }))
}

fn save_config<S, R, P>(
    device: &mut Device<S, R, P>,
    query: &str,
    now: Instant,
) -> Result<ApiResponse, ApiError>
where
    S: Storage,
    R: WifiRadio,
    P: OutputPin,
{
    let params = parse_query(query);
    let update = ConfigUpdate::from_params(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    let saved = DeviceConfig::load(device.store());
    update.validate(&saved)?;
    if update.is_empty() {
        debug!("Save requested with no changes");
    } else {
        update.apply(device.store())?;
        info!("Configuration saved");
    }

    let delay = device.timings().config_restart_delay;
    device.schedule_restart(now, delay);
    Ok(ApiResponse::ok(&StatusMessage { status: "saved" }))
}
