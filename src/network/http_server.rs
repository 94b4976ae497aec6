//! HTTP server for the control API.
//!
//! Uses `tiny_http`, which works on both host and ESP32 (via std::net).
//! The server runs on the calling thread: it polls for a request with a
//! short timeout, hands it to [`ControlApi`] and lets the device run its
//! background supervision between requests. Requests are therefore
//! handled strictly one at a time, in arrival order.

use crate::api::{ApiError, ApiRequest, ApiResponse, ControlApi};
use crate::device::{Device, Supervision};
use crate::storage::Storage;
use crate::wifi::WifiRadio;
use embedded_hal::digital::OutputPin;
use log::{debug, info, warn};
use std::io::{self, Read};
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tiny_http::{Header, Request, Response, Server};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024;

/// How long one poll waits for a request before supervision runs.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Why [`HttpServer::serve`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeOutcome {
    /// The device asked to be restarted.
    Restart,
}

/// Single-threaded HTTP front end.
pub struct HttpServer {
    server: Server,
}

impl HttpServer {
    /// Bind the server.
    ///
    /// # Arguments
    ///
    /// * `bind_addr` - IP address to bind to (use `None` for 0.0.0.0)
    /// * `port` - Port to listen on (0 picks a free port)
    pub fn bind(bind_addr: Option<IpAddr>, port: u16) -> io::Result<Self> {
        let addr = match bind_addr {
            Some(ip) => format!("{}:{}", ip, port),
            None => format!("0.0.0.0:{}", port),
        };

        let server = Server::http(&addr)
            .map_err(|e| io::Error::new(io::ErrorKind::AddrInUse, format!("{}", e)))?;

        info!("Control API listening on http://{}/", addr);
        Ok(Self { server })
    }

    /// Port actually bound.
    pub fn port(&self) -> Option<u16> {
        self.server.server_addr().to_ip().map(|addr| addr.port())
    }

    /// Serve requests until the device asks for a restart.
    pub fn serve<S, R, P>(
        &self,
        api: &mut ControlApi,
        device: &mut Device<S, R, P>,
    ) -> io::Result<ServeOutcome>
    where
        S: Storage,
        R: WifiRadio,
        P: OutputPin,
    {
        loop {
            if let Some(request) = self.server.recv_timeout(POLL_INTERVAL)? {
                Self::respond(request, api, device);
            }

            if device.tick(Instant::now()) == Supervision::Restart {
                info!("Restarting...");
                return Ok(ServeOutcome::Restart);
            }
        }
    }

    fn respond<S, R, P>(mut request: Request, api: &mut ControlApi, device: &mut Device<S, R, P>)
    where
        S: Storage,
        R: WifiRadio,
        P: OutputPin,
    {
        let method = request.method().clone();
        let url = request.url().to_string();
        debug!("{} {}", method, url);

        let response = match read_body(&mut request) {
            Ok(body) => {
                let api_request = ApiRequest::new(method, url, body);
                api.handle(device, &api_request, Instant::now())
            }
            Err(e) => e,
        };

        if let Err(e) = request.respond(to_http(response)) {
            warn!("Failed to send response: {}", e);
        }
    }
}

/// Read the body, refusing anything over [`MAX_BODY_BYTES`].
fn read_body(request: &mut Request) -> Result<Vec<u8>, ApiResponse> {
    let mut body = Vec::new();
    let limit = MAX_BODY_BYTES as u64 + 1;
    if let Err(e) = request.as_reader().take(limit).read_to_end(&mut body) {
        warn!("Failed to read request body: {}", e);
        return Err(ApiResponse::from(ApiError::InvalidJson));
    }
    if body.len() > MAX_BODY_BYTES {
        return Err(ApiResponse::from(ApiError::BodyTooLarge {
            limit: MAX_BODY_BYTES,
        }));
    }
    Ok(body)
}

fn to_http(response: ApiResponse) -> Response<io::Cursor<Vec<u8>>> {
    let mut http = Response::from_string(response.body)
        .with_status_code(response.status)
        .with_header(header("Content-Type", response.content_type));
    if let Some(allow) = response.allow {
        http = http.with_header(header("Allow", allow));
    }
    http
}

fn header(name: &'static str, value: &'static str) -> Header {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).expect("static header")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Timings, DEFAULT_LIGHT_PINS};
    use crate::lights::SimulatedPin;
    use crate::storage::MemoryStorage;
    use crate::wifi::mock::ScriptedRadio;
    use std::io::Write;
    use std::net::{Ipv4Addr, TcpStream};
    use std::sync::mpsc;
    use std::thread;

    fn exchange(port: u16, raw: &str) -> String {
        let mut stream = TcpStream::connect((Ipv4Addr::LOCALHOST, port)).unwrap();
        stream.write_all(raw.as_bytes()).unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    }

    #[test]
    fn test_serves_until_restart() {
        let server = HttpServer::bind(Some(IpAddr::V4(Ipv4Addr::LOCALHOST)), 0).unwrap();
        let port = server.port().unwrap();
        let pins = SimulatedPin::bank(&DEFAULT_LIGHT_PINS);
        let timings = Timings::fast();
        let mut device = Device::boot(MemoryStorage::new(), ScriptedRadio::new(), pins, timings);
        let mut api = ControlApi::new(&timings);

        let (tx, rx) = mpsc::channel();
        let client = thread::spawn(move || {
            let status = exchange(
                port,
                "GET /status HTTP/1.1\r\nHost: device\r\nConnection: close\r\n\r\n",
            );
            let big = "x".repeat(MAX_BODY_BYTES + 1);
            let oversized = exchange(
                port,
                &format!(
                    "POST /testToggle HTTP/1.1\r\nHost: device\r\nConnection: close\r\nContent-Length: {}\r\n\r\n{}",
                    big.len(),
                    big
                ),
            );
            let wrong_method = exchange(
                port,
                "GET /0/toggle HTTP/1.1\r\nHost: device\r\nConnection: close\r\n\r\n",
            );
            let restart = exchange(
                port,
                "GET /restart HTTP/1.1\r\nHost: device\r\nConnection: close\r\n\r\n",
            );
            tx.send((status, oversized, wrong_method, restart)).unwrap();
        });

        let outcome = server.serve(&mut api, &mut device).unwrap();
        assert_eq!(outcome, ServeOutcome::Restart);
        client.join().unwrap();

        let (status, oversized, wrong_method, restart) = rx.recv().unwrap();
        assert!(status.starts_with("HTTP/1.1 200"));
        assert!(status.contains("application/json"));
        assert!(status.contains(r#""states""#));
        assert!(oversized.starts_with("HTTP/1.1 400"));
        assert!(wrong_method.starts_with("HTTP/1.1 405"));
        assert!(wrong_method.contains("Allow: POST"));
        assert!(restart.contains("Restarting..."));
    }
}
