//! Network front end.
//!
//! The radio itself lives in [`crate::wifi`]; this module only serves the
//! control API over whatever interface is up (station or access point).

mod http_server;

pub use http_server::{HttpServer, ServeOutcome, MAX_BODY_BYTES};
