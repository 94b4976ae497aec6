//! Cached list of visible networks.
//!
//! Scanning blocks the radio for a couple of seconds, so real scans are
//! throttled and callers read the cached list instead.

use super::radio::WifiRadio;
use log::{info, warn};
use std::time::{Duration, Instant};

/// SSIDs seen by the last scan.
#[derive(Debug)]
pub struct ScanCache {
    networks: Vec<String>,
    last_scan: Option<Instant>,
    min_interval: Duration,
}

impl ScanCache {
    /// Create an empty cache allowing one real scan per `min_interval`.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            networks: Vec::new(),
            last_scan: None,
            min_interval,
        }
    }

    /// Cached SSIDs, in scan order, without duplicates or hidden networks.
    pub fn networks(&self) -> &[String] {
        &self.networks
    }

    /// Rescan unless the last scan was less than `min_interval` ago.
    ///
    /// Returns `true` if a scan was performed. A failed scan still counts
    /// towards the interval and keeps the previous list.
    pub fn refresh<R: WifiRadio>(&mut self, radio: &mut R, now: Instant) -> bool {
        if let Some(last) = self.last_scan {
            if now.saturating_duration_since(last) < self.min_interval {
                return false;
            }
        }
        self.last_scan = Some(now);

        match radio.scan() {
            Ok(found) => {
                let mut networks: Vec<String> = Vec::with_capacity(found.len());
                for ssid in found {
                    if !ssid.is_empty() && !networks.contains(&ssid) {
                        networks.push(ssid);
                    }
                }
                info!("Scan found {} network(s)", networks.len());
                self.networks = networks;
            }
            Err(e) => warn!("WiFi scan failed: {}", e),
        }
        true
    }
}
