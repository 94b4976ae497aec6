//! ESP-IDF WiFi radio.
//!
//! Wraps the non-blocking `EspWifi` driver. Association is started with
//! `connect()` and then polled through [`WifiRadio::is_associated`]; the
//! deadline lives in the connectivity manager.

use super::config::{AccessPointSettings, WifiCredentials};
use super::radio::{RadioError, WifiRadio};
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::ipv4::{self, Mask, RouterConfiguration, Subnet};
use esp_idf_svc::netif::{EspNetif, NetifConfiguration};
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::config::ScanConfig;
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi,
};
use esp_idf_sys::EspError;
use log::{debug, info};
use std::net::Ipv4Addr;

/// Station + access-point radio backed by ESP-IDF.
pub struct EspWifiRadio {
    wifi: EspWifi<'static>,
    access_point: Option<AccessPointConfiguration>,
}

impl EspWifiRadio {
    /// Create the driver. Passing the NVS partition lets ESP-IDF keep its
    /// calibration data between boots.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> Result<Self, EspError> {
        let wifi = EspWifi::new(modem, sysloop, nvs)?;
        Ok(Self {
            wifi,
            access_point: None,
        })
    }

    /// Give the AP interface a fixed router address, and set the hostname
    /// on both interfaces.
    fn configure_netifs(&mut self, settings: &AccessPointSettings) -> Result<(), RadioError> {
        let mask = Mask(settings.prefix_len);
        let ap_conf = NetifConfiguration {
            ip_configuration: Some(ipv4::Configuration::Router(RouterConfiguration {
                subnet: Subnet {
                    gateway: settings.address,
                    mask,
                },
                dhcp_enabled: true,
                dns: Some(settings.gateway),
                secondary_dns: None,
            })),
            ..NetifConfiguration::wifi_default_router()
        };
        let ap_netif = EspNetif::new_with_conf(&ap_conf)?;
        self.wifi.swap_netif_ap(ap_netif)?;

        self.wifi.sta_netif_mut().set_hostname(&settings.hostname)?;
        self.wifi.ap_netif_mut().set_hostname(&settings.hostname)?;
        Ok(())
    }

    fn client_configuration(credentials: &WifiCredentials) -> Result<ClientConfiguration, RadioError> {
        Ok(ClientConfiguration {
            ssid: credentials
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| RadioError::InvalidSsid)?,
            password: credentials
                .password
                .as_str()
                .try_into()
                .map_err(|_| RadioError::InvalidPassword)?,
            auth_method: AuthMethod::WPA2Personal,
            ..Default::default()
        })
    }

    fn restart_with(&mut self, configuration: &Configuration) -> Result<(), RadioError> {
        if self.wifi.is_started()? {
            // Not connected is fine here.
            let _ = self.wifi.disconnect();
            self.wifi.stop()?;
        }
        self.wifi.set_configuration(configuration)?;
        self.wifi.start()?;
        Ok(())
    }
}

impl WifiRadio for EspWifiRadio {
    fn start_access_point(&mut self, settings: &AccessPointSettings) -> Result<(), RadioError> {
        if self.access_point.is_none() {
            self.configure_netifs(settings)?;
        }
        let ap = AccessPointConfiguration {
            ssid: settings
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| RadioError::InvalidSsid)?,
            password: settings
                .password
                .as_str()
                .try_into()
                .map_err(|_| RadioError::InvalidPassword)?,
            auth_method: AuthMethod::WPA2Personal,
            channel: 1,
            ..Default::default()
        };

        // Mixed keeps a station half around so scans work while hosting.
        self.restart_with(&Configuration::Mixed(ClientConfiguration::default(), ap.clone()))?;
        self.access_point = Some(ap);
        info!("AP started, IP: {}", settings.address);
        Ok(())
    }

    fn begin_station(
        &mut self,
        credentials: &WifiCredentials,
        keep_access_point: bool,
    ) -> Result<(), RadioError> {
        let client = Self::client_configuration(credentials)?;
        let configuration = match (&self.access_point, keep_access_point) {
            (Some(ap), true) => Configuration::Mixed(client, ap.clone()),
            _ => Configuration::Client(client),
        };
        self.restart_with(&configuration)?;
        self.wifi.connect()?;
        debug!("Association with '{}' started", credentials.ssid);
        Ok(())
    }

    fn is_associated(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false) && self.wifi.sta_netif().is_up().unwrap_or(false)
    }

    fn settle_station(&mut self) -> Result<(), RadioError> {
        if let Configuration::Mixed(client, _) = self.wifi.get_configuration()? {
            // Changing mode on a live link keeps the association.
            self.wifi.set_configuration(&Configuration::Client(client))?;
        }
        Ok(())
    }

    fn scan(&mut self) -> Result<Vec<String>, RadioError> {
        self.wifi.start_scan(&ScanConfig::default(), true)?;
        let found = self.wifi.get_scan_result()?;
        Ok(found.into_iter().map(|ap| ap.ssid.to_string()).collect())
    }

    fn station_ip(&self) -> Option<Ipv4Addr> {
        if !self.is_associated() {
            return None;
        }
        self.wifi.sta_netif().get_ip_info().ok().map(|info| info.ip)
    }
}
