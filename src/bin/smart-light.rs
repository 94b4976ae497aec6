//! Smart light firmware binary.
//!
//! Runs on both ESP32 and host platforms:
//! - **Host**: `cargo run --bin smart-light`
//! - **ESP32**: `cargo espflash flash --bin smart-light --features esp32 --release`
//!
//! ## Host environment
//!
//! - `SMART_LIGHT_PORT` - HTTP port (default 8080)
//! - `SMART_LIGHT_DATA_DIR` - where settings are persisted (default `~/.smart-light`)
//! - `SMART_LIGHT_NETWORKS` - `ssid:password;...` networks the simulated radio
//!   can join (default: any)
//!
//! ## Endpoints
//!
//! - Light control: `/id`, `/status`, `/<light>/toggle`, `/testToggle`
//! - Provisioning: `/rescan`, `/networks`, `/connect`, `/newWiFiCredentials`
//! - Configuration: `/config`, `/saveConfig`, `/restart`

use log::{error, info};
use smart_light_esp32::{ControlApi, Device, HttpServer, ServeOutcome, Timings};

// ESP32: Initialize ESP-IDF before anything else
#[cfg(feature = "esp32")]
fn platform_init() {
    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    info!("ESP-IDF initialized");
}

// Host: Just initialize env_logger
#[cfg(not(feature = "esp32"))]
fn platform_init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn main() {
    platform_init();

    info!("=== Smart Light starting ===");

    #[cfg(feature = "esp32")]
    info!("Platform: ESP32");
    #[cfg(not(feature = "esp32"))]
    info!("Platform: Host");

    if let Err(e) = run() {
        error!("Fatal: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "esp32")]
fn run() -> Result<(), Box<dyn std::error::Error>> {
    use esp_idf_hal::gpio::{OutputPin, PinDriver};
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use smart_light_esp32::config::{DEFAULT_LIGHT_PINS, DEVICE_HTTP_PORT};
    use smart_light_esp32::storage::NvsStorage;
    use smart_light_esp32::wifi::EspWifiRadio;

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let radio = EspWifiRadio::new(peripherals.modem, sysloop, Some(nvs.clone()))?;
    let storage = NvsStorage::new(nvs);

    let gpio = peripherals.pins;
    let outputs = [
        gpio.gpio2.downgrade_output(),
        gpio.gpio4.downgrade_output(),
        gpio.gpio5.downgrade_output(),
        gpio.gpio18.downgrade_output(),
    ];
    let mut pins = Vec::with_capacity(outputs.len());
    for (number, pin) in DEFAULT_LIGHT_PINS.into_iter().zip(outputs) {
        pins.push((number, PinDriver::output(pin)?));
    }

    let timings = Timings::default();
    let mut device = Device::boot(storage, radio, pins, timings);
    if let Some(ip) = device.station_ip() {
        info!("Control API at http://{}/", ip);
    }

    let server = HttpServer::bind(None, DEVICE_HTTP_PORT)?;
    let mut api = ControlApi::new(&timings);
    match server.serve(&mut api, &mut device)? {
        ServeOutcome::Restart => esp_idf_hal::reset::restart(),
    }
}

#[cfg(not(feature = "esp32"))]
fn run() -> Result<(), Box<dyn std::error::Error>> {
    use smart_light_esp32::config::{HostSettings, DEFAULT_LIGHT_PINS};
    use smart_light_esp32::lights::SimulatedPin;
    use smart_light_esp32::storage::FileStorage;
    use smart_light_esp32::wifi::HostRadio;

    let settings = HostSettings::from_env();
    info!("Data directory: {}", settings.data_dir.display());

    let mut storage = FileStorage::new(&settings.data_dir);
    let mut radio = HostRadio::new(settings.networks);
    let server = HttpServer::bind(None, settings.port)?;
    let timings = Timings::default();

    loop {
        // Power-on state: every output low.
        let pins = SimulatedPin::bank(&DEFAULT_LIGHT_PINS);

        let mut device = Device::boot(storage, radio, pins, timings);
        info!("Control API at http://localhost:{}/", settings.port);

        let mut api = ControlApi::new(&timings);
        match server.serve(&mut api, &mut device)? {
            ServeOutcome::Restart => {
                let (s, r, _) = device.shutdown();
                storage = s;
                radio = r;
                info!("=== Smart Light restarting ===");
            }
        }
    }
}
