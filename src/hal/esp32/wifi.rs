//! Soft access point for ESP32.
//!
//! The controller hosts its own network so a phone can join it and open
//! the web UI, no existing WiFi needed.
//!
//! # Example
//!
//! ```ignore
//! use train_pulse::hal::esp32::Esp32AccessPoint;
//! use train_pulse::config::AccessPointConfig;
//!
//! let ap = Esp32AccessPoint::new(modem, sysloop, nvs, &AccessPointConfig::default())?;
//! log::info!("UI at http://{:?}/", ap.ip_addr());
//! ```

use std::net::Ipv4Addr;

use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AccessPointConfiguration, AuthMethod, BlockingWifi, Configuration, EspWifi};
use log::info;

use crate::config::AccessPointConfig;

/// Soft access point manager for ESP32.
///
/// The access point is started during construction and kept up for the
/// lifetime of this struct.
pub struct Esp32AccessPoint<'a> {
    wifi: BlockingWifi<EspWifi<'a>>,
}

impl<'a> Esp32AccessPoint<'a> {
    /// Start the access point.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - WiFi initialization fails
    /// - The SSID or passphrase does not fit the driver's limits
    /// - The AP interface does not come up
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        config: &AccessPointConfig,
    ) -> anyhow::Result<Self> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        let mut ssid: heapless::String<32> = heapless::String::new();
        ssid.push_str(config.ssid.as_str())
            .map_err(|_| anyhow::anyhow!("SSID '{}' longer than 32 bytes", config.ssid))?;

        let mut password: heapless::String<64> = heapless::String::new();
        password
            .push_str(config.password.as_str())
            .map_err(|_| anyhow::anyhow!("passphrase longer than 64 bytes"))?;

        let auth_method = if config.is_open() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };

        wifi.set_configuration(&Configuration::AccessPoint(AccessPointConfiguration {
            ssid,
            password,
            channel: config.channel,
            auth_method,
            max_connections: config.max_connections,
            ..Default::default()
        }))?;

        info!("starting access point '{}'", config.ssid);
        wifi.start()?;
        wifi.wait_netif_up()?;

        let ap = Self { wifi };
        if let Some(ip) = ap.ip_addr() {
            info!("access point up, IP: {}", ip);
        }
        Ok(ap)
    }

    /// Address of the controller on its own network.
    pub fn ip_addr(&self) -> Option<Ipv4Addr> {
        self.wifi
            .wifi()
            .ap_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
    }

    /// Stop the access point.
    pub fn stop(&mut self) -> anyhow::Result<()> {
        self.wifi.stop()?;
        Ok(())
    }
}
