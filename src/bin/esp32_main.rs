//! ESP32 train motor controller.
//!
//! This is the main entry point for the physical hardware controller:
//! - Builds the default fleet from [`Config`] (one DirectPulse motor on GPIO4)
//! - Hosts its own WiFi access point (if enabled)
//! - Serves the HTTP API and web UI (if enabled)
//!
//! All motor work happens inside HTTP handlers; the main thread only keeps
//! the drivers alive.
//!
//! # Build
//!
//! ```bash
//! cargo build --release --features esp32-http --bin esp32_main
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use train_pulse::hal::esp32::{Esp32AccessPoint, Esp32Hardware, Esp32HttpServer};
use train_pulse::services::{MotorBackend, RequestRouter, SharedRegistry};
use train_pulse::Config;

/// Idle loop interval in milliseconds
const IDLE_INTERVAL_MS: u64 = 1000;

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();

    esp_idf_svc::log::EspLogger::initialize_default();

    println!();
    println!("================================");
    println!("  train-pulse motor controller");
    println!("================================");
    println!();

    // =========================================================================
    // Configuration
    // =========================================================================
    let config = Config::default();

    // =========================================================================
    // Motors
    // =========================================================================
    let shared = SharedRegistry::from_config(&config, Esp32Hardware::new())
        .map_err(|e| anyhow::anyhow!("motor setup failed: {e}"))?;
    shared.with_registry(|registry| {
        for motor in registry.all() {
            println!(
                "[OK] {} ({}, {} Hz)",
                motor.name(),
                motor.mode(),
                motor.frequency_hz()
            );
        }
    });

    // =========================================================================
    // Access point
    // =========================================================================
    let _access_point = if config.access_point.enabled {
        let peripherals = Peripherals::take()?;
        let sysloop = EspSystemEventLoop::take()?;
        let nvs = EspDefaultNvsPartition::take()?;

        let ap = Esp32AccessPoint::new(peripherals.modem, sysloop, Some(nvs), &config.access_point)?;
        println!("[OK] Access point '{}': {:?}", config.access_point.ssid, ap.ip_addr());
        Some(ap)
    } else {
        println!("[SKIP] Access point disabled");
        None
    };

    // =========================================================================
    // HTTP server (web API + UI)
    // =========================================================================
    let router = Arc::new(RequestRouter::new(Arc::new(shared)));
    let _server = if config.web.enabled {
        let server = Esp32HttpServer::new(&config.web, router.clone())?;
        println!("[OK] HTTP server on port {}", config.web.port);
        Some(server)
    } else {
        println!("[SKIP] HTTP server disabled");
        None
    };
    println!("     {} motor(s) ready", router.backend().status().len());

    if config.web.enabled {
        println!();
        println!("Web UI: http://<ap-ip>/");
        println!();
    }

    loop {
        thread::sleep(Duration::from_millis(IDLE_INTERVAL_MS));
    }
}
