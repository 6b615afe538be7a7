//! Desktop server for trying the web UI without hardware.
//!
//! Runs the full HTTP API over mock lines, so you can:
//! - Open the web UI at http://localhost:8080
//! - Add motors and drive them from a browser or curl
//! - Watch every pin edge and PWM write in the log (`RUST_LOG=debug`)
//!
//! # Usage
//!
//! ```sh
//! cargo run --example desktop_server --features web
//! RUST_LOG=train_pulse=debug cargo run --example desktop_server --features web
//! ```
//!
//! # Configuration
//!
//! Edit the `Config::default()` call in `main()` to customize the fleet.

use std::sync::Arc;

use train_pulse::hal::{MockHardware, SignalTrace};
use train_pulse::services::{run_server, RequestRouter, SharedRegistry, WebServerConfig};
use train_pulse::{Config, MotorConfig, PinAssignment};
use tracing_subscriber::EnvFilter;

/// Desktop port; port 80 usually needs privileges.
const DESKTOP_PORT: u16 = 8080;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=================================");
    println!("  train-pulse Desktop Server");
    println!("=================================");
    println!();

    // Default DirectPulse motor plus one H-bridge motor
    let config = Config::default().with_motor(MotorConfig::new("Shunter", 1_000, PinAssignment::bridge(14, 16, 15)));

    // The trace only grows, so keep it off for a long-running server.
    let hardware = MockHardware::new(SignalTrace::disabled());
    let shared = SharedRegistry::from_config(&config, hardware)
        .map_err(|e| anyhow::anyhow!("motor setup failed: {e}"))?;
    let router = Arc::new(RequestRouter::new(Arc::new(shared)));

    let web_config = WebServerConfig::from_config(&config.web.clone().with_port(DESKTOP_PORT));

    println!("Starting web server...");
    println!("  Web UI: http://{}", web_config.addr);
    println!("  API:    http://{}/status", web_config.addr);
    println!();
    println!("Press Ctrl+C to stop.");
    println!();

    run_server(router, web_config).await?;
    Ok(())
}
