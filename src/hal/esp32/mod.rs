//! ESP32 hardware abstraction layer for train motor control.
//!
//! This module provides hardware implementations for driving model train
//! motors from an ESP32, either through an H-bridge (two direction lines
//! plus LEDC PWM) or through a pulse-count decoder on a single line.
//!
//! # Hardware Configuration
//!
//! - **GPIO**: push-pull outputs claimed by number at runtime
//! - **PWM**: up to four LEDC low-speed timer/channel pairs, 10-bit
//! - **Timing**: `Ets` busy-wait for pulse frames
//! - **Network**: soft access point + HTTP server (`wifi` / `esp32-http`)
//!
//! GPIO numbers come from [`crate::config::MotorConfig`] or the `/add`
//! route; nothing is wired at compile time.

mod hardware;

pub use hardware::{Esp32HalError, Esp32Hardware, Esp32Output, Esp32Pwm, PWM_SLOTS};

#[cfg(feature = "wifi")]
mod wifi;
#[cfg(feature = "wifi")]
pub use wifi::Esp32AccessPoint;

#[cfg(feature = "esp32-http")]
mod http;
#[cfg(feature = "esp32-http")]
pub use http::Esp32HttpServer;

