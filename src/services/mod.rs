//! Request routing and HTTP servers.
//!
//! This module provides the network-facing side of the motor registry:
//! - `shared`: [`SharedRegistry`], the one lock around registry + hardware,
//!   behind the [`MotorBackend`] trait
//! - `router`: [`RequestRouter`], platform-agnostic GET routing
//! - `web` feature: Axum server wrapping the router
//!
//! The ESP32 server in `hal::esp32` drives the same router, so both
//! platforms answer every route identically.
//!
//! # Shared State Pattern
//!
//! ```ignore
//! use std::sync::Arc;
//! use train_pulse::services::{RequestRouter, SharedRegistry};
//!
//! let shared = Arc::new(SharedRegistry::from_config(&config, hardware)?);
//! let router = Arc::new(RequestRouter::new(shared));
//!
//! run_server(router, WebServerConfig::from_config(&config.web)).await?;
//! ```

pub mod router;
pub mod shared;

#[cfg(feature = "web")]
pub mod web;

// Re-exports
pub use router::*;
pub use shared::*;

#[cfg(feature = "web")]
pub use web::*;
