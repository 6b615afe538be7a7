//! HTTP server for the ESP32 web API.
//!
//! A single wildcard GET handler passes the request target to the shared
//! [`RequestRouter`], so the ESP32 answers exactly like the desktop server.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use train_pulse::hal::esp32::Esp32HttpServer;
//! use train_pulse::services::{RequestRouter, SharedRegistry};
//!
//! let router = Arc::new(RequestRouter::new(Arc::new(shared)));
//! let server = Esp32HttpServer::new(&config.web, router)?;
//! ```

use std::sync::Arc;

use esp_idf_hal::io::Write;
use esp_idf_svc::http::server::{Configuration, EspHttpServer};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::EspIOError;
use log::info;

use crate::config::WebConfig;
use crate::services::{MotorBackend, RequestRouter};

/// HTTP server serving the motor API and web UI.
pub struct Esp32HttpServer {
    _server: EspHttpServer<'static>,
}

impl Esp32HttpServer {
    /// Start the server on `config.port`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP server fails to start.
    pub fn new<B: MotorBackend + 'static>(config: &WebConfig, router: Arc<RequestRouter<B>>) -> anyhow::Result<Self> {
        let server_config = Configuration {
            http_port: config.port,
            uri_match_wildcard: true,
            ..Default::default()
        };

        let mut server = EspHttpServer::new(&server_config)?;

        server.fn_handler("/*", Method::Get, move |req| {
            let target = req.uri().to_string();
            let result = router.handle(&target);
            let mut resp = req.into_response(result.status(), None, &[("Content-Type", result.content_type())])?;
            resp.write_all(result.body().as_bytes())?;
            Ok::<_, EspIOError>(())
        })?;

        info!("HTTP server started on port {}", config.port);

        Ok(Self { _server: server })
    }
}
