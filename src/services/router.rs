//! Request routing shared by the desktop and ESP32 HTTP servers.
//!
//! `RequestRouter` maps GET request targets onto [`MotorBackend`]
//! operations. Platform-specific servers hand it the raw target (or the
//! already split path pieces) and translate the [`ApiResult`] into their
//! native response type.
//!
//! # Routes
//!
//! | Target | Result |
//! |--------|--------|
//! | `/`, `/index.html` | Web UI |
//! | `/status` | JSON array of every motor's state |
//! | `/add?name=<str>&pwm=<gpio>&freq=<hz>` | BridgePwm motor; direction lines on `pwm - 1` / `pwm + 1` |
//! | `/add?name=<str>&rx=<gpio>&freq=<hz>` | DirectPulse motor on `rx` |
//! | `/<name>/<action>[?val=<int>]` | Action result as JSON |
//!
//! Anything else is a 400.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use train_pulse::hal::{MockHardware, SignalTrace};
//! use train_pulse::services::{RequestRouter, SharedRegistry};
//! use train_pulse::Config;
//!
//! let hw = MockHardware::new(SignalTrace::disabled());
//! let shared = Arc::new(SharedRegistry::from_config(&Config::default(), hw).unwrap());
//! let router = RequestRouter::new(shared);
//!
//! assert_eq!(router.handle("/status").status(), 200);
//! assert_eq!(router.handle("/TestTrain/forward").status(), 200);
//! assert_eq!(router.handle("/Ghost/forward").status(), 404);
//! assert_eq!(router.handle("/a/b/c").status(), 400);
//! ```

use log::{debug, warn};
use percent_encoding::percent_decode_str;

use crate::motor::PinAssignment;

use super::shared::{MotorBackend, ServiceError};

/// Embedded web UI.
pub const INDEX_HTML: &str = include_str!("../../www/index.html");

// ============================================================================
// API Response Types
// ============================================================================

/// Result of an API operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResult {
    /// Success with JSON response body.
    Ok(String),
    /// Success with an HTML page.
    Html(&'static str),
    /// Error with status code and message.
    Error(u16, String),
}

impl ApiResult {
    /// Create a success response.
    pub fn ok(json: impl Into<String>) -> Self {
        Self::Ok(json.into())
    }

    /// Create an error response.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::Error(status, message.into())
    }

    /// Create a bad request (400) error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Error(400, message.into())
    }

    /// Check if this is a success response.
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Error(..))
    }

    /// Response body: JSON, HTML, or a JSON error object.
    pub fn body(&self) -> String {
        match self {
            Self::Ok(json) => json.clone(),
            Self::Html(html) => (*html).to_string(),
            Self::Error(_, msg) => serde_json::json!({ "error": msg }).to_string(),
        }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        match self {
            Self::Ok(_) | Self::Html(_) => 200,
            Self::Error(status, _) => *status,
        }
    }

    /// Content type of [`body`](Self::body).
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Html(_) => "text/html; charset=utf-8",
            _ => "application/json",
        }
    }
}

impl From<ServiceError> for ApiResult {
    fn from(err: ServiceError) -> Self {
        Self::Error(err.status, err.message)
    }
}

// Axum integration: allow ApiResult to be returned directly from handlers
#[cfg(feature = "web")]
impl axum::response::IntoResponse for ApiResult {
    fn into_response(self) -> axum::response::Response {
        use axum::http::{header, StatusCode};

        let status = StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, self.content_type())], self.body()).into_response()
    }
}

// ============================================================================
// Request Router
// ============================================================================

/// Maps request targets to motor operations.
pub struct RequestRouter<B: MotorBackend> {
    backend: B,
}

impl<B: MotorBackend> RequestRouter<B> {
    /// Create a router over `backend`.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// The backend requests are routed to.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Route a raw request target such as `/Loco/speed?val=40`.
    pub fn handle(&self, target: &str) -> ApiResult {
        let route = target.strip_prefix('/').unwrap_or(target);
        let (path, query) = match route.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (route, None),
        };
        debug!("route '{}'", route);

        match path {
            "" | "index.html" => ApiResult::Html(INDEX_HTML),
            "status" => self.handle_status(),
            "add" => self.handle_add(query.unwrap_or("")),
            _ => match path.split_once('/') {
                Some((name, action)) if !name.is_empty() && !action.is_empty() && !action.contains('/') => {
                    // Path segments are percent-decoded only; `+` stays literal.
                    match percent_decode_str(name).decode_utf8() {
                        Ok(name) => self.handle_action(&name, action, query),
                        Err(_) => ApiResult::bad_request("malformed motor name"),
                    }
                }
                _ => ApiResult::bad_request("bad request"),
            },
        }
    }

    /// GET /status - every motor's state as a JSON array.
    pub fn handle_status(&self) -> ApiResult {
        to_json(&self.backend.status())
    }

    /// GET /add - create (or replace) a motor from query parameters.
    ///
    /// Takes `name`, `freq` and exactly one of `pwm` (BridgePwm; direction
    /// lines on the adjacent GPIOs) or `rx` (DirectPulse).
    pub fn handle_add(&self, query: &str) -> ApiResult {
        let request = match AddRequest::parse(query) {
            Ok(request) => request,
            Err(msg) => {
                warn!("rejected add request '{}': {}", query, msg);
                return ApiResult::bad_request(msg);
            }
        };

        match self.backend.add(&request.name, request.frequency_hz, request.pins) {
            Ok(state) => to_json(&state),
            Err(err) => {
                warn!("add '{}' failed: {}", request.name, err);
                err.into()
            }
        }
    }

    /// GET /<name>/<action>[?val=<int>] - dispatch an action.
    ///
    /// An empty `val` counts as no value.
    pub fn handle_action(&self, name: &str, action: &str, query: Option<&str>) -> ApiResult {
        let raw = query.and_then(|q| query_value(q, "val"));
        let value = match raw.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<i32>() {
                Ok(v) => Some(v),
                Err(_) => return ApiResult::bad_request("val must be an integer"),
            },
        };

        match self.backend.dispatch(name, action, value) {
            Ok(state) => to_json(&state),
            Err(err) => {
                warn!("{} /{}/{}: {}", err.status, name, action, err);
                err.into()
            }
        }
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> ApiResult {
    match serde_json::to_string(value) {
        Ok(json) => ApiResult::Ok(json),
        Err(e) => ApiResult::error(500, e.to_string()),
    }
}

// ============================================================================
// Query Parsing
// ============================================================================

/// Parsed `/add` parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddRequest {
    /// Motor name.
    pub name: String,
    /// Carrier frequency.
    pub frequency_hz: u32,
    /// GPIO numbers.
    pub pins: PinAssignment,
}

impl AddRequest {
    /// Parse an `/add` query string.
    ///
    /// ```
    /// use train_pulse::services::AddRequest;
    /// use train_pulse::PinAssignment;
    ///
    /// let req = AddRequest::parse("name=TremB&pwm=15&freq=2000").unwrap();
    /// assert_eq!(req.pins, PinAssignment::bridge(14, 16, 15));
    ///
    /// assert!(AddRequest::parse("name=TremB&freq=2000").is_err());
    /// ```
    pub fn parse(query: &str) -> Result<Self, &'static str> {
        let name = query_value(query, "name").ok_or("missing or malformed name")?;
        if name.is_empty() {
            return Err("missing or malformed name");
        }
        let frequency_hz = query_value(query, "freq")
            .and_then(|f| f.trim().parse::<u32>().ok())
            .ok_or("missing or malformed freq")?;

        let gpio = |key: &str| -> Result<Option<u8>, &'static str> {
            match query_value(query, key) {
                None => Ok(None),
                Some(v) => v.trim().parse::<u8>().map(Some).map_err(|_| "pin must be a GPIO number"),
            }
        };

        let pins = match (gpio("pwm")?, gpio("rx")?) {
            (Some(pwm), None) => {
                let forward = pwm.checked_sub(1).ok_or("no GPIO below pwm pin")?;
                let backward = pwm.checked_add(1).ok_or("no GPIO above pwm pin")?;
                PinAssignment::bridge(forward, backward, pwm)
            }
            (None, Some(rx)) => PinAssignment::direct(rx),
            (Some(_), Some(_)) => return Err("give either pwm or rx, not both"),
            (None, None) => return Err("missing pwm or rx pin"),
        };

        Ok(Self {
            name,
            frequency_hz,
            pins,
        })
    }
}

/// First value for `key` in an `application/x-www-form-urlencoded` query.
///
/// A key present without `=` yields an empty value.
pub fn query_value(query: &str, key: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k.as_ref() == key)
        .map(|(_, v)| v.into_owned())
}
