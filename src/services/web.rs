//! Axum-based HTTP server for the motor API.
//!
//! Provides GET endpoints for:
//! - `/status` - State of every motor
//! - `/add?name=..&pwm=..&freq=..` (or `rx=..`) - Create a motor
//! - `/<name>/<action>[?val=n]` - Drive a motor
//! - `/`, `/index.html` - Web UI
//!
//! Motor work blocks for whole pulse frames, so every call into the
//! backend runs on tokio's blocking pool.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, State},
    routing::get,
    Router,
};
use log::info;
use tower_http::cors::{Any, CorsLayer};

use crate::config::WebConfig;

use super::router::{ApiResult, RequestRouter, INDEX_HTML};
use super::shared::MotorBackend;

// ============================================================================
// Route Handlers
// ============================================================================

async fn blocking<F>(f: F) -> ApiResult
where
    F: FnOnce() -> ApiResult + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => ApiResult::error(500, e.to_string()),
    }
}

/// GET /status
async fn status<B: MotorBackend + 'static>(State(router): State<Arc<RequestRouter<B>>>) -> ApiResult {
    blocking(move || router.handle_status()).await
}

/// GET /add?name=..&pwm=..&freq=..
async fn add<B: MotorBackend + 'static>(
    State(router): State<Arc<RequestRouter<B>>>,
    RawQuery(query): RawQuery,
) -> ApiResult {
    blocking(move || router.handle_add(query.as_deref().unwrap_or(""))).await
}

/// GET /<name>/<action>[?val=n]
async fn action<B: MotorBackend + 'static>(
    State(router): State<Arc<RequestRouter<B>>>,
    Path((name, action)): Path<(String, String)>,
    RawQuery(query): RawQuery,
) -> ApiResult {
    blocking(move || router.handle_action(&name, &action, query.as_deref())).await
}

/// GET / - Serve the web UI
async fn index() -> ApiResult {
    ApiResult::Html(INDEX_HTML)
}

/// Any other shape of request
async fn bad_request() -> ApiResult {
    ApiResult::bad_request("bad request")
}

// ============================================================================
// Server Builder
// ============================================================================

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self::from_config(&WebConfig::default())
    }
}

impl WebServerConfig {
    /// Create a new config with the given address
    pub fn new(addr: impl Into<SocketAddr>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Set whether CORS should be permissive
    pub fn cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Create from shared WebConfig
    pub fn from_config(config: &WebConfig) -> Self {
        Self {
            addr: ([0, 0, 0, 0], config.port).into(),
            cors_permissive: config.cors_permissive,
        }
    }
}

/// Build the Axum router with all routes
pub fn build_router<B: MotorBackend + 'static>(router: Arc<RequestRouter<B>>, config: &WebServerConfig) -> Router {
    let mut app = Router::new()
        .route("/", get(index))
        .route("/index.html", get(index))
        .route("/status", get(status::<B>))
        .route("/add", get(add::<B>))
        .route("/:name/:action", get(action::<B>))
        .fallback(bad_request)
        .with_state(router);

    if config.cors_permissive {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    app
}

/// Start the web server
///
/// This function blocks until the server is shut down.
pub async fn run_server<B: MotorBackend + 'static>(
    router: Arc<RequestRouter<B>>,
    config: WebServerConfig,
) -> Result<(), std::io::Error> {
    let app = build_router(router, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("web server listening on http://{}", config.addr);

    axum::serve(listener, app).await
}
