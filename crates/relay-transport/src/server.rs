//! WebSocket transport server using Axum.
//!
//! Serves the chat page, upgrades `/ws` requests, and runs one hub session
//! per upgraded socket on the connection's own task.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{WebSocket, rejection::WebSocketUpgradeRejection},
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use relay_hub::{Broadcaster, HubConfig, Session};
use thiserror::Error;
use tokio::sync::mpsc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

use crate::page::render_home;
use crate::ws::{WsSink, into_connection};

/// The hub as used by this transport.
pub type WsBroadcaster = Broadcaster<WsSink>;

/// Transport server configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Port to listen on (0 for OS-assigned)
    pub port: u16,
    /// Hostname to bind to
    pub hostname: String,
    /// Endpoint URL advertised by the home page (derived from the bind
    /// address when unset)
    pub public_url: Option<String>,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum concurrent connections
    pub max_connections: Option<usize>,
    /// Hub settings (welcome text, write deadline)
    pub hub: HubConfig,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            hostname: "127.0.0.1".into(),
            public_url: None,
            enable_cors: false,
            max_connections: None,
            hub: HubConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid listen address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read bound address: {0}")]
    LocalAddr(#[source] std::io::Error),
}

/// Shared state for the HTTP handlers.
struct AppState {
    hub: Arc<WsBroadcaster>,
    home_page: String,
    max_connections: Option<usize>,
    /// Live sessions, tracked outside the registry lock so the
    /// connection cap never waits on a broadcast
    session_count: AtomicUsize,
}

/// The transport server — owns the hub and the listening task.
pub struct TransportServer {
    hub: Arc<WsBroadcaster>,
    /// Shutdown signal
    shutdown_tx: Option<mpsc::Sender<()>>,
    /// Server task handle
    handle: Option<tokio::task::JoinHandle<()>>,
    /// Actual bound port
    port: u16,
    endpoint: String,
}

impl TransportServer {
    /// Bind the listener, create the hub, and start serving.
    pub async fn start(config: TransportConfig) -> Result<Self, TransportError> {
        let addr: SocketAddr = format!("{}:{}", config.hostname, config.port).parse()?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind { addr, source })?;
        let actual_port = listener.local_addr().map_err(TransportError::LocalAddr)?.port();

        let endpoint = endpoint_url(&config, actual_port);
        let hub = Arc::new(Broadcaster::new(config.hub.clone()));
        let app = router(hub.clone(), &config, &endpoint);

        info!("Relay listening on http://{}:{}/ (socket: {endpoint})", config.hostname, actual_port);

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                })
                .await
                .ok();
        });

        Ok(Self {
            hub,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
            port: actual_port,
            endpoint,
        })
    }

    /// Get the actual bound port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// WebSocket URL advertised to clients.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The process-wide hub shared by every session.
    pub fn hub(&self) -> Arc<WsBroadcaster> {
        self.hub.clone()
    }

    /// Gracefully stop the server.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("Relay transport stopped");
    }
}

/// Endpoint URL for the home page.
///
/// Unspecified bind addresses are advertised as `localhost`.
pub fn endpoint_url(config: &TransportConfig, port: u16) -> String {
    if let Some(url) = &config.public_url {
        return url.clone();
    }
    let host = match config.hostname.as_str() {
        "0.0.0.0" | "::" | "[::]" => "localhost",
        other => other,
    };
    format!("ws://{host}:{port}/ws")
}

/// Build the HTTP router around an existing hub.
pub fn router(hub: Arc<WsBroadcaster>, config: &TransportConfig, endpoint: &str) -> Router {
    let state = Arc::new(AppState {
        hub,
        home_page: render_home(endpoint),
        max_connections: config.max_connections,
        session_count: AtomicUsize::new(0),
    });

    let app = Router::new()
        .route("/", get(home_handler))
        .route("/ws", get(ws_upgrade_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn home_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.home_page.clone())
}

async fn ws_upgrade_handler(
    State(state): State<Arc<AppState>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            warn!("Handshake rejected: {rejection}");
            return rejection.into_response();
        }
    };

    // Check connection limit
    if let Some(max) = state.max_connections {
        let current = state.session_count.load(Ordering::Relaxed);
        if current >= max {
            warn!("Connection rejected: max connections reached ({max})");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    }

    ws.on_failed_upgrade(|e| warn!("Handshake failed: {e}"))
        .on_upgrade(move |socket| handle_ws_connection(socket, state))
}

// ─────────────────────────────────────────────────────────────────────────────
// WebSocket Connection Handler
// ─────────────────────────────────────────────────────────────────────────────

async fn handle_ws_connection(socket: WebSocket, state: Arc<AppState>) {
    state.session_count.fetch_add(1, Ordering::Relaxed);

    let summary = Session::run(state.hub.clone(), into_connection(socket)).await;

    state.session_count.fetch_sub(1, Ordering::Relaxed);
    debug!(
        "Session {} ended after relaying {} message(s): {}",
        summary.id, summary.relayed, summary.reason
    );
}
