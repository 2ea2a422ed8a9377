pub mod error;
pub mod handlers;
pub mod protected;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use reqwest::Url;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::ConfigSource;
use crate::render::Statuses;
use crate::router::CALLBACK_PATH;
use crate::store::Store;

pub struct AppState {
    pub store: Mutex<Store>,
    pub statuses: Mutex<Statuses>,
    pub http: reqwest::Client,
    pub config_source: ConfigSource,
    /// Base URL the page is served from; request paths are resolved against it.
    pub origin: Url,
}

impl AppState {
    pub fn new(store: Store, config_source: ConfigSource, origin: Url) -> Self {
        Self {
            store: Mutex::new(store),
            statuses: Mutex::new(Statuses::default()),
            http: reqwest::Client::new(),
            config_source,
            origin,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::page))
        .route(CALLBACK_PATH, get(handlers::page))
        .route("/login", post(handlers::login))
        .route("/api/call", post(handlers::call_api))
        .route("/logout", post(handlers::logout))
        .route("/reset", post(handlers::reset))
        .route("/config.json", get(handlers::config_json))
        .fallback(get(handlers::page))
        .with_state(state)
        .merge(protected::routes())
}

pub fn run_server(port: u16, state_dir: &Path, config_source: ConfigSource) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(start_server_async(port, state_dir, config_source))
}

pub async fn start_server_async(
    port: u16,
    state_dir: &Path,
    config_source: ConfigSource,
) -> Result<()> {
    let store = Store::open(state_dir)?;
    let origin = Url::parse(&format!("http://localhost:{port}/"))?;
    let state = Arc::new(AppState::new(store, config_source.clone(), origin.clone()));

    tracing::info!(%config_source, state_dir = %state_dir.display(), "Starting demo server");
    println!("OIDC demo running at {}", origin);
    println!("  Sample protected API: {}", origin.join(protected::PATH)?);

    let listener = bind_with_reuse(port).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

/// Bind a loopback TCP listener with SO_REUSEADDR so restarts reclaim the port instantly.
async fn bind_with_reuse(port: u16) -> Result<tokio::net::TcpListener> {
    let addr: std::net::SocketAddr = format!("127.0.0.1:{port}").parse()?;
    let socket = socket2::Socket::new(
        socket2::Domain::IPV4,
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1024)?;
    let std_listener: std::net::TcpListener = socket.into();
    Ok(tokio::net::TcpListener::from_std(std_listener)?)
}
