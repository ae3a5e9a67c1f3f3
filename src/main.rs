use anyhow::Context;
use axum::{
  extract::{State, WebSocketUpgrade},
  http::Method,
  response::IntoResponse,
  routing::get,
  Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

mod config;
mod game;
mod protocol;
mod shared;
mod transport;

use config::{EngineConfig, ServerConfig};
use game::registry::{Registry, RoomSummary};

#[derive(Clone)]
struct AppState {
  registry: Arc<Registry>,
}

#[derive(Debug, Serialize)]
struct OkResponse {
  ok: bool,
}

#[derive(Debug, Serialize)]
struct RoomsResponse {
  rooms: Vec<RoomSummary>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let engine = EngineConfig::from_env();
  let server = ServerConfig::from_env();
  tracing::info!(
    grid_size = engine.grid_size,
    room_capacity = engine.room_capacity,
    tick_ms = engine.tick_period.as_millis() as u64,
    "engine configured"
  );

  let registry = Arc::new(Registry::new(engine));
  let state = Arc::new(AppState {
    registry: Arc::clone(&registry),
  });

  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::GET])
    .allow_headers(Any);

  let app: Router = Router::new()
    .route("/api/health", get(health))
    .route("/api/rooms", get(rooms))
    .route("/api/play", get(ws_handler))
    .layer(cors)
    .with_state(state);

  let address = format!("0.0.0.0:{}", server.port);
  tracing::info!("listening on {address}");

  let listener = tokio::net::TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  registry.shutdown().await;
  tracing::info!("registry shut down");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(error) = tokio::signal::ctrl_c().await {
    tracing::warn!(?error, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutdown signal received");
}

async fn health() -> impl IntoResponse {
  Json(OkResponse { ok: true })
}

async fn rooms(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(RoomsResponse {
    rooms: state.registry.room_summaries().await,
  })
}

async fn ws_handler(
  ws: WebSocketUpgrade,
  State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
  let registry = Arc::clone(&state.registry);
  ws.on_upgrade(move |socket| transport::ws_session::handle_socket(socket, registry))
}
