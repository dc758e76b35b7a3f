mod config;
mod routes;
mod services;
mod state;

use std::net::SocketAddr;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let config = config::RelayConfig::from_env();
    let addr = SocketAddr::new(config.bind_addr, config.port);
    let state = state::AppState::new(config);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(addr).await.inspect_err(|e| {
        tracing::error!(%addr, error = %e, "failed to bind");
    })?;

    tracing::info!(%addr, room_max_peers = config.room_max_peers, "scribble relay listening");
    axum::serve(listener, app).await
}
