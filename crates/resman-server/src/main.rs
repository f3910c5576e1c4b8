//! Resman Server: application entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use resman_db::DbManager;
use resman_server::{AppState, ServerConfig, build_router};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("resman=info".parse()?))
        .json()
        .init();

    info!("Starting resman server...");

    let config = ServerConfig::load().context("loading configuration")?;
    let auth = Arc::new(config.auth.load().context("loading JWT keys")?);

    let db = DbManager::connect(&config.store)
        .await
        .context("connecting to SurrealDB")?;
    let store = Arc::new(db.store(auth.pepper.clone()));

    let state = AppState::new(store, auth, &config);
    let app = build_router(state, config.http.max_body_bytes);

    let listener = TcpListener::bind(&config.http.bind)
        .await
        .with_context(|| format!("binding {}", config.http.bind))?;
    info!(addr = %config.http.bind, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;

    info!("resman server stopped.");
    Ok(())
}
