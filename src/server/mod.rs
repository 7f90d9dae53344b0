//! HTTP host for the gateway.
//!
//! Startup order is fixed: database, then the LLM gateway (credential,
//! client, probe), then the listener. Only the database step is fatal.

pub mod db;
pub mod error;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

pub use error::{ApiError, StartupError};
pub use routes::create_router;
pub use state::AppState;

use crate::config::AppConfig;
use crate::gateway::Gateway;

pub async fn run(config: &AppConfig) -> Result<(), StartupError> {
    let db = db::connect(config.database_url.as_deref()).await?;

    let gateway = Gateway::initialize(&config.gateway_settings()).await?;
    if !gateway.is_available() {
        tracing::warn!(
            connectivity = %gateway.connectivity(),
            "LLM upstream unavailable; chat requests will receive mock responses"
        );
    }

    let state = AppState {
        gateway: Arc::new(gateway),
        db,
    };
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on http://localhost:{}", config.port);

    axum::serve(listener, app).await?;
    Ok(())
}
