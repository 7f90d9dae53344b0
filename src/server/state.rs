use axum::extract::FromRef;
use sqlx::PgPool;
use std::sync::Arc;

use crate::gateway::Gateway;

/// Shared handler state. Both members are built once during startup.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    /// Held open for the knowledge-base and session handlers; no route here
    /// reads it yet.
    pub db: PgPool,
}

impl FromRef<AppState> for Arc<Gateway> {
    fn from_ref(state: &AppState) -> Self {
        state.gateway.clone()
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
