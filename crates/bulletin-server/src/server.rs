use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use bulletin_acquire::{ClientConfig, PortalConfig};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::error::Diagnostics;
use crate::handlers;

/// Shared, read-only server state. Nothing here is mutated per request:
/// every grade request builds its own portal session.
#[derive(Debug, Clone)]
pub struct AppState {
    pub portal: PortalConfig,
    pub client: ClientConfig,
    pub diagnostics: Diagnostics,
}

/// Build the application router.
///
/// Only POST is routed on the grade endpoint; axum answers any other method
/// with 405 and an empty body.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/fetch-grades", post(handlers::fetch_grades))
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Serve the router on an already bound listener until the process exits.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(
        addr = %addr,
        portal = %state.portal.base_url(),
        proxy = ?state.client.proxy.as_ref().map(|p| p.url()),
        diagnostics = ?state.diagnostics,
        "Bulletin server listening"
    );

    axum::serve(listener, router(state))
        .await
        .map_err(|e| anyhow::anyhow!("Bulletin server failed: {e}"))?;
    Ok(())
}
