pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    routing::{get, patch},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::ledger::LedgerService;
use state::AppState;

/// Build the HTTP router over a ledger service
pub fn router(ledger: Arc<LedgerService>) -> Router {
    let state = Arc::new(AppState::new(ledger));

    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .route("/point/{id}", get(handlers::get_point))
        .route("/point/{id}/histories", get(handlers::get_histories))
        .route("/point/{id}/charge", patch(handlers::charge))
        .route("/point/{id}/use", patch(handlers::use_points))
        .with_state(state)
        // Stateless, added after with_state
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Start HTTP Gateway server
pub async fn run_server(host: &str, port: u16, ledger: Arc<LedgerService>) -> anyhow::Result<()> {
    let app = router(ledger);

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("API Docs: http://{}/docs", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
