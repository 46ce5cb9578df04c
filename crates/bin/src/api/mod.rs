//! HTTP API: routes under `/api/v1` plus `/health`.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use serde::Serialize;
use serde_json::{Value, json};
use tower_cookies::CookieManagerLayer;

use armory::Armory;

mod auth;
mod catalog;
mod error;
mod loadouts;
mod relations;

use error::ApiResult;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub armory: Armory,
    /// Whether auth cookies carry the `Secure` attribute.
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(armory: Armory, secure_cookies: bool) -> Self {
        Self {
            armory,
            secure_cookies,
        }
    }
}

/// Build the full router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/version", get(version))
        .merge(auth::routes())
        .merge(catalog::routes())
        .merge(relations::routes())
        .merge(loadouts::routes());

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    backend: &'static str,
}

/// Handler for GET /health
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.armory.catalog().version().current().await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                backend: "sqlite",
            }),
        ),
        Err(err) => {
            tracing::error!(error = %err, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    backend: "sqlite",
                }),
            )
        }
    }
}

/// Handler for GET /api/v1/version
async fn version(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let updated_at = state.armory.catalog().version().current().await?;
    Ok(Json(json!({ "updated_at": updated_at })))
}
