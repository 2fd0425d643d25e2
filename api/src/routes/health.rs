use crate::state::SharedState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::{Value, json};
use tracing::instrument;

pub const SERVICE_NAME: &str = "isoterma-backend";

pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "Isoterma Backend API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
    }))
}

/// Ready once the farm file can be read and parsed.
#[instrument(skip(state))]
pub async fn ready(State(state): State<SharedState>) -> impl IntoResponse {
    let farms_file = state.store.path().display().to_string();
    if state.store.is_readable().await {
        (
            StatusCode::OK,
            Json(json!({"status": "ready", "service": SERVICE_NAME, "farms_file": farms_file})),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "not ready", "service": SERVICE_NAME, "farms_file": farms_file})),
        )
    }
}
