use crate::state::SharedState;
use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod farms;
pub mod health;
pub mod weather;

pub fn router(state: SharedState) -> Router {
    let api = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .route("/weather/current", get(weather::current))
        .route("/weather/forecast", get(weather::forecast))
        .route("/weather/validate", post(weather::validate))
        .route("/farms", get(farms::list).post(farms::create))
        .route(
            "/farms/{farm_id}",
            get(farms::detail).put(farms::replace).delete(farms::delete),
        )
        .route("/farms/{farm_id}/alerts", get(farms::alerts));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health::root))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
