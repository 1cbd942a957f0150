use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handler::{self, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/blinks", post(handler::create_blink))
        .route("/blinks/:unique_blink_id", get(handler::get_blink))
}

/// The full service: healthcheck, `/api` routes, CORS and request tracing.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(handler::healthcheck))
        .nest("/api", routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
