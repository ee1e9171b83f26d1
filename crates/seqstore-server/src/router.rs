use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use seqstore_core::SequenceStore;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all sequence endpoints.
pub fn build_router(store: SequenceStore, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route("/v1/sequence", post(handler::write_sequence))
        .route(
            "/v1/sequence/:address",
            get(handler::get_sequence).post(handler::write_verified_sequence),
        )
        .route("/v1/sequences/get", post(handler::get_sequences))
        .route("/v1/sequences/chunks", post(handler::write_chunks))
        .route("/v1/sequences/write", post(handler::write_many))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { store })
}
