use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use talaro_core::health::healthz;
use talaro_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::health::readyz;
use crate::handlers::password_reset::{confirm_reset, request_reset};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Password recovery
        .route("/auth/password/forgot", post(request_reset))
        .route("/auth/password/reset", post(confirm_reset))
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer()),
        )
        .with_state(state)
}
