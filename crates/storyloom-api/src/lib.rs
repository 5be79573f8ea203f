//! Storyloom API — HTTP surface over live story sessions.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;

use crate::state::AppState;

/// Builds the application router with every route mounted.
///
/// Middleware (tracing, CORS) is layered on by the binary.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/stories", routes::stories::router())
        .nest("/api/v1/renders", routes::renders::router())
        .with_state(state)
}
