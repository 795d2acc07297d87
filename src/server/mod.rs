//! HTTP surface
//!
//! - `GET /get-products?offset=&limit=&proxy=` runs a scrape (bearer token required)
//! - `GET /health` answers without authentication

mod auth;
mod error;
mod routes;

pub use auth::require_bearer;
pub use error::{ApiError, ErrorBody};
pub use routes::{HealthResponse, ProductsQuery, ProductsResponse};

use crate::crawler::Coordinator;
use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Coordinator,
    pub api_token: Arc<str>,
}

impl AppState {
    pub fn new(coordinator: Coordinator, api_token: impl Into<Arc<str>>) -> Self {
        Self {
            coordinator,
            api_token: api_token.into(),
        }
    }
}

/// Builds the application router
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/get-products", get(routes::get_products))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    Router::new()
        .merge(protected)
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
