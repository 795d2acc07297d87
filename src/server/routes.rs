//! Route handlers

use crate::crawler::{RunParams, RunSummary};
use crate::server::error::ApiError;
use crate::server::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

/// Query string of `GET /get-products`
#[derive(Debug, Clone, Deserialize)]
pub struct ProductsQuery {
    #[serde(default = "first_page")]
    pub offset: u32,
    #[serde(default = "first_page")]
    pub limit: u32,
    #[serde(default)]
    pub proxy: String,
}

fn first_page() -> u32 {
    1
}

impl From<ProductsQuery> for RunParams {
    fn from(query: ProductsQuery) -> Self {
        RunParams::new(query.offset, query.limit, query.proxy)
    }
}

/// Body of a successful scrape
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductsResponse {
    pub message: String,
    pub total_products: u64,
    pub products_created: u64,
    pub products_updated: u64,
    pub products_unchanged: u64,
    pub params: RunParams,
}

impl From<RunSummary> for ProductsResponse {
    fn from(summary: RunSummary) -> Self {
        Self {
            message: "Products scraped successfully".to_string(),
            total_products: summary.total(),
            products_created: summary.created,
            products_updated: summary.updated,
            products_unchanged: summary.unchanged,
            params: summary.params,
        }
    }
}

/// Scrapes the requested page range
pub async fn get_products(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<ProductsResponse>, ApiError> {
    let summary = state.coordinator.run(query.into()).await?;
    Ok(Json(summary.into()))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

/// Liveness probe
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
