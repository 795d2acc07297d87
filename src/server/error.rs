//! API error responses
//!
//! Every failure is answered with a JSON `{"detail": ...}` body. Scrape
//! failures are logged with their cause; the response only carries a
//! generic message.

use crate::ScrapeError;
use axum::{
    http::{header::WWW_AUTHENTICATE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Error body, `{"detail": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Failures surfaced by the API
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Scrape(ScrapeError),
}

impl From<ScrapeError> for ApiError {
    fn from(error: ScrapeError) -> Self {
        Self::Scrape(error)
    }
}

impl ApiError {
    fn status_and_detail(&self) -> (StatusCode, String) {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Invalid authentication token".to_string(),
            ),
            Self::Scrape(ScrapeError::OffsetAfterLimit { .. }) => (
                StatusCode::BAD_REQUEST,
                "Offset cannot be greater than limit".to_string(),
            ),
            Self::Scrape(ScrapeError::InvalidProxy { proxy, .. }) => {
                (StatusCode::BAD_REQUEST, format!("Invalid proxy: {}", proxy))
            }
            Self::Scrape(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to scrape products".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = self.status_and_detail();

        if let Self::Scrape(error) = &self {
            if status.is_server_error() {
                tracing::error!("Scrape request failed: {}", error);
            }
        }

        let body = Json(ErrorBody { detail });
        match self {
            Self::Unauthorized => {
                (status, [(WWW_AUTHENTICATE, "Bearer")], body).into_response()
            }
            Self::Scrape(_) => (status, body).into_response(),
        }
    }
}
