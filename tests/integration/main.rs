//! Integration tests for the scraper
//!
//! These tests use wiremock to stand in for the shop and drive the full
//! fetch, extract, reconcile and persist cycle, plus the HTTP surface.

mod api_tests;
mod scrape_tests;
