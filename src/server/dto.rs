use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::models::Product;
use crate::pipeline::ScrapeOutcome;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResponse {
    pub success: bool,
    pub products: Vec<Product>,
    pub last_scraped: String,
    pub total_products: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_cache: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ScrapeOutcome> for ScrapeResponse {
    fn from(outcome: ScrapeOutcome) -> Self {
        let from_cache = outcome.from_cache().then_some(true);
        Self {
            success: true,
            total_products: outcome.products.len(),
            last_scraped: iso_timestamp(outcome.last_scraped),
            products: outcome.products,
            from_cache,
            error: outcome.error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub last_scraped: Option<String>,
}

/// `2024-03-01T22:05:00.000Z`
pub fn iso_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}
