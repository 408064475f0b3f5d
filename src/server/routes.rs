use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, warn};

use crate::errors::ScrapeError;
use crate::models::Category;
use crate::pipeline::FetchMode;
use crate::server::dto::{iso_timestamp, HealthResponse, ScrapeResponse};
use crate::server::errors::{error_details, json_error};
use crate::server::AppState;

/// `GET /api/scrape/:category`
///
/// The scrape runs in its own task so a request that times out leaves it running to
/// warm the cache. Any failure tries the last snapshot before answering 500.
pub async fn scrape_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Response {
    let category: Category = match category.parse() {
        Ok(category) => category,
        Err(e) => return json_error(StatusCode::NOT_FOUND, e.to_string(), None),
    };

    let orchestrator = state.orchestrator.clone();
    let run = tokio::spawn(async move { orchestrator.run(category, FetchMode::PreferCache).await });

    let result = match tokio::time::timeout(state.request_timeout, run).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(ScrapeError::Aborted(join_error.to_string())),
        Err(_) => Err(ScrapeError::TimedOut(state.request_timeout)),
    };

    match result {
        Ok(outcome) => Json(ScrapeResponse::from(outcome)).into_response(),
        Err(e) => {
            error!(%category, error = %e, "Error in scrape endpoint");
            if let Some(outcome) = state.orchestrator.cached_fallback(category, &e.to_string()).await {
                warn!(%category, "Serving cached data after endpoint failure");
                return Json(ScrapeResponse::from(outcome)).into_response();
            }
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.to_string(),
                error_details(state.debug_errors, &e),
            )
        }
    }
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        last_scraped: state.orchestrator.last_scraped().await.map(iso_timestamp),
    })
}
