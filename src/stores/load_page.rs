use std::time::Duration;

use tokio::time::{timeout, Instant};
use tracing::{debug, info};

use crate::errors::{RenderError, SourceError};
use crate::flaresolverr::{RenderEngine, RenderPage};
use crate::scraping::extract_text::has_marker;
use crate::stores::PageTimeouts;
use crate::utilities::generate_random_delay::generate_random_delay;

const POLL_MIN_MS: u64 = 1000;
const POLL_MAX_MS: u64 = 3000;

/// Renders `url` in a fresh page and returns its HTML once `marker` is present.
///
/// The page is released whatever the outcome.
pub async fn load_page(
    engine: &dyn RenderEngine,
    timeouts: PageTimeouts,
    store: &'static str,
    url: &str,
    marker: &'static str,
) -> Result<String, SourceError> {
    info!(store, url, "Scraping products");
    let page = engine
        .acquire_page()
        .await
        .map_err(SourceError::render(store))?;

    let result = navigate_and_wait(engine, &page, timeouts, store, url, marker).await;
    engine.release(page).await;
    result
}

async fn navigate_and_wait(
    engine: &dyn RenderEngine,
    page: &RenderPage,
    timeouts: PageTimeouts,
    store: &'static str,
    url: &str,
    marker: &'static str,
) -> Result<String, SourceError> {
    let html = render_bounded(engine, page, url, timeouts.navigation)
        .await
        .map_err(SourceError::render(store))?;
    if has_marker(&html, marker) {
        return Ok(html);
    }

    // The listing is filled in by scripts; render again until it shows up.
    let deadline = Instant::now() + timeouts.wait;
    let missing = || SourceError::MissingMarker {
        store,
        selector: marker,
    };
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        generate_random_delay(POLL_MIN_MS, POLL_MAX_MS, remaining).await;

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(missing());
        }

        debug!(store, marker, "marker not present yet, rendering again");
        match render_bounded(engine, page, url, remaining).await {
            Ok(html) if has_marker(&html, marker) => return Ok(html),
            Ok(_) => continue,
            Err(RenderError::Timeout(_)) => return Err(missing()),
            Err(e) => return Err(SourceError::Render { store, source: e }),
        }
    }
}

async fn render_bounded(
    engine: &dyn RenderEngine,
    page: &RenderPage,
    url: &str,
    limit: Duration,
) -> Result<String, RenderError> {
    timeout(limit, engine.render(page, url, limit))
        .await
        .map_err(|_| RenderError::Timeout(limit))?
}
