use std::time::Duration;

use thiserror::Error;

/// Failures of the page rendering service.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The service could not be reached or its browser is gone.
    #[error("rendering engine unavailable: {0}")]
    Unavailable(String),
    #[error("rendering timed out after {0:?}")]
    Timeout(Duration),
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },
    #[error("unexpected rendering engine response: {0}")]
    Protocol(String),
}

impl RenderError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, RenderError::Unavailable(_))
    }
}

/// Fatal failure of one store adapter for the current run.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{store}: {source}")]
    Render {
        store: &'static str,
        #[source]
        source: RenderError,
    },
    #[error("{store}: marker `{selector}` not found before timeout")]
    MissingMarker {
        store: &'static str,
        selector: &'static str,
    },
    #[error("{store}: no products extracted")]
    Empty { store: &'static str },
}

impl SourceError {
    pub fn render(store: &'static str) -> impl FnOnce(RenderError) -> SourceError {
        move |source| SourceError::Render { store, source }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cache i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("cache file replace failed: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Unrecoverable outcome of an orchestrator run: fetching failed and no snapshot exists.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("scraping failed and no cached data is available: {0}")]
    Source(#[from] SourceError),
    #[error("scrape task aborted: {0}")]
    Aborted(String),
    #[error("scraping did not finish within {0:?}")]
    TimedOut(Duration),
}
