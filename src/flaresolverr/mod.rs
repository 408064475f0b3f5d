//! Page rendering through a FlareSolverr service.
//!
//! Store adapters only see the [`RenderEngine`] capability: acquire an isolated page,
//! render URLs in it, release it.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::RenderError;

pub mod client;
pub mod payload;

pub use client::FlareSolverr;

/// An isolated rendering context (one browser session).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPage {
    id: String,
}

impl RenderPage {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

#[async_trait]
pub trait RenderEngine: Send + Sync {
    /// Opens a fresh page, initializing or re-initializing the engine when needed.
    async fn acquire_page(&self) -> Result<RenderPage, RenderError>;

    /// Loads `url` in `page` and returns the rendered HTML once the page is idle.
    async fn render(
        &self,
        page: &RenderPage,
        url: &str,
        timeout: Duration,
    ) -> Result<String, RenderError>;

    /// Closes the page. Never fails; problems are logged.
    async fn release(&self, page: RenderPage);

    /// Checks the engine after a failed run and rebuilds it if it is gone.
    async fn recover(&self) {}
}
