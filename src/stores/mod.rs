use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::config::FlareSolverrConfig;
use crate::errors::SourceError;
use crate::flaresolverr::RenderEngine;
use crate::models::RawProduct;
use crate::scraping::CategoryKeywords;

pub mod billa;
pub mod kaufland;
pub mod load_page;

pub use billa::Billa;
pub use kaufland::Kaufland;

/// Whether a store page only lists products of the tracked category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageScope {
    /// Every listing belongs to the category; keep all of them.
    Category,
    /// Listings from all departments; keep only those tagged as category members.
    Mixed,
}

/// Retailer-specific extraction of product listings.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn store(&self) -> &'static str;

    fn scope(&self) -> PageScope;

    /// Loads the store page and extracts every listing, tagged with its category flag.
    async fn fetch(&self) -> Result<Vec<RawProduct>, SourceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTimeouts {
    pub navigation: Duration,
    pub wait: Duration,
}

impl From<&FlareSolverrConfig> for PageTimeouts {
    fn from(config: &FlareSolverrConfig) -> Self {
        Self {
            navigation: config.navigation_timeout(),
            wait: config.wait_timeout(),
        }
    }
}

/// What every adapter needs: the rendering engine, the shared keyword set and timeouts.
pub struct StoreContext {
    pub engine: Arc<dyn RenderEngine>,
    pub keywords: CategoryKeywords,
    pub timeouts: PageTimeouts,
}

/// The adapters for every supported store, in aggregation order.
pub fn all_stores(context: Arc<StoreContext>) -> Vec<Arc<dyn SourceAdapter>> {
    vec![
        Arc::new(Kaufland::new(context.clone())),
        Arc::new(Billa::new(context)),
    ]
}
