use std::sync::Arc;

use crate::config::AppConfig;
use crate::flaresolverr::RenderEngine;
use crate::pipeline::{CacheStore, Orchestrator};
use crate::stores::{all_stores, PageTimeouts, StoreContext};

pub mod config;
pub mod errors;
pub mod flaresolverr;
pub mod models;
pub mod pipeline;
pub mod scraping;
pub mod server;
pub mod stores;
pub mod utilities;

/// Wires every store adapter, the cache and the freshness policy around `engine`.
pub fn build_orchestrator(config: &AppConfig, engine: Arc<dyn RenderEngine>) -> Orchestrator {
    let context = Arc::new(StoreContext {
        engine: engine.clone(),
        keywords: config.category.keywords(),
        timeouts: PageTimeouts::from(&config.flaresolverr),
    });

    Orchestrator::new(
        all_stores(context),
        engine,
        CacheStore::new(&config.storage.data_dir),
        config.storage.freshness(),
    )
}
