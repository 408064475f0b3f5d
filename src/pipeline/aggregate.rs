use std::sync::Arc;

use futures::future::try_join_all;
use tracing::info;

use crate::errors::SourceError;
use crate::models::Product;
use crate::scraping::validate_product;
use crate::stores::{PageScope, SourceAdapter};

/// Runs every adapter concurrently and merges their listings in adapter order.
///
/// The first adapter failure fails the whole collection and drops the others.
/// Listings from mixed-department pages are narrowed to the tracked category.
pub async fn collect(adapters: &[Arc<dyn SourceAdapter>]) -> Result<Vec<Product>, SourceError> {
    let runs = adapters.iter().map(|adapter| async move {
        let raw = adapter.fetch().await?;
        let total = raw.len();
        let kept: Vec<Product> = raw
            .into_iter()
            .filter(|p| adapter.scope() == PageScope::Category || p.is_meat_product)
            .map(validate_product)
            .collect();
        info!(store = adapter.store(), total, kept = kept.len(), "store scraped");
        Ok::<_, SourceError>(kept)
    });

    let per_store = try_join_all(runs).await?;
    Ok(per_store.into_iter().flatten().collect())
}
