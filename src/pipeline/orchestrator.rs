use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::errors::ScrapeError;
use crate::flaresolverr::RenderEngine;
use crate::models::{Category, Product};
use crate::pipeline::aggregate::collect;
use crate::pipeline::cache::{CacheSnapshot, CacheStore};
use crate::stores::SourceAdapter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Serve a snapshot younger than the freshness threshold without fetching.
    PreferCache,
    /// Always fetch; used by the daily warm-up.
    Forced,
}

/// Where the served products came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Snapshot within the freshness window.
    Cached,
    /// Fetched during this run.
    Fresh,
    /// Fetching failed; last snapshot served regardless of age.
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeOutcome {
    pub products: Vec<Product>,
    pub last_scraped: DateTime<Utc>,
    pub freshness: Freshness,
    /// Why fetching failed, for stale results.
    pub error: Option<String>,
}

impl ScrapeOutcome {
    fn from_snapshot(snapshot: CacheSnapshot, freshness: Freshness, error: Option<String>) -> Self {
        Self {
            products: snapshot.data,
            last_scraped: snapshot.timestamp,
            freshness,
            error,
        }
    }

    pub fn from_cache(&self) -> bool {
        self.freshness == Freshness::Stale
    }
}

/// Decides between cache and a new scrape and owns the fallback ladder:
/// fresh data, then the last snapshot whatever its age, then the error.
pub struct Orchestrator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    engine: Arc<dyn RenderEngine>,
    cache: CacheStore,
    freshness: Duration,
    runs: HashMap<Category, Arc<Mutex<()>>>,
    last_scraped: RwLock<Option<DateTime<Utc>>>,
}

impl Orchestrator {
    pub fn new(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        engine: Arc<dyn RenderEngine>,
        cache: CacheStore,
        freshness: Duration,
    ) -> Self {
        let runs = Category::ALL
            .into_iter()
            .map(|c| (c, Arc::new(Mutex::new(()))))
            .collect();

        Self {
            adapters,
            engine,
            cache,
            freshness,
            runs,
            last_scraped: RwLock::new(None),
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Time of the data served by the last successful run, if any.
    pub async fn last_scraped(&self) -> Option<DateTime<Utc>> {
        *self.last_scraped.read().await
    }

    /// Serves `category`, scraping when the cache is too old (or `mode` is `Forced`).
    ///
    /// An in-window snapshot is served without waiting for a run in progress. Runs for
    /// the same category are serialized, and a caller that waited for another run is
    /// served that run's snapshot instead of scraping again.
    pub async fn run(&self, category: Category, mode: FetchMode) -> Result<ScrapeOutcome, ScrapeError> {
        let requested_at = Utc::now();

        if mode == FetchMode::PreferCache {
            if let Some(outcome) = self.fresh_snapshot(category).await {
                return Ok(outcome);
            }
        }

        let lock = self.runs[&category].clone();
        let _running = lock.lock().await;

        if let Some(snapshot) = self.cache.read(category).await {
            // Written after this call arrived, so by the run it waited for.
            if snapshot.timestamp > requested_at {
                info!(%category, "Returning products scraped while waiting");
                return Ok(self.served(ScrapeOutcome::from_snapshot(snapshot, Freshness::Cached, None)).await);
            }
            if mode == FetchMode::PreferCache && snapshot.age() < self.freshness {
                info!(%category, "Returning cached products");
                return Ok(self.served(ScrapeOutcome::from_snapshot(snapshot, Freshness::Cached, None)).await);
            }
        }

        info!(%category, "Scraping new products from all stores");
        match collect(&self.adapters).await {
            Ok(products) => {
                let last_scraped = match self.cache.write(category, products.clone()).await {
                    Ok(snapshot) => snapshot.timestamp,
                    Err(e) => {
                        error!(%category, error = %e, "Error saving data");
                        Utc::now().trunc_subsecs(3)
                    }
                };
                Ok(self
                    .served(ScrapeOutcome {
                        products,
                        last_scraped,
                        freshness: Freshness::Fresh,
                        error: None,
                    })
                    .await)
            }
            Err(e) => {
                error!(%category, error = %e, "Error scraping products");
                self.engine.recover().await;

                match self.cache.read(category).await {
                    Some(snapshot) => {
                        warn!(%category, "Returning cached data due to scraping error");
                        let outcome =
                            ScrapeOutcome::from_snapshot(snapshot, Freshness::Stale, Some(e.to_string()));
                        Ok(self.served(outcome).await)
                    }
                    None => Err(ScrapeError::Source(e)),
                }
            }
        }
    }

    /// Last snapshot regardless of age, marked stale; used when a request gives up waiting.
    pub async fn cached_fallback(&self, category: Category, reason: &str) -> Option<ScrapeOutcome> {
        let snapshot = self.cache.read(category).await?;
        let outcome = ScrapeOutcome::from_snapshot(snapshot, Freshness::Stale, Some(reason.to_string()));
        Some(self.served(outcome).await)
    }

    async fn fresh_snapshot(&self, category: Category) -> Option<ScrapeOutcome> {
        let snapshot = self.cache.read(category).await?;
        if snapshot.age() >= self.freshness {
            return None;
        }
        info!(%category, "Returning cached products");
        Some(self.served(ScrapeOutcome::from_snapshot(snapshot, Freshness::Cached, None)).await)
    }

    async fn served(&self, outcome: ScrapeOutcome) -> ScrapeOutcome {
        *self.last_scraped.write().await = Some(outcome.last_scraped);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    use async_trait::async_trait;

    use super::*;
    use crate::errors::RenderError;
    use crate::flaresolverr::RenderPage;
    use crate::pipeline::aggregate::fake::{raw, FakeStore};
    use crate::scraping::validate_product;
    use crate::stores::PageScope;

    #[derive(Default)]
    struct CountingEngine {
        recoveries: AtomicUsize,
    }

    #[async_trait]
    impl RenderEngine for CountingEngine {
        async fn acquire_page(&self) -> Result<RenderPage, RenderError> {
            Ok(RenderPage::new("unused"))
        }

        async fn render(&self, _: &RenderPage, _: &str, _: StdDuration) -> Result<String, RenderError> {
            Ok(String::new())
        }

        async fn release(&self, _: RenderPage) {}

        async fn recover(&self) {
            self.recoveries.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Harness {
        orchestrator: Arc<Orchestrator>,
        store: Arc<FakeStore>,
        engine: Arc<CountingEngine>,
        _dir: tempfile::TempDir,
    }

    fn harness(store: FakeStore) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(store);
        let engine = Arc::new(CountingEngine::default());
        let adapter: Arc<dyn SourceAdapter> = store.clone();
        let orchestrator = Orchestrator::new(
            vec![adapter],
            engine.clone(),
            CacheStore::new(dir.path()),
            Duration::hours(24),
        );
        Harness {
            orchestrator: Arc::new(orchestrator),
            store,
            engine,
            _dir: dir,
        }
    }

    fn working_store() -> FakeStore {
        FakeStore::ok("Kaufland", PageScope::Category, vec![raw("Кайма", "Kaufland", true)])
    }

    fn write_snapshot(h: &Harness, title: &str, age: Duration) {
        let snapshot = CacheSnapshot {
            data: vec![validate_product(raw(title, "Billa", true))],
            timestamp: (Utc::now() - age).trunc_subsecs(3),
        };
        std::fs::write(
            h.orchestrator.cache().path_for(Category::Meat),
            serde_json::to_vec(&snapshot).unwrap(),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn fresh_scrape_is_cached_and_reused() {
        let h = harness(working_store());

        let first = h.orchestrator.run(Category::Meat, FetchMode::PreferCache).await.unwrap();
        let second = h.orchestrator.run(Category::Meat, FetchMode::PreferCache).await.unwrap();

        assert_eq!(first.freshness, Freshness::Fresh);
        assert_eq!(second.freshness, Freshness::Cached);
        assert_eq!(first.products, second.products);
        assert_eq!(first.last_scraped, second.last_scraped);
        assert_eq!(h.store.calls(), 1);
        assert_eq!(h.orchestrator.last_scraped().await, Some(first.last_scraped));
    }

    #[tokio::test]
    async fn expired_snapshot_triggers_scrape() {
        let h = harness(working_store());
        write_snapshot(&h, "Стара луканка", Duration::hours(25));

        let outcome = h.orchestrator.run(Category::Meat, FetchMode::PreferCache).await.unwrap();

        assert_eq!(outcome.freshness, Freshness::Fresh);
        assert_eq!(outcome.products[0].title, "Кайма");
        assert_eq!(h.store.calls(), 1);
    }

    #[tokio::test]
    async fn forced_mode_bypasses_fresh_snapshot() {
        let h = harness(working_store());
        write_snapshot(&h, "Салам", Duration::minutes(5));

        let outcome = h.orchestrator.run(Category::Meat, FetchMode::Forced).await.unwrap();

        assert_eq!(outcome.freshness, Freshness::Fresh);
        assert_eq!(h.store.calls(), 1);
    }

    #[tokio::test]
    async fn failure_falls_back_to_expired_snapshot() {
        let h = harness(FakeStore::failing("Billa"));
        write_snapshot(&h, "Стара луканка", Duration::hours(72));

        let outcome = h.orchestrator.run(Category::Meat, FetchMode::PreferCache).await.unwrap();

        assert_eq!(outcome.freshness, Freshness::Stale);
        assert!(outcome.from_cache());
        assert_eq!(outcome.products[0].title, "Стара луканка");
        assert!(outcome.error.unwrap().contains("Billa"));
        assert_eq!(h.engine.recoveries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_without_snapshot_propagates() {
        let h = harness(FakeStore::failing("Billa"));

        let err = h.orchestrator.run(Category::Meat, FetchMode::PreferCache).await.unwrap_err();

        assert!(matches!(err, ScrapeError::Source(_)));
        assert!(!err.to_string().is_empty());
        assert_eq!(h.orchestrator.last_scraped().await, None);
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_scrape() {
        let h = harness(FakeStore {
            delay: StdDuration::from_millis(100),
            ..working_store()
        });

        let (a, b) = tokio::join!(
            h.orchestrator.run(Category::Meat, FetchMode::PreferCache),
            h.orchestrator.run(Category::Meat, FetchMode::Forced),
        );

        assert_eq!(h.store.calls(), 1);
        assert_eq!(a.unwrap().last_scraped, b.unwrap().last_scraped);
    }

    #[tokio::test]
    async fn cached_fallback_marks_snapshot_stale() {
        let h = harness(working_store());
        assert!(h.orchestrator.cached_fallback(Category::Meat, "timeout").await.is_none());

        write_snapshot(&h, "Пастет", Duration::hours(1));
        let outcome = h.orchestrator.cached_fallback(Category::Meat, "timeout").await.unwrap();
        assert_eq!(outcome.freshness, Freshness::Stale);
        assert_eq!(outcome.error.as_deref(), Some("timeout"));
        assert_eq!(h.orchestrator.last_scraped().await, Some(outcome.last_scraped));
    }

    #[tokio::test]
    async fn fresh_snapshot_is_served_while_forced_run_is_in_progress() {
        let h = harness(FakeStore {
            delay: StdDuration::from_millis(1500),
            ..working_store()
        });
        write_snapshot(&h, "Пастет", Duration::minutes(10));

        let orchestrator = h.orchestrator.clone();
        let forced = tokio::spawn(async move { orchestrator.run(Category::Meat, FetchMode::Forced).await });
        while h.store.calls() == 0 {
            tokio::time::sleep(StdDuration::from_millis(5)).await;
        }

        let started = tokio::time::Instant::now();
        let outcome = h.orchestrator.run(Category::Meat, FetchMode::PreferCache).await.unwrap();

        assert!(started.elapsed() < StdDuration::from_millis(500));
        assert_eq!(outcome.freshness, Freshness::Cached);
        assert_eq!(outcome.products[0].title, "Пастет");
        assert_eq!(forced.await.unwrap().unwrap().freshness, Freshness::Fresh);
    }

    #[tokio::test]
    async fn forced_run_right_after_a_write_still_fetches() {
        let h = harness(working_store());
        write_snapshot(&h, "Салам", Duration::zero());

        let outcome = h.orchestrator.run(Category::Meat, FetchMode::Forced).await.unwrap();

        assert_eq!(outcome.freshness, Freshness::Fresh);
        assert_eq!(outcome.products[0].title, "Кайма");
        assert_eq!(h.store.calls(), 1);
    }
}
