use std::sync::Arc;

use chrono::{DateTime, Days, Local, LocalResult, NaiveTime, TimeZone};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::models::Category;
use crate::pipeline::orchestrator::{FetchMode, Orchestrator};

/// A fixed wall-clock time once per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    /// The next occurrence strictly after `now`: today if still ahead, tomorrow otherwise.
    pub fn next_fire<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let tz = now.timezone();
        let mut day = now.date_naive();
        loop {
            let candidate = match tz.from_local_datetime(&day.and_time(self.at)) {
                LocalResult::Single(t) => Some(t),
                LocalResult::Ambiguous(earliest, _) => Some(earliest),
                // Skipped by a DST jump; try the next day.
                LocalResult::None => None,
            };
            if let Some(t) = candidate.filter(|t| t > now) {
                return t;
            }
            day = match day.checked_add_days(Days::new(1)) {
                Some(next) => next,
                None => return now.clone(),
            };
        }
    }

    pub fn delay_until_next<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> std::time::Duration {
        let next = self.next_fire(now);
        next.signed_duration_since(now.clone())
            .to_std()
            .unwrap_or_default()
    }
}

/// Daily warm-up of the cache, independent of request serving.
///
/// Failures are logged and the next run is armed regardless.
pub struct Scheduler {
    schedule: DailySchedule,
    orchestrator: Arc<Orchestrator>,
    shutdown: Arc<Notify>,
}

impl Scheduler {
    pub fn new(schedule: DailySchedule, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            schedule,
            orchestrator,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Handle to stop the worker after it has been started.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let now = Local::now();
                let next = self.schedule.next_fire(&now);
                let delay = self.schedule.delay_until_next(&now);
                info!("Next scraping scheduled for: {}", next.format("%Y-%m-%d %H:%M:%S %Z"));

                tokio::select! {
                    _ = self.shutdown.notified() => {
                        info!("Scheduler received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {
                        for category in Category::ALL {
                            match self.orchestrator.run(category, FetchMode::Forced).await {
                                Ok(outcome) => info!(
                                    %category,
                                    products = outcome.products.len(),
                                    freshness = ?outcome.freshness,
                                    "Scheduled scraping finished"
                                ),
                                Err(e) => error!(%category, error = %e, "Scheduled scraping failed"),
                            }
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{FixedOffset, Utc};

    use super::*;
    use crate::models::RawProduct;
    use crate::pipeline::aggregate::fake::{raw, FakeStore};
    use crate::pipeline::{CacheSnapshot, CacheStore};
    use crate::scraping::validate_product;
    use crate::stores::load_page::fake::FakeEngine;
    use crate::stores::{PageScope, SourceAdapter};

    fn orchestrator(store: Arc<FakeStore>, data_dir: &std::path::Path) -> Arc<Orchestrator> {
        let adapter: Arc<dyn SourceAdapter> = store;
        Arc::new(Orchestrator::new(
            vec![adapter],
            Arc::new(FakeEngine::default()),
            CacheStore::new(data_dir),
            chrono::Duration::hours(24),
        ))
    }

    async fn wait_for_calls(store: &FakeStore, calls: usize) {
        while store.calls() < calls {
            tokio::time::sleep(Duration::from_secs(600)).await;
        }
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn sofia(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
    }

    #[test]
    fn before_midnight_fires_in_fifteen_minutes() {
        let schedule = DailySchedule::new(at(0, 5));
        let now = sofia(2024, 3, 1, 23, 50);

        assert_eq!(schedule.delay_until_next(&now), Duration::from_secs(15 * 60));
        assert_eq!(schedule.next_fire(&now), sofia(2024, 3, 2, 0, 5));
    }

    #[test]
    fn past_todays_slot_fires_tomorrow() {
        let schedule = DailySchedule::new(at(0, 5));
        let now = sofia(2024, 3, 1, 0, 10);

        assert_eq!(
            schedule.delay_until_next(&now),
            Duration::from_secs(23 * 3600 + 55 * 60)
        );
    }

    #[test]
    fn exactly_on_slot_waits_a_full_day() {
        let schedule = DailySchedule::new(at(0, 5));
        let now = sofia(2024, 12, 31, 0, 5);

        assert_eq!(schedule.next_fire(&now), sofia(2025, 1, 1, 0, 5));
    }

    #[test]
    fn works_in_utc_too() {
        let schedule = DailySchedule::new(at(12, 0));
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 11, 0, 0).unwrap();

        assert_eq!(schedule.delay_until_next(&now), Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_runs_rearm_until_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FakeStore::failing("Billa"));
        let scheduler = Scheduler::new(
            DailySchedule::new(at(0, 5)),
            orchestrator(store.clone(), dir.path()),
        );
        let shutdown = scheduler.shutdown_handle();
        let worker = scheduler.start();

        wait_for_calls(&store, 2).await;
        shutdown.notify_one();
        worker.await.unwrap();

        let calls = store.calls();
        tokio::time::sleep(Duration::from_secs(3 * 24 * 3600)).await;
        assert_eq!(store.calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_run_bypasses_fresh_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FakeStore::ok(
            "Kaufland",
            PageScope::Category,
            vec![raw("Кайма", "Kaufland", true)],
        ));
        let orchestrator = orchestrator(store.clone(), dir.path());
        let snapshot = CacheSnapshot {
            data: vec![validate_product(RawProduct::default())],
            timestamp: Utc::now(),
        };
        std::fs::write(
            orchestrator.cache().path_for(Category::Meat),
            serde_json::to_vec(&snapshot).unwrap(),
        )
        .unwrap();

        let scheduler = Scheduler::new(DailySchedule::new(at(0, 5)), orchestrator.clone());
        let shutdown = scheduler.shutdown_handle();
        let worker = scheduler.start();

        wait_for_calls(&store, 1).await;
        shutdown.notify_one();
        worker.await.unwrap();

        let cached = orchestrator.cache().read(Category::Meat).await.unwrap();
        assert_eq!(cached.data[0].title, "Кайма");
    }
}
