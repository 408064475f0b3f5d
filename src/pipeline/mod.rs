//! Fetch, normalize, cache and fall back.

pub mod aggregate;
pub mod cache;
pub mod orchestrator;
pub mod scheduler;

pub use cache::{CacheSnapshot, CacheStore};
pub use orchestrator::{FetchMode, Freshness, Orchestrator, ScrapeOutcome};
pub use scheduler::{DailySchedule, Scheduler};
