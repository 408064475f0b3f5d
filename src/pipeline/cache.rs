use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::errors::StorageError;
use crate::models::{Category, Product, RawProduct};
use crate::scraping::validate_product;

/// A persisted result set for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheSnapshot {
    pub data: Vec<Product>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// On-disk shape; records are re-validated on load.
#[derive(Deserialize)]
struct StoredSnapshot {
    data: Vec<RawProduct>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
}

/// One JSON file per category under the data directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    data_dir: PathBuf,
}

impl CacheStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path_for(&self, category: Category) -> PathBuf {
        self.data_dir.join(format!("{}.json", category.slug()))
    }

    /// Persists `products` stamped with the current time (millisecond precision, as stored).
    ///
    /// The file is written next to its destination and renamed over it, so readers see
    /// either the previous or the new snapshot.
    pub async fn write(
        &self,
        category: Category,
        products: Vec<Product>,
    ) -> Result<CacheSnapshot, StorageError> {
        let snapshot = CacheSnapshot {
            data: products,
            timestamp: Utc::now().trunc_subsecs(3),
        };
        let body = serde_json::to_vec_pretty(&snapshot)?;
        let dir = self.data_dir.clone();
        let path = self.path_for(category);

        tokio::fs::create_dir_all(&dir).await?;
        let target = path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
            let mut file = NamedTempFile::new_in(&dir)?;
            file.write_all(&body)?;
            file.as_file().sync_all()?;
            file.persist(&target)?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

        info!(path = %path.display(), products = snapshot.data.len(), "Data saved");
        Ok(snapshot)
    }

    /// Loads the snapshot for `category`; `None` when missing or unreadable.
    pub async fn read(&self, category: Category) -> Option<CacheSnapshot> {
        let path = self.path_for(category);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No cached data found");
                return None;
            }
        };

        match serde_json::from_str::<StoredSnapshot>(&content) {
            Ok(stored) => Some(CacheSnapshot {
                data: stored.data.into_iter().map(validate_product).collect(),
                timestamp: stored.timestamp,
            }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cached data is unreadable");
                None
            }
        }
    }
}

impl CacheSnapshot {
    pub fn age(&self) -> Duration {
        self.age_at(Utc::now())
    }

    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.timestamp)
    }
}
