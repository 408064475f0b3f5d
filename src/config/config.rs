use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::scraping::is_meat_product::default_meat_keywords;
use crate::scraping::CategoryKeywords;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base: BaseConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub flaresolverr: FlareSolverrConfig,
    pub scheduler: SchedulerConfig,
    pub category: CategoryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BaseConfig {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub request_timeout_secs: u64,
    /// Expose error chains in failed responses.
    pub debug_errors: bool,
    pub public_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub freshness_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlareSolverrConfig {
    pub flaresolverr_url: String,
    pub executable: PathBuf,
    /// Spawn `executable` when the service does not answer.
    pub autostart: bool,
    pub startup_timeout_secs: u64,
    pub navigation_timeout_secs: u64,
    pub wait_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// Local wall-clock time of the daily run, `HH:MM`.
    pub daily_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    pub keywords: Vec<String>,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            request_timeout_secs: 120,
            debug_errors: false,
            public_dir: PathBuf::from("public"),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("scrapes"),
            freshness_hours: 24,
        }
    }
}

impl Default for FlareSolverrConfig {
    fn default() -> Self {
        Self {
            flaresolverr_url: "http://localhost:8191/v1".to_string(),
            executable: default_executable(),
            autostart: false,
            startup_timeout_secs: 30,
            navigation_timeout_secs: 60,
            wait_timeout_secs: 60,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_at: "00:05".to_string(),
        }
    }
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            keywords: default_meat_keywords(),
        }
    }
}

fn default_executable() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("flaresolverr.exe")
    } else {
        PathBuf::from("/usr/local/bin/flaresolverr")
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl StorageConfig {
    pub fn freshness(&self) -> chrono::Duration {
        chrono::Duration::hours(self.freshness_hours)
    }
}

impl FlareSolverrConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }
}

impl SchedulerConfig {
    pub fn daily_time(&self) -> Result<NaiveTime, chrono::ParseError> {
        NaiveTime::parse_from_str(&self.daily_at, "%H:%M")
    }
}

impl CategoryConfig {
    pub fn keywords(&self) -> CategoryKeywords {
        CategoryKeywords::new(&self.keywords)
    }
}

/// Loads `Settings.toml` (optional) overlaid with `APP_*` environment variables,
/// e.g. `APP_SERVER__PORT=8080`. The environment names used by earlier deployments
/// (`PORT`, `DATA_DIR`, `PUPPETEER_EXECUTABLE_PATH`, `NODE_ENV`) still apply.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from("Settings.toml")
}

pub fn load_config_from(path: &str) -> Result<AppConfig, ConfigError> {
    let debug_errors = env::var("NODE_ENV")
        .ok()
        .map(|v| v == "development")
        .filter(|on| *on);

    let settings = Config::builder()
        .add_source(File::new(path, config::FileFormat::Toml).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("category.keywords"),
        )
        .set_override_option("server.port", env::var("PORT").ok())?
        .set_override_option("storage.data_dir", env::var("DATA_DIR").ok())?
        .set_override_option(
            "flaresolverr.executable",
            env::var("PUPPETEER_EXECUTABLE_PATH").ok(),
        )?
        .set_override_option("server.debug_errors", debug_errors)?
        .build()?;

    settings.try_deserialize::<AppConfig>()
}
