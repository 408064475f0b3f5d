use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;

use promo_scrapping::config::load_config;
use promo_scrapping::flaresolverr::{FlareSolverr, RenderEngine};
use promo_scrapping::pipeline::{DailySchedule, Scheduler};
use promo_scrapping::server::{build_app, serve, AppState};
use promo_scrapping::utilities::logging;
use promo_scrapping::build_orchestrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    // Load configuration settings
    let config = load_config().context("Failed to load configuration")?;
    let daily_at = config
        .scheduler
        .daily_time()
        .with_context(|| format!("Invalid scheduler.daily_at: {}", config.scheduler.daily_at))?;

    let engine: Arc<dyn RenderEngine> = Arc::new(
        FlareSolverr::new(config.flaresolverr.clone()).context("Failed to set up FlareSolverr")?,
    );
    let orchestrator = Arc::new(build_orchestrator(&config, engine));

    let scheduler = config.scheduler.enabled.then(|| {
        let scheduler = Scheduler::new(DailySchedule::new(daily_at), orchestrator.clone());
        (scheduler.shutdown_handle(), scheduler.start())
    });

    println!(
        "{}",
        format!("{} {}", config.base.name, config.base.version).green()
    );
    println!("Data directory: {}", config.storage.data_dir.display());
    println!("FlareSolverr: {}", config.flaresolverr.flaresolverr_url);
    match &scheduler {
        Some(_) => println!("Daily scraping at {}", config.scheduler.daily_at),
        None => println!("{}", "Daily scraping disabled".yellow()),
    }
    println!(
        "{}",
        format!("Server running at http://localhost:{}", config.server.port).green()
    );

    let app = build_app(
        AppState {
            orchestrator,
            request_timeout: config.server.request_timeout(),
            debug_errors: config.server.debug_errors,
        },
        &config.server.public_dir,
    );
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let served = serve(addr, app).await;

    if let Some((shutdown, handle)) = scheduler {
        shutdown.notify_one();
        let _ = handle.await;
    }

    served
}
