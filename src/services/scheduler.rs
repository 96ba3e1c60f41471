use std::sync::Arc;
use std::time::Duration;
use sqlx::SqlitePool;
use tracing::info;

use crate::config::Config;
use crate::error::AppError;
use crate::scraper::SectionSource;
use crate::services::ingest::{IngestService, IngestStats};

/// Periodic scrape scheduler. Refreshes the catalog for the configured
/// current term on a fixed interval (weekly by default).
pub struct ScrapeScheduler {
    db: SqlitePool,
    source: Arc<dyn SectionSource>,
    config: Arc<Config>,
}

impl ScrapeScheduler {
    pub fn new(db: SqlitePool, source: Arc<dyn SectionSource>, config: Arc<Config>) -> Self {
        Self { db, source, config }
    }

    /// Run scrapes in an endless interval loop.
    pub async fn start(self) {
        let interval = Duration::from_secs(self.config.scrape_interval_secs);
        info!("starting scrape scheduler (interval: {:?})", interval);

        loop {
            tokio::time::sleep(interval).await;

            match self.run_scrape().await {
                Ok(stats) => {
                    info!(
                        "scheduled scrape completed: {} records stored, {} codes failed",
                        stats.inserted, stats.failed_initials
                    );
                }
                Err(e) => {
                    tracing::warn!("scheduled scrape failed: {:?}", e);
                    // Keep looping; the next interval retries from scratch.
                }
            }
        }
    }

    async fn run_scrape(&self) -> Result<IngestStats, AppError> {
        let service = IngestService::new(
            self.db.clone(),
            Arc::clone(&self.source),
            self.config.scrape_concurrency,
        );
        let (year, period) = self.config.current_term();
        service.run(year, period, None).await
    }
}
