use std::sync::{Arc, LazyLock};

use chrono::Utc;
use futures::{StreamExt, stream};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::repository;
use crate::error::AppError;
use crate::models::Section;
use crate::scraper::SectionSource;

/// Master list of course codes, scraped when no explicit subset is given.
static MASTER_INITIALS: LazyLock<Vec<String>> = LazyLock::new(|| {
    serde_json::from_str(include_str!("../../data/initials.json"))
        .expect("data/initials.json is valid JSON")
});

/// Fetches raw sections per course code from the scraper collaborator and
/// replaces the entire store with the result. A failing code degrades to
/// zero sections for that code; it never aborts the run.
pub struct IngestService {
    db: SqlitePool,
    source: Arc<dyn SectionSource>,
    concurrency: usize,
}

#[derive(Debug, Serialize)]
pub struct IngestStats {
    pub fetched: usize,
    pub failed_initials: usize,
    pub inserted: u64,
}

impl IngestService {
    pub fn new(db: SqlitePool, source: Arc<dyn SectionSource>, concurrency: usize) -> Self {
        Self {
            db,
            source,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn run(
        &self,
        year: i32,
        period: i32,
        initials: Option<Vec<String>>,
    ) -> Result<IngestStats, AppError> {
        let codes = initials.unwrap_or_else(|| MASTER_INITIALS.clone());
        info!(
            "ingesting {} course codes for {}-{} (concurrency {})",
            codes.len(),
            year,
            period,
            self.concurrency
        );

        let mut fetched = Vec::new();
        let mut failed_initials = 0;

        let mut fetches = stream::iter(codes)
            .map(|code| {
                let source = Arc::clone(&self.source);
                async move {
                    let result = source.fetch_sections(year, period, &code).await;
                    (code, result)
                }
            })
            .buffer_unordered(self.concurrency);

        while let Some((code, result)) = fetches.next().await {
            match result {
                Ok(sections) => fetched.extend(sections),
                Err(error) => {
                    failed_initials += 1;
                    warn!("fetch failed for {}: {}", code, error);
                }
            }
        }

        let ingested_at = Utc::now().to_rfc3339();
        let sections: Vec<Section> = fetched
            .into_iter()
            .map(|raw| raw.into_section(&ingested_at))
            .collect();

        let inserted = repository::replace_all(&self.db, &sections).await?;
        info!(
            "ingestion complete: {} records stored, {} codes failed",
            inserted, failed_initials
        );

        Ok(IngestStats {
            fetched: sections.len(),
            failed_initials,
            inserted,
        })
    }
}
