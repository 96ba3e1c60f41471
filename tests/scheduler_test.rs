use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use uccourses::config::Config;
use uccourses::db::repository;
use uccourses::error::AppError;
use uccourses::scraper::{RawSection, SectionSource};
use uccourses::services::ScrapeScheduler;

async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test db");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// Returns one section for every course code it is asked about, with a
/// distinct NRC per call.
struct SingleSectionSource {
    next_nrc: AtomicI32,
}

#[async_trait]
impl SectionSource for SingleSectionSource {
    async fn fetch_sections(
        &self,
        year: i32,
        period: i32,
        initials: &str,
    ) -> Result<Vec<RawSection>, AppError> {
        let nrc = self.next_nrc.fetch_add(1, Ordering::SeqCst);
        let raw = serde_json::from_value(serde_json::json!({
            "NRC": nrc,
            "initials": initials,
            "section": 1,
            "name": "Curso",
            "year": year,
            "period": period,
            "credits": 10
        }))
        .expect("valid raw section");
        Ok(vec![raw])
    }
}

#[tokio::test]
async fn scheduler_runs_a_scrape_after_the_interval() {
    let pool = setup_test_db().await;

    let config = Config {
        scrape_interval_secs: 1,
        scrape_concurrency: 5,
        ..Config::default()
    };
    let scheduler = ScrapeScheduler::new(
        pool.clone(),
        Arc::new(SingleSectionSource {
            next_nrc: AtomicI32::new(10000),
        }),
        Arc::new(config),
    );

    let handle = tokio::spawn(scheduler.start());
    tokio::time::sleep(Duration::from_millis(1800)).await;
    handle.abort();

    // One interval elapsed, so the master list was scraped once: one section
    // per master course code.
    let count = repository::count_sections(&pool).await.expect("count");
    assert!(count >= 1, "expected at least one ingested section");
}
