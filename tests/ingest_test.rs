use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use uccourses::db::repository;
use uccourses::error::AppError;
use uccourses::scraper::{RawSection, SectionSource};
use uccourses::services::IngestService;

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

fn raw_section(nrc: i32, initials: &str, section: i32) -> RawSection {
    // Wire shape with the flat historical schedule variant; ingestion has to
    // normalize it.
    serde_json::from_value(serde_json::json!({
        "NRC": nrc,
        "initials": initials,
        "section": section,
        "name": "Programacion Avanzada",
        "school": "Ingenieria",
        "year": 2016,
        "period": 1,
        "credits": 10,
        "teachers": [{ "name": "Juan Torres" }],
        "vacancy": { "total": 40, "available": 10 },
        "schedule": [
            {
                "identifier": "CAT",
                "day": "L",
                "hours": [1, 2],
                "location": { "campus": "San Joaquin", "place": "BC25" }
            }
        ]
    }))
    .expect("valid raw section")
}

/// Scraper double returning a fixed set of sections per course code.
struct FixedSource {
    by_initials: HashMap<String, Vec<RawSection>>,
    fail_for: Option<String>,
}

impl FixedSource {
    fn new(by_initials: HashMap<String, Vec<RawSection>>) -> Self {
        Self {
            by_initials,
            fail_for: None,
        }
    }

    fn empty() -> Self {
        Self::new(HashMap::new())
    }

    fn failing_for(mut self, initials: &str) -> Self {
        self.fail_for = Some(initials.to_string());
        self
    }
}

#[async_trait]
impl SectionSource for FixedSource {
    async fn fetch_sections(
        &self,
        _year: i32,
        _period: i32,
        initials: &str,
    ) -> Result<Vec<RawSection>, AppError> {
        if self.fail_for.as_deref() == Some(initials) {
            let synthetic = serde_json::from_str::<i32>("boom").expect_err("is an error");
            return Err(AppError::Corrupt(synthetic));
        }
        Ok(self.by_initials.get(initials).cloned().unwrap_or_default())
    }
}

#[tokio::test]
async fn ingest_replaces_store_with_fetched_records() {
    let pool = setup_test_db().await;
    let source = FixedSource::new(HashMap::from([
        (
            "IIC2233".to_string(),
            vec![raw_section(10760, "IIC2233", 1), raw_section(10761, "IIC2233", 2)],
        ),
        ("MAT1610".to_string(), vec![raw_section(20000, "MAT1610", 1)]),
    ]));

    let service = IngestService::new(pool.clone(), Arc::new(source), 5);
    let stats = service
        .run(2016, 1, Some(vec!["IIC2233".to_string(), "MAT1610".to_string()]))
        .await
        .expect("ingest run");

    assert_eq!(stats.inserted, 3);
    assert_eq!(stats.failed_initials, 0);
    assert_eq!(repository::count_sections(&pool).await.expect("count"), 3);

    // The flat schedule arrived normalized into the canonical shape.
    let stored = repository::find_section_by_nrc(&pool, 10760)
        .await
        .expect("lookup")
        .expect("stored");
    assert_eq!(stored.schedule["CAT"].modules["L"], vec![1, 2]);
    assert_eq!(
        stored.schedule["CAT"].location.campus.as_deref(),
        Some("San Joaquin")
    );
}

#[tokio::test]
async fn second_run_with_no_records_empties_the_store() {
    let pool = setup_test_db().await;

    let source = FixedSource::new(HashMap::from([(
        "IIC2233".to_string(),
        vec![raw_section(10760, "IIC2233", 1)],
    )]));
    let service = IngestService::new(pool.clone(), Arc::new(source), 5);
    service
        .run(2016, 1, Some(vec!["IIC2233".to_string()]))
        .await
        .expect("first run");
    assert_eq!(repository::count_sections(&pool).await.expect("count"), 1);

    let service = IngestService::new(pool.clone(), Arc::new(FixedSource::empty()), 5);
    let stats = service
        .run(2016, 1, Some(vec!["IIC2233".to_string()]))
        .await
        .expect("second run");

    assert_eq!(stats.inserted, 0);
    assert_eq!(repository::count_sections(&pool).await.expect("count"), 0);
}

#[tokio::test]
async fn per_initials_failure_does_not_abort_the_run() {
    let pool = setup_test_db().await;
    let source = FixedSource::new(HashMap::from([
        ("IIC2233".to_string(), vec![raw_section(10760, "IIC2233", 1)]),
        ("MAT1610".to_string(), vec![raw_section(20000, "MAT1610", 1)]),
    ]))
    .failing_for("MAT1610");

    let service = IngestService::new(pool.clone(), Arc::new(source), 5);
    let stats = service
        .run(2016, 1, Some(vec!["IIC2233".to_string(), "MAT1610".to_string()]))
        .await
        .expect("ingest run");

    assert_eq!(stats.failed_initials, 1);
    assert_eq!(stats.inserted, 1);

    let survivor = repository::find_section_by_nrc(&pool, 10760)
        .await
        .expect("lookup");
    assert!(survivor.is_some());
}

#[tokio::test]
async fn serialized_concurrency_produces_the_same_result() {
    let pool = setup_test_db().await;
    let source = FixedSource::new(HashMap::from([
        ("IIC2233".to_string(), vec![raw_section(10760, "IIC2233", 1)]),
        ("MAT1610".to_string(), vec![raw_section(20000, "MAT1610", 1)]),
    ]));

    let service = IngestService::new(pool.clone(), Arc::new(source), 1);
    let stats = service
        .run(2016, 1, Some(vec!["IIC2233".to_string(), "MAT1610".to_string()]))
        .await
        .expect("ingest run");

    assert_eq!(stats.inserted, 2);
    assert_eq!(repository::count_sections(&pool).await.expect("count"), 2);
}
