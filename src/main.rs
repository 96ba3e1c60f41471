use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uccourses::api::router;
use uccourses::config::Config;
use uccourses::error;
use uccourses::scraper::{HttpSectionSource, SectionSource};
use uccourses::services::ScrapeScheduler;
use uccourses::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "uccourses=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env());
    error::set_production(config.production);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let source: Arc<dyn SectionSource> = Arc::new(HttpSectionSource::new(
        &config.scrape_base_url,
        config.scrape_timeout_secs,
    )?);

    let state = AppState {
        db: pool.clone(),
        source,
        config: Arc::clone(&config),
    };

    let scheduler = ScrapeScheduler::new(pool, Arc::clone(&state.source), Arc::clone(&config));
    tokio::spawn(scheduler.start());

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
