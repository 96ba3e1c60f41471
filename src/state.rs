use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::scraper::SectionSource;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub source: Arc<dyn SectionSource>,
    pub config: Arc<Config>,
}
