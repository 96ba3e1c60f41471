use std::env;
use std::str::FromStr;

/// Runtime configuration, resolved once at process start. Every knob has a
/// working default so the service boots with an empty environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub production: bool,
    /// Term substituted for a literal `_` in year/period route parameters.
    pub current_year: i32,
    pub current_period: i32,
    pub scrape_base_url: String,
    /// Path segment that arms the HTTP scrape trigger; unset disables it.
    pub scrape_secret: Option<String>,
    pub scrape_concurrency: usize,
    pub scrape_interval_secs: u64,
    pub scrape_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: "sqlite://uccourses.db?mode=rwc".to_string(),
            production: false,
            current_year: 2016,
            current_period: 1,
            scrape_base_url: "https://buscacursos.uc.cl".to_string(),
            scrape_secret: None,
            scrape_concurrency: 5,
            scrape_interval_secs: 7 * 24 * 60 * 60,
            scrape_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Self {
            port: var_or("PORT", defaults.port),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            production: env::var("APP_ENV")
                .map(|e| e.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            current_year: var_or("CURRENT_YEAR", defaults.current_year),
            current_period: var_or("CURRENT_PERIOD", defaults.current_period),
            scrape_base_url: env::var("SCRAPE_BASE_URL").unwrap_or(defaults.scrape_base_url),
            scrape_secret: env::var("SCRAPE_SECRET").ok().filter(|s| !s.is_empty()),
            scrape_concurrency: var_or("SCRAPE_CONCURRENCY", defaults.scrape_concurrency),
            scrape_interval_secs: var_or("SCRAPE_INTERVAL_SECS", defaults.scrape_interval_secs),
            scrape_timeout_secs: var_or("SCRAPE_TIMEOUT_SECS", defaults.scrape_timeout_secs),
        }
    }

    pub fn current_term(&self) -> (i32, i32) {
        (self.current_year, self.current_period)
    }
}

fn var_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
