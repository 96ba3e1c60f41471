pub mod dto;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::AppError;

pub use dto::RawSection;

/// External collaborator that produces raw section records for one course
/// code in one term.
#[async_trait]
pub trait SectionSource: Send + Sync {
    async fn fetch_sections(
        &self,
        year: i32,
        period: i32,
        initials: &str,
    ) -> Result<Vec<RawSection>, AppError>;
}

pub struct HttpSectionSource {
    client: Client,
    base_url: String,
}

impl HttpSectionSource {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SectionSource for HttpSectionSource {
    async fn fetch_sections(
        &self,
        year: i32,
        period: i32,
        initials: &str,
    ) -> Result<Vec<RawSection>, AppError> {
        let sections = self
            .client
            .get(&self.base_url)
            .query(&[
                ("cxml_semestre", format!("{year}-{period}")),
                ("cxml_sigla", initials.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<RawSection>>()
            .await?;
        Ok(sections)
    }
}

/// Source that never returns anything. Handy for wiring tests that exercise
/// the read path without an upstream.
pub struct NoopSource;

#[async_trait]
impl SectionSource for NoopSource {
    async fn fetch_sections(
        &self,
        _year: i32,
        _period: i32,
        _initials: &str,
    ) -> Result<Vec<RawSection>, AppError> {
        Ok(Vec::new())
    }
}
