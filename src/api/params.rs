//! Route and query parameter parsing. Everything here fails before any
//! store access happens.

use crate::error::AppError;

/// Year/period path segments accept a literal `_` meaning "the configured
/// current term".
pub fn parse_term_path(value: &str, default: i32, field: &str) -> Result<i32, AppError> {
    if value == "_" {
        return Ok(default);
    }
    value
        .parse()
        .map_err(|_| AppError::InvalidParam(format!("{field} must be numeric or '_'")))
}

pub fn parse_numeric_path(value: &str, field: &str) -> Result<i32, AppError> {
    value
        .parse()
        .map_err(|_| AppError::InvalidIdentifier(format!("{field} must be numeric")))
}

/// Optional `?year=&period=` pair; it only takes effect when both are given.
#[derive(Debug, Default)]
pub struct TermQuery {
    pub year: Option<i32>,
    pub period: Option<i32>,
}

impl TermQuery {
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        let mut parsed = TermQuery::default();
        for (key, value) in url::form_urlencoded::parse(raw.unwrap_or("").as_bytes()) {
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "year" => parsed.year = Some(parse_query_numeric("year", &value)?),
                "period" => parsed.period = Some(parse_query_numeric("period", &value)?),
                _ => {}
            }
        }
        Ok(parsed)
    }

    pub fn term(&self) -> Option<(i32, i32)> {
        match (self.year, self.period) {
            (Some(year), Some(period)) => Some((year, period)),
            _ => None,
        }
    }
}

/// Parameters of the scrape trigger endpoint.
#[derive(Debug, Default)]
pub struct ScrapeQuery {
    pub year: Option<i32>,
    pub period: Option<i32>,
    pub initials: Vec<String>,
}

impl ScrapeQuery {
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        let mut parsed = ScrapeQuery::default();
        for (key, value) in url::form_urlencoded::parse(raw.unwrap_or("").as_bytes()) {
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "year" => parsed.year = Some(parse_query_numeric("year", &value)?),
                "period" => parsed.period = Some(parse_query_numeric("period", &value)?),
                "initials" | "initials[]" => parsed.initials.push(value.into_owned()),
                _ => {}
            }
        }
        Ok(parsed)
    }
}

fn parse_query_numeric(field: &str, value: &str) -> Result<i32, AppError> {
    value
        .parse()
        .map_err(|_| AppError::InvalidParam(format!("{field} must be numeric")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underscore_resolves_to_default() {
        assert_eq!(parse_term_path("_", 2016, "year").expect("ok"), 2016);
        assert_eq!(parse_term_path("2015", 2016, "year").expect("ok"), 2015);
    }

    #[test]
    fn non_numeric_term_path_is_rejected() {
        let err = parse_term_path("twenty", 2016, "year").expect_err("must fail");
        assert!(matches!(err, AppError::InvalidParam(_)));
    }

    #[test]
    fn non_numeric_identifier_is_rejected() {
        let err = parse_numeric_path("abc", "NRC").expect_err("must fail");
        assert!(matches!(err, AppError::InvalidIdentifier(_)));
    }

    #[test]
    fn term_query_requires_both_values() {
        let parsed = TermQuery::parse(Some("year=2016")).expect("parses");
        assert_eq!(parsed.term(), None);

        let parsed = TermQuery::parse(Some("year=2016&period=1")).expect("parses");
        assert_eq!(parsed.term(), Some((2016, 1)));
    }

    #[test]
    fn scrape_query_collects_initials() {
        let parsed =
            ScrapeQuery::parse(Some("year=2016&period=1&initials[]=IIC2233&initials[]=MAT1610"))
                .expect("parses");
        assert_eq!(parsed.initials, vec!["IIC2233", "MAT1610"]);
    }
}
