//! Query construction for the sections store. Incoming filter parameters
//! become a single bound SQL statement; nested document fields (teachers,
//! schedule locations) are matched through `json_each`/`json_extract`.

use sqlx::{QueryBuilder, Sqlite};

use crate::error::AppError;

pub const MAX_LIMIT: i64 = 50;

pub const SECTION_COLUMNS: &str = "id, nrc, initials, section, name, school, year, period, \
     credits, information, droppable, english, special_approval, vacancy_total, \
     vacancy_available, teachers, schedule, requisites, ingested_at";

pub const COURSE_COLUMNS: &str = "initials, name, school, year, period, credits, information, \
     droppable, english, special_approval, requisites";

/// A parsed `/courses` query string: either the strict ANDed multi-filter
/// mode or the ORing free-text mode (`q=` present).
#[derive(Debug)]
pub enum CourseQuery {
    Strict(SearchFilter),
    FreeText(FreeTextQuery),
}

#[derive(Debug, Clone)]
pub struct SearchFilter {
    pub name: Option<String>,
    pub initials: Option<String>,
    pub nrc: Option<String>,
    pub school: Option<String>,
    pub section: Option<String>,
    pub teacher: Option<String>,
    pub campus: Option<String>,
    pub places: Vec<String>,
    pub year: Option<i32>,
    pub period: Option<i32>,
    pub limit: i64,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            name: None,
            initials: None,
            nrc: None,
            school: None,
            section: None,
            teacher: None,
            campus: None,
            places: Vec::new(),
            year: None,
            period: None,
            limit: MAX_LIMIT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FreeTextQuery {
    pub q: String,
    pub year: Option<i32>,
    pub period: Option<i32>,
    pub limit: i64,
}

impl CourseQuery {
    /// Parse and validate a raw query string. Validation happens here, at the
    /// boundary, before any store access.
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        let mut filter = SearchFilter::default();
        let mut q = None;

        for (key, value) in url::form_urlencoded::parse(raw.unwrap_or("").as_bytes()) {
            if value.is_empty() {
                continue;
            }
            let value = value.into_owned();
            match key.as_ref() {
                "q" => q = Some(value),
                "name" => filter.name = Some(value),
                "initials" => filter.initials = Some(value),
                "NRC" => filter.nrc = Some(value),
                "school" => filter.school = Some(value),
                "section" => filter.section = Some(value),
                "teacher" => filter.teacher = Some(value),
                "campus" => filter.campus = Some(value),
                "places" | "places[]" => filter.places.push(value),
                "year" => filter.year = Some(parse_numeric("year", &value)?),
                "period" => filter.period = Some(parse_numeric("period", &value)?),
                "limit" => filter.limit = parse_limit(&value)?,
                _ => {}
            }
        }

        if let Some(q) = q {
            return Ok(CourseQuery::FreeText(FreeTextQuery {
                q,
                year: filter.year,
                period: filter.period,
                limit: filter.limit,
            }));
        }

        if filter.is_empty() {
            return Err(AppError::InvalidQuery(
                "at least one search filter is required".to_string(),
            ));
        }
        Ok(CourseQuery::Strict(filter))
    }
}

impl SearchFilter {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.initials.is_none()
            && self.nrc.is_none()
            && self.school.is_none()
            && self.section.is_none()
            && self.teacher.is_none()
            && self.campus.is_none()
            && self.places.is_empty()
            && self.year.is_none()
            && self.period.is_none()
    }
}

fn parse_numeric(field: &str, value: &str) -> Result<i32, AppError> {
    value
        .parse()
        .map_err(|_| AppError::InvalidQuery(format!("{field} must be numeric")))
}

fn parse_limit(value: &str) -> Result<i64, AppError> {
    let limit: i64 = value
        .parse()
        .map_err(|_| AppError::InvalidQuery("limit must be numeric".to_string()))?;
    if limit < 0 {
        return Err(AppError::InvalidQuery("limit must not be negative".to_string()));
    }
    Ok(limit.min(MAX_LIMIT))
}

/// All strict-mode filters AND together; absent filters are omitted.
pub fn build_search(filter: &SearchFilter) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(format!("SELECT {SECTION_COLUMNS} FROM sections WHERE 1 = 1"));

    if let Some(name) = &filter.name {
        push_like(&mut qb, "name", name);
    }
    if let Some(initials) = &filter.initials {
        push_like(&mut qb, "initials", initials);
    }
    if let Some(nrc) = &filter.nrc {
        push_like(&mut qb, "CAST(nrc AS TEXT)", nrc);
    }
    if let Some(school) = &filter.school {
        push_like(&mut qb, "school", school);
    }
    if let Some(section) = &filter.section {
        push_like(&mut qb, "CAST(section AS TEXT)", section);
    }
    if let Some(teacher) = &filter.teacher {
        qb.push(" AND EXISTS (SELECT 1 FROM json_each(sections.teachers) AS t WHERE ");
        push_like_expr(&mut qb, "json_extract(t.value, '$.name')", teacher);
        qb.push(")");
    }
    if let Some(campus) = &filter.campus {
        // OR across every module type's location.
        qb.push(" AND EXISTS (SELECT 1 FROM json_each(sections.schedule) AS b WHERE ");
        push_like_expr(&mut qb, "json_extract(b.value, '$.location.campus')", campus);
        qb.push(")");
    }
    if !filter.places.is_empty() {
        qb.push(" AND EXISTS (SELECT 1 FROM json_each(sections.schedule) AS b WHERE ");
        for (i, place) in filter.places.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            push_like_expr(&mut qb, "json_extract(b.value, '$.location.place')", place);
        }
        qb.push(")");
    }
    if let Some(year) = filter.year {
        qb.push(" AND year = ").push_bind(year);
    }
    if let Some(period) = filter.period {
        qb.push(" AND period = ").push_bind(period);
    }

    qb.push(" ORDER BY initials ASC LIMIT ").push_bind(filter.limit);
    qb
}

/// Free-text mode ORs across fields. SQLite gives us no relevance score
/// here, so ordering falls back to initials.
pub fn build_free_text(search: &FreeTextQuery) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(format!("SELECT {SECTION_COLUMNS} FROM sections WHERE ("));
    push_like_expr(&mut qb, "initials", &search.q);
    qb.push(" OR ");
    push_like_expr(&mut qb, "name", &search.q);
    if let Ok(nrc) = search.q.parse::<i32>() {
        qb.push(" OR nrc = ").push_bind(nrc);
    }
    if let (Some(year), Some(period)) = (search.year, search.period) {
        qb.push(" OR (year = ")
            .push_bind(year)
            .push(" AND period = ")
            .push_bind(period)
            .push(")");
    }
    qb.push(") ORDER BY initials ASC LIMIT ").push_bind(search.limit);
    qb
}

/// Newest term first; callers keep the first row seen per (year, period).
pub fn build_find_initials(
    initials: &[String],
    term: Option<(i32, i32)>,
) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(format!("SELECT {COURSE_COLUMNS} FROM sections WHERE initials IN ("));
    let mut separated = qb.separated(", ");
    for value in initials {
        separated.push_bind(value.clone());
    }
    qb.push(")");
    if let Some((year, period)) = term {
        qb.push(" AND year = ")
            .push_bind(year)
            .push(" AND period = ")
            .push_bind(period);
    }
    qb.push(" ORDER BY year DESC, period DESC, rowid DESC");
    qb
}

fn push_like(qb: &mut QueryBuilder<'static, Sqlite>, column: &str, value: &str) {
    qb.push(" AND ");
    push_like_expr(qb, column, value);
}

fn push_like_expr(qb: &mut QueryBuilder<'static, Sqlite>, expr: &str, value: &str) {
    qb.push(expr)
        .push(" LIKE ")
        .push_bind(contains(value))
        .push(" ESCAPE '\\'");
}

fn contains(value: &str) -> String {
    format!("%{}%", escape_like(value))
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_is_rejected() {
        let err = CourseQuery::parse(None).expect_err("must fail");
        assert!(matches!(err, AppError::InvalidQuery(_)));

        // Unrecognized keys alone do not count as filters either.
        let err = CourseQuery::parse(Some("foo=bar")).expect_err("must fail");
        assert!(matches!(err, AppError::InvalidQuery(_)));
    }

    #[test]
    fn limit_is_clamped_to_max() {
        let parsed = CourseQuery::parse(Some("initials=IIC&limit=500")).expect("parses");
        match parsed {
            CourseQuery::Strict(f) => assert_eq!(f.limit, MAX_LIMIT),
            other => panic!("expected strict mode, got {other:?}"),
        }
    }

    #[test]
    fn limit_zero_is_allowed() {
        let parsed = CourseQuery::parse(Some("initials=IIC&limit=0")).expect("parses");
        match parsed {
            CourseQuery::Strict(f) => assert_eq!(f.limit, 0),
            other => panic!("expected strict mode, got {other:?}"),
        }
    }

    #[test]
    fn negative_limit_is_rejected() {
        let err = CourseQuery::parse(Some("initials=IIC&limit=-1")).expect_err("must fail");
        assert!(matches!(err, AppError::InvalidQuery(_)));
    }

    #[test]
    fn limit_defaults_to_max() {
        let parsed = CourseQuery::parse(Some("name=calculo")).expect("parses");
        match parsed {
            CourseQuery::Strict(f) => assert_eq!(f.limit, MAX_LIMIT),
            other => panic!("expected strict mode, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_year_is_rejected() {
        let err = CourseQuery::parse(Some("initials=IIC&year=twenty")).expect_err("must fail");
        assert!(matches!(err, AppError::InvalidQuery(_)));
    }

    #[test]
    fn q_selects_free_text_mode() {
        let parsed = CourseQuery::parse(Some("q=IIC2233&year=2016&period=1")).expect("parses");
        match parsed {
            CourseQuery::FreeText(f) => {
                assert_eq!(f.q, "IIC2233");
                assert_eq!(f.year, Some(2016));
                assert_eq!(f.period, Some(1));
            }
            other => panic!("expected free-text mode, got {other:?}"),
        }
    }

    #[test]
    fn repeated_places_collect() {
        let parsed =
            CourseQuery::parse(Some("places[]=BC25&places[]=AULA1&campus=Oriente")).expect("parses");
        match parsed {
            CourseQuery::Strict(f) => assert_eq!(f.places, vec!["BC25", "AULA1"]),
            other => panic!("expected strict mode, got {other:?}"),
        }
    }

    #[test]
    fn strict_sql_ands_filters_and_orders_by_initials() {
        let parsed = CourseQuery::parse(Some("teacher=Torres&campus=San+Joaquin&year=2016"))
            .expect("parses");
        let CourseQuery::Strict(filter) = parsed else {
            panic!("expected strict mode");
        };
        let mut qb = build_search(&filter);
        let sql = qb.sql();
        assert!(sql.contains("json_each(sections.teachers)"));
        assert!(sql.contains("json_extract(b.value, '$.location.campus')"));
        assert!(sql.contains("AND year ="));
        assert!(sql.contains("ORDER BY initials ASC"));
    }

    #[test]
    fn free_text_sql_skips_nrc_for_non_numeric_token() {
        let search = FreeTextQuery {
            q: "calculo".to_string(),
            year: None,
            period: None,
            limit: MAX_LIMIT,
        };
        let mut qb = build_free_text(&search);
        assert!(!qb.sql().contains("nrc ="));

        let search = FreeTextQuery { q: "10760".to_string(), ..search };
        let mut qb = build_free_text(&search);
        assert!(qb.sql().contains("nrc ="));
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(contains("100%"), "%100\\%%");
        assert_eq!(contains("a_b"), "%a\\_b%");
    }
}
