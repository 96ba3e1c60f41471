use axum::Json;
use axum::extract::{Path, RawQuery, State};
use axum::http::HeaderMap;

use crate::api::links::{self, CourseLinks, Linked, LinkedRequirement, LinkedResolved, RequestContext, SectionLinks};
use crate::api::params::{self, TermQuery};
use crate::db::query::CourseQuery;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{Course, Section};
use crate::services::requisites;
use crate::state::AppState;

/// Strict multi-filter search, or free-text search when `q` is present.
pub async fn search(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Vec<Section>>, AppError> {
    let query = CourseQuery::parse(raw.as_deref())?;
    let results = match &query {
        CourseQuery::Strict(filter) => repository::search_sections(&state.db, filter).await?,
        CourseQuery::FreeText(search) => repository::search_free_text(&state.db, search).await?,
    };
    Ok(Json(results))
}

/// Every Course entry for the given initials across terms, deduplicated,
/// newest term first.
pub async fn list_by_initials(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(initials): Path<String>,
) -> Result<Json<Vec<Linked<Course, CourseLinks>>>, AppError> {
    let courses = repository::find_initials(&state.db, &[initials], None).await?;
    if courses.is_empty() {
        return Err(AppError::NotFound);
    }
    let ctx = RequestContext::from_headers(&headers);
    Ok(Json(links::courses(&ctx, courses)))
}

pub async fn get_course(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((initials, year, period)): Path<(String, String, String)>,
) -> Result<Json<Linked<Course, CourseLinks>>, AppError> {
    let year = params::parse_term_path(&year, state.config.current_year, "year")?;
    let period = params::parse_term_path(&period, state.config.current_period, "period")?;

    let course = repository::find_course(&state.db, &initials, year, period)
        .await?
        .ok_or(AppError::NotFound)?;
    let ctx = RequestContext::from_headers(&headers);
    Ok(Json(links::course(&ctx, course)))
}

pub async fn list_sections(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((initials, year, period)): Path<(String, String, String)>,
) -> Result<Json<Vec<Linked<Section, SectionLinks>>>, AppError> {
    let year = params::parse_term_path(&year, state.config.current_year, "year")?;
    let period = params::parse_term_path(&period, state.config.current_period, "period")?;

    let sections = repository::find_sections(&state.db, &initials, year, period).await?;
    if sections.is_empty() {
        return Err(AppError::NotFound);
    }
    let ctx = RequestContext::from_headers(&headers);
    Ok(Json(links::sections(&ctx, sections)))
}

pub async fn get_section_by_number(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((initials, year, period, section)): Path<(String, String, String, String)>,
) -> Result<Json<Linked<Section, SectionLinks>>, AppError> {
    let section = params::parse_numeric_path(&section, "section")?;
    let year = params::parse_term_path(&year, state.config.current_year, "year")?;
    let period = params::parse_term_path(&period, state.config.current_period, "period")?;

    let found = repository::find_section_by_number(&state.db, &initials, year, period, section)
        .await?
        .ok_or(AppError::NotFound)?;
    let ctx = RequestContext::from_headers(&headers);
    Ok(Json(links::section(&ctx, found)))
}

pub async fn get_section_by_id(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Linked<Section, SectionLinks>>, AppError> {
    let found = repository::find_section_by_id(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let ctx = RequestContext::from_headers(&headers);
    Ok(Json(links::section(&ctx, found)))
}

pub async fn get_section_by_nrc(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(nrc): Path<String>,
) -> Result<Json<Linked<Section, SectionLinks>>, AppError> {
    let nrc = params::parse_numeric_path(&nrc, "NRC")?;
    let found = repository::find_section_by_nrc(&state.db, nrc)
        .await?
        .ok_or(AppError::NotFound)?;
    let ctx = RequestContext::from_headers(&headers);
    Ok(Json(links::section(&ctx, found)))
}

/// Resolved equivalences of a course. The course itself is looked up at the
/// requested term (or the configured current one); the equivalence lookup is
/// only term-filtered when the caller passes both year and period.
pub async fn equivalences(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(initials): Path<String>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Vec<LinkedResolved>>, AppError> {
    let term_query = TermQuery::parse(raw.as_deref())?;
    let (year, period) = term_query.term().unwrap_or_else(|| state.config.current_term());

    let course = repository::find_course(&state.db, &initials, year, period)
        .await?
        .ok_or(AppError::NotFound)?;
    let resolved = requisites::resolve_equivalences(&state.db, &course, term_query.term()).await?;
    let ctx = RequestContext::from_headers(&headers);
    Ok(Json(links::resolved(&ctx, resolved)))
}

/// Resolved requirement groups of a course, each prerequisite/corequisite
/// looked up at the same term as the course.
pub async fn requirements(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(initials): Path<String>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Vec<LinkedRequirement>>, AppError> {
    let term_query = TermQuery::parse(raw.as_deref())?;
    let (year, period) = term_query.term().unwrap_or_else(|| state.config.current_term());

    let course = repository::find_course(&state.db, &initials, year, period)
        .await?
        .ok_or(AppError::NotFound)?;
    let groups = requisites::resolve_requirements(&state.db, &course, year, period).await?;
    let ctx = RequestContext::from_headers(&headers);
    Ok(Json(links::requirements(&ctx, groups)))
}
