use axum::Json;
use axum::extract::{Path, RawQuery, State};

use crate::api::params::TermQuery;
use crate::db::repository;
use crate::error::AppError;
use crate::models::Teacher;
use crate::state::AppState;

/// Unique teacher directory derived from section records, optionally
/// restricted to one term.
pub async fn list(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Vec<Teacher>>, AppError> {
    let term = TermQuery::parse(raw.as_deref())?;
    let teachers = repository::fetch_teachers(&state.db, term.term()).await?;
    if teachers.is_empty() {
        return Err(AppError::NotFound);
    }
    Ok(Json(teachers))
}

pub async fn get_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Teacher>, AppError> {
    let teacher = repository::find_teacher(&state.db, &name)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(teacher))
}
