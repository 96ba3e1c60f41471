use std::collections::HashMap;

use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::repository;
use crate::error::AppError;
use crate::models::Course;

/// A requisite entry either resolves to a stored course or stays as a stub
/// carrying only the initials. A missing course is normal data (retired
/// courses keep appearing in requirement lists), never an error.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Resolved {
    Course(Course),
    Stub { initials: String },
}

#[derive(Debug, Serialize)]
pub struct ResolvedRequirement {
    pub prerequisites: Vec<Resolved>,
    pub corequisites: Vec<Resolved>,
}

/// Resolve every prerequisite/corequisite of a course against the given
/// term, preserving requirement-group structure and input order. Lookups
/// within a group run concurrently.
pub async fn resolve_requirements(
    db: &SqlitePool,
    course: &Course,
    year: i32,
    period: i32,
) -> Result<Vec<ResolvedRequirement>, AppError> {
    let mut resolved = Vec::with_capacity(course.requisites.requirements.len());
    for requirement in &course.requisites.requirements {
        let (prerequisites, corequisites) = tokio::try_join!(
            resolve_group(db, &requirement.prerequisites, year, period),
            resolve_group(db, &requirement.corequisites, year, period),
        )?;
        resolved.push(ResolvedRequirement {
            prerequisites,
            corequisites,
        });
    }
    Ok(resolved)
}

async fn resolve_group(
    db: &SqlitePool,
    initials: &[String],
    year: i32,
    period: i32,
) -> Result<Vec<Resolved>, AppError> {
    let lookups = initials.iter().map(|code| resolve_one(db, code, year, period));
    futures::future::try_join_all(lookups).await
}

async fn resolve_one(
    db: &SqlitePool,
    initials: &str,
    year: i32,
    period: i32,
) -> Result<Resolved, AppError> {
    Ok(match repository::find_course(db, initials, year, period).await? {
        Some(course) => Resolved::Course(course),
        None => Resolved::Stub {
            initials: initials.to_string(),
        },
    })
}

/// Resolve a course's equivalence list through the deduplicator, optionally
/// filtered to one term. Same stub policy as requirements: an initials with
/// no stored course yields a stub, so output length always matches input.
pub async fn resolve_equivalences(
    db: &SqlitePool,
    course: &Course,
    term: Option<(i32, i32)>,
) -> Result<Vec<Resolved>, AppError> {
    let found = repository::find_initials(db, &course.requisites.equivalences, term).await?;

    let mut grouped: HashMap<String, Vec<Course>> = HashMap::new();
    for equivalent in found {
        grouped.entry(equivalent.initials.clone()).or_default().push(equivalent);
    }

    let mut resolved = Vec::new();
    for initials in &course.requisites.equivalences {
        match grouped.remove(initials.as_str()) {
            Some(courses) => resolved.extend(courses.into_iter().map(Resolved::Course)),
            None => resolved.push(Resolved::Stub {
                initials: initials.clone(),
            }),
        }
    }
    Ok(resolved)
}
