use std::collections::HashSet;

use sqlx::{FromRow, SqlitePool};

use crate::db::query::{self, FreeTextQuery, SearchFilter};
use crate::error::AppError;
use crate::models::{Course, Section, Teacher, Vacancy};

#[derive(Debug, FromRow)]
struct SectionRow {
    id: String,
    nrc: i32,
    initials: String,
    section: i32,
    name: String,
    school: Option<String>,
    year: i32,
    period: i32,
    credits: i32,
    information: Option<String>,
    droppable: bool,
    english: bool,
    special_approval: bool,
    vacancy_total: Option<i32>,
    vacancy_available: Option<i32>,
    teachers: String,
    schedule: String,
    requisites: String,
    ingested_at: String,
}

impl TryFrom<SectionRow> for Section {
    type Error = serde_json::Error;

    fn try_from(row: SectionRow) -> Result<Self, Self::Error> {
        Ok(Section {
            id: row.id,
            nrc: row.nrc,
            initials: row.initials,
            section: row.section,
            name: row.name,
            school: row.school,
            year: row.year,
            period: row.period,
            credits: row.credits,
            information: row.information,
            droppable: row.droppable,
            english: row.english,
            special_approval: row.special_approval,
            teachers: serde_json::from_str(&row.teachers)?,
            vacancy: Vacancy {
                total: row.vacancy_total,
                available: row.vacancy_available,
            },
            schedule: serde_json::from_str(&row.schedule)?,
            requisites: serde_json::from_str(&row.requisites)?,
            ingested_at: row.ingested_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct CourseRow {
    initials: String,
    name: String,
    school: Option<String>,
    year: i32,
    period: i32,
    credits: i32,
    information: Option<String>,
    droppable: bool,
    english: bool,
    special_approval: bool,
    requisites: String,
}

impl TryFrom<CourseRow> for Course {
    type Error = serde_json::Error;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        Ok(Course {
            initials: row.initials,
            name: row.name,
            school: row.school,
            year: row.year,
            period: row.period,
            credits: row.credits,
            information: row.information,
            droppable: row.droppable,
            english: row.english,
            special_approval: row.special_approval,
            requisites: serde_json::from_str(&row.requisites)?,
        })
    }
}

pub async fn search_sections(
    db: &SqlitePool,
    filter: &SearchFilter,
) -> Result<Vec<Section>, AppError> {
    let mut qb = query::build_search(filter);
    let rows: Vec<SectionRow> = qb.build_query_as().fetch_all(db).await?;
    collect_sections(rows)
}

pub async fn search_free_text(
    db: &SqlitePool,
    search: &FreeTextQuery,
) -> Result<Vec<Section>, AppError> {
    let mut qb = query::build_free_text(search);
    let rows: Vec<SectionRow> = qb.build_query_as().fetch_all(db).await?;
    collect_sections(rows)
}

/// At most one Course per distinct (year, period), newest term first.
pub async fn find_initials(
    db: &SqlitePool,
    initials: &[String],
    term: Option<(i32, i32)>,
) -> Result<Vec<Course>, AppError> {
    if initials.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb = query::build_find_initials(initials, term);
    let rows: Vec<CourseRow> = qb.build_query_as().fetch_all(db).await?;
    let courses = rows
        .into_iter()
        .map(Course::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(unique_by_term(courses))
}

pub async fn find_course(
    db: &SqlitePool,
    initials: &str,
    year: i32,
    period: i32,
) -> Result<Option<Course>, AppError> {
    let sql = format!(
        "SELECT {} FROM sections WHERE initials = ? AND year = ? AND period = ? LIMIT 1",
        query::COURSE_COLUMNS
    );
    let row: Option<CourseRow> = sqlx::query_as(&sql)
        .bind(initials)
        .bind(year)
        .bind(period)
        .fetch_optional(db)
        .await?;
    Ok(row.map(Course::try_from).transpose()?)
}

pub async fn find_sections(
    db: &SqlitePool,
    initials: &str,
    year: i32,
    period: i32,
) -> Result<Vec<Section>, AppError> {
    let sql = format!(
        "SELECT {} FROM sections WHERE initials = ? AND year = ? AND period = ? ORDER BY section ASC",
        query::SECTION_COLUMNS
    );
    let rows: Vec<SectionRow> = sqlx::query_as(&sql)
        .bind(initials)
        .bind(year)
        .bind(period)
        .fetch_all(db)
        .await?;
    collect_sections(rows)
}

pub async fn find_section_by_id(db: &SqlitePool, id: &str) -> Result<Option<Section>, AppError> {
    let sql = format!("SELECT {} FROM sections WHERE id = ?", query::SECTION_COLUMNS);
    let row: Option<SectionRow> = sqlx::query_as(&sql).bind(id).fetch_optional(db).await?;
    Ok(row.map(Section::try_from).transpose()?)
}

pub async fn find_section_by_nrc(db: &SqlitePool, nrc: i32) -> Result<Option<Section>, AppError> {
    let sql = format!("SELECT {} FROM sections WHERE nrc = ?", query::SECTION_COLUMNS);
    let row: Option<SectionRow> = sqlx::query_as(&sql).bind(nrc).fetch_optional(db).await?;
    Ok(row.map(Section::try_from).transpose()?)
}

pub async fn find_section_by_number(
    db: &SqlitePool,
    initials: &str,
    year: i32,
    period: i32,
    section: i32,
) -> Result<Option<Section>, AppError> {
    let sql = format!(
        "SELECT {} FROM sections WHERE initials = ? AND year = ? AND period = ? AND section = ?",
        query::SECTION_COLUMNS
    );
    let row: Option<SectionRow> = sqlx::query_as(&sql)
        .bind(initials)
        .bind(year)
        .bind(period)
        .bind(section)
        .fetch_optional(db)
        .await?;
    Ok(row.map(Section::try_from).transpose()?)
}

/// Unique teachers across matching sections, first appearance wins.
pub async fn fetch_teachers(
    db: &SqlitePool,
    term: Option<(i32, i32)>,
) -> Result<Vec<Teacher>, AppError> {
    let rows: Vec<String> = match term {
        Some((year, period)) => {
            sqlx::query_scalar("SELECT teachers FROM sections WHERE year = ? AND period = ?")
                .bind(year)
                .bind(period)
                .fetch_all(db)
                .await?
        }
        None => sqlx::query_scalar("SELECT teachers FROM sections").fetch_all(db).await?,
    };

    let mut seen = HashSet::new();
    let mut teachers = Vec::new();
    for raw in rows {
        let parsed: Vec<Teacher> = serde_json::from_str(&raw)?;
        for teacher in parsed {
            if seen.insert(teacher.name.clone()) {
                teachers.push(teacher);
            }
        }
    }
    Ok(teachers)
}

/// Match the given name or its word-reversed form ("Perez Juan" for
/// "Juan Perez"; upstream data is inconsistent about ordering).
pub async fn find_teacher(db: &SqlitePool, name: &str) -> Result<Option<Teacher>, AppError> {
    let reversed = name.split_whitespace().rev().collect::<Vec<_>>().join(" ");
    let row: Option<String> = sqlx::query_scalar(
        "SELECT teachers FROM sections WHERE EXISTS (SELECT 1 FROM json_each(sections.teachers) AS t \
         WHERE json_extract(t.value, '$.name') IN (?, ?)) LIMIT 1",
    )
    .bind(name)
    .bind(&reversed)
    .fetch_optional(db)
    .await?;

    let Some(raw) = row else {
        return Ok(None);
    };
    let teachers: Vec<Teacher> = serde_json::from_str(&raw)?;
    Ok(teachers.into_iter().find(|t| t.name == name || t.name == reversed))
}

/// Replace the entire catalog in one transaction; readers never observe a
/// partially ingested state.
pub async fn replace_all(db: &SqlitePool, sections: &[Section]) -> Result<u64, AppError> {
    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM sections").execute(&mut *tx).await?;

    for section in sections {
        sqlx::query(
            "INSERT INTO sections \
             (id, nrc, initials, section, name, school, year, period, credits, information, \
              droppable, english, special_approval, vacancy_total, vacancy_available, \
              teachers, schedule, requisites, ingested_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&section.id)
        .bind(section.nrc)
        .bind(&section.initials)
        .bind(section.section)
        .bind(&section.name)
        .bind(&section.school)
        .bind(section.year)
        .bind(section.period)
        .bind(section.credits)
        .bind(&section.information)
        .bind(section.droppable)
        .bind(section.english)
        .bind(section.special_approval)
        .bind(section.vacancy.total)
        .bind(section.vacancy.available)
        .bind(serde_json::to_string(&section.teachers)?)
        .bind(serde_json::to_string(&section.schedule)?)
        .bind(serde_json::to_string(&section.requisites)?)
        .bind(&section.ingested_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(sections.len() as u64)
}

pub async fn count_sections(db: &SqlitePool) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sections")
        .fetch_one(db)
        .await?;
    Ok(count)
}

fn collect_sections(rows: Vec<SectionRow>) -> Result<Vec<Section>, AppError> {
    Ok(rows
        .into_iter()
        .map(Section::try_from)
        .collect::<Result<Vec<_>, _>>()?)
}

fn unique_by_term(courses: Vec<Course>) -> Vec<Course> {
    let mut seen = HashSet::new();
    courses
        .into_iter()
        .filter(|course| seen.insert((course.year, course.period)))
        .collect()
}
