pub mod courses;
pub mod links;
pub mod params;
pub mod teachers;

use std::sync::Arc;

use axum::extract::{RawQuery, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tracing::info;

use crate::api::links::RequestContext;
use crate::api::params::ScrapeQuery;
use crate::error::AppError;
use crate::services::IngestService;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(index))
        .route("/api/v1", get(api_index))
        .route("/api/v1/courses", get(courses::search))
        .route("/api/v1/courses/id/{id}", get(courses::get_section_by_id))
        .route("/api/v1/courses/NRC/{nrc}", get(courses::get_section_by_nrc))
        .route("/api/v1/courses/{initials}", get(courses::list_by_initials))
        .route("/api/v1/courses/{initials}/equivalences", get(courses::equivalences))
        .route("/api/v1/courses/{initials}/requirements", get(courses::requirements))
        .route("/api/v1/courses/{initials}/{year}/{period}", get(courses::get_course))
        .route(
            "/api/v1/courses/{initials}/{year}/{period}/sections",
            get(courses::list_sections),
        )
        .route(
            "/api/v1/courses/{initials}/{year}/{period}/sections/{section}",
            get(courses::get_section_by_number),
        )
        .route("/api/v1/teachers", get(teachers::list))
        .route("/api/v1/teachers/{name}", get(teachers::get_by_name));

    // The scrape trigger is an operator-configured path segment, not a real
    // auth scheme; it simply does not exist when no secret is set.
    if let Some(secret) = &state.config.scrape_secret {
        app = app.route(&format!("/{secret}"), get(trigger_scrape));
    }

    app.layer(middleware::from_fn(log_requests)).with_state(state)
}

async fn index(headers: HeaderMap) -> Json<Value> {
    let ctx = RequestContext::from_headers(&headers);
    Json(json!({
        "status": "on",
        "versions": {
            "v1": { "url": ctx.api_base() },
        },
    }))
}

async fn api_index(headers: HeaderMap) -> Json<Value> {
    let base = RequestContext::from_headers(&headers).api_base();
    Json(json!({
        "version": "v1",
        "routes": [
            {
                "description": "Search sections",
                "resource": "[Section]",
                "method": "GET",
                "url": format!("{base}/courses"),
                "queryParams": [
                    "name", "initials", "NRC", "school", "section", "teacher",
                    "campus", "places[]", "year", "period", "limit", "q",
                ],
                "examples": [
                    format!("{base}/courses?initials=MAT&teacher=Torres&campus=San+Joaquin&places[]=BC25"),
                    format!("{base}/courses?q=IIC2233"),
                ],
            },
            {
                "description": "Get courses by initials, one per term",
                "resource": "[Course]",
                "method": "GET",
                "url": format!("{base}/courses/:initials"),
                "examples": [format!("{base}/courses/IIC2233")],
            },
            {
                "description": "Get course at a term ('_' means current)",
                "resource": "Course",
                "method": "GET",
                "url": format!("{base}/courses/:initials/:year/:period"),
                "examples": [format!("{base}/courses/IIC2233/_/_")],
            },
            {
                "description": "Get sections of a course",
                "resource": "[Section]",
                "method": "GET",
                "url": format!("{base}/courses/:initials/:year/:period/sections"),
                "examples": [format!("{base}/courses/IIC2233/2016/1/sections")],
            },
            {
                "description": "Get course equivalences",
                "resource": "[Course]",
                "method": "GET",
                "url": format!("{base}/courses/:initials/equivalences"),
                "examples": [format!("{base}/courses/IIC2233/equivalences?year=2016&period=1")],
            },
            {
                "description": "Get course requirements (prerequisites and corequisites)",
                "resource": "Custom schema",
                "method": "GET",
                "url": format!("{base}/courses/:initials/requirements"),
                "examples": [format!("{base}/courses/IIC2233/requirements")],
            },
            {
                "description": "Get section",
                "resource": "Section",
                "method": "GET",
                "url": format!("{base}/courses/id/:id"),
            },
            {
                "description": "Get section",
                "resource": "Section",
                "method": "GET",
                "url": format!("{base}/courses/NRC/:nrc"),
                "examples": [format!("{base}/courses/NRC/10760")],
            },
            {
                "description": "Get section by number",
                "resource": "Section",
                "method": "GET",
                "url": format!("{base}/courses/:initials/:year/:period/sections/:section"),
                "examples": [format!("{base}/courses/IIC2233/2016/1/sections/1")],
            },
            {
                "description": "Teacher directory",
                "resource": "[Teacher]",
                "method": "GET",
                "url": format!("{base}/teachers"),
                "examples": [format!("{base}/teachers?year=2016&period=1")],
            },
            {
                "description": "Get teacher by name",
                "resource": "Teacher",
                "method": "GET",
                "url": format!("{base}/teachers/:name"),
            },
        ],
    }))
}

/// Kick off an ingestion run and return immediately; the job continues in a
/// background task.
async fn trigger_scrape(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let scrape = ScrapeQuery::parse(raw.as_deref())?;
    let year = scrape.year.unwrap_or(state.config.current_year);
    let period = scrape.period.unwrap_or(state.config.current_period);
    let initials = (!scrape.initials.is_empty()).then_some(scrape.initials);

    let service = IngestService::new(
        state.db.clone(),
        Arc::clone(&state.source),
        state.config.scrape_concurrency,
    );
    tokio::spawn(async move {
        match service.run(year, period, initials).await {
            Ok(stats) => info!("triggered scrape done: {} records stored", stats.inserted),
            Err(error) => tracing::error!("triggered scrape failed: {}", error),
        }
    });

    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "scraping started" }))))
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    info!("{} {} {}", method, path, response.status().as_u16());
    response
}
