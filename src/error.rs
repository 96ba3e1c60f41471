use std::sync::OnceLock;

use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

static PRODUCTION: OnceLock<bool> = OnceLock::new();

/// Set once at startup; controls whether 5xx responses carry detail.
pub fn set_production(on: bool) {
    let _ = PRODUCTION.set(on);
}

fn production() -> bool {
    *PRODUCTION.get().unwrap_or(&false)
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error("not found")]
    NotFound,

    #[error("upstream fetch failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub name: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(rename = "errorCode", skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i32>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, name, message) = match &self {
            AppError::InvalidQuery(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalidQuery", msg.clone())
            }
            AppError::InvalidIdentifier(msg) => {
                (StatusCode::NOT_ACCEPTABLE, "invalidIdentifier", msg.clone())
            }
            AppError::InvalidParam(msg) => {
                (StatusCode::NOT_ACCEPTABLE, "invalidParam", msg.clone())
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "notFound", "Not found".to_string()),
            AppError::Upstream(e) => {
                error!("upstream error reached the response path: {}", e);
                internal(self.to_string())
            }
            AppError::Store(e) => {
                error!("store error: {}", e);
                internal(self.to_string())
            }
            AppError::Corrupt(e) => {
                error!("corrupt stored record: {}", e);
                internal(self.to_string())
            }
        };

        let body = Json(ErrorResponse {
            name: name.to_string(),
            message,
            status_code: status.as_u16(),
            error_code: None,
        });

        (status, body).into_response()
    }
}

fn internal(detail: String) -> (StatusCode, &'static str, String) {
    let message = if production() {
        "Internal server error".to_string()
    } else {
        detail
    };
    (StatusCode::INTERNAL_SERVER_ERROR, "internalServerError", message)
}
