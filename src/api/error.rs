use crate::utils::validation::FieldViolation;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("{0}")]
    Validation(FieldViolation),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Cross-library placement violation (photo and album in different
    /// libraries). Surfaced as 400, not 409.
    #[error("{0}")]
    CrossScope(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl From<FieldViolation> for AppError {
    fn from(violation: FieldViolation) -> Self {
        AppError::Validation(violation)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
            AppError::Validation(v) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": v.to_string(), "field": v.field }),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::CrossScope(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Io(msg) => {
                tracing::error!("I/O error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::ViolationKind;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn render(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_io_error_body_is_generic() {
        let (status, body) =
            render(AppError::Io("failed to write /srv/photos/secret.png".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        // Filesystem paths stay in the log, never in the response.
        assert_eq!(body["error"], "Internal Server Error");
    }

    #[tokio::test]
    async fn test_internal_and_database_bodies_are_generic() {
        let (status, body) = render(AppError::Internal("wiring broke".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal Server Error");

        let (status, body) =
            render(AppError::Database(sea_orm::DbErr::Custom("boom".to_string()))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal Server Error");
    }

    #[tokio::test]
    async fn test_validation_body_carries_field() {
        let (status, body) = render(AppError::Validation(FieldViolation::new(
            "rating",
            ViolationKind::OutOfRange { min: 0, max: 5 },
        )))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "rating");
        assert_eq!(body["error"], "rating must be between 0 and 5");
    }
}
