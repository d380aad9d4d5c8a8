pub mod albums;
pub mod health;
pub mod libraries;
pub mod photos;
pub mod tags;

use crate::api::error::AppError;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Body for mutations that return no entity. `warning` is present only when
/// the database commit succeeded but a filesystem cleanup afterwards failed.
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            warning: None,
        }
    }

    pub fn with_warning(message: &str, warning: Option<String>) -> Self {
        Self {
            message: message.to_string(),
            warning,
        }
    }
}

/// Path params arrive as raw strings; a malformed UUID is a client error,
/// never a 404.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid {} ID", what)))
}
