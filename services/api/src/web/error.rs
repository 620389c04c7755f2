//! services/api/src/web/error.rs
//!
//! The error every handler returns. It renders as `{"error": "..."}` with the
//! matching status code; 500s keep their detail in the logs.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use recipe_core::{PortError, ValidationError};
use tracing::error;

use crate::web::protocol::{ErrorBody, PreviewResponse, RecipeResponse};

pub const RECIPE_NOT_FOUND: &str = "Recipe not found";
pub const DUPLICATE_TITLE: &str = "Recipe with this title already exists";

#[derive(Debug)]
pub enum HttpError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    /// A recipe with the same title already belongs to the caller.
    Conflict {
        existing: Box<RecipeResponse>,
        preview: Option<Box<PreviewResponse>>,
    },
    /// Carries the public message only.
    Internal(String),
}

impl HttpError {
    /// Logs `err` and hides it behind `message`.
    pub fn internal(message: &str, err: impl std::fmt::Display) -> Self {
        error!("{}: {}", message, err);
        HttpError::Internal(message.to_string())
    }

    pub fn recipe_not_found() -> Self {
        HttpError::NotFound(RECIPE_NOT_FOUND.to_string())
    }

    /// Maps a repository failure during a recipe operation. Missing and
    /// foreign recipes look the same to the caller.
    pub fn from_recipe_lookup(err: PortError, message: &str) -> Self {
        match err {
            PortError::NotFound(_) => Self::recipe_not_found(),
            other => Self::internal(message, other),
        }
    }
}

impl From<ValidationError> for HttpError {
    fn from(err: ValidationError) -> Self {
        HttpError::BadRequest(err.to_string())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            HttpError::BadRequest(message) => (StatusCode::BAD_REQUEST, ErrorBody::new(message)),
            HttpError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, ErrorBody::new(message)),
            HttpError::Forbidden(message) => (StatusCode::FORBIDDEN, ErrorBody::new(message)),
            HttpError::NotFound(message) => (StatusCode::NOT_FOUND, ErrorBody::new(message)),
            HttpError::Conflict { existing, preview } => (
                StatusCode::CONFLICT,
                ErrorBody {
                    error: DUPLICATE_TITLE.to_string(),
                    existing_recipe: Some(*existing),
                    preview: preview.map(|p| *p),
                },
            ),
            HttpError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new(message))
            }
        };
        (status, Json(body)).into_response()
    }
}
