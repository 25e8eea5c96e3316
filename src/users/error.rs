use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::users::dto::FieldError;

/// Which unique column a write collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Request validation failed")]
    Validation(Vec<FieldError>),

    #[error("{}", conflict_message(.0))]
    Conflict(UniqueField),

    #[error("User not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type UserResult<T> = Result<T, UserError>;

fn conflict_message(field: &UniqueField) -> &'static str {
    match field {
        UniqueField::Username => "Username already registered",
        UniqueField::Email => "Email already registered",
    }
}

impl From<sqlx::Error> for UserError {
    fn from(e: sqlx::Error) -> Self {
        UserError::Internal(e.into())
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            UserError::Validation(errors) => (StatusCode::UNPROCESSABLE_ENTITY, json!(errors)),
            UserError::Conflict(field) => (StatusCode::BAD_REQUEST, json!(conflict_message(field))),
            UserError::NotFound => (StatusCode::NOT_FOUND, json!("User not found")),
            UserError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!("Internal server error"),
                )
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
