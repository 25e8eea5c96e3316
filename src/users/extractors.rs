use std::num::IntErrorKind;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;
use validator::Validate;

use crate::users::{
    dto::{field_errors, FieldError},
    error::UserError,
};

/// JSON body that has passed [`Validate`]. Malformed bodies and rule
/// violations are both rejected with 422.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(reject_body)?;

        data.validate().map_err(|e| {
            let errors = field_errors(&e);
            warn!(fields = ?errors.iter().map(|e| &e.field).collect::<Vec<_>>(), "validation failed");
            UserError::Validation(errors).into_response()
        })?;

        Ok(ValidatedJson(data))
    }
}

fn reject_body(rejection: JsonRejection) -> Response {
    match rejection {
        JsonRejection::JsonDataError(e) => {
            UserError::Validation(vec![FieldError::new("body", "invalid_body", e.body_text())])
                .into_response()
        }
        JsonRejection::JsonSyntaxError(e) => {
            UserError::Validation(vec![FieldError::new("body", "json_invalid", e.body_text())])
                .into_response()
        }
        other => other.into_response(),
    }
}

/// `{id}` path segment. An integer too large for storage cannot name a user,
/// so it is a 404; anything that is not an integer is a 422.
pub struct UserId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        parse_user_id(&raw)
            .map(UserId)
            .map_err(IntoResponse::into_response)
    }
}

pub(crate) fn parse_user_id(raw: &str) -> Result<i64, UserError> {
    raw.parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => UserError::NotFound,
        _ => UserError::Validation(vec![FieldError::new(
            "id",
            "int_parsing",
            "id must be an integer",
        )]),
    })
}
