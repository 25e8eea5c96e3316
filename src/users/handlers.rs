use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    state::AppState,
    users::{
        dto::{UserCreate, UserRead, UserUpdate},
        error::UserResult,
        extractors::{UserId, ValidatedJson},
        services::UserService,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/users/username/:username", get(get_user_by_username))
}

#[instrument(skip(users, payload))]
pub async fn create_user(
    State(users): State<UserService>,
    ValidatedJson(payload): ValidatedJson<UserCreate>,
) -> UserResult<(StatusCode, Json<UserRead>)> {
    let user = users.create_user(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(users))]
pub async fn list_users(State(users): State<UserService>) -> UserResult<Json<Vec<UserRead>>> {
    Ok(Json(users.list_users().await?))
}

#[instrument(skip(users))]
pub async fn get_user(
    State(users): State<UserService>,
    UserId(id): UserId,
) -> UserResult<Json<UserRead>> {
    Ok(Json(users.get_user_by_id(id).await?))
}

#[instrument(skip(users))]
pub async fn get_user_by_username(
    State(users): State<UserService>,
    Path(username): Path<String>,
) -> UserResult<Json<UserRead>> {
    Ok(Json(users.get_user_by_username(&username).await?))
}

#[instrument(skip(users, payload))]
pub async fn update_user(
    State(users): State<UserService>,
    UserId(id): UserId,
    ValidatedJson(payload): ValidatedJson<UserUpdate>,
) -> UserResult<Json<UserRead>> {
    Ok(Json(users.update_user(id, payload).await?))
}

#[instrument(skip(users))]
pub async fn delete_user(
    State(users): State<UserService>,
    UserId(id): UserId,
) -> UserResult<StatusCode> {
    users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
