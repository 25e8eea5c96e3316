use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod error;
pub(crate) mod extractors;
pub mod handlers;
pub mod memory;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
