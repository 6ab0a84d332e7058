use crate::state::AppState;
use axum::Router;

mod dto;
mod error;
pub mod handlers;
pub(crate) mod jwt;
mod password;
pub mod repo;
mod repo_types;
mod reset;
mod validation;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
