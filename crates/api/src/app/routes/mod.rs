use axum::Router;

use crate::middleware::AuthState;

pub mod auth;
pub mod system;
pub mod users;

/// Router for everything under `/api`.
pub fn router(auth_state: AuthState) -> Router {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router(auth_state))
}
