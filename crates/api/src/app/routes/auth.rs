use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use gatekeeper_core::{LoginInput, RegistrationInput};

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::routes::system;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register).fallback(system::not_found))
        .route("/login", post(login).fallback(system::not_found))
}

fn body_rejection(rejection: JsonRejection) -> ApiError {
    tracing::debug!(error = %rejection, "rejected request body");
    ApiError::bad_request(rejection.body_text())
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<RegistrationInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = body.map_err(body_rejection)?;
    let user = services.register(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(dto::RegisterResponse {
            message: "User registered successfully",
            user: user.into(),
        }),
    ))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<dto::LoginResponse>, ApiError> {
    let Json(input) = body.map_err(body_rejection)?;
    let (token, user) = services.login(input).await?;

    Ok(Json(dto::LoginResponse {
        token,
        user: user.into(),
    }))
}
