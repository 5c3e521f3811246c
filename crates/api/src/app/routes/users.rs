//! `/api/users` routes.
//!
//! Layers added with `route_layer` run last-added first, so each route reads
//! validate, then authenticate, then authorize, then the handler.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    middleware::{from_fn, from_fn_with_state},
    routing::{MethodRouter, get, patch},
};

use gatekeeper_auth::UserView;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::routes::system;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::{SearchQuery, TargetUserId};
use crate::middleware::{AuthState, auth_middleware};
use crate::validate;

pub fn router(auth_state: AuthState) -> Router {
    let admin = |route: MethodRouter| {
        route
            .route_layer(from_fn(authz::admin_only))
            .route_layer(from_fn_with_state(auth_state.clone(), auth_middleware))
    };
    let admin_or_self = |route: MethodRouter| {
        route
            .route_layer(from_fn(authz::admin_or_self))
            .route_layer(from_fn_with_state(auth_state.clone(), auth_middleware))
            .route_layer(from_fn(validate::user_id_param))
    };

    // Guards are attached per method so an unsupported method on a known path
    // falls through to the plain 404 without being authenticated first.
    Router::new()
        .route("/", admin(get(list_users)).fallback(system::not_found))
        .route(
            "/search",
            admin(get(search_users))
                .route_layer(from_fn(validate::search_query))
                .fallback(system::not_found),
        )
        .route("/:id", admin_or_self(get(get_user)).fallback(system::not_found))
        .route(
            "/:id/block",
            admin_or_self(patch(block_user)).fallback(system::not_found),
        )
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<UserView>>, ApiError> {
    let users = services.list_users().await?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

pub async fn search_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(SearchQuery(q)): Extension<SearchQuery>,
) -> Result<Json<Vec<UserView>>, ApiError> {
    let users = services.search_users(&q).await?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(TargetUserId(id)): Extension<TargetUserId>,
) -> Result<Json<UserView>, ApiError> {
    Ok(Json(services.get_user(id).await?.into()))
}

pub async fn block_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(TargetUserId(id)): Extension<TargetUserId>,
) -> Result<Json<dto::BlockUserResponse>, ApiError> {
    let user = services.block_user(id).await?;
    Ok(Json(dto::BlockUserResponse {
        message: "User blocked successfully",
        user: user.into(),
    }))
}
