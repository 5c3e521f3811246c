//! Route-level authorization guards.
//!
//! These run after `auth_middleware`; a missing [`CurrentUser`] means the
//! router was wired wrong and is reported as a server fault.

use axum::{extract::Request, middleware::Next, response::Response};

use gatekeeper_auth::{require_admin, require_admin_or_self};

use crate::app::errors::ApiError;
use crate::context::{CurrentUser, TargetUserId};

fn current_user(req: &Request) -> Result<&CurrentUser, ApiError> {
    req.extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| ApiError::internal("authorization guard ran before authentication"))
}

/// Only admins may proceed.
pub async fn admin_only(req: Request, next: Next) -> Result<Response, ApiError> {
    require_admin(current_user(&req)?.user())?;
    Ok(next.run(req).await)
}

/// Admins, or the user named by the `:id` path parameter.
pub async fn admin_or_self(req: Request, next: Next) -> Result<Response, ApiError> {
    let TargetUserId(target) = req
        .extensions()
        .get::<TargetUserId>()
        .copied()
        .ok_or_else(|| ApiError::internal("authorization guard ran before id validation"))?;

    require_admin_or_self(current_user(&req)?.user(), target)?;
    Ok(next.run(req).await)
}
