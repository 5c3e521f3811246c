use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use gatekeeper_auth::{Authenticator, UserStore};

use crate::app::errors::ApiError;
use crate::context::CurrentUser;

pub type SharedAuthenticator = Arc<Authenticator<Arc<dyn UserStore>>>;

#[derive(Clone)]
pub struct AuthState {
    pub authenticator: SharedAuthenticator,
}

/// Resolve the bearer token into the caller and attach it as [`CurrentUser`].
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Non-UTF-8 header values are treated as absent.
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let user = state.authenticator.authenticate(header.as_deref()).await?;

    req.extensions_mut().insert(CurrentUser::new(user));

    Ok(next.run(req).await)
}
