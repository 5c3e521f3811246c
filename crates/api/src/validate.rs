//! Input validation middleware for path and query parameters.
//!
//! Runs before authentication, so malformed input is rejected with 400 even
//! for anonymous callers.

use axum::{
    extract::{Path, Query, Request},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

use gatekeeper_core::{RawUserId, validation};

use crate::app::errors::ApiError;
use crate::context::{SearchQuery, TargetUserId};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// Validate `:id` and attach it as [`TargetUserId`].
pub async fn user_id_param(
    path: Option<Path<String>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let raw = path.map(|Path(id)| RawUserId::Text(id));
    let id = validation::parse_user_id(raw.as_ref()).map_err(|e| ApiError::Validation(vec![e]))?;

    req.extensions_mut().insert(TargetUserId(id));
    Ok(next.run(req).await)
}

/// Validate `?q=` and attach it as [`SearchQuery`].
pub async fn search_query(
    params: Option<Query<SearchParams>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let q = params.and_then(|Query(p)| p.q);
    let errors = validation::validate_search_query(q.as_deref());

    match q {
        Some(q) if errors.is_empty() => {
            req.extensions_mut().insert(SearchQuery(q));
            Ok(next.run(req).await)
        }
        _ => Err(ApiError::Validation(errors)),
    }
}
