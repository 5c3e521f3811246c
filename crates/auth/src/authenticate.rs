//! Bearer-token authentication.
//!
//! Resolves the raw `Authorization` header into an active [`User`], or a
//! rejection. Never mutates stored state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{JwtCodec, StoreError, TokenError, User, UserStore};

const BEARER_SCHEME: &str = "Bearer";

/// Why a request could not be authenticated.
///
/// Every variant except [`AuthError::Store`] is a client-facing rejection (401);
/// `Store` is a server fault and must never be reported as a bad token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Access token is required")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("User account is deactivated")]
    AccountDeactivated,

    #[error("user lookup failed: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    pub fn is_rejection(&self) -> bool {
        !matches!(self, AuthError::Store(_))
    }
}

/// Extract the token from `Bearer <token>`.
///
/// The scheme is case-sensitive and the token is the second whitespace
/// separated segment.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let mut segments = header.ok_or(AuthError::MissingToken)?.split_whitespace();

    match (segments.next(), segments.next()) {
        (Some(BEARER_SCHEME), Some(token)) => Ok(token),
        _ => Err(AuthError::MissingToken),
    }
}

#[derive(Debug)]
pub struct Authenticator<S> {
    tokens: Arc<JwtCodec>,
    store: S,
}

impl<S> Authenticator<S>
where
    S: UserStore,
{
    pub fn new(tokens: Arc<JwtCodec>, store: S) -> Self {
        Self { tokens, store }
    }

    pub async fn authenticate(&self, header: Option<&str>) -> Result<User, AuthError> {
        self.authenticate_at(header, Utc::now()).await
    }

    pub async fn authenticate_at(
        &self,
        header: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<User, AuthError> {
        let result = self.resolve(header, now).await;

        match &result {
            Ok(user) => tracing::debug!(user_id = %user.id, "authenticated"),
            Err(AuthError::Store(e)) => tracing::error!(error = %e, "authentication lookup failed"),
            Err(e) => tracing::debug!(reason = %e, "authentication rejected"),
        }

        result
    }

    async fn resolve(&self, header: Option<&str>, now: DateTime<Utc>) -> Result<User, AuthError> {
        let token = extract_bearer(header)?;

        let subject = self.tokens.verify(token, now).map_err(|e| match e {
            TokenError::Expired => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

        let user = self
            .store
            .find_by_id(subject)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        Ok(user)
    }
}
