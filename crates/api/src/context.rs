//! Per-request context inserted by the middleware pipeline.

use gatekeeper_auth::User;
use gatekeeper_core::UserId;

/// The authenticated caller.
///
/// Present on every request that made it through `auth_middleware`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(User);

impl CurrentUser {
    pub fn new(user: User) -> Self {
        Self(user)
    }

    pub fn user(&self) -> &User {
        &self.0
    }

    pub fn into_inner(self) -> User {
        self.0
    }
}

/// The `:id` path parameter, already validated.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TargetUserId(pub UserId);

/// The `q` query parameter of a search, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(pub String);
