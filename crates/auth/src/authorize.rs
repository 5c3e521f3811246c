//! Role-based access control.
//!
//! Two policies exist and they are pure predicates over the authenticated user
//! and the id of the resource being acted on. An authenticated [`User`] is a
//! precondition: calling these without one is a wiring bug, not a runtime case.
//!
//! - No IO
//! - No panics

use thiserror::Error;

use gatekeeper_core::UserId;

use crate::User;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("Insufficient permissions")]
    InsufficientPermissions,
}

/// Access policy attached to a route.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Policy {
    /// Caller must be an admin.
    Admin,
    /// Caller must be an admin or the user identified by the target id.
    AdminOrSelf(UserId),
}

impl Policy {
    pub fn permits(&self, user: &User) -> bool {
        match self {
            Policy::Admin => user.is_admin(),
            Policy::AdminOrSelf(target) => user.is_admin() || user.id == *target,
        }
    }
}

pub fn authorize(user: &User, policy: &Policy) -> Result<(), AuthzError> {
    if policy.permits(user) {
        return Ok(());
    }

    tracing::debug!(user_id = %user.id, role = %user.role, ?policy, "authorization denied");
    Err(AuthzError::InsufficientPermissions)
}

pub fn require_admin(user: &User) -> Result<(), AuthzError> {
    authorize(user, &Policy::Admin)
}

pub fn require_admin_or_self(user: &User, target: UserId) -> Result<(), AuthzError> {
    authorize(user, &Policy::AdminOrSelf(target))
}
