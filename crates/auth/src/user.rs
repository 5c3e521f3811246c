//! User records as seen by the authentication boundary.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use gatekeeper_core::UserId;

use crate::Role;

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// A registered user (the authenticated identity).
///
/// # Invariants
/// - `id` is unique and never changes once the store has assigned it.
/// - `password_hash` never leaves the process; use [`UserView`] for responses.
/// - A user with `is_active == false` cannot authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn view(&self) -> UserView {
        UserView::from(self)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// NewUser
// ─────────────────────────────────────────────────────────────────────────────

/// Data needed to create a user; the store assigns the id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// UserView
// ─────────────────────────────────────────────────────────────────────────────

/// Public projection of a [`User`] with the password material removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            date_of_birth: user.date_of_birth,
            email: user.email.clone(),
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}
