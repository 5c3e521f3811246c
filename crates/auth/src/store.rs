use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use gatekeeper_core::UserId;

use crate::{NewUser, User};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("a user with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("user store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt user record: {0}")]
    Corrupt(String),
}

/// Persistent user storage.
///
/// The store is the single source of truth and serializes conflicting writes
/// itself; callers never lock around it.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user, assigning its id. Emails are unique (case-insensitive).
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// All users ordered by id.
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    /// Users whose full name or email contains `query`, case-insensitively.
    async fn search(&self, query: &str) -> Result<Vec<User>, StoreError>;

    /// Flip the active flag; `None` when the user does not exist.
    async fn set_active(&self, id: UserId, active: bool) -> Result<Option<User>, StoreError>;
}

#[async_trait]
impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        (**self).create(user).await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        (**self).find_by_email(email).await
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        (**self).list().await
    }

    async fn search(&self, query: &str) -> Result<Vec<User>, StoreError> {
        (**self).search(query).await
    }

    async fn set_active(&self, id: UserId, active: bool) -> Result<Option<User>, StoreError> {
        (**self).set_active(id, active).await
    }
}
