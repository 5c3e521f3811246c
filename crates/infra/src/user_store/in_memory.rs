use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use gatekeeper_auth::{NewUser, StoreError, User, UserStore};
use gatekeeper_core::UserId;

#[derive(Debug)]
struct Inner {
    next_id: u64,
    users: BTreeMap<UserId, User>,
}

/// In-memory user store for tests/dev.
///
/// Ids are assigned sequentially starting at 1. Writes are serialized by the
/// lock; no lock is held across an `.await`.
#[derive(Debug)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_id: 1,
                users: BTreeMap::new(),
            }),
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("in-memory user store lock poisoned".to_string())
}

fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;

        if inner
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::DuplicateEmail(user.email));
        }

        let id = UserId::new(inner.next_id);
        inner.next_id += 1;

        let now = Utc::now();
        let created = User {
            id,
            full_name: user.full_name,
            date_of_birth: user.date_of_birth,
            email: user.email,
            role: user.role,
            is_active: true,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(id, created.clone());

        Ok(created)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.users.values().cloned().collect())
    }

    async fn search(&self, query: &str) -> Result<Vec<User>, StoreError> {
        let needle = query.to_lowercase();
        let inner = self.inner.read().map_err(|_| poisoned())?;

        Ok(inner
            .users
            .values()
            .filter(|u| {
                contains_ignore_case(&u.full_name, &needle)
                    || contains_ignore_case(&u.email, &needle)
            })
            .cloned()
            .collect())
    }

    async fn set_active(&self, id: UserId, active: bool) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;

        Ok(inner.users.get_mut(&id).map(|user| {
            user.is_active = active;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}
