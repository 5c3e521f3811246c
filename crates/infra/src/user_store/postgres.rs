//! Postgres-backed user store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `DuplicateEmail` |
//! | Database (other) | Any other | `Unavailable` |
//! | PoolClosed / IO / other | N/A | `Unavailable` |
//!
//! Rows that cannot be mapped back into a [`User`] surface as `Corrupt`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::instrument;

use gatekeeper_auth::{NewUser, StoreError, User, UserStore};
use gatekeeper_core::UserId;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    full_name TEXT NOT NULL,
    date_of_birth DATE NOT NULL,
    email TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('admin', 'user')),
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE UNIQUE INDEX IF NOT EXISTS users_email_lower_idx ON users (LOWER(email));
"#;

const COLUMNS: &str =
    "id, full_name, date_of_birth, email, password_hash, role, is_active, created_at, updated_at";

/// Postgres-backed user store.
///
/// `Send + Sync`; all operations go through the SQLx pool. Email uniqueness is
/// enforced by a unique index on `LOWER(email)`.
#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: Arc<PgPool>,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the `users` table and its indexes if missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    #[instrument(skip(self, user), fields(email = %user.email), err)]
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (full_name, date_of_birth, email, password_hash, role)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(&user.full_name)
            .bind(user.date_of_birth)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    StoreError::DuplicateEmail(user.email.clone())
                }
                other => map_sqlx_error("create", other),
            })?;

        user_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let Ok(id) = i64::try_from(id.get()) else {
            return Ok(None);
        };

        let sql = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_id", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_email", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM users ORDER BY id ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;

        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn search(&self, query: &str) -> Result<Vec<User>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM users
             WHERE full_name ILIKE $1 ESCAPE '\\' OR email ILIKE $1 ESCAPE '\\'
             ORDER BY id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(like_pattern(query))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("search", e))?;

        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn set_active(&self, id: UserId, active: bool) -> Result<Option<User>, StoreError> {
        let Ok(id) = i64::try_from(id.get()) else {
            return Ok(None);
        };

        let sql = format!(
            "UPDATE users SET is_active = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(active)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_active", e))?;

        row.as_ref().map(user_from_row).transpose()
    }
}

/// `%query%` with LIKE metacharacters escaped.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let corrupt = |e: sqlx::Error| StoreError::Corrupt(e.to_string());

    let id: i64 = row.try_get("id").map_err(corrupt)?;
    let role: String = row.try_get("role").map_err(corrupt)?;
    let date_of_birth: NaiveDate = row.try_get("date_of_birth").map_err(corrupt)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(corrupt)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(corrupt)?;

    Ok(User {
        id: u64::try_from(id)
            .map(UserId::new)
            .map_err(|_| StoreError::Corrupt(format!("negative user id {id}")))?,
        full_name: row.try_get("full_name").map_err(corrupt)?,
        date_of_birth,
        email: row.try_get("email").map_err(corrupt)?,
        role: role
            .parse()
            .map_err(|e: gatekeeper_auth::UnknownRole| StoreError::Corrupt(e.to_string()))?,
        is_active: row.try_get("is_active").map_err(corrupt)?,
        password_hash: row.try_get("password_hash").map_err(corrupt)?,
        created_at,
        updated_at,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Unavailable(format!(
                "database error in {}: {}",
                operation,
                db_err.message()
            ))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        other => StoreError::Unavailable(format!("sqlx error in {}: {}", operation, other)),
    }
}
