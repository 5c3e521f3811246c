//! Infrastructure layer: user store implementations.

pub mod user_store;

pub use user_store::InMemoryUserStore;
#[cfg(feature = "postgres")]
pub use user_store::PostgresUserStore;
