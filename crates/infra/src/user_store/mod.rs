//! [`gatekeeper_auth::UserStore`] implementations.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryUserStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresUserStore;
