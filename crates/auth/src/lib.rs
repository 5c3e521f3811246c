//! `gatekeeper-auth`: authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP: the authenticator takes the
//! raw `Authorization` header value and the user store is reached through the
//! [`UserStore`] trait.

pub mod authenticate;
pub mod authorize;
pub mod claims;
pub mod password;
pub mod roles;
pub mod store;
pub mod token;
pub mod user;

pub use authenticate::{AuthError, Authenticator, extract_bearer};
pub use authorize::{AuthzError, Policy, authorize, require_admin, require_admin_or_self};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use password::{PasswordError, hash_password, verify_password};
pub use roles::{Role, UnknownRole};
pub use store::{StoreError, UserStore};
pub use token::{AccessToken, JwtCodec, MAX_TOKEN_TTL_SECS, TokenError};
pub use user::{NewUser, User, UserView};
