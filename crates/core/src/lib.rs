//! `gatekeeper-core`: pure building blocks shared by every other crate.
//!
//! Nothing in here performs IO: identifiers, the validation error model and the
//! field-level input validators.

pub mod error;
pub mod id;
pub mod validation;

pub use error::ValidationError;
pub use id::UserId;
pub use validation::{LoginInput, RawUserId, RegistrationInput};
