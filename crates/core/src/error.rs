//! Validation error model.

use serde::Serialize;
use thiserror::Error;

/// A single field-level validation failure.
///
/// Serialized as `{ "field": ..., "message": ... }` in 400 responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: &'static str,
}

impl ValidationError {
    pub const fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}
