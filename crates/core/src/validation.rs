//! Field-level validation of inbound request data.
//!
//! Every validator builds its result from scratch and returns it; there is no
//! accumulator shared between calls, so validators can run concurrently.
//!
//! Rules per field short-circuit at the first failure, but every field is
//! checked, and errors come back in field-declaration order.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::Deserialize;

use crate::{UserId, ValidationError};

/// `local@domain.tld` with no whitespace and a single `@`.
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

pub const MIN_PASSWORD_LEN: usize = 6;

/// Offset-less date-times, as sent by `datetime-local` inputs.
const NAIVE_DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

pub const ROLES: [&str; 2] = ["admin", "user"];

// ─────────────────────────────────────────────────────────────────────────────
// Inputs
// ─────────────────────────────────────────────────────────────────────────────

/// Registration body as received on the wire; every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationInput {
    pub full_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Login body as received on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A user id before validation: path parameters arrive as text, JSON callers
/// may send a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawUserId {
    Number(f64),
    Text(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Predicates
// ─────────────────────────────────────────────────────────────────────────────

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

pub fn starts_with_whitespace(value: &str) -> bool {
    value.chars().next().is_some_and(char::is_whitespace)
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

fn is_empty(value: Option<&str>) -> bool {
    value.is_none_or(str::is_empty)
}

/// Parse a date of birth.
///
/// Accepts a bare calendar date (`YYYY-MM-DD`, taken as UTC midnight), an
/// RFC 3339 timestamp, or a date-time without offset (taken as UTC).
pub fn parse_date_of_birth(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|dt| dt.and_utc())
}

// ─────────────────────────────────────────────────────────────────────────────
// Field checks
// ─────────────────────────────────────────────────────────────────────────────

fn check_full_name(full_name: Option<&str>) -> Result<(), ValidationError> {
    match full_name {
        v if is_blank(v) => Err(ValidationError::new("fullName", "Full name is required")),
        Some(v) if starts_with_whitespace(v) => Err(ValidationError::new(
            "fullName",
            "Full name cannot start with spaces",
        )),
        _ => Ok(()),
    }
}

fn check_date_of_birth(
    date_of_birth: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), ValidationError> {
    let Some(raw) = date_of_birth.filter(|v| !v.is_empty()) else {
        return Err(ValidationError::new("dateOfBirth", "Date of birth is required"));
    };

    match parse_date_of_birth(raw) {
        None => Err(ValidationError::new("dateOfBirth", "Invalid date format")),
        Some(date) if date > now => Err(ValidationError::new(
            "dateOfBirth",
            "Date of birth cannot be in the future",
        )),
        Some(_) => Ok(()),
    }
}

fn check_email_format(email: Option<&str>) -> Result<&str, ValidationError> {
    match email {
        Some(v) if !is_blank(Some(v)) => {
            if is_valid_email(v) {
                Ok(v)
            } else {
                Err(ValidationError::new("email", "Invalid email format"))
            }
        }
        _ => Err(ValidationError::new("email", "Email is required")),
    }
}

fn check_registration_email(email: Option<&str>) -> Result<(), ValidationError> {
    let email = check_email_format(email)?;
    if starts_with_whitespace(email) {
        return Err(ValidationError::new("email", "Email cannot start with spaces"));
    }
    Ok(())
}

fn check_registration_password(password: Option<&str>) -> Result<(), ValidationError> {
    match password {
        v if is_empty(v) => Err(ValidationError::new("password", "Password is required")),
        Some(v) if !is_valid_password(v) => Err(ValidationError::new(
            "password",
            "Password must be at least 6 characters long",
        )),
        Some(v) if starts_with_whitespace(v) => Err(ValidationError::new(
            "password",
            "Password cannot start with spaces",
        )),
        _ => Ok(()),
    }
}

fn check_role(role: Option<&str>) -> Result<(), ValidationError> {
    match role {
        Some(v) if !v.is_empty() && !ROLES.contains(&v) => Err(ValidationError::new(
            "role",
            r#"Role must be either "admin" or "user""#,
        )),
        _ => Ok(()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Validators
// ─────────────────────────────────────────────────────────────────────────────

/// Validate a registration body against the current instant.
pub fn validate_registration(input: &RegistrationInput) -> Vec<ValidationError> {
    validate_registration_at(input, Utc::now())
}

/// Validate a registration body; `now` bounds the date of birth.
pub fn validate_registration_at(
    input: &RegistrationInput,
    now: DateTime<Utc>,
) -> Vec<ValidationError> {
    let checks = [
        check_full_name(input.full_name.as_deref()),
        check_date_of_birth(input.date_of_birth.as_deref(), now),
        check_registration_email(input.email.as_deref()),
        check_registration_password(input.password.as_deref()),
        check_role(input.role.as_deref()),
    ];

    checks.into_iter().filter_map(Result::err).collect()
}

/// Validate a login body.
///
/// Weaker than registration on purpose: no leading-space rule for the email and
/// no length rule for the password.
pub fn validate_login(input: &LoginInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Err(e) = check_email_format(input.email.as_deref()) {
        errors.push(e);
    }
    if is_empty(input.password.as_deref()) {
        errors.push(ValidationError::new("password", "Password is required"));
    }

    errors
}

/// Parse and validate a user id.
pub fn parse_user_id(raw: Option<&RawUserId>) -> Result<UserId, ValidationError> {
    let value = match raw {
        None => return Err(ValidationError::new("id", "User ID is required")),
        Some(RawUserId::Text(s)) if s.is_empty() => {
            return Err(ValidationError::new("id", "User ID is required"));
        }
        Some(RawUserId::Text(s)) => match s.parse::<u64>() {
            Ok(id) => return Ok(UserId::new(id)),
            // Only used to tell "3.5" and "-1" apart from garbage.
            Err(_) => s.parse::<f64>().ok(),
        },
        Some(RawUserId::Number(n)) => Some(*n),
    };

    let Some(value) = value.filter(|v| !v.is_nan()) else {
        return Err(ValidationError::new("id", "User ID must be a number"));
    };
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::new("id", "User ID must be a non-negative number"));
    }
    if value.fract() != 0.0 {
        return Err(ValidationError::new("id", "User ID must be an integer"));
    }

    // Saturates above u64::MAX, which no store will ever have assigned.
    Ok(UserId::new(value as u64))
}

/// Validate a user id (path parameter or JSON value).
pub fn validate_user_id(raw: Option<&RawUserId>) -> Vec<ValidationError> {
    parse_user_id(raw).err().into_iter().collect()
}

/// Validate the `q` parameter of a user search.
pub fn validate_search_query(query: Option<&str>) -> Vec<ValidationError> {
    match query {
        q if is_blank(q) => vec![ValidationError::new("query", "Search query is required")],
        Some(q) if starts_with_whitespace(q) => vec![ValidationError::new(
            "query",
            "Search query cannot start with spaces",
        )],
        _ => Vec::new(),
    }
}
