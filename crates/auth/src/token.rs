//! HS256 access tokens: issuing and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Serialize;
use thiserror::Error;

use gatekeeper_core::UserId;

use crate::{JwtClaims, TokenValidationError, User, validate_claims};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// No signing secret configured. Fatal at startup.
    #[error("JWT signing secret is not configured")]
    MissingSecret,

    /// Signature valid but past `exp`.
    #[error("token expired")]
    Expired,

    /// Bad signature, malformed token or impossible time window.
    #[error("invalid token")]
    Invalid,

    /// Lifetime is not positive or exceeds [`MAX_TOKEN_TTL_SECS`]. Fatal at startup.
    #[error("token lifetime is out of range")]
    InvalidTtl,

    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Upper bound on a token lifetime (100 years).
pub const MAX_TOKEN_TTL_SECS: i64 = 100 * 365 * 24 * 60 * 60;

/// A signed, opaque access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl core::fmt::Display for AccessToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issues and verifies HS256 JWTs with a server-held secret.
#[derive(Clone)]
pub struct JwtCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl core::fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JwtCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtCodec {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Result<Self, TokenError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        if ttl <= Duration::zero() || ttl > Duration::seconds(MAX_TOKEN_TTL_SECS) {
            return Err(TokenError::InvalidTtl);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user: &User) -> Result<AccessToken, TokenError> {
        self.issue_at(user.id, Utc::now())
    }

    pub fn issue_at(&self, subject: UserId, now: DateTime<Utc>) -> Result<AccessToken, TokenError> {
        let claims = JwtClaims {
            sub: subject,
            issued_at: now,
            expires_at: now.checked_add_signed(self.ttl).ok_or_else(|| {
                TokenError::Encoding(format!("expiry overflows for issue time {now}"))
            })?,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map(AccessToken)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify a token and return its subject.
    ///
    /// The signature is checked before the expiry, so a tampered token is
    /// always `Invalid` and never `Expired`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, TokenError> {
        // Expiry is evaluated against `now` by `validate_claims`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<JwtClaims>(token, &self.decoding, &validation).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            TokenError::Invalid
        })?;

        validate_claims(&data.claims, now).map_err(|e| match e {
            TokenValidationError::Expired => TokenError::Expired,
            TokenValidationError::NotYetValid | TokenValidationError::InvalidTimeWindow => {
                TokenError::Invalid
            }
        })?;

        Ok(data.claims.sub)
    }
}
