//! Bearer-token shape checks.
//!
//! These functions only look at the *form* of a presented token. They never
//! consult a credential store or verify a signature: a token that passes is
//! an asserted caller identity, not an authenticated one.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scheme prefix expected in the `Authorization` header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// How strictly a presented token is checked.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenPolicy {
    /// Token must parse as a UUID.
    #[default]
    Uuid,
    /// Any non-empty token is accepted.
    Opaque,
}

impl std::fmt::Display for TokenPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenPolicy::Uuid => f.write_str("uuid"),
            TokenPolicy::Opaque => f.write_str("opaque"),
        }
    }
}

/// Rejections produced by the token shape check.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Invalid Auth Header")]
    NotBearer,

    #[error("Bearer token is empty")]
    EmptyToken,

    #[error("Token must be a valid UUID")]
    NotUuid,
}

/// Caller identity asserted by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerIdentity(String);

impl CallerIdentity {
    /// Wrap an identity that some verifier has already accepted.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Split `Bearer <token>` and return the token part.
///
/// The scheme match is case-sensitive, as the original clients send it.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingHeader)?;
    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::NotBearer)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::EmptyToken);
    }
    Ok(token)
}

/// Check a bearer token against `policy` and turn it into an identity.
///
/// Under [`TokenPolicy::Uuid`] the identity is the canonical lower-case
/// hyphenated form, so `urn:uuid:`, braced, simple and upper-case spellings
/// of one UUID are the same caller.
pub fn check_token_shape(token: &str, policy: TokenPolicy) -> Result<CallerIdentity, AuthError> {
    if token.is_empty() {
        return Err(AuthError::EmptyToken);
    }
    match policy {
        TokenPolicy::Uuid => {
            let id = uuid::Uuid::parse_str(token).map_err(|_| AuthError::NotUuid)?;
            Ok(CallerIdentity(id.hyphenated().to_string()))
        }
        TokenPolicy::Opaque => Ok(CallerIdentity(token.to_string())),
    }
}
