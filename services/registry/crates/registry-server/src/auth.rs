//! Caller identity extraction.
//!
//! The shipped verifier checks token *shape* only and accepts the token as
//! the caller's identity. Real authentication (signed sessions, a token
//! introspection endpoint) plugs in as another [`IdentityVerifier`].

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use charm_common::{AuthError, CallerIdentity, TokenPolicy, check_token_shape, parse_bearer};

use crate::error::ApiError;
use crate::server::AppState;

/// Turns a bearer token into a caller identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<CallerIdentity, AuthError>;
}

/// Accepts any token that matches the configured [`TokenPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct TokenShapeVerifier {
    policy: TokenPolicy,
}

impl TokenShapeVerifier {
    pub fn new(policy: TokenPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl IdentityVerifier for TokenShapeVerifier {
    async fn verify(&self, token: &str) -> Result<CallerIdentity, AuthError> {
        check_token_shape(token, self.policy)
    }
}

/// Extractor for the publishing caller. Rejects with 401 before the body
/// is read.
#[derive(Debug, Clone)]
pub struct Caller(pub CallerIdentity);

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(AUTHORIZATION) {
            None => None,
            Some(value) => Some(value.to_str().map_err(|_| AuthError::NotBearer)?),
        };
        let token = parse_bearer(header)?;
        let identity = state.verifier.verify(token).await.inspect_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
        })?;
        Ok(Caller(identity))
    }
}
