//! Bearer-token authentication against the external identity provider.
//!
//! Handlers that need a caller take an [`AuthUser`] argument; the extractor
//! rejects the request with 401 before the handler runs when the token is
//! missing, malformed, or fails verification.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::state::AppState;
use crate::utils::error::AppError;

pub mod jwt;

pub use jwt::{Claims, JwtVerifier};

const BEARER_PREFIX: &str = "Bearer ";

/// Caller identity as asserted by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub email: Option<String>,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, AppError>;
}

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::AuthError("Missing authorization header".to_string()))?;

    let value = header
        .to_str()
        .map_err(|_| AppError::AuthError("Malformed authorization header".to_string()))?;

    match value.strip_prefix(BEARER_PREFIX).map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AppError::AuthError(
            "Authorization scheme not supported".to_string(),
        )),
    }
}

/// A request whose bearer token has been verified.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl AuthUser {
    /// Email of the caller; ownership decisions are made on it.
    pub fn email(&self) -> Result<&str, AppError> {
        self.0
            .email
            .as_deref()
            .filter(|email| !email.is_empty())
            .ok_or_else(|| AppError::Forbidden("Token carries no email address".to_string()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let identity = state.verifier.verify(token).await?;
        tracing::debug!(subject = %identity.subject, "Verified caller");
        Ok(AuthUser(identity))
    }
}
