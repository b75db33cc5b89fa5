//! Authorization extractors.
//!
//! Privileged routes take one of these extractors as an argument; the
//! handler body only runs once the token has been verified.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn delete_product(
//!     RequireAdmin(claims): RequireAdmin,
//!     Path(id): Path<String>,
//! ) -> Result<Json<u64>> {
//!     tracing::info!(acting_user = %claims.user_id, "deleting");
//!     ...
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};

use crate::error::AppError;
use crate::services::{Claims, TokenError};
use crate::state::AppState;

/// Header carrying the access token, both on requests and responses.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Scheme prefix of the header value.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Format a token as an `x-auth-token` header value.
#[must_use]
pub fn bearer_value(token: &str) -> String {
    format!("{BEARER_PREFIX}{token}")
}

/// Extract the raw token from the `x-auth-token` header.
///
/// # Errors
///
/// Returns `TokenError::Malformed` if the header is absent, not UTF-8, lacks
/// the `Bearer ` prefix, or holds nothing after it.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, TokenError> {
    let value = headers
        .get(AUTH_TOKEN_HEADER)
        .ok_or(TokenError::Malformed)?
        .to_str()
        .map_err(|_| TokenError::Malformed)?;

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(TokenError::Malformed)?
        .trim();

    if token.is_empty() {
        return Err(TokenError::Malformed);
    }
    Ok(token)
}

/// Extractor that requires a valid token.
///
/// Rejects with 401 if the token is missing, malformed or expired.
pub struct RequireToken(pub Claims);

impl FromRequestParts<AppState> for RequireToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let claims = state.tokens().verify(token)?;

        tracing::Span::current().record("user_id", claims.user_id.as_str());
        Ok(Self(claims))
    }
}

/// Extractor that requires a valid token with the admin claim.
///
/// Rejects with 401 like [`RequireToken`], and with 403 if the token is
/// valid but not authorized.
pub struct RequireAdmin(pub Claims);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireToken(claims) = RequireToken::from_request_parts(parts, state).await?;

        if !claims.authorized {
            tracing::warn!(user_id = %claims.user_id, "admin route denied");
            return Err(AppError::Forbidden);
        }

        Ok(Self(claims))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &[u8]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTH_TOKEN_HEADER, HeaderValue::from_bytes(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers(b"Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_bearer_token_rejects() {
        assert!(bearer_token(&HeaderMap::new()).is_err());
        assert!(bearer_token(&headers(b"abc.def.ghi")).is_err());
        assert!(bearer_token(&headers(b"bearer abc")).is_err());
        assert!(bearer_token(&headers(b"Bearer ")).is_err());
        assert!(bearer_token(&headers(b"Bearer \xff")).is_err());
    }

    #[test]
    fn test_bearer_value() {
        let value = bearer_value("tok");
        assert_eq!(bearer_token(&headers(value.as_bytes())).unwrap(), "tok");
    }
}
