//! Signed access tokens.
//!
//! HS256 JWTs carrying `{authorized, user_id, exp}`. Verification is
//! stateless: a token is valid until it expires.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifetime of an issued token.
pub const TOKEN_TTL_MINUTES: i64 = 15;

/// Claim set carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Admin flag of the subject at issuance.
    pub authorized: bool,
    /// Subject: the user's email address.
    pub user_id: String,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// Errors that can occur when issuing or verifying tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token cannot be parsed or its signature does not match.
    #[error("token is malformed")]
    Malformed,

    /// The token is past its expiry.
    #[error("token has expired")]
    Expired,

    /// The signer is misconfigured.
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Issues and verifies tokens with a single process-wide secret.
#[derive(Clone)]
pub struct TokenManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Create a token manager signing with `secret`.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
            ttl: Duration::minutes(TOKEN_TTL_MINUTES),
        }
    }

    /// Issue a token for `user_id`, valid from now for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if the token cannot be encoded.
    pub fn issue(&self, authorized: bool, user_id: &str) -> Result<String, TokenError> {
        let claims = Claims {
            authorized,
            user_id: user_id.to_owned(),
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        self.sign(&claims)
    }

    /// Sign an explicit claim set.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if the token cannot be encoded.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(TokenError::Signing)
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` past expiry, `TokenError::Malformed` otherwise.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn manager() -> TokenManager {
        TokenManager::new(&SecretString::from("k7Qp2Vx9Lm4Rt8Ws1Yz6Bn3Hd5Jf0Gc"))
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = manager();
        let token = tokens.issue(true, "admin@tronics.io").unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert!(claims.authorized);
        assert_eq!(claims.user_id, "admin@tronics.io");
    }

    #[test]
    fn test_expiry_is_fifteen_minutes() {
        let before = Utc::now().timestamp();
        let token = manager().issue(false, "buyer@tronics.io").unwrap();
        let after = Utc::now().timestamp();

        let exp = manager().verify(&token).unwrap().exp;
        assert!(exp >= before + 900);
        assert!(exp <= after + 900);
    }

    #[test]
    fn test_expired_token() {
        let tokens = manager();
        let token = tokens
            .sign(&Claims {
                authorized: true,
                user_id: "admin@tronics.io".into(),
                exp: Utc::now().timestamp() - 3600,
            })
            .unwrap();
        assert!(matches!(tokens.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_wrong_secret() {
        let token = manager().issue(true, "admin@tronics.io").unwrap();
        let other = TokenManager::new(&SecretString::from("Zx8Cv7Bn6Mq5We4Rt3Yu2Io1Pa0Sd9Fg"));
        assert!(matches!(other.verify(&token), Err(TokenError::Malformed)));
    }

    #[test]
    fn test_garbage_token() {
        assert!(matches!(manager().verify("abc.def"), Err(TokenError::Malformed)));
        assert!(matches!(manager().verify(""), Err(TokenError::Malformed)));
    }

    #[test]
    fn test_spliced_payload_is_rejected() {
        let tokens = manager();
        let buyer = tokens.issue(false, "buyer@tronics.io").unwrap();
        let admin = tokens.issue(true, "buyer@tronics.io").unwrap();

        let buyer_parts: Vec<&str> = buyer.split('.').collect();
        let admin_payload = admin.split('.').nth(1).unwrap();
        let spliced = format!("{}.{}.{}", buyer_parts[0], admin_payload, buyer_parts[2]);

        assert!(matches!(tokens.verify(&spliced), Err(TokenError::Malformed)));
    }
}
