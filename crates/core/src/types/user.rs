//! User account types.
//!
//! Three shapes exist on purpose:
//! - [`Credentials`] is what a client sends (plaintext password, held as a secret)
//! - [`User`] is what the store holds (password hash only)
//! - [`UserResponse`] is the only thing ever serialized back to a client

use core::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::email::Email;
use crate::validation::{Validate, ValidationErrors, Validator};

/// Minimum password length, in characters.
pub const MIN_PASSWORD_CHARS: usize = 8;
/// Maximum password length, in characters.
pub const MAX_PASSWORD_CHARS: usize = 300;

/// Document field holding the account key.
pub const USERNAME_FIELD: &str = "username";
/// Document field holding the admin flag.
pub const IS_ADMIN_FIELD: &str = "isadmin";

/// A stored user account.
///
/// `Debug` is implemented by hand so the hash never reaches logs.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Email address, unique across accounts.
    #[serde(rename = "username")]
    pub email: Email,
    /// Argon2 PHC string. Never the plaintext.
    #[serde(rename = "password")]
    pub password_hash: String,
    /// Grants the `authorized` claim in issued tokens.
    #[serde(rename = "isadmin", default)]
    pub is_admin: bool,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

/// Login or registration payload: `{"username": ..., "password": ...}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawCredentials")]
pub struct Credentials {
    /// Claimed email address; validated by [`Validate`].
    pub username: String,
    /// Plaintext password.
    pub password: SecretString,
}

#[derive(Deserialize)]
struct RawCredentials {
    username: String,
    password: String,
}

impl From<RawCredentials> for Credentials {
    fn from(raw: RawCredentials) -> Self {
        Self {
            username: raw.username,
            password: SecretString::from(raw.password),
        }
    }
}

impl Credentials {
    /// Build credentials from plain strings.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl Validate for Credentials {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();

        if let Some(username) = v.required_text(USERNAME_FIELD, Some(self.username.as_str())) {
            v.email(USERNAME_FIELD, username);
        }
        v.char_len(
            "password",
            self.password.expose_secret(),
            MIN_PASSWORD_CHARS,
            MAX_PASSWORD_CHARS,
        );

        v.finish()
    }
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub username: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            username: user.email.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds: Credentials = serde_json::from_value(json!({
            "username": "buyer@tronics.io",
            "password": "hunter2hunter2"
        }))
        .unwrap();

        let debug = format!("{creds:?}");
        assert!(debug.contains("buyer@tronics.io"));
        assert!(!debug.contains("hunter2hunter2"));
    }

    #[test]
    fn test_credentials_validation() {
        assert!(Credentials::new("buyer@tronics.io", "12345678").validate().is_ok());

        let err = Credentials::new("buyer@tronics.io", "12345")
            .validate()
            .unwrap_err();
        assert!(err.has_field("password"));
        assert!(!err.has_field("username"));

        let err = Credentials::new("buyer", "a".repeat(301)).validate().unwrap_err();
        assert!(err.has_field("password"));
        assert!(err.has_field("username"));
    }

    #[test]
    fn test_user_debug_redacts_hash() {
        let user = User {
            email: Email::parse("buyer@tronics.io").unwrap(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            is_admin: false,
        };
        assert!(!format!("{user:?}").contains("argon2id"));
    }

    #[test]
    fn test_user_document_shape() {
        let user = User {
            email: Email::parse("buyer@tronics.io").unwrap(),
            password_hash: "hash".to_string(),
            is_admin: true,
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(
            value,
            json!({"username": "buyer@tronics.io", "password": "hash", "isadmin": true})
        );

        let legacy: User =
            serde_json::from_value(json!({"username": "buyer@tronics.io", "password": "hash"}))
                .unwrap();
        assert!(!legacy.is_admin);
    }

    #[test]
    fn test_response_has_only_username() {
        let user = User {
            email: Email::parse("buyer@tronics.io").unwrap(),
            password_hash: "hash".to_string(),
            is_admin: true,
        };
        let value = serde_json::to_value(UserResponse::from(&user)).unwrap();
        assert_eq!(value, json!({"username": "buyer@tronics.io"}));
    }
}
