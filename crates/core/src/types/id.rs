//! Document identifiers.
//!
//! Every stored document is keyed by a [`DocumentId`], a UUID v4 generated by
//! the system at insertion time. On the wire and inside documents it is the
//! canonical hyphenated string under the `_id` field.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the identifier field inside stored documents.
pub const ID_FIELD: &str = "_id";

/// Errors that can occur when parsing a [`DocumentId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input string is empty.
    #[error("identifier cannot be empty")]
    Empty,
    /// The input is not a valid identifier.
    #[error("invalid identifier: {0}")]
    Malformed(String),
}

/// Opaque unique identifier for a stored document.
///
/// # Example
///
/// ```rust
/// # use tronics_core::DocumentId;
/// let id = DocumentId::generate();
/// let parsed = DocumentId::parse(&id.to_string()).unwrap();
/// assert_eq!(id, parsed);
///
/// assert!(DocumentId::parse("not-an-id").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its string form.
    ///
    /// Accepts any textual UUID form (hyphenated, simple, braced, URN);
    /// [`Display`](fmt::Display) always renders the hyphenated form.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::Empty`] for an empty string and
    /// [`IdError::Malformed`] when the input is not a UUID.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdError::Empty);
        }

        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| IdError::Malformed(s.to_owned()))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for DocumentId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Uuid> for DocumentId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<DocumentId> for Uuid {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for DocumentId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Uuid as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Uuid as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for DocumentId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <Uuid as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(id))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for DocumentId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Uuid as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
