//! Document collection capability.
//!
//! Services talk to persistence only through [`CollectionStore`]. A store
//! holds schemaless JSON [`Document`]s keyed by the `_id` field; concrete
//! backends (in-memory, PostgreSQL JSONB) live in the API crate.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::filter::Filter;
use crate::types::id::{DocumentId, ID_FIELD};

/// A stored document: a JSON object.
pub type Document = serde_json::Map<String, Value>;

/// Errors that can occur in a collection store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique key constraint would be violated.
    #[error("duplicate value for unique key `{key}`")]
    Duplicate {
        /// Name of the violated key (a field name or a backend constraint name).
        key: String,
    },

    /// A stored document could not be converted to or from its typed form.
    #[error("document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The backend failed (connection, query, pool exhaustion).
    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wrap an arbitrary backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// A named collection of documents.
///
/// Implementations must be safe to share across request handlers.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Collection name, used for logging.
    fn name(&self) -> &str;

    /// Insert a document, assigning `_id` if the document lacks one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] when a unique key is already taken.
    async fn insert_one(&self, document: Document) -> Result<DocumentId, StoreError>;

    /// All documents matching `filter`.
    async fn find(&self, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    /// The first document matching `filter`, if any.
    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError>;

    /// Shallow-merge `set` into the first document matching `filter`.
    ///
    /// Returns the number of matched documents (0 or 1).
    async fn update_one(&self, filter: &Filter, set: Document) -> Result<u64, StoreError>;

    /// Replace the body of the first document matching `filter` with
    /// `document`. Fields absent from `document` are removed; the stored
    /// `_id` is kept.
    ///
    /// Returns the number of matched documents (0 or 1).
    async fn replace_one(&self, filter: &Filter, document: Document) -> Result<u64, StoreError>;

    /// Delete the first document matching `filter`.
    ///
    /// Returns the number of deleted documents (0 or 1).
    async fn delete_one(&self, filter: &Filter) -> Result<u64, StoreError>;
}

/// Serialize a value into a [`Document`].
///
/// # Errors
///
/// Returns [`StoreError::Encoding`] if the value does not serialize to a JSON object.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Encoding(serde::ser::Error::custom(format!(
            "expected a JSON object, got {other}"
        )))),
    }
}

/// Make sure `document` carries an `_id`, generating one if absent.
///
/// An existing `_id` is parsed and rewritten in canonical form.
///
/// # Errors
///
/// Returns [`StoreError::Encoding`] if an existing `_id` is not a valid identifier.
pub fn ensure_id(document: &mut Document) -> Result<DocumentId, StoreError> {
    let id = match document.get(ID_FIELD) {
        Some(value) => serde_json::from_value::<DocumentId>(value.clone())?,
        None => DocumentId::generate(),
    };
    document.insert(ID_FIELD.to_owned(), Value::String(id.to_string()));
    Ok(id)
}

/// Deserialize a [`Document`] into a typed value.
///
/// # Errors
///
/// Returns [`StoreError::Encoding`] if the document does not fit `T`.
pub fn from_document<T: DeserializeOwned>(document: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(document))?)
}
