//! In-memory collection store.
//!
//! Used by tests and by local runs without a database. Documents are kept in
//! insertion order behind a single lock, so every operation is atomic.

use async_trait::async_trait;
use tokio::sync::RwLock;

use tronics_core::store::ensure_id;
use tronics_core::{CollectionStore, Document, DocumentId, Filter, ID_FIELD, StoreError};

/// A collection held in process memory.
#[derive(Debug)]
pub struct MemoryCollection {
    name: String,
    unique_keys: Vec<String>,
    documents: RwLock<Vec<Document>>,
}

impl MemoryCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unique_keys: Vec::new(),
            documents: RwLock::new(Vec::new()),
        }
    }

    /// Reject inserts and updates that would duplicate a value of `field`.
    #[must_use]
    pub fn with_unique_key(mut self, field: impl Into<String>) -> Self {
        self.unique_keys.push(field.into());
        self
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Returns `true` if the collection holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// First key of `candidate` whose value is already used by a document
    /// other than the one at `skip`.
    fn conflicting_key(
        &self,
        documents: &[Document],
        candidate: &Document,
        skip: Option<usize>,
    ) -> Option<String> {
        std::iter::once(ID_FIELD)
            .chain(self.unique_keys.iter().map(String::as_str))
            .find(|key| {
                candidate.get(*key).is_some_and(|value| {
                    documents
                        .iter()
                        .enumerate()
                        .any(|(i, doc)| Some(i) != skip && doc.get(*key) == Some(value))
                })
            })
            .map(str::to_owned)
    }
}

#[async_trait]
impl CollectionStore for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert_one(&self, mut document: Document) -> Result<DocumentId, StoreError> {
        let id = ensure_id(&mut document)?;

        let mut documents = self.documents.write().await;
        if let Some(key) = self.conflicting_key(&documents, &document, None) {
            return Err(StoreError::Duplicate { key });
        }
        documents.push(document);

        Ok(id)
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect())
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents.iter().find(|doc| filter.matches(doc)).cloned())
    }

    async fn update_one(&self, filter: &Filter, mut set: Document) -> Result<u64, StoreError> {
        // identifiers are immutable
        set.remove(ID_FIELD);

        let mut documents = self.documents.write().await;
        let Some(index) = documents.iter().position(|doc| filter.matches(doc)) else {
            return Ok(0);
        };

        if let Some(key) = self.conflicting_key(&documents, &set, Some(index)) {
            return Err(StoreError::Duplicate { key });
        }
        if let Some(target) = documents.get_mut(index) {
            target.extend(set);
        }

        Ok(1)
    }

    async fn replace_one(
        &self,
        filter: &Filter,
        mut document: Document,
    ) -> Result<u64, StoreError> {
        document.remove(ID_FIELD);

        let mut documents = self.documents.write().await;
        let Some(index) = documents.iter().position(|doc| filter.matches(doc)) else {
            return Ok(0);
        };

        if let Some(key) = self.conflicting_key(&documents, &document, Some(index)) {
            return Err(StoreError::Duplicate { key });
        }
        if let Some(target) = documents.get_mut(index) {
            if let Some(id) = target.remove(ID_FIELD) {
                document.insert(ID_FIELD.to_owned(), id);
            }
            *target = document;
        }

        Ok(1)
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;
        match documents.iter().position(|doc| filter.matches(doc)) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
