//! Product catalog service.

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use tronics_core::store::{from_document, to_document};
use tronics_core::{
    CollectionStore, DocumentId, Filter, FilterBuilder, IdError, Product, ProductDraft,
    StoreError, ValidationErrors,
};

/// Errors that can occur in product operations.
#[derive(Debug, Error)]
pub enum ProductError {
    /// An identifier (path or filter) could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdError),

    /// No product with this identifier exists.
    #[error("product {0} not found")]
    NotFound(DocumentId),

    /// The payload (or merged entity) broke a product rule.
    #[error("validation failed: {0}")]
    ValidationFailed(#[from] ValidationErrors),

    /// The store query failed.
    #[error("query failed: {0}")]
    QueryFailed(#[source] StoreError),

    /// A stored document does not have the product shape.
    #[error("stored product could not be decoded: {0}")]
    DecodeFailed(#[source] StoreError),

    /// Inserting the product at `index` failed; earlier inserts are kept.
    #[error("insert of product {index} failed: {source}")]
    InsertFailed { index: usize, source: StoreError },

    /// Writing an update or delete failed.
    #[error("persist failed: {0}")]
    PersistFailed(#[source] StoreError),
}

/// CRUD over the products collection.
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn CollectionStore>,
}

impl ProductService {
    /// Create a product service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { store }
    }

    /// List products matching every `(field, value)` constraint.
    ///
    /// # Errors
    ///
    /// `InvalidIdentifier` for a bad `_id` constraint, `QueryFailed` or
    /// `DecodeFailed` on store trouble.
    #[instrument(skip(self, constraints), fields(collection = self.store.name()))]
    pub async fn list<I, K, V>(&self, constraints: I) -> Result<Vec<Product>, ProductError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let filter = FilterBuilder::from_pairs(constraints)?;

        let documents = self
            .store
            .find(&filter)
            .await
            .map_err(ProductError::QueryFailed)?;

        let products = documents
            .into_iter()
            .map(from_document::<Product>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(ProductError::DecodeFailed)?;

        tracing::debug!(constraints = filter.len(), count = products.len(), "listed products");
        Ok(products)
    }

    /// Fetch a single product.
    ///
    /// # Errors
    ///
    /// `InvalidIdentifier`, `NotFound`, `QueryFailed` or `DecodeFailed`.
    #[instrument(skip(self), fields(collection = self.store.name()))]
    pub async fn get(&self, id: &str) -> Result<Product, ProductError> {
        let id = DocumentId::parse(id)?;
        self.find_by_id(id).await
    }

    async fn find_by_id(&self, id: DocumentId) -> Result<Product, ProductError> {
        let document = self
            .store
            .find_one(&Filter::by_id(id))
            .await
            .map_err(ProductError::QueryFailed)?
            .ok_or(ProductError::NotFound(id))?;

        from_document(document).map_err(ProductError::DecodeFailed)
    }

    /// Validate every draft, then insert them one by one.
    ///
    /// Returns the assigned identifiers in input order. Nothing is inserted if
    /// any draft is invalid; on an insert failure, earlier inserts remain.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` (fields prefixed with the draft's index) or
    /// `InsertFailed`.
    #[instrument(skip_all, fields(collection = self.store.name(), count = drafts.len()))]
    pub async fn create(&self, drafts: Vec<ProductDraft>) -> Result<Vec<DocumentId>, ProductError> {
        let products = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| {
                draft
                    .into_product(DocumentId::generate())
                    .map_err(|e| e.at_index(index))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut ids = Vec::with_capacity(products.len());
        for (index, product) in products.iter().enumerate() {
            let inserted = match to_document(product) {
                Ok(document) => self.store.insert_one(document).await,
                Err(e) => Err(e),
            };
            match inserted {
                Ok(id) => ids.push(id),
                Err(source) => {
                    tracing::error!(index, inserted = ids.len(), error = %source, "product insert failed");
                    return Err(ProductError::InsertFailed { index, source });
                }
            }
        }

        tracing::info!(count = ids.len(), "products created");
        Ok(ids)
    }

    /// Overlay `patch` onto the stored product and write the result back.
    ///
    /// # Errors
    ///
    /// `InvalidIdentifier`, `NotFound`, `ValidationFailed`, `PersistFailed`,
    /// or the read errors of [`ProductService::get`].
    #[instrument(skip(self, patch), fields(collection = self.store.name()))]
    pub async fn update(&self, id: &str, patch: ProductDraft) -> Result<Product, ProductError> {
        let id = DocumentId::parse(id)?;
        let existing = self.find_by_id(id).await?;

        let merged = ProductDraft::from(existing).overlay(patch).into_product(id)?;

        let document = to_document(&merged).map_err(ProductError::PersistFailed)?;
        let matched = self
            .store
            .replace_one(&Filter::by_id(id), document)
            .await
            .map_err(ProductError::PersistFailed)?;

        if matched == 0 {
            return Err(ProductError::NotFound(id));
        }

        tracing::info!(%id, "product updated");
        Ok(merged)
    }

    /// Delete a product, returning how many documents were removed (0 or 1).
    ///
    /// # Errors
    ///
    /// `InvalidIdentifier` or `PersistFailed`.
    #[instrument(skip(self), fields(collection = self.store.name()))]
    pub async fn delete(&self, id: &str) -> Result<u64, ProductError> {
        let id = DocumentId::parse(id)?;

        let deleted = self
            .store
            .delete_one(&Filter::by_id(id))
            .await
            .map_err(ProductError::PersistFailed)?;

        tracing::info!(%id, deleted, "product delete");
        Ok(deleted)
    }
}
