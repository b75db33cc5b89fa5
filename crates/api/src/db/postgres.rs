//! `PostgreSQL` collection store.
//!
//! All collections share one `documents` table keyed by `(collection, id)`
//! with the body in a JSONB column. Filters are evaluated with JSONB
//! containment (`data @> filter`), which gives exact-match semantics on the
//! listed fields. Queries are built at runtime because the table layout is
//! generic over collections.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use tronics_core::store::ensure_id;
use tronics_core::{CollectionStore, Document, DocumentId, Filter, ID_FIELD, StoreError};

const INSERT: &str = r"
    INSERT INTO documents (collection, id, data)
    VALUES ($1, $2, $3)
";

const FIND: &str = r"
    SELECT data FROM documents
    WHERE collection = $1 AND data @> $2
    ORDER BY created_at, id
";

const FIND_ONE: &str = r"
    SELECT data FROM documents
    WHERE collection = $1 AND data @> $2
    ORDER BY created_at, id
    LIMIT 1
";

const UPDATE_ONE: &str = r"
    UPDATE documents SET data = data || $3
    WHERE collection = $1 AND id = (
        SELECT id FROM documents
        WHERE collection = $1 AND data @> $2
        ORDER BY created_at, id
        LIMIT 1
    )
";

const REPLACE_ONE: &str = r"
    UPDATE documents SET data = $3 || jsonb_build_object('_id', data->'_id')
    WHERE collection = $1 AND id = (
        SELECT id FROM documents
        WHERE collection = $1 AND data @> $2
        ORDER BY created_at, id
        LIMIT 1
    )
";

const DELETE_ONE: &str = r"
    DELETE FROM documents
    WHERE collection = $1 AND id = (
        SELECT id FROM documents
        WHERE collection = $1 AND data @> $2
        ORDER BY created_at, id
        LIMIT 1
    )
";

/// A collection stored in the shared `documents` table.
#[derive(Debug, Clone)]
pub struct PgCollection {
    pool: PgPool,
    name: String,
}

impl PgCollection {
    /// Bind a collection name to a pool.
    #[must_use]
    pub fn new(pool: PgPool, name: impl Into<String>) -> Self {
        Self {
            pool,
            name: name.into(),
        }
    }
}

#[async_trait]
impl CollectionStore for PgCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert_one(&self, mut document: Document) -> Result<DocumentId, StoreError> {
        let id = ensure_id(&mut document)?;

        sqlx::query(INSERT)
            .bind(&self.name)
            .bind(id)
            .bind(Value::Object(document))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(id)
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let rows: Vec<Value> = sqlx::query_scalar(FIND)
            .bind(&self.name)
            .bind(Value::Object(filter.as_document().clone()))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(into_document).collect()
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let row: Option<Value> = sqlx::query_scalar(FIND_ONE)
            .bind(&self.name)
            .bind(Value::Object(filter.as_document().clone()))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(into_document).transpose()
    }

    async fn update_one(&self, filter: &Filter, mut set: Document) -> Result<u64, StoreError> {
        // identifiers are immutable
        set.remove(ID_FIELD);

        let result = sqlx::query(UPDATE_ONE)
            .bind(&self.name)
            .bind(Value::Object(filter.as_document().clone()))
            .bind(Value::Object(set))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn replace_one(
        &self,
        filter: &Filter,
        mut document: Document,
    ) -> Result<u64, StoreError> {
        // the stored identifier is carried over by the statement
        document.remove(ID_FIELD);

        let result = sqlx::query(REPLACE_ONE)
            .bind(&self.name)
            .bind(Value::Object(filter.as_document().clone()))
            .bind(Value::Object(document))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, StoreError> {
        let result = sqlx::query(DELETE_ONE)
            .bind(&self.name)
            .bind(Value::Object(filter.as_document().clone()))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

fn into_document(value: Value) -> Result<Document, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Encoding(serde::de::Error::custom(format!(
            "stored document is not a JSON object: {other}"
        )))),
    }
}

fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::Duplicate {
            key: db_err.constraint().unwrap_or("unique").to_owned(),
        };
    }
    StoreError::backend(e)
}
