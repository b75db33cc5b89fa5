//! Product catalog handlers.
//!
//! Reads are public. Creating and updating need a valid token; deleting
//! needs the admin claim.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};

use tronics_core::{DocumentId, Product, ProductDraft};

use crate::error::{ApiJson, Result};
use crate::middleware::{RequireAdmin, RequireToken};
use crate::state::AppState;

/// List products, filtered by exact-match `field=value` query pairs.
pub async fn index(
    State(state): State<AppState>,
    Query(constraints): Query<Vec<(String, String)>>,
) -> Result<ApiJson<Vec<Product>>> {
    let products = state.products().list(constraints).await?;
    Ok(ApiJson(products))
}

/// Fetch one product by identifier.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiJson<Product>> {
    let product = state.products().get(&id).await?;
    Ok(ApiJson(product))
}

/// Insert a batch of products. Responds with their identifiers in order.
pub async fn create(
    State(state): State<AppState>,
    RequireToken(claims): RequireToken,
    ApiJson(drafts): ApiJson<Vec<ProductDraft>>,
) -> Result<(StatusCode, ApiJson<Vec<DocumentId>>)> {
    let ids = state.products().create(drafts).await?;

    tracing::info!(acting_user = %claims.user_id, count = ids.len(), "products created");
    Ok((StatusCode::CREATED, ApiJson(ids)))
}

/// Overlay a partial payload onto a stored product.
pub async fn update(
    State(state): State<AppState>,
    RequireToken(claims): RequireToken,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ProductDraft>,
) -> Result<ApiJson<Product>> {
    let product = state.products().update(&id, patch).await?;

    tracing::info!(acting_user = %claims.user_id, product_id = %product.id, "product updated");
    Ok(ApiJson(product))
}

/// Delete a product. Responds with the number of products removed.
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(claims): RequireAdmin,
    Path(id): Path<String>,
) -> Result<ApiJson<u64>> {
    let deleted = state.products().delete(&id).await?;

    tracing::info!(acting_user = %claims.user_id, product_id = %id, deleted, "product delete");
    Ok(ApiJson(deleted))
}
