//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::Stores;
use crate::services::{CredentialHasher, ProductService, TokenManager, UserService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// services, each already wired to its collection.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    products: ProductService,
    users: UserService,
    tokens: TokenManager,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `stores` - Products and users collections
    #[must_use]
    pub fn new(config: ApiConfig, stores: Stores) -> Self {
        Self::with_hasher(config, stores, CredentialHasher::new())
    }

    /// Create a new application state with a custom password hasher.
    #[must_use]
    pub fn with_hasher(config: ApiConfig, stores: Stores, hasher: CredentialHasher) -> Self {
        let tokens = TokenManager::new(&config.token_secret);
        let products = ProductService::new(stores.products);
        let users = UserService::new(stores.users, hasher, tokens.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                products,
                users,
                tokens,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the product service.
    #[must_use]
    pub fn products(&self) -> &ProductService {
        &self.inner.products
    }

    /// Get a reference to the user service.
    #[must_use]
    pub fn users(&self) -> &UserService {
        &self.inner.users
    }

    /// Get a reference to the token manager.
    #[must_use]
    pub fn tokens(&self) -> &TokenManager {
        &self.inner.tokens
    }
}
