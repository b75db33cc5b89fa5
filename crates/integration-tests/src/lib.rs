//! Integration test harness for the Tronics API.
//!
//! Each [`TestApp`] owns a fresh application wired to in-memory collections
//! and drives the real router in-process, so no database or listening socket
//! is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tronics-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::HashMap;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower::ServiceExt;

use tronics_api::config::ApiConfig;
use tronics_api::db::Stores;
use tronics_api::middleware::{AUTH_TOKEN_HEADER, bearer_token, bearer_value};
use tronics_api::routes;
use tronics_api::services::CredentialHasher;
use tronics_api::state::AppState;
use tronics_core::Credentials;

/// A high-entropy signing secret that passes configuration checks.
pub const TEST_TOKEN_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%";

/// Password used by the account helpers.
pub const TEST_PASSWORD: &str = "s3cret-passw0rd";

/// The catalog entry used throughout the scenarios.
#[must_use]
pub fn googletalk() -> Value {
    serde_json::json!({
        "product_name": "googletalk",
        "price": 250,
        "currency": "INR",
        "vendor": "google",
        "accessories": ["charger", "subscription"]
    })
}

/// One in-process application instance.
pub struct TestApp {
    state: AppState,
}

/// A fully buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("response body is not the expected JSON")
    }

    /// The body as text.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The raw token from the `x-auth-token` header, if present.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        bearer_token(&self.headers).ok().map(str::to_owned)
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// An application with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_vars(&[])
    }

    /// An application with extra configuration variables.
    ///
    /// The token secret is always set; database variables are never read,
    /// so the stores are in memory.
    #[must_use]
    pub fn with_vars(vars: &[(&str, &str)]) -> Self {
        let mut vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        vars.entry("JWT_TOKEN_SECRET".to_owned())
            .or_insert_with(|| TEST_TOKEN_SECRET.to_owned());

        let config = ApiConfig::from_lookup(|key| vars.get(key).cloned())
            .expect("test configuration is valid");
        let stores = Stores::in_memory(&config);

        Self {
            state: AppState::with_hasher(config, stores, fast_hasher()),
        }
    }

    /// Shared state, for reaching services directly.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Send one request through the full middleware stack.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTH_TOKEN_HEADER, bearer_value(token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request is well formed");

        self.send(request).await
    }

    /// Send a prebuilt request through the full middleware stack.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = routes::app(self.state.clone())
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body is readable");

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// `GET` without a token.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None, None).await
    }

    /// Register a buyer over HTTP and return its token.
    pub async fn register(&self, email: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/users",
                None,
                Some(&serde_json::json!({"username": email, "password": TEST_PASSWORD})),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
        response.token().expect("registration returns a token")
    }

    /// Create an admin account directly and return its token.
    pub async fn admin_token(&self, email: &str) -> String {
        let users = self.state.users();
        let admin = users
            .register_admin(&Credentials::new(email, TEST_PASSWORD))
            .await
            .expect("admin registration succeeds");
        users.issue_token(&admin).expect("token signing succeeds")
    }

    /// Create products under `token` and return their identifiers.
    pub async fn create_products(&self, token: &str, products: &Value) -> Vec<String> {
        let response = self
            .request(Method::POST, "/products", Some(token), Some(products))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
        response.json()
    }
}

/// Argon2 with minimal cost, so account tests stay fast.
fn fast_hasher() -> CredentialHasher {
    let params = argon2::Params::new(
        argon2::Params::MIN_M_COST,
        argon2::Params::MIN_T_COST,
        argon2::Params::MIN_P_COST,
        None,
    )
    .expect("minimal argon2 parameters are valid");
    CredentialHasher::with_params(params)
}
