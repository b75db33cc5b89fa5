//! Integration tests for registration and login.

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use tronics_integration_tests::{TEST_PASSWORD, TestApp, TestResponse};

async fn post(app: &TestApp, uri: &str, body: &Value) -> TestResponse {
    app.request(Method::POST, uri, None, Some(body)).await
}

fn credentials(username: &str, password: &str) -> Value {
    json!({"username": username, "password": password})
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_returns_username_and_token() {
    let app = TestApp::new();

    let response = post(&app, "/users", &credentials("buyer@tronics.io", TEST_PASSWORD)).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json::<Value>(), json!({"username": "buyer@tronics.io"}));

    let token = response.token().expect("token header");
    let claims = app.state().tokens().verify(&token).expect("valid token");
    assert_eq!(claims.user_id, "buyer@tronics.io");
    assert!(!claims.authorized);
}

#[tokio::test]
async fn test_register_password_length() {
    let app = TestApp::new();

    let response = post(&app, "/users", &credentials("buyer@tronics.io", "short")).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.text().contains("password"));
    assert!(response.token().is_none());

    let response = post(&app, "/users", &credentials("buyer@tronics.io", "12345678")).await;
    assert_eq!(response.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_register_invalid_email() {
    let app = TestApp::new();

    let response = post(&app, "/users", &credentials("not-an-email", TEST_PASSWORD)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.text().contains("username"));
}

#[tokio::test]
async fn test_register_twice() {
    let app = TestApp::new();
    let body = credentials("buyer@tronics.io", TEST_PASSWORD);

    assert_eq!(post(&app, "/users", &body).await.status, StatusCode::CREATED);

    let again = post(&app, "/users", &body).await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.json::<Value>(), json!({"message": "user already exists"}));
}

#[tokio::test]
async fn test_register_cannot_claim_admin() {
    let app = TestApp::new();

    let response = post(
        &app,
        "/users",
        &json!({"username": "sneaky@tronics.io", "password": TEST_PASSWORD, "isadmin": true}),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let claims = app
        .state()
        .tokens()
        .verify(&response.token().expect("token header"))
        .expect("valid token");
    assert!(!claims.authorized);
}

#[tokio::test]
async fn test_register_malformed_payload() {
    let app = TestApp::new();

    let response = post(&app, "/users", &json!({"username": "buyer@tronics.io"})).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/users")
        .header("content-type", "text/plain")
        .body(axum::body::Body::from("buyer@tronics.io"))
        .expect("request");
    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_issues_token() {
    let app = TestApp::new();
    app.register("buyer@tronics.io").await;

    let response = post(&app, "/auth", &credentials("buyer@tronics.io", TEST_PASSWORD)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!({"username": "buyer@tronics.io"}));

    let token = response.token().expect("token header");
    assert!(app.state().tokens().verify(&token).is_ok());
}

#[tokio::test]
async fn test_login_failures_share_message() {
    let app = TestApp::new();
    app.register("buyer@tronics.io").await;

    let wrong_password =
        post(&app, "/auth", &credentials("buyer@tronics.io", "wrong-password")).await;
    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert!(wrong_password.token().is_none());

    let unknown = post(&app, "/auth", &credentials("nobody@tronics.io", TEST_PASSWORD)).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    assert_eq!(wrong_password.json::<Value>(), unknown.json::<Value>());
    assert_eq!(unknown.json::<Value>(), json!({"message": "invalid credentials"}));
}

#[tokio::test]
async fn test_login_validates_payload() {
    let app = TestApp::new();

    let response = post(&app, "/auth", &credentials("buyer@tronics.io", "short")).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_login_carries_claim() {
    let app = TestApp::new();
    app.admin_token("admin@tronics.io").await;

    let response = post(&app, "/auth", &credentials("admin@tronics.io", TEST_PASSWORD)).await;
    assert_eq!(response.status, StatusCode::OK);

    let claims = app
        .state()
        .tokens()
        .verify(&response.token().expect("token header"))
        .expect("valid token");
    assert!(claims.authorized);
}

// ============================================================================
// Credential Secrecy
// ============================================================================

#[tokio::test]
async fn test_responses_never_contain_password() {
    let app = TestApp::new();
    let body = credentials("buyer@tronics.io", TEST_PASSWORD);

    let responses = [
        post(&app, "/users", &body).await,
        post(&app, "/users", &body).await,
        post(&app, "/auth", &body).await,
        post(&app, "/auth", &credentials("buyer@tronics.io", "wrong-password")).await,
    ];

    for response in responses {
        let text = response.text();
        assert!(!text.contains("password"), "{text}");
        assert!(!text.contains(TEST_PASSWORD), "{text}");
        assert!(!text.contains("$argon2"), "{text}");
    }
}
