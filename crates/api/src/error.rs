//! Unified error handling with Sentry integration.
//!
//! Every layer has its own error enum; route handlers return
//! `Result<T, AppError>` and the conversion to a status code and a JSON
//! `{"message": ...}` body happens once, here. Server errors are captured to
//! Sentry and logged; their details never reach the client.

use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;
use axum::{
    BoxError, Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::{AuthError, ProductError, TokenError};

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Product operation failed.
    #[error("Product error: {0}")]
    Product(#[from] ProductError),

    /// Account operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Token missing, malformed or expired.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Authenticated, but lacking the admin claim.
    #[error("Forbidden")]
    Forbidden,

    /// The request body could not be read as the expected JSON.
    #[error("Unable to parse request payload: {message}")]
    Payload { status: StatusCode, message: String },

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// No route matches the request path.
    #[error("Route not found")]
    RouteNotFound,

    /// The path exists but not for this method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Product(err) => match err {
                ProductError::InvalidIdentifier(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ProductError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
                ProductError::NotFound(_) => StatusCode::NOT_FOUND,
                ProductError::QueryFailed(_)
                | ProductError::DecodeFailed(_)
                | ProductError::InsertFailed { .. }
                | ProductError::PersistFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::ValidationFailed(_) | AuthError::UserExists => StatusCode::BAD_REQUEST,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::LookupFailed(_)
                | AuthError::PersistFailed(_)
                | AuthError::Hashing(_)
                | AuthError::TokenSigningFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Token(err) => match err {
                TokenError::Malformed | TokenError::Expired => StatusCode::UNAUTHORIZED,
                TokenError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Payload { status, .. } => *status,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal details are never included.
    fn public_message(&self) -> String {
        if self.status().is_server_error() {
            return "internal server error".to_string();
        }

        match self {
            Self::Product(err) => match err {
                ProductError::InvalidIdentifier(e) => e.to_string(),
                ProductError::ValidationFailed(errors) => {
                    format!("unable to validate request payload: {errors}")
                }
                ProductError::NotFound(_) => "unable to find the product".to_string(),
                _ => "internal server error".to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::ValidationFailed(errors) => {
                    format!("unable to validate request payload: {errors}")
                }
                AuthError::UserExists => "user already exists".to_string(),
                // same text for both, so the body does not reveal which accounts exist
                AuthError::UserNotFound | AuthError::InvalidCredentials => {
                    "invalid credentials".to_string()
                }
                _ => "internal server error".to_string(),
            },
            Self::Token(TokenError::Expired) => "token has expired".to_string(),
            Self::Token(_) => "missing or invalid token".to_string(),
            Self::Forbidden => "admin privileges required".to_string(),
            Self::Payload { message, .. } => format!("unable to parse request payload: {message}"),
            Self::Timeout => "request timed out".to_string(),
            Self::RouteNotFound => "route not found".to_string(),
            Self::MethodNotAllowed => "method not allowed".to_string(),
            Self::Internal(_) => "internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorBody {
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self::Payload {
            status,
            message: rejection.body_text(),
        }
    }
}

/// Error handler for the timeout layer. Errors other than an elapsed
/// deadline become [`AppError::Internal`].
pub async fn handle_timeout(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::Timeout
    } else {
        AppError::Internal(err.to_string())
    }
}

/// Router fallback for unknown paths.
pub async fn route_not_found() -> AppError {
    AppError::RouteNotFound
}

/// Router fallback for known paths hit with an unsupported method.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// JSON extractor and response whose rejections are [`AppError`]s.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        Json(self.0).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
