//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. `NormalizePathLayer` (trim trailing slashes before routing)
//! 2. Sentry layers (capture errors, transactions)
//! 3. `TraceLayer` (request span with `correlation_id` and `user_id` fields)
//! 4. Correlation ID (echo or generate `x-correlation-id`)
//! 5. `HandleErrorLayer` + tower `TimeoutLayer` (per-request deadline, JSON 408)
//! 6. Router fallbacks (JSON 404 and 405)
//! 7. Per-route: `DefaultBodyLimit` on product writes, auth extractors

pub mod auth;
pub mod correlation_id;

pub use auth::{AUTH_TOKEN_HEADER, RequireAdmin, RequireToken, bearer_token, bearer_value};
pub use correlation_id::{CORRELATION_ID_HEADER, correlation_id_middleware};
