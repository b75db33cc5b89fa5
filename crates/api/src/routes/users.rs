//! Account registration and login.
//!
//! Both respond with the public view of the account and a fresh token in the
//! `x-auth-token` header.

use axum::{extract::State, http::StatusCode};

use tronics_core::{Credentials, User, UserResponse};

use crate::error::{ApiJson, Result};
use crate::middleware::{AUTH_TOKEN_HEADER, bearer_value};
use crate::state::AppState;

type TokenResponse = (StatusCode, [(&'static str, String); 1], ApiJson<UserResponse>);

/// Register a non-admin account.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<TokenResponse> {
    let user = state.users().register(&credentials).await?;
    with_token(&state, StatusCode::CREATED, &user)
}

/// Exchange credentials for a token.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<TokenResponse> {
    let user = state.users().authenticate(&credentials).await?;
    with_token(&state, StatusCode::OK, &user)
}

fn with_token(state: &AppState, status: StatusCode, user: &User) -> Result<TokenResponse> {
    let token = state.users().issue_token(user)?;
    Ok((
        status,
        [(AUTH_TOKEN_HEADER, bearer_value(&token))],
        ApiJson(UserResponse::from(user)),
    ))
}
