//! Registration and login.

use axum::Json;
use axum::extract::State;
use mirage_core::models::user::User;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: User,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let output = state.identity.register(&req.email, &req.password).await?;
    Ok(Json(TokenResponse {
        access_token: output.access_token,
        token_type: "bearer",
        expires_in: output.expires_in,
        user: output.user,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let output = state.identity.login(&req.email, &req.password).await?;
    Ok(Json(TokenResponse {
        access_token: output.access_token,
        token_type: "bearer",
        expires_in: output.expires_in,
        user: output.user,
    }))
}
