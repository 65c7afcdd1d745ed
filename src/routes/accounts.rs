use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::bearer_token,
    routes::{extract::AppJson, AppState},
    services::accounts::{self, Registration},
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Handler for account registration
pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<Registration>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let (_, token) = accounts::register(state.store.as_ref(), request, state.token_ttl).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "access": token,
        })),
    ))
}

/// Handler for credential login
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<LoginRequest>,
) -> AppResult<Json<Value>> {
    let token = accounts::login(
        state.store.as_ref(),
        &request.email,
        &request.password,
        state.token_ttl,
    )
    .await?;
    Ok(Json(json!({ "access": token })))
}

/// Handler swapping the presented bearer token for a fresh one
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<Value>> {
    let token = bearer_token(&headers).ok_or_else(|| {
        AppError::Unauthorized("Authentication credentials were not provided".to_string())
    })?;
    let fresh = accounts::refresh_token(state.store.as_ref(), token, state.token_ttl).await?;
    Ok(Json(json!({ "access": fresh })))
}
