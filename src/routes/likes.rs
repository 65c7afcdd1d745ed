use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::Principal,
    models::Profile,
    routes::{extract::AppJson, AppState},
    services::likes::{self, LikeOutcome},
};

#[derive(Debug, Deserialize)]
pub struct LikeCategoryRequest {
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LikeAuthorRequest {
    #[serde(default)]
    pub author: Option<String>,
}

async fn profile_of(state: &AppState, principal: &Principal) -> AppResult<Profile> {
    state
        .store
        .profile_for_user(principal.0.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}

fn like_response(outcome: LikeOutcome, subject: &str) -> (StatusCode, Json<Value>) {
    if outcome.created {
        (
            StatusCode::CREATED,
            Json(json!({ "message": format!("{} added successfully", subject) })),
        )
    } else {
        (
            StatusCode::OK,
            Json(json!({ "message": format!("{} already exists", subject) })),
        )
    }
}

/// Handler listing the caller's liked categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> AppResult<Json<Value>> {
    let profile = profile_of(&state, &principal).await?;
    let liked = likes::list_liked_categories(state.store.as_ref(), profile.id).await?;
    Ok(Json(json!({ "liked_categories": liked })))
}

/// Handler recording a liked category
pub async fn like_category(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    AppJson(request): AppJson<LikeCategoryRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let profile = profile_of(&state, &principal).await?;
    let category = request.category.unwrap_or_default();
    let outcome = likes::like_category(state.store.as_ref(), profile.id, &category).await?;
    Ok(like_response(outcome, "Category"))
}

/// Handler listing the caller's liked authors
pub async fn list_authors(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> AppResult<Json<Value>> {
    let profile = profile_of(&state, &principal).await?;
    let liked = likes::list_liked_authors(state.store.as_ref(), profile.id).await?;
    Ok(Json(json!({ "liked_authors": liked })))
}

/// Handler recording a liked author
pub async fn like_author(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    AppJson(request): AppJson<LikeAuthorRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let profile = profile_of(&state, &principal).await?;
    let author = request.author.unwrap_or_default();
    let outcome = likes::like_author(state.store.as_ref(), profile.id, &author).await?;
    Ok(like_response(outcome, "Author"))
}
