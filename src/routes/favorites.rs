use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::Principal,
    models::BookId,
    routes::{extract::AppJson, AppState},
    services::favorites,
};

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    #[serde(default)]
    pub book_id: Option<BookId>,
}

impl FavoriteRequest {
    fn book_id(&self) -> AppResult<BookId> {
        self.book_id
            .ok_or_else(|| AppError::InvalidInput("book_id is required".to_string()))
    }
}

/// Handler listing the caller's favorites
pub async fn list(
    State(state): State<Arc<AppState>>,
    Principal(user): Principal,
) -> AppResult<Json<Value>> {
    let favorites = favorites::list_favorites(state.store.as_ref(), user.id).await?;
    Ok(Json(json!({ "favorites": favorites })))
}

/// Handler adding a favorite
pub async fn add(
    State(state): State<Arc<AppState>>,
    Principal(user): Principal,
    AppJson(request): AppJson<FavoriteRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let created = favorites::add_favorite(state.store.as_ref(), user.id, request.book_id()?).await?;

    Ok(if created {
        (
            StatusCode::CREATED,
            Json(json!({ "message": "Book added to favorites" })),
        )
    } else {
        (
            StatusCode::OK,
            Json(json!({ "message": "Book is already in favorites" })),
        )
    })
}

/// Handler removing a favorite
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Principal(user): Principal,
    AppJson(request): AppJson<FavoriteRequest>,
) -> AppResult<StatusCode> {
    favorites::remove_favorite(state.store.as_ref(), user.id, request.book_id()?).await?;
    Ok(StatusCode::NO_CONTENT)
}
