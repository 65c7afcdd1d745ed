use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::{Principal, RequestId},
    models::{BookHit, NameHit},
    routes::{extract::AppJson, AppState},
    services::taxonomy,
};

#[derive(Debug, Deserialize)]
pub struct AutoCompleteRequest {
    #[serde(default)]
    pub who: Option<String>,
    #[serde(default)]
    pub searched: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AutoCompleteHits {
    Names(Vec<NameHit>),
    Books(Vec<BookHit>),
}

/// Handler listing every category present in the catalog
pub async fn categories(
    State(state): State<Arc<AppState>>,
    _principal: Principal,
) -> AppResult<Json<Value>> {
    let categories = taxonomy::extract_categories(state.store.as_ref()).await?;
    Ok(Json(json!({ "categories": categories })))
}

/// Handler for author, book and category suggestions
pub async fn auto_complete(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    _principal: Principal,
    AppJson(request): AppJson<AutoCompleteRequest>,
) -> AppResult<Json<AutoCompleteHits>> {
    let searched = request
        .searched
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Search query is required".to_string()))?;

    let store = state.store.as_ref();
    let hits = match request.who.as_deref() {
        Some("author") => AutoCompleteHits::Names(taxonomy::search_authors(store, searched).await?),
        Some("category") => {
            AutoCompleteHits::Names(taxonomy::search_categories(store, searched).await?)
        }
        Some("book") => AutoCompleteHits::Books(taxonomy::search_books(store, searched).await?),
        _ => {
            return Err(AppError::NotFound(
                "Unknown search target, expected author, book or category".to_string(),
            ))
        }
    };

    tracing::debug!(
        request_id = %request_id,
        who = request.who.as_deref().unwrap_or_default(),
        "Autocomplete served"
    );

    Ok(Json(hits))
}
