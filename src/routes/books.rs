use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::Principal,
    models::{Book, BookId, BookPatch, NewBook},
    routes::{extract::AppJson, AppState},
    services::books,
};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// Handler listing the whole catalog
pub async fn list(
    State(state): State<Arc<AppState>>,
    _principal: Principal,
) -> AppResult<Json<Vec<Book>>> {
    Ok(Json(books::list_books(state.store.as_ref()).await?))
}

/// Handler adding a book to the catalog
pub async fn create(
    State(state): State<Arc<AppState>>,
    Principal(user): Principal,
    AppJson(book): AppJson<NewBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = books::create_book(state.store.as_ref(), &user, book).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Handler for title search
pub async fn search(
    State(state): State<Arc<AppState>>,
    _principal: Principal,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<Book>>> {
    let results = books::search_by_title(state.store.as_ref(), params.q.as_deref()).await?;
    Ok(Json(results))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    _principal: Principal,
    Path(id): Path<BookId>,
) -> AppResult<Json<Book>> {
    Ok(Json(books::get_book(state.store.as_ref(), id).await?))
}

/// Handler replacing every field of a book
pub async fn replace(
    State(state): State<Arc<AppState>>,
    Principal(user): Principal,
    Path(id): Path<BookId>,
    AppJson(book): AppJson<NewBook>,
) -> AppResult<Json<Book>> {
    Ok(Json(books::replace_book(state.store.as_ref(), &user, id, book).await?))
}

/// Handler applying a partial edit
pub async fn update(
    State(state): State<Arc<AppState>>,
    Principal(user): Principal,
    Path(id): Path<BookId>,
    AppJson(patch): AppJson<BookPatch>,
) -> AppResult<Json<Book>> {
    Ok(Json(books::update_book(state.store.as_ref(), &user, id, patch).await?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Principal(user): Principal,
    Path(id): Path<BookId>,
) -> AppResult<StatusCode> {
    books::delete_book(state.store.as_ref(), &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
