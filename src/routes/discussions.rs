use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::Principal,
    models::{
        discussion::{CommentId, DiscussionId},
        BookId, Comment, Discussion,
    },
    routes::{extract::AppJson, AppState},
    services::discussions,
};

#[derive(Debug, Deserialize)]
pub struct NewDiscussionRequest {
    pub book_id: BookId,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct DiscussionUpdate {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    #[serde(default)]
    pub content: String,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    _principal: Principal,
) -> AppResult<Json<Vec<Discussion>>> {
    Ok(Json(discussions::list_discussions(state.store.as_ref()).await?))
}

/// Handler opening a discussion on a book
pub async fn create(
    State(state): State<Arc<AppState>>,
    Principal(user): Principal,
    AppJson(request): AppJson<NewDiscussionRequest>,
) -> AppResult<(StatusCode, Json<Discussion>)> {
    let discussion =
        discussions::create_discussion(state.store.as_ref(), &user, request.book_id, &request.title)
            .await?;
    Ok((StatusCode::CREATED, Json(discussion)))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    _principal: Principal,
    Path(id): Path<DiscussionId>,
) -> AppResult<Json<Discussion>> {
    Ok(Json(discussions::get_discussion(state.store.as_ref(), id).await?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Principal(user): Principal,
    Path(id): Path<DiscussionId>,
    AppJson(request): AppJson<DiscussionUpdate>,
) -> AppResult<Json<Discussion>> {
    let discussion =
        discussions::update_discussion(state.store.as_ref(), &user, id, &request.title).await?;
    Ok(Json(discussion))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Principal(user): Principal,
    Path(id): Path<DiscussionId>,
) -> AppResult<StatusCode> {
    discussions::delete_discussion(state.store.as_ref(), &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler listing the comments of a discussion, oldest first
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    _principal: Principal,
    Path(id): Path<DiscussionId>,
) -> AppResult<Json<Vec<Comment>>> {
    Ok(Json(discussions::list_comments(state.store.as_ref(), id).await?))
}

pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Principal(user): Principal,
    Path(id): Path<DiscussionId>,
    AppJson(request): AppJson<CommentBody>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let comment =
        discussions::create_comment(state.store.as_ref(), &user, id, &request.content).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn comment_detail(
    State(state): State<Arc<AppState>>,
    _principal: Principal,
    Path(id): Path<CommentId>,
) -> AppResult<Json<Comment>> {
    Ok(Json(discussions::get_comment(state.store.as_ref(), id).await?))
}

pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    Principal(user): Principal,
    Path(id): Path<CommentId>,
    AppJson(request): AppJson<CommentBody>,
) -> AppResult<Json<Comment>> {
    let comment =
        discussions::update_comment(state.store.as_ref(), &user, id, &request.content).await?;
    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Principal(user): Principal,
    Path(id): Path<CommentId>,
) -> AppResult<StatusCode> {
    discussions::delete_comment(state.store.as_ref(), &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
