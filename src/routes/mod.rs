use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::CatalogStore,
    middleware::{make_span_with_request_id, request_id_middleware},
    services::{
        accounts::DEFAULT_TOKEN_TTL_SECS, completion::CompletionClient,
        recommendations::RecommendationSettings,
    },
};

pub mod accounts;
pub mod books;
pub mod discussions;
pub mod extract;
pub mod favorites;
pub mod likes;
pub mod recommendations;
pub mod taxonomy;

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub completion: Arc<dyn CompletionClient>,
    pub recommendation: RecommendationSettings,
    /// Lifetime of access tokens issued by register, login and refresh
    pub token_ttl: chrono::Duration,
}

impl AppState {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        completion: Arc<dyn CompletionClient>,
        recommendation: RecommendationSettings,
    ) -> Self {
        Self {
            store,
            completion,
            recommendation,
            token_ttl: chrono::Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
        }
    }

    pub fn with_token_ttl(mut self, token_ttl: chrono::Duration) -> Self {
        self.token_ttl = token_ttl;
        self
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// API routes under /api
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Accounts
        .route("/register/", post(accounts::register))
        .route("/login/", post(accounts::login))
        .route("/token/refresh/", post(accounts::refresh))
        // Taxonomy & search
        .route("/categories/", get(taxonomy::categories))
        .route("/auto_complete/", post(taxonomy::auto_complete))
        // Likes
        .route(
            "/liked_categories/",
            get(likes::list_categories).post(likes::like_category),
        )
        .route(
            "/liked-authors/",
            get(likes::list_authors).post(likes::like_author),
        )
        // Favorites
        .route(
            "/favorites/",
            get(favorites::list)
                .post(favorites::add)
                .delete(favorites::remove),
        )
        // Recommendations
        .route("/recommendations/", post(recommendations::recommend))
        // Catalog
        .route("/books/", get(books::list).post(books::create))
        .route("/books/search/", get(books::search))
        .route(
            "/books/:id/",
            get(books::detail)
                .put(books::replace)
                .patch(books::update)
                .delete(books::delete),
        )
        // Discussions & comments
        .route(
            "/discussions/",
            get(discussions::list).post(discussions::create),
        )
        .route(
            "/discussions/:id/",
            get(discussions::detail)
                .put(discussions::update)
                .delete(discussions::delete),
        )
        .route(
            "/discussions/:id/comments/",
            get(discussions::list_comments).post(discussions::create_comment),
        )
        .route(
            "/comments/:id/",
            get(discussions::comment_detail)
                .put(discussions::update_comment)
                .delete(discussions::delete_comment),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
