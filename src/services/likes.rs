use serde::Serialize;

use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::ProfileId,
    services::taxonomy,
};

/// Result of an idempotent like
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeOutcome {
    pub created: bool,
}

/// Records that a profile likes a category present in the live catalog
///
/// Liking the same category again is not an error; `created` is false.
pub async fn like_category(
    store: &dyn CatalogStore,
    profile_id: ProfileId,
    category: &str,
) -> AppResult<LikeOutcome> {
    let category = category.trim();
    if category.is_empty() {
        return Err(AppError::InvalidInput("Category is required".to_string()));
    }

    let vocabulary = taxonomy::extract_categories(store).await?;
    if !vocabulary.contains(category) {
        return Err(AppError::NotFound("Category is not found".to_string()));
    }

    let created = store.insert_liked_category(profile_id, category).await?;
    tracing::debug!(profile_id, category, created, "Category like recorded");

    Ok(LikeOutcome { created })
}

/// Records that a profile likes an author present in the live catalog
pub async fn like_author(
    store: &dyn CatalogStore,
    profile_id: ProfileId,
    author: &str,
) -> AppResult<LikeOutcome> {
    let author = author.trim();
    if author.is_empty() {
        return Err(AppError::InvalidInput("Author is required".to_string()));
    }

    let vocabulary = taxonomy::extract_authors(store).await?;
    if !vocabulary.contains(author) {
        return Err(AppError::NotFound("Author is not found".to_string()));
    }

    let created = store.insert_liked_author(profile_id, author).await?;
    tracing::debug!(profile_id, author, created, "Author like recorded");

    Ok(LikeOutcome { created })
}

pub async fn list_liked_categories(
    store: &dyn CatalogStore,
    profile_id: ProfileId,
) -> AppResult<Vec<String>> {
    store.liked_categories(profile_id).await
}

pub async fn list_liked_authors(
    store: &dyn CatalogStore,
    profile_id: ProfileId,
) -> AppResult<Vec<String>> {
    store.liked_authors(profile_id).await
}
