use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{BookId, FavoriteView, UserId},
};

/// Adds a book to the user's favorites; returns whether a new row was written
pub async fn add_favorite(
    store: &dyn CatalogStore,
    user_id: UserId,
    book_id: BookId,
) -> AppResult<bool> {
    if store.get_book(book_id).await?.is_none() {
        return Err(AppError::NotFound("Book not found".to_string()));
    }

    let created = store.insert_favorite(user_id, book_id).await?;
    tracing::debug!(user_id, book_id, created, "Favorite recorded");
    Ok(created)
}

/// Removes a favorite. Unknown books and missing favorites are both not-found.
pub async fn remove_favorite(
    store: &dyn CatalogStore,
    user_id: UserId,
    book_id: BookId,
) -> AppResult<()> {
    if store.get_book(book_id).await?.is_none() {
        return Err(AppError::NotFound("Book not found".to_string()));
    }

    if !store.delete_favorite(user_id, book_id).await? {
        return Err(AppError::NotFound("Favorite not found".to_string()));
    }

    tracing::debug!(user_id, book_id, "Favorite removed");
    Ok(())
}

pub async fn list_favorites(store: &dyn CatalogStore, user_id: UserId) -> AppResult<Vec<FavoriteView>> {
    let books = store.favorite_books(user_id, None).await?;
    Ok(books.iter().map(FavoriteView::from).collect())
}
