use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{Book, BookId, BookPatch, NewBook, Role, User},
};

pub async fn list_books(store: &dyn CatalogStore) -> AppResult<Vec<Book>> {
    store.list_books().await
}

pub async fn get_book(store: &dyn CatalogStore, id: BookId) -> AppResult<Book> {
    store
        .get_book(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
}

/// Title search used by the catalog browser
pub async fn search_by_title(store: &dyn CatalogStore, query: Option<&str>) -> AppResult<Vec<Book>> {
    match query.map(str::trim) {
        Some(q) if !q.is_empty() => store.search_books_by_title(q).await,
        _ => Err(AppError::InvalidInput(
            "Query parameter 'q' is required".to_string(),
        )),
    }
}

const MAX_TEXT_CHARS: usize = 255;

fn ensure_moderator(actor: &User, action: &str) -> AppResult<()> {
    if actor.has_role(Role::Moderator) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("Only moderators can {} books", action)))
    }
}

fn invalid(message: &str) -> AppError {
    AppError::InvalidInput(message.to_string())
}

/// Rejects anything the schema would refuse
fn validate(book: &NewBook) -> AppResult<()> {
    if book.title.trim().is_empty() || book.authors.trim().is_empty() {
        return Err(invalid("Title and authors are required"));
    }
    if book.isbn13.chars().count() != 13 || book.isbn10.chars().count() != 10 {
        return Err(invalid(
            "ISBN-13 must have 13 characters and ISBN-10 must have 10",
        ));
    }

    let too_long = |value: Option<&str>| value.is_some_and(|v| v.chars().count() > MAX_TEXT_CHARS);
    if too_long(Some(&book.title))
        || too_long(Some(&book.authors))
        || too_long(book.subtitle.as_deref())
        || too_long(book.categories.as_deref())
    {
        return Err(invalid(
            "Title, subtitle, authors and categories are limited to 255 characters",
        ));
    }

    if let Some(rating) = book.average_rating {
        if !(0.0..=5.0).contains(&rating) {
            return Err(invalid("Average rating must be between 0 and 5"));
        }
    }
    let negative = |value: Option<i32>| value.is_some_and(|v| v < 0);
    if negative(book.published_year) || negative(book.num_pages) || negative(book.ratings_count) {
        return Err(invalid(
            "Published year, page count and ratings count cannot be negative",
        ));
    }
    Ok(())
}

/// Adds a book by hand; moderators and above only
pub async fn create_book(store: &dyn CatalogStore, actor: &User, book: NewBook) -> AppResult<Book> {
    ensure_moderator(actor, "add")?;
    validate(&book)?;

    let created = store.create_book(book).await?;
    tracing::info!(book_id = created.id, actor = actor.id, "Book created");
    Ok(created)
}

/// Overwrites every field of a book
pub async fn replace_book(
    store: &dyn CatalogStore,
    actor: &User,
    id: BookId,
    book: NewBook,
) -> AppResult<Book> {
    ensure_moderator(actor, "edit")?;
    validate(&book)?;

    let updated = store
        .update_book(id, book)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;
    tracing::info!(book_id = id, actor = actor.id, "Book updated");
    Ok(updated)
}

/// Applies the fields present in `patch`, keeping the rest
pub async fn update_book(
    store: &dyn CatalogStore,
    actor: &User,
    id: BookId,
    patch: BookPatch,
) -> AppResult<Book> {
    ensure_moderator(actor, "edit")?;
    let current = get_book(store, id).await?;
    replace_book(store, actor, id, patch.apply(current)).await
}

pub async fn delete_book(store: &dyn CatalogStore, actor: &User, id: BookId) -> AppResult<()> {
    ensure_moderator(actor, "delete")?;
    if !store.delete_book(id).await? {
        return Err(AppError::NotFound("Book not found".to_string()));
    }
    tracing::info!(book_id = id, actor = actor.id, "Book deleted");
    Ok(())
}
