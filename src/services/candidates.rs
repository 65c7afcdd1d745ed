use rand::{seq::SliceRandom, Rng};

use crate::{
    db::CatalogStore,
    error::AppResult,
    models::{BookId, BookSummary, UserId},
};

/// Upper bound on each of the two book lists embedded in a recommendation prompt
pub const DEFAULT_LIMIT: usize = 60;

/// The user's favorited books, oldest first, at most `limit`
pub async fn select_favorites(
    store: &dyn CatalogStore,
    user_id: UserId,
    limit: usize,
) -> AppResult<Vec<BookSummary>> {
    let books = store.favorite_books(user_id, Some(limit)).await?;
    Ok(books.iter().map(BookSummary::from).collect())
}

/// A shuffled sample of books sharing a category with `liked_categories`
///
/// Books listed in `exclude_ids` never appear. The shuffle is driven by `rng`,
/// so callers decide whether the sample is reproducible.
pub async fn select_candidates<R: Rng + ?Sized>(
    store: &dyn CatalogStore,
    liked_categories: &[String],
    exclude_ids: &[BookId],
    limit: usize,
    rng: &mut R,
) -> AppResult<Vec<BookSummary>> {
    if liked_categories.is_empty() || limit == 0 {
        return Ok(Vec::new());
    }

    let mut pool = store
        .books_in_categories(liked_categories, exclude_ids)
        .await?;
    let matched = pool.len();

    pool.shuffle(rng);
    pool.truncate(limit);

    tracing::debug!(matched, selected = pool.len(), "Candidate books sampled");

    Ok(pool)
}
