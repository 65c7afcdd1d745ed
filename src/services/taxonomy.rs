use std::collections::BTreeSet;

use crate::{
    db::CatalogStore,
    error::AppResult,
    models::{BookHit, NameHit},
};

/// Maximum number of autocomplete suggestions returned per query
pub const AUTOCOMPLETE_LIMIT: usize = 10;

/// Separator used inside one of the free-text taxonomy fields of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiter(pub char);

impl Delimiter {
    /// `categories` is a comma-separated list
    pub const CATEGORIES: Delimiter = Delimiter(',');
    /// `authors` is a semicolon-separated list; names themselves may contain commas
    pub const AUTHORS: Delimiter = Delimiter(';');
}

/// Splits one field value into trimmed, non-empty tokens
pub fn tokens(field: &str, delimiter: Delimiter) -> impl Iterator<Item = &str> {
    field
        .split(delimiter.0)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Distinct tokens across a set of field values, in lexicographic order
pub fn extract<I, S>(fields: I, delimiter: Delimiter) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut vocabulary = BTreeSet::new();
    for field in fields {
        for token in tokens(field.as_ref(), delimiter) {
            vocabulary.insert(token.to_string());
        }
    }
    vocabulary
}

/// Live category vocabulary of the whole catalog
pub async fn extract_categories(store: &dyn CatalogStore) -> AppResult<BTreeSet<String>> {
    let fields = store.category_fields().await?;
    Ok(extract(&fields, Delimiter::CATEGORIES))
}

/// Live author vocabulary of the whole catalog
pub async fn extract_authors(store: &dyn CatalogStore) -> AppResult<BTreeSet<String>> {
    let fields = store.author_fields().await?;
    Ok(extract(&fields, Delimiter::AUTHORS))
}

/// Case-insensitive substring filter over a vocabulary, first `AUTOCOMPLETE_LIMIT` in order
pub fn match_names(vocabulary: &BTreeSet<String>, query: &str) -> Vec<NameHit> {
    let needle = query.to_lowercase();
    vocabulary
        .iter()
        .filter(|name| name.to_lowercase().contains(&needle))
        .take(AUTOCOMPLETE_LIMIT)
        .map(|name| NameHit { name: name.clone() })
        .collect()
}

pub async fn search_authors(store: &dyn CatalogStore, query: &str) -> AppResult<Vec<NameHit>> {
    let authors = extract_authors(store).await?;
    Ok(match_names(&authors, query))
}

pub async fn search_categories(store: &dyn CatalogStore, query: &str) -> AppResult<Vec<NameHit>> {
    let categories = extract_categories(store).await?;
    Ok(match_names(&categories, query))
}

pub async fn search_books(store: &dyn CatalogStore, query: &str) -> AppResult<Vec<BookHit>> {
    store.search_books(query, AUTOCOMPLETE_LIMIT).await
}
