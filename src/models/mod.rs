use serde::{Deserialize, Serialize};

pub mod discussion;
pub mod user;

pub use discussion::{Comment, Discussion};
pub use user::{NewUser, Profile, Role, User};

pub type BookId = i64;
pub type UserId = i64;
pub type ProfileId = i64;

/// A catalog record. Written by bulk import, read-only for the rest of the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Book {
    pub id: BookId,
    pub isbn13: String,
    pub isbn10: String,
    pub title: String,
    pub subtitle: Option<String>,
    /// `;`-delimited author names
    pub authors: String,
    /// `,`-delimited category names
    pub categories: Option<String>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub published_year: Option<i32>,
    pub average_rating: Option<f64>,
    pub num_pages: Option<i32>,
    pub ratings_count: Option<i32>,
}

/// Fields accepted when a moderator adds a book by hand
#[derive(Debug, Clone, Deserialize)]
pub struct NewBook {
    pub isbn13: String,
    pub isbn10: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub authors: String,
    #[serde(default)]
    pub categories: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub published_year: Option<i32>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub num_pages: Option<i32>,
    #[serde(default)]
    pub ratings_count: Option<i32>,
}

/// Partial book edit; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookPatch {
    pub isbn13: Option<String>,
    pub isbn10: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub authors: Option<String>,
    pub categories: Option<String>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub published_year: Option<i32>,
    pub average_rating: Option<f64>,
    pub num_pages: Option<i32>,
    pub ratings_count: Option<i32>,
}

impl BookPatch {
    pub fn apply(self, book: Book) -> NewBook {
        NewBook {
            isbn13: self.isbn13.unwrap_or(book.isbn13),
            isbn10: self.isbn10.unwrap_or(book.isbn10),
            title: self.title.unwrap_or(book.title),
            subtitle: self.subtitle.or(book.subtitle),
            authors: self.authors.unwrap_or(book.authors),
            categories: self.categories.or(book.categories),
            thumbnail: self.thumbnail.or(book.thumbnail),
            description: self.description.or(book.description),
            published_year: self.published_year.or(book.published_year),
            average_rating: self.average_rating.or(book.average_rating),
            num_pages: self.num_pages.or(book.num_pages),
            ratings_count: self.ratings_count.or(book.ratings_count),
        }
    }
}

/// Projection of a book embedded in recommendation prompts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct BookSummary {
    pub id: BookId,
    pub title: String,
    pub subtitle: Option<String>,
    pub authors: String,
    pub categories: Option<String>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub published_year: Option<i32>,
    pub average_rating: Option<f64>,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            subtitle: book.subtitle.clone(),
            authors: book.authors.clone(),
            categories: book.categories.clone(),
            thumbnail: book.thumbnail.clone(),
            description: book.description.clone(),
            published_year: book.published_year,
            average_rating: book.average_rating,
        }
    }
}

/// A favorite as listed back to its owner
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct FavoriteView {
    pub title: String,
    pub authors: String,
    pub isbn13: String,
}

impl From<&Book> for FavoriteView {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            authors: book.authors.clone(),
            isbn13: book.isbn13.clone(),
        }
    }
}

/// Autocomplete hit for a book
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct BookHit {
    pub id: BookId,
    pub title: String,
    pub subtitle: Option<String>,
}

/// Autocomplete hit for an author or category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NameHit {
    pub name: String,
}

/// One entry of a recommendation returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub id: BookId,
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_book() -> Book {
        Book {
            id: 7,
            isbn13: "9780002005883".to_string(),
            isbn10: "0002005883".to_string(),
            title: "Gilead".to_string(),
            subtitle: None,
            authors: "Marilynne Robinson".to_string(),
            categories: Some("Fiction".to_string()),
            thumbnail: None,
            description: Some("A novel".to_string()),
            published_year: Some(2004),
            average_rating: Some(3.85),
            num_pages: Some(247),
            ratings_count: Some(361),
        }
    }

    #[test]
    fn test_summary_projection() {
        let book = sample_book();
        let summary = BookSummary::from(&book);
        assert_eq!(summary.id, 7);
        assert_eq!(summary.title, "Gilead");
        assert_eq!(summary.categories.as_deref(), Some("Fiction"));
        assert_eq!(summary.average_rating, Some(3.85));
    }

    #[test]
    fn test_favorite_view_projection() {
        let view = FavoriteView::from(&sample_book());
        assert_eq!(view.isbn13, "9780002005883");
        assert_eq!(view.authors, "Marilynne Robinson");
    }

    #[test]
    fn test_recommendation_deserialization() {
        let parsed: Vec<Recommendation> =
            serde_json::from_str(r#"[{"id": 3, "comment": "Похожий стиль"}]"#).unwrap();
        assert_eq!(parsed[0].id, 3);
        assert_eq!(parsed[0].comment, "Похожий стиль");
    }
}
