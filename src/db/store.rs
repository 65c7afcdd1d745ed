use chrono::{DateTime, Utc};

use crate::{
    error::AppResult,
    models::{
        discussion::{CommentId, DiscussionId},
        Book, BookHit, BookId, BookSummary, Comment, Discussion, NewBook, NewUser, Profile,
        ProfileId, User, UserId,
    },
};

/// Persistence boundary for the whole service
///
/// Relationship inserts (`insert_*`) are insert-if-absent and must be atomic:
/// two concurrent calls for the same pair leave exactly one row, and exactly
/// one of them reports `true`.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    // Books

    async fn list_books(&self) -> AppResult<Vec<Book>>;

    async fn get_book(&self, id: BookId) -> AppResult<Option<Book>>;

    async fn create_book(&self, book: NewBook) -> AppResult<Book>;

    /// Replaces every field of an existing book; `None` when the id is unknown
    async fn update_book(&self, id: BookId, book: NewBook) -> AppResult<Option<Book>>;

    /// Removes the book together with its favorites and discussions
    async fn delete_book(&self, id: BookId) -> AppResult<bool>;

    /// Every non-empty `categories` value in the catalog
    async fn category_fields(&self) -> AppResult<Vec<String>>;

    /// Every non-empty `authors` value in the catalog
    async fn author_fields(&self) -> AppResult<Vec<String>>;

    /// Case-insensitive substring match on title or subtitle, ordered by id
    async fn search_books(&self, query: &str, limit: usize) -> AppResult<Vec<BookHit>>;

    /// Case-insensitive substring match on title only, ordered by id
    async fn search_books_by_title(&self, query: &str) -> AppResult<Vec<Book>>;

    /// Books carrying at least one of `categories` as a comma-delimited token,
    /// minus `exclude`. Order is unspecified.
    async fn books_in_categories(
        &self,
        categories: &[String],
        exclude: &[BookId],
    ) -> AppResult<Vec<BookSummary>>;

    // Accounts

    /// Creates the user and its profile together; neither exists if either fails.
    async fn create_user(&self, user: NewUser) -> AppResult<(User, Profile)>;

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn profile_for_user(&self, user_id: UserId) -> AppResult<Option<Profile>>;

    /// Records a token digest and drops the user's tokens that already expired
    async fn store_token(
        &self,
        token_hash: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Owner of a token that is still valid at `now`
    async fn user_for_token(&self, token_hash: &str, now: DateTime<Utc>)
        -> AppResult<Option<User>>;

    async fn revoke_token(&self, token_hash: &str) -> AppResult<bool>;

    // Likes

    async fn insert_liked_category(&self, profile_id: ProfileId, category: &str)
        -> AppResult<bool>;

    async fn liked_categories(&self, profile_id: ProfileId) -> AppResult<Vec<String>>;

    async fn insert_liked_author(&self, profile_id: ProfileId, author: &str) -> AppResult<bool>;

    async fn liked_authors(&self, profile_id: ProfileId) -> AppResult<Vec<String>>;

    // Favorites

    async fn insert_favorite(&self, user_id: UserId, book_id: BookId) -> AppResult<bool>;

    async fn delete_favorite(&self, user_id: UserId, book_id: BookId) -> AppResult<bool>;

    /// Favorited books in the order they were added
    async fn favorite_books(&self, user_id: UserId, limit: Option<usize>) -> AppResult<Vec<Book>>;

    // Discussions

    async fn list_discussions(&self) -> AppResult<Vec<Discussion>>;

    async fn get_discussion(&self, id: DiscussionId) -> AppResult<Option<Discussion>>;

    async fn create_discussion(
        &self,
        book_id: BookId,
        title: &str,
        author_id: UserId,
    ) -> AppResult<Discussion>;

    async fn update_discussion(&self, id: DiscussionId, title: &str)
        -> AppResult<Option<Discussion>>;

    async fn delete_discussion(&self, id: DiscussionId) -> AppResult<bool>;

    // Comments

    async fn list_comments(&self, discussion_id: DiscussionId) -> AppResult<Vec<Comment>>;

    async fn get_comment(&self, id: CommentId) -> AppResult<Option<Comment>>;

    async fn create_comment(
        &self,
        discussion_id: DiscussionId,
        content: &str,
        author_id: UserId,
    ) -> AppResult<Comment>;

    async fn update_comment(&self, id: CommentId, content: &str) -> AppResult<Option<Comment>>;

    async fn delete_comment(&self, id: CommentId) -> AppResult<bool>;
}
