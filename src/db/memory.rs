use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{
        discussion::{CommentId, DiscussionId},
        Book, BookHit, BookId, BookSummary, Comment, Discussion, NewBook, NewUser, Profile,
        ProfileId, Role, User, UserId,
    },
    services::taxonomy::{tokens, Delimiter},
};

/// In-process store backed by ordered maps
///
/// Every mutation happens under a single write lock, so insert-if-absent is
/// atomic without further coordination.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    books: BTreeMap<BookId, Book>,
    users: BTreeMap<UserId, User>,
    profiles: BTreeMap<ProfileId, Profile>,
    tokens: HashMap<String, (UserId, DateTime<Utc>)>,
    liked_categories: Vec<(ProfileId, String)>,
    liked_authors: Vec<(ProfileId, String)>,
    favorites: Vec<(UserId, BookId, DateTime<Utc>)>,
    discussions: BTreeMap<DiscussionId, Discussion>,
    comments: BTreeMap<CommentId, Comment>,
    last_id: i64,
}

impl MemoryInner {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn stored_book(id: BookId, book: NewBook) -> Book {
    Book {
        id,
        isbn13: book.isbn13,
        isbn10: book.isbn10,
        title: book.title,
        subtitle: book.subtitle,
        authors: book.authors,
        categories: book.categories,
        thumbnail: book.thumbnail,
        description: book.description,
        published_year: book.published_year,
        average_rating: book.average_rating,
        num_pages: book.num_pages,
        ratings_count: book.ratings_count,
    }
}

fn isbn_taken(inner: &MemoryInner, book: &NewBook, except: Option<BookId>) -> bool {
    inner.books.values().any(|b| {
        Some(b.id) != except && (b.isbn13 == book.isbn13 || b.isbn10 == book.isbn10)
    })
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Changes the role of an existing account
    pub async fn set_role(&self, user_id: UserId, role: Role) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.role = role;
        Ok(())
    }

    /// Number of stored like rows for a profile, duplicates included
    pub async fn liked_category_rows(&self, profile_id: ProfileId) -> usize {
        let inner = self.inner.read().await;
        inner
            .liked_categories
            .iter()
            .filter(|(owner, _)| *owner == profile_id)
            .count()
    }

    /// Number of token digests currently stored for a user, expired ones included
    pub async fn token_rows(&self, user_id: UserId) -> usize {
        let inner = self.inner.read().await;
        inner
            .tokens
            .values()
            .filter(|(owner, _)| *owner == user_id)
            .count()
    }

    /// Number of stored favorite rows for a pair, duplicates included
    pub async fn favorite_rows(&self, user_id: UserId, book_id: BookId) -> usize {
        let inner = self.inner.read().await;
        inner
            .favorites
            .iter()
            .filter(|(user, book, _)| *user == user_id && *book == book_id)
            .count()
    }
}

#[async_trait::async_trait]
impl CatalogStore for MemoryStore {
    async fn list_books(&self) -> AppResult<Vec<Book>> {
        Ok(self.inner.read().await.books.values().cloned().collect())
    }

    async fn get_book(&self, id: BookId) -> AppResult<Option<Book>> {
        Ok(self.inner.read().await.books.get(&id).cloned())
    }

    async fn create_book(&self, book: NewBook) -> AppResult<Book> {
        let mut inner = self.inner.write().await;
        if isbn_taken(&inner, &book, None) {
            return Err(AppError::InvalidInput(
                "A book with this ISBN already exists".to_string(),
            ));
        }

        let id = inner.next_id();
        let created = stored_book(id, book);
        inner.books.insert(id, created.clone());
        Ok(created)
    }

    async fn update_book(&self, id: BookId, book: NewBook) -> AppResult<Option<Book>> {
        let mut inner = self.inner.write().await;
        if !inner.books.contains_key(&id) {
            return Ok(None);
        }
        if isbn_taken(&inner, &book, Some(id)) {
            return Err(AppError::InvalidInput(
                "A book with this ISBN already exists".to_string(),
            ));
        }

        let updated = stored_book(id, book);
        inner.books.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete_book(&self, id: BookId) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        if inner.books.remove(&id).is_none() {
            return Ok(false);
        }

        inner.favorites.retain(|(_, book, _)| *book != id);
        let orphaned: Vec<DiscussionId> = inner
            .discussions
            .values()
            .filter(|d| d.book_id == id)
            .map(|d| d.id)
            .collect();
        inner.discussions.retain(|_, d| d.book_id != id);
        inner
            .comments
            .retain(|_, c| !orphaned.contains(&c.discussion_id));
        Ok(true)
    }

    async fn category_fields(&self) -> AppResult<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner
            .books
            .values()
            .filter_map(|b| b.categories.clone())
            .filter(|c| !c.is_empty())
            .collect())
    }

    async fn author_fields(&self) -> AppResult<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner
            .books
            .values()
            .map(|b| b.authors.clone())
            .filter(|a| !a.is_empty())
            .collect())
    }

    async fn search_books(&self, query: &str, limit: usize) -> AppResult<Vec<BookHit>> {
        let needle = query.to_lowercase();
        let inner = self.inner.read().await;
        Ok(inner
            .books
            .values()
            .filter(|b| {
                contains_ci(&b.title, &needle)
                    || b.subtitle.as_deref().is_some_and(|s| contains_ci(s, &needle))
            })
            .take(limit)
            .map(|b| BookHit {
                id: b.id,
                title: b.title.clone(),
                subtitle: b.subtitle.clone(),
            })
            .collect())
    }

    async fn search_books_by_title(&self, query: &str) -> AppResult<Vec<Book>> {
        let needle = query.to_lowercase();
        let inner = self.inner.read().await;
        Ok(inner
            .books
            .values()
            .filter(|b| contains_ci(&b.title, &needle))
            .cloned()
            .collect())
    }

    async fn books_in_categories(
        &self,
        categories: &[String],
        exclude: &[BookId],
    ) -> AppResult<Vec<BookSummary>> {
        let inner = self.inner.read().await;
        Ok(inner
            .books
            .values()
            .filter(|b| !exclude.contains(&b.id))
            .filter(|b| {
                b.categories.as_deref().is_some_and(|field| {
                    tokens(field, Delimiter::CATEGORIES)
                        .any(|token| categories.iter().any(|c| c == token))
                })
            })
            .map(BookSummary::from)
            .collect())
    }

    async fn create_user(&self, user: NewUser) -> AppResult<(User, Profile)> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(AppError::InvalidInput(
                "User with this email already exists".to_string(),
            ));
        }
        if inner
            .users
            .values()
            .any(|u| u.phone_number == user.phone_number)
        {
            return Err(AppError::InvalidInput(
                "User with this phone number already exists".to_string(),
            ));
        }

        let user_id = inner.next_id();
        let created = User {
            id: user_id,
            email: user.email,
            phone_number: user.phone_number,
            full_name: user.full_name,
            role: Role::User,
            is_active: true,
            is_staff: false,
            date_joined: Utc::now(),
            password_hash: user.password_hash,
        };
        let profile_id = inner.next_id();
        let profile = Profile {
            id: profile_id,
            user_id,
            bio: String::new(),
            website: String::new(),
        };
        inner.users.insert(user_id, created.clone());
        inner.profiles.insert(profile_id, profile.clone());
        Ok((created, profile))
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn profile_for_user(&self, user_id: UserId) -> AppResult<Option<Profile>> {
        let inner = self.inner.read().await;
        Ok(inner
            .profiles
            .values()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn store_token(
        &self,
        token_hash: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        inner
            .tokens
            .retain(|_, (owner, expiry)| *owner != user_id || *expiry > now);
        inner
            .tokens
            .insert(token_hash.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn user_for_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tokens
            .get(token_hash)
            .filter(|(_, expires_at)| *expires_at > now)
            .and_then(|(id, _)| inner.users.get(id))
            .cloned())
    }

    async fn revoke_token(&self, token_hash: &str) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.tokens.remove(token_hash).is_some())
    }

    async fn insert_liked_category(
        &self,
        profile_id: ProfileId,
        category: &str,
    ) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        if inner
            .liked_categories
            .iter()
            .any(|(owner, c)| *owner == profile_id && c == category)
        {
            return Ok(false);
        }
        inner
            .liked_categories
            .push((profile_id, category.to_string()));
        Ok(true)
    }

    async fn liked_categories(&self, profile_id: ProfileId) -> AppResult<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner
            .liked_categories
            .iter()
            .filter(|(owner, _)| *owner == profile_id)
            .map(|(_, c)| c.clone())
            .collect())
    }

    async fn insert_liked_author(&self, profile_id: ProfileId, author: &str) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        if inner
            .liked_authors
            .iter()
            .any(|(owner, a)| *owner == profile_id && a == author)
        {
            return Ok(false);
        }
        inner.liked_authors.push((profile_id, author.to_string()));
        Ok(true)
    }

    async fn liked_authors(&self, profile_id: ProfileId) -> AppResult<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner
            .liked_authors
            .iter()
            .filter(|(owner, _)| *owner == profile_id)
            .map(|(_, a)| a.clone())
            .collect())
    }

    async fn insert_favorite(&self, user_id: UserId, book_id: BookId) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        if inner
            .favorites
            .iter()
            .any(|(user, book, _)| *user == user_id && *book == book_id)
        {
            return Ok(false);
        }
        inner.favorites.push((user_id, book_id, Utc::now()));
        Ok(true)
    }

    async fn delete_favorite(&self, user_id: UserId, book_id: BookId) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.favorites.len();
        inner
            .favorites
            .retain(|(user, book, _)| !(*user == user_id && *book == book_id));
        Ok(inner.favorites.len() < before)
    }

    async fn favorite_books(&self, user_id: UserId, limit: Option<usize>) -> AppResult<Vec<Book>> {
        let inner = self.inner.read().await;
        Ok(inner
            .favorites
            .iter()
            .filter(|(user, _, _)| *user == user_id)
            .filter_map(|(_, book, _)| inner.books.get(book))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn list_discussions(&self) -> AppResult<Vec<Discussion>> {
        Ok(self
            .inner
            .read()
            .await
            .discussions
            .values()
            .cloned()
            .collect())
    }

    async fn get_discussion(&self, id: DiscussionId) -> AppResult<Option<Discussion>> {
        Ok(self.inner.read().await.discussions.get(&id).cloned())
    }

    async fn create_discussion(
        &self,
        book_id: BookId,
        title: &str,
        author_id: UserId,
    ) -> AppResult<Discussion> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let now = Utc::now();
        let discussion = Discussion {
            id,
            book_id,
            title: title.to_string(),
            author_id,
            created_at: now,
            updated_at: now,
        };
        inner.discussions.insert(id, discussion.clone());
        Ok(discussion)
    }

    async fn update_discussion(
        &self,
        id: DiscussionId,
        title: &str,
    ) -> AppResult<Option<Discussion>> {
        let mut inner = self.inner.write().await;
        Ok(inner.discussions.get_mut(&id).map(|discussion| {
            discussion.title = title.to_string();
            discussion.updated_at = Utc::now();
            discussion.clone()
        }))
    }

    async fn delete_discussion(&self, id: DiscussionId) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let removed = inner.discussions.remove(&id).is_some();
        if removed {
            inner.comments.retain(|_, c| c.discussion_id != id);
        }
        Ok(removed)
    }

    async fn list_comments(&self, discussion_id: DiscussionId) -> AppResult<Vec<Comment>> {
        let inner = self.inner.read().await;
        Ok(inner
            .comments
            .values()
            .filter(|c| c.discussion_id == discussion_id)
            .cloned()
            .collect())
    }

    async fn get_comment(&self, id: CommentId) -> AppResult<Option<Comment>> {
        Ok(self.inner.read().await.comments.get(&id).cloned())
    }

    async fn create_comment(
        &self,
        discussion_id: DiscussionId,
        content: &str,
        author_id: UserId,
    ) -> AppResult<Comment> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let now = Utc::now();
        let comment = Comment {
            id,
            discussion_id,
            content: content.to_string(),
            author_id,
            created_at: now,
            updated_at: now,
        };
        inner.comments.insert(id, comment.clone());
        Ok(comment)
    }

    async fn update_comment(&self, id: CommentId, content: &str) -> AppResult<Option<Comment>> {
        let mut inner = self.inner.write().await;
        Ok(inner.comments.get_mut(&id).map(|comment| {
            comment.content = content.to_string();
            comment.updated_at = Utc::now();
            comment.clone()
        }))
    }

    async fn delete_comment(&self, id: CommentId) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.comments.remove(&id).is_some())
    }
}
