use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{
        discussion::{CommentId, DiscussionId},
        Book, BookHit, BookId, BookSummary, Comment, Discussion, NewBook, NewUser, Profile,
        ProfileId, Role, User, UserId,
    },
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

const BOOK_COLUMNS: &str = "id, isbn13, isbn10, title, subtitle, authors, categories, thumbnail, \
     description, published_year, average_rating::FLOAT8 AS average_rating, num_pages, ratings_count";

const FAVORITE_BOOK_COLUMNS: &str = "b.id, b.isbn13, b.isbn10, b.title, b.subtitle, b.authors, \
     b.categories, b.thumbnail, b.description, b.published_year, \
     b.average_rating::FLOAT8 AS average_rating, b.num_pages, b.ratings_count";

const SUMMARY_COLUMNS: &str = "id, title, subtitle, authors, categories, thumbnail, description, \
     published_year, average_rating::FLOAT8 AS average_rating";

const USER_COLUMNS: &str =
    "id, email, phone_number, full_name, password_hash, role, is_active, is_staff, date_joined";

/// Escapes LIKE metacharacters and wraps the query for substring matching
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn unique_violation(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::InvalidInput(message.to_string())
        }
        _ => AppError::Database(err),
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    phone_number: String,
    full_name: String,
    password_hash: String,
    role: String,
    is_active: bool,
    is_staff: bool,
    date_joined: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row.role.parse().map_err(AppError::Internal)?;
        Ok(User {
            id: row.id,
            email: row.email,
            phone_number: row.phone_number,
            full_name: row.full_name,
            role,
            is_active: row.is_active,
            is_staff: row.is_staff,
            date_joined: row.date_joined,
            password_hash: row.password_hash,
        })
    }
}

/// Store backed by PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CatalogStore for PgStore {
    async fn list_books(&self) -> AppResult<Vec<Book>> {
        let sql = format!("SELECT {} FROM books ORDER BY id", BOOK_COLUMNS);
        Ok(sqlx::query_as::<_, Book>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_book(&self, id: BookId) -> AppResult<Option<Book>> {
        let sql = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);
        Ok(sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_book(&self, book: NewBook) -> AppResult<Book> {
        let sql = format!(
            r#"
            INSERT INTO books (isbn13, isbn10, title, subtitle, authors, categories, thumbnail,
                               description, published_year, average_rating, num_pages, ratings_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );
        sqlx::query_as::<_, Book>(&sql)
            .bind(book.isbn13)
            .bind(book.isbn10)
            .bind(book.title)
            .bind(book.subtitle)
            .bind(book.authors)
            .bind(book.categories)
            .bind(book.thumbnail)
            .bind(book.description)
            .bind(book.published_year)
            .bind(book.average_rating)
            .bind(book.num_pages)
            .bind(book.ratings_count)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_violation(e, "A book with this ISBN already exists"))
    }

    async fn update_book(&self, id: BookId, book: NewBook) -> AppResult<Option<Book>> {
        let sql = format!(
            r#"
            UPDATE books
            SET isbn13 = $2, isbn10 = $3, title = $4, subtitle = $5, authors = $6,
                categories = $7, thumbnail = $8, description = $9, published_year = $10,
                average_rating = $11, num_pages = $12, ratings_count = $13
            WHERE id = $1
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );
        sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .bind(book.isbn13)
            .bind(book.isbn10)
            .bind(book.title)
            .bind(book.subtitle)
            .bind(book.authors)
            .bind(book.categories)
            .bind(book.thumbnail)
            .bind(book.description)
            .bind(book.published_year)
            .bind(book.average_rating)
            .bind(book.num_pages)
            .bind(book.ratings_count)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| unique_violation(e, "A book with this ISBN already exists"))
    }

    async fn delete_book(&self, id: BookId) -> AppResult<bool> {
        // favorites, discussions and their comments go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn category_fields(&self) -> AppResult<Vec<String>> {
        Ok(sqlx::query_scalar::<_, String>(
            "SELECT categories FROM books WHERE categories IS NOT NULL AND categories <> ''",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn author_fields(&self) -> AppResult<Vec<String>> {
        Ok(
            sqlx::query_scalar::<_, String>("SELECT authors FROM books WHERE authors <> ''")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn search_books(&self, query: &str, limit: usize) -> AppResult<Vec<BookHit>> {
        Ok(sqlx::query_as::<_, BookHit>(
            r#"
            SELECT id, title, subtitle
            FROM books
            WHERE title ILIKE $1 OR subtitle ILIKE $1
            ORDER BY id
            LIMIT $2
            "#,
        )
        .bind(like_pattern(query))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn search_books_by_title(&self, query: &str) -> AppResult<Vec<Book>> {
        let sql = format!(
            "SELECT {} FROM books WHERE title ILIKE $1 ORDER BY id",
            BOOK_COLUMNS
        );
        Ok(sqlx::query_as::<_, Book>(&sql)
            .bind(like_pattern(query))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn books_in_categories(
        &self,
        categories: &[String],
        exclude: &[BookId],
    ) -> AppResult<Vec<BookSummary>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM books
            WHERE NOT (id = ANY($2))
              AND EXISTS (
                  SELECT 1
                  FROM unnest(string_to_array(categories, ',')) AS token
                  WHERE btrim(token) = ANY($1)
              )
            "#,
            SUMMARY_COLUMNS
        );
        Ok(sqlx::query_as::<_, BookSummary>(&sql)
            .bind(categories)
            .bind(exclude)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_user(&self, user: NewUser) -> AppResult<(User, Profile)> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO users (email, phone_number, full_name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.email)
            .bind(&user.phone_number)
            .bind(&user.full_name)
            .bind(&user.password_hash)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| unique_violation(e, "User with this email or phone number already exists"))?;

        let profile = sqlx::query_as::<_, Profile>(
            "INSERT INTO profiles (user_id) VALUES ($1) RETURNING id, user_id, bio, website",
        )
        .bind(row.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((User::try_from(row)?, profile))
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn profile_for_user(&self, user_id: UserId) -> AppResult<Option<Profile>> {
        Ok(sqlx::query_as::<_, Profile>(
            "SELECT id, user_id, bio, website FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn store_token(
        &self,
        token_hash: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            WITH pruned AS (
                DELETE FROM auth_tokens WHERE user_id = $2 AND expires_at <= NOW()
            )
            INSERT INTO auth_tokens (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn user_for_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM users
            WHERE id = (
                SELECT user_id FROM auth_tokens WHERE token_hash = $1 AND expires_at > $2
            )
            "#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(token_hash)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn revoke_token(&self, token_hash: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_liked_category(
        &self,
        profile_id: ProfileId,
        category: &str,
    ) -> AppResult<bool> {
        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO liked_categories (profile_id, category)
            VALUES ($1, $2)
            ON CONFLICT (profile_id, category) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(profile_id)
        .bind(category)
        .fetch_optional(&self.pool)
        .await?;
        Ok(inserted.is_some())
    }

    async fn liked_categories(&self, profile_id: ProfileId) -> AppResult<Vec<String>> {
        Ok(sqlx::query_scalar::<_, String>(
            "SELECT category FROM liked_categories WHERE profile_id = $1 ORDER BY id",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_liked_author(&self, profile_id: ProfileId, author: &str) -> AppResult<bool> {
        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO liked_authors (profile_id, author)
            VALUES ($1, $2)
            ON CONFLICT (profile_id, author) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(profile_id)
        .bind(author)
        .fetch_optional(&self.pool)
        .await?;
        Ok(inserted.is_some())
    }

    async fn liked_authors(&self, profile_id: ProfileId) -> AppResult<Vec<String>> {
        Ok(sqlx::query_scalar::<_, String>(
            "SELECT author FROM liked_authors WHERE profile_id = $1 ORDER BY id",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_favorite(&self, user_id: UserId, book_id: BookId) -> AppResult<bool> {
        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO favorite_books (user_id, book_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, book_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(inserted.is_some())
    }

    async fn delete_favorite(&self, user_id: UserId, book_id: BookId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM favorite_books WHERE user_id = $1 AND book_id = $2")
            .bind(user_id)
            .bind(book_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn favorite_books(&self, user_id: UserId, limit: Option<usize>) -> AppResult<Vec<Book>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM favorite_books f
            JOIN books b ON b.id = f.book_id
            WHERE f.user_id = $1
            ORDER BY f.id
            LIMIT $2
            "#,
            FAVORITE_BOOK_COLUMNS
        );
        // LIMIT NULL means no limit
        Ok(sqlx::query_as::<_, Book>(&sql)
            .bind(user_id)
            .bind(limit.map(|l| l as i64))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_discussions(&self) -> AppResult<Vec<Discussion>> {
        Ok(sqlx::query_as::<_, Discussion>(
            "SELECT id, book_id, title, author_id, created_at, updated_at FROM discussions ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_discussion(&self, id: DiscussionId) -> AppResult<Option<Discussion>> {
        Ok(sqlx::query_as::<_, Discussion>(
            "SELECT id, book_id, title, author_id, created_at, updated_at FROM discussions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_discussion(
        &self,
        book_id: BookId,
        title: &str,
        author_id: UserId,
    ) -> AppResult<Discussion> {
        Ok(sqlx::query_as::<_, Discussion>(
            r#"
            INSERT INTO discussions (book_id, title, author_id)
            VALUES ($1, $2, $3)
            RETURNING id, book_id, title, author_id, created_at, updated_at
            "#,
        )
        .bind(book_id)
        .bind(title)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_discussion(
        &self,
        id: DiscussionId,
        title: &str,
    ) -> AppResult<Option<Discussion>> {
        Ok(sqlx::query_as::<_, Discussion>(
            r#"
            UPDATE discussions SET title = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, book_id, title, author_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_discussion(&self, id: DiscussionId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM discussions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(&self, discussion_id: DiscussionId) -> AppResult<Vec<Comment>> {
        Ok(sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, discussion_id, content, author_id, created_at, updated_at
            FROM comments WHERE discussion_id = $1 ORDER BY id
            "#,
        )
        .bind(discussion_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_comment(&self, id: CommentId) -> AppResult<Option<Comment>> {
        Ok(sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, discussion_id, content, author_id, created_at, updated_at
            FROM comments WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_comment(
        &self,
        discussion_id: DiscussionId,
        content: &str,
        author_id: UserId,
    ) -> AppResult<Comment> {
        Ok(sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (discussion_id, content, author_id)
            VALUES ($1, $2, $3)
            RETURNING id, discussion_id, content, author_id, created_at, updated_at
            "#,
        )
        .bind(discussion_id)
        .bind(content)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_comment(&self, id: CommentId, content: &str) -> AppResult<Option<Comment>> {
        Ok(sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments SET content = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, discussion_id, content, author_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_comment(&self, id: CommentId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("war"), "%war%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }

    #[test]
    fn test_user_row_with_unknown_role_is_rejected() {
        let row = UserRow {
            id: 1,
            email: "a@example.com".to_string(),
            phone_number: "1".to_string(),
            full_name: "A".to_string(),
            password_hash: String::new(),
            role: "admin".to_string(),
            is_active: true,
            is_staff: false,
            date_joined: Utc::now(),
        };
        assert!(User::try_from(row).is_err());
    }

    // sqlx::test provisions a fresh database per test from DATABASE_URL

    fn sample_book(seq: u32, title: &str, categories: Option<&str>) -> NewBook {
        NewBook {
            isbn13: format!("978{:010}", seq),
            isbn10: format!("{:010}", seq),
            title: title.to_string(),
            subtitle: None,
            authors: "Unknown".to_string(),
            categories: categories.map(str::to_string),
            thumbnail: None,
            description: None,
            published_year: None,
            average_rating: Some(4.25),
            num_pages: None,
            ratings_count: None,
        }
    }

    async fn reader(store: &PgStore, seq: u32) -> (User, Profile) {
        store
            .create_user(NewUser {
                email: format!("reader{}@example.com", seq),
                phone_number: format!("+7000{:07}", seq),
                full_name: "Reader".to_string(),
                password_hash: "x".to_string(),
            })
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_candidates_match_trimmed_category_tokens(pool: PgPool) {
        let store = PgStore::new(pool);
        let a = store.create_book(sample_book(1, "A", Some("Sci-Fi"))).await.unwrap();
        let b = store
            .create_book(sample_book(2, "B", Some("Drama, Sci-Fi")))
            .await
            .unwrap();
        store.create_book(sample_book(3, "C", Some("Romance"))).await.unwrap();
        store.create_book(sample_book(4, "D", Some("Sci-Fi Classics"))).await.unwrap();

        let liked = vec!["Sci-Fi".to_string()];
        let mut ids: Vec<BookId> = store
            .books_in_categories(&liked, &[])
            .await
            .unwrap()
            .iter()
            .map(|s| s.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec![a.id, b.id]);

        let remaining = store.books_in_categories(&liked, &[a.id]).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, b.id);
        assert_eq!(remaining[0].average_rating, Some(4.25));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_double_like_inserts_once(pool: PgPool) {
        let store = PgStore::new(pool);
        let (_, profile) = reader(&store, 1).await;

        assert!(store.insert_liked_category(profile.id, "Drama").await.unwrap());
        assert!(!store.insert_liked_category(profile.id, "Drama").await.unwrap());
        assert!(store.insert_liked_author(profile.id, "Neil Gaiman").await.unwrap());
        assert!(!store.insert_liked_author(profile.id, "Neil Gaiman").await.unwrap());

        assert_eq!(store.liked_categories(profile.id).await.unwrap(), vec!["Drama"]);
        assert_eq!(store.liked_authors(profile.id).await.unwrap(), vec!["Neil Gaiman"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_concurrent_favorite_inserts_once(pool: PgPool) {
        let store = PgStore::new(pool.clone());
        let (user, _) = reader(&store, 1).await;
        let book = store.create_book(sample_book(1, "Dune", None)).await.unwrap();

        let (user_id, book_id) = (user.id, book.id);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.insert_favorite(user_id, book_id).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);

        let rows: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM favorite_books WHERE user_id = $1 AND book_id = $2",
        )
        .bind(user.id)
        .bind(book.id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(rows, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_favorite_books_limit_is_optional(pool: PgPool) {
        let store = PgStore::new(pool);
        let (user, _) = reader(&store, 1).await;
        for seq in 0..3 {
            let book = store
                .create_book(sample_book(seq, &format!("Book {}", seq), None))
                .await
                .unwrap();
            store.insert_favorite(user.id, book.id).await.unwrap();
        }

        let all = store.favorite_books(user.id, None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].title, "Book 0");

        let first = store.favorite_books(user.id, Some(1)).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].title, "Book 0");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_expired_tokens_are_ignored_and_pruned(pool: PgPool) {
        let store = PgStore::new(pool.clone());
        let (user, _) = reader(&store, 1).await;
        let now = Utc::now();

        store
            .store_token("stale", user.id, now - chrono::Duration::minutes(1))
            .await
            .unwrap();
        assert!(store.user_for_token("stale", now).await.unwrap().is_none());

        store
            .store_token("fresh", user.id, now + chrono::Duration::hours(1))
            .await
            .unwrap();
        let found = store.user_for_token("fresh", now).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM auth_tokens WHERE user_id = $1")
            .bind(user.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);

        assert!(store.revoke_token("fresh").await.unwrap());
        assert!(store.user_for_token("fresh", now).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_book_cascades(pool: PgPool) {
        let store = PgStore::new(pool);
        let (user, _) = reader(&store, 1).await;
        let book = store.create_book(sample_book(1, "Dune", None)).await.unwrap();
        store.insert_favorite(user.id, book.id).await.unwrap();
        let discussion = store
            .create_discussion(book.id, "Spice", user.id)
            .await
            .unwrap();

        assert!(store.delete_book(book.id).await.unwrap());
        assert!(!store.delete_book(book.id).await.unwrap());
        assert!(store.favorite_books(user.id, None).await.unwrap().is_empty());
        assert!(store.get_discussion(discussion.id).await.unwrap().is_none());
    }
}
