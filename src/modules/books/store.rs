//! Persistence for books.

use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;

use super::models::{Book, BookDraft, FieldError};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The record was rejected before reaching the database
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A window of books together with the size of the full filtered set.
#[derive(Debug, Clone, Default)]
pub struct BookPage {
    pub items: Vec<Book>,
    pub total: u64,
}

/// Storage operations the catalog relies on.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Validate and persist a new book.
    async fn insert(&self, draft: &BookDraft) -> Result<Book, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, StoreError>;

    /// Books whose title, author, genre or year contain `filter`, ordered by id.
    ///
    /// `total` counts every match, not just the returned window.
    async fn find_page(
        &self,
        filter: Option<&str>,
        offset: u64,
        limit: u64,
    ) -> Result<BookPage, StoreError>;

    async fn find_all(&self) -> Result<Vec<Book>, StoreError>;

    /// Validate and replace every editable field. `Ok(None)` when the id is unknown.
    async fn update(&self, id: i64, draft: &BookDraft) -> Result<Option<Book>, StoreError>;

    /// Returns true if the book existed and was deleted.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

pub(crate) const CREATE_BOOKS: &str = r#"
    CREATE TABLE books (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        title      TEXT NOT NULL CHECK (length(trim(title)) > 0),
        author     TEXT NOT NULL CHECK (length(trim(author)) > 0),
        genre      TEXT,
        year       TEXT,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
"#;

const COLUMNS: &str = "id, title, author, genre, year, created_at, updated_at";

const MATCHES: &str = "title LIKE ? ESCAPE '\\' OR author LIKE ? ESCAPE '\\' \
     OR genre LIKE ? ESCAPE '\\' OR year LIKE ? ESCAPE '\\'";

/// [`BookStore`] backed by a SQLite pool.
#[derive(Clone)]
pub struct SqliteBookStore {
    pool: SqlitePool,
}

impl SqliteBookStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn check(draft: &BookDraft) -> Result<(), StoreError> {
        let errors = draft.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Validation(errors))
        }
    }
}

#[async_trait]
impl BookStore for SqliteBookStore {
    async fn insert(&self, draft: &BookDraft) -> Result<Book, StoreError> {
        Self::check(draft)?;

        let sql = format!(
            "INSERT INTO books (title, author, genre, year) VALUES (?, ?, ?, ?) RETURNING {COLUMNS}"
        );
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(&draft.title)
            .bind(&draft.author)
            .bind(&draft.genre)
            .bind(&draft.year)
            .fetch_one(&self.pool)
            .await?;

        Ok(book)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM books WHERE id = ?");
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    async fn find_page(
        &self,
        filter: Option<&str>,
        offset: u64,
        limit: u64,
    ) -> Result<BookPage, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        // List and count share one WHERE clause so totals always match the rows
        let (items, total) = match filter {
            Some(term) => {
                let pattern = like_pattern(term);

                let list_sql = format!(
                    "SELECT {COLUMNS} FROM books WHERE {MATCHES} ORDER BY id LIMIT ? OFFSET ?"
                );
                let items = sqlx::query_as::<_, Book>(&list_sql)
                    .bind(&pattern)
                    .bind(&pattern)
                    .bind(&pattern)
                    .bind(&pattern)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?;

                let count_sql = format!("SELECT COUNT(*) FROM books WHERE {MATCHES}");
                let total: i64 = sqlx::query_scalar(&count_sql)
                    .bind(&pattern)
                    .bind(&pattern)
                    .bind(&pattern)
                    .bind(&pattern)
                    .fetch_one(&self.pool)
                    .await?;

                (items, total)
            }
            None => {
                let list_sql = format!("SELECT {COLUMNS} FROM books ORDER BY id LIMIT ? OFFSET ?");
                let items = sqlx::query_as::<_, Book>(&list_sql)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?;

                let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
                    .fetch_one(&self.pool)
                    .await?;

                (items, total)
            }
        };

        Ok(BookPage {
            items,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn find_all(&self) -> Result<Vec<Book>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM books ORDER BY id");
        let books = sqlx::query_as::<_, Book>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    async fn update(&self, id: i64, draft: &BookDraft) -> Result<Option<Book>, StoreError> {
        Self::check(draft)?;

        let sql = format!(
            "UPDATE books \
             SET title = ?, author = ?, genre = ?, year = ?, updated_at = CURRENT_TIMESTAMP \
             WHERE id = ? RETURNING {COLUMNS}"
        );
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(&draft.title)
            .bind(&draft.author)
            .bind(&draft.genre)
            .bind(&draft.year)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// `%term%` with LIKE wildcards in the term matched literally.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
