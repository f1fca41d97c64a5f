//! In-memory fixtures shared by the books tests.

use std::sync::Arc;

use async_trait::async_trait;
use stacks_kernel::settings::CatalogSettings;
use stacks_kernel::Module;

use super::catalog::Catalog;
use super::isbn::{Isbn, IsbnLookup, LookupError};
use super::models::{Book, BookDraft};
use super::store::{BookStore, SqliteBookStore};
use super::BooksModule;

/// Canned [`IsbnLookup`] that never touches the network.
pub struct StubLookup {
    result: Option<BookDraft>,
    fail: bool,
}

impl StubLookup {
    pub fn empty() -> Self {
        Self {
            result: None,
            fail: false,
        }
    }

    pub fn returning(draft: BookDraft) -> Self {
        Self {
            result: Some(draft),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            result: None,
            fail: true,
        }
    }
}

#[async_trait]
impl IsbnLookup for StubLookup {
    async fn lookup(&self, _isbn: &Isbn) -> Result<Option<BookDraft>, LookupError> {
        if self.fail {
            return Err(LookupError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE));
        }
        Ok(self.result.clone())
    }
}

/// A migrated store over a private in-memory database.
pub async fn memory_store() -> SqliteBookStore {
    let pool = stacks_db::connect_in_memory().await.unwrap();
    let migrations: Vec<(String, stacks_kernel::Migration)> = BooksModule::migrations_only()
        .into_iter()
        .map(|migration| ("books".to_string(), migration))
        .collect();
    stacks_db::migrate(&pool, &migrations).await.unwrap();
    SqliteBookStore::new(pool)
}

pub async fn catalog(lookup: StubLookup) -> (Arc<Catalog>, SqliteBookStore) {
    let store = memory_store().await;
    let catalog = Catalog::new(
        Arc::new(store.clone()),
        Arc::new(lookup),
        CatalogSettings::default(),
    );
    (Arc::new(catalog), store)
}

/// Module wired to an in-memory catalog, as the server would mount it.
pub async fn module(lookup: StubLookup) -> (Arc<dyn Module>, SqliteBookStore) {
    let (catalog, store) = catalog(lookup).await;
    (super::create_module(catalog), store)
}

/// A small fixture library; returns the stored books in insertion order.
pub async fn seed(store: &SqliteBookStore) -> Vec<Book> {
    let fixtures = [
        ("The Hobbit", "J.R.R. Tolkien", Some("Fantasy"), Some("1937")),
        ("The Fellowship of the Ring", "J.R.R. Tolkien", Some("Fantasy"), Some("1954")),
        ("The Silmarillion", "J.R.R. Tolkien", Some("Fantasy"), Some("1977")),
        ("A Game of Thrones", "George R.R. Martin", Some("Fantasy"), Some("1996")),
        ("Dune", "Frank Herbert", Some("Science Fiction"), Some("1965")),
        ("Emma", "Jane Austen", Some("Romance"), Some("1815")),
        ("Tolkien: A Biography", "Humphrey Carpenter", Some("Biography"), Some("1977")),
        ("Neuromancer", "William Gibson", None, None),
    ];

    let mut books = Vec::with_capacity(fixtures.len());
    for (title, author, genre, year) in fixtures {
        let draft = BookDraft {
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.map(str::to_string),
            year: year.map(str::to_string),
        };
        books.push(store.insert(&draft).await.unwrap());
    }
    books
}

/// `count` interchangeable books titled "Volume 1", "Volume 2", ...
pub async fn seed_numbered(store: &SqliteBookStore, count: usize) {
    for n in 1..=count {
        let draft = BookDraft {
            title: format!("Volume {n}"),
            author: "Anonymous".to_string(),
            ..BookDraft::default()
        };
        store.insert(&draft).await.unwrap();
    }
}
