//! Request-level catalog operations.
//!
//! Every operation returns an explicit outcome: success, a rejected submission
//! carrying field errors, or "not found" as `None`. Only infrastructure
//! failures travel as `Err`.

use std::sync::Arc;

use stacks_http::error::AppError;
use stacks_kernel::settings::CatalogSettings;
use thiserror::Error;

use super::isbn::{Isbn, IsbnLookup, LookupError};
use super::models::{Book, BookChanges, BookDraft, FieldError};
use super::paging::{ListParams, PageResult, SearchQuery};
use super::store::{BookStore, StoreError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to retrieve or persist books: {0}")]
    Store(#[from] StoreError),

    #[error("ISBN lookup failed: {0}")]
    Lookup(#[from] LookupError),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Lookup(err) => AppError::external_service("google-books", err.to_string()),
            CatalogError::Store(err) => AppError::Internal(anyhow::Error::new(err)),
        }
    }
}

/// Result of a create or update attempt.
#[derive(Debug)]
pub enum Submission {
    Saved(Book),
    /// Nothing was written; `draft` echoes what the user submitted.
    Rejected {
        id: Option<i64>,
        draft: BookDraft,
        errors: Vec<FieldError>,
    },
}

/// Result of an ISBN-assisted prefill.
#[derive(Debug)]
pub enum IsbnOutcome {
    Found(BookDraft),
    NoResults(Isbn),
    /// The input was not an ISBN; the metadata service was not called.
    Invalid {
        input: String,
        errors: Vec<FieldError>,
    },
}

/// The book catalog request handler.
///
/// Holds no per-request state; one instance serves every request.
pub struct Catalog {
    store: Arc<dyn BookStore>,
    isbn: Arc<dyn IsbnLookup>,
    settings: CatalogSettings,
}

impl Catalog {
    pub fn new(
        store: Arc<dyn BookStore>,
        isbn: Arc<dyn IsbnLookup>,
        settings: CatalogSettings,
    ) -> Self {
        Self {
            store,
            isbn,
            settings,
        }
    }

    /// Normalize raw list parameters with this catalog's paging settings.
    pub fn query(&self, params: &ListParams) -> SearchQuery {
        SearchQuery::from_params(params, &self.settings)
    }

    /// One page of books, optionally filtered by a search term.
    ///
    /// A page past the end yields no items but still reports the true totals.
    pub async fn list(&self, query: &SearchQuery) -> Result<PageResult, CatalogError> {
        let page = self
            .store
            .find_page(query.term.as_deref(), query.offset(), query.page_size)
            .await?;

        tracing::debug!(
            term = ?query.term,
            page = query.page,
            page_size = query.page_size,
            total = page.total,
            returned = page.items.len(),
            "listed books"
        );

        Ok(PageResult::new(
            query,
            page.items,
            page.total,
            self.settings.page_window,
        ))
    }

    pub async fn all(&self) -> Result<Vec<Book>, CatalogError> {
        Ok(self.store.find_all().await?)
    }

    pub async fn find(&self, id: i64) -> Result<Option<Book>, CatalogError> {
        Ok(self.store.find_by_id(id).await?)
    }

    pub async fn create(&self, draft: BookDraft) -> Result<Submission, CatalogError> {
        let draft = draft.normalized();

        match self.store.insert(&draft).await {
            Ok(book) => {
                tracing::info!(book_id = book.id, title = %book.title, "book created");
                Ok(Submission::Saved(book))
            }
            Err(StoreError::Validation(errors)) => {
                tracing::debug!(?errors, "book creation rejected");
                Ok(Submission::Rejected {
                    id: None,
                    draft,
                    errors,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Apply a partial update. `None` when no book has this id.
    pub async fn update(
        &self,
        id: i64,
        changes: BookChanges,
    ) -> Result<Option<Submission>, CatalogError> {
        let Some(existing) = self.store.find_by_id(id).await? else {
            return Ok(None);
        };

        let draft = changes.apply_to(&existing).normalized();

        match self.store.update(id, &draft).await {
            Ok(Some(book)) => {
                tracing::info!(book_id = book.id, "book updated");
                Ok(Some(Submission::Saved(book)))
            }
            // Deleted between the lookup and the write
            Ok(None) => Ok(None),
            Err(StoreError::Validation(errors)) => {
                tracing::debug!(book_id = id, ?errors, "book update rejected");
                Ok(Some(Submission::Rejected {
                    id: Some(id),
                    draft,
                    errors,
                }))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Permanently remove a book, returning it. `None` when no book has this id.
    pub async fn delete(&self, id: i64) -> Result<Option<Book>, CatalogError> {
        let Some(book) = self.store.find_by_id(id).await? else {
            return Ok(None);
        };

        if !self.store.delete(id).await? {
            return Ok(None);
        }

        tracing::info!(book_id = id, title = %book.title, "book deleted");
        Ok(Some(book))
    }

    pub async fn lookup_isbn(&self, input: &str) -> Result<IsbnOutcome, CatalogError> {
        let isbn = match Isbn::parse(input) {
            Ok(isbn) => isbn,
            Err(err) => {
                return Ok(IsbnOutcome::Invalid {
                    input: input.trim().to_string(),
                    errors: vec![FieldError::new("isbn", err.to_string())],
                });
            }
        };

        match self.isbn.lookup(&isbn).await? {
            Some(draft) => Ok(IsbnOutcome::Found(draft)),
            None => {
                tracing::info!(%isbn, "no books found for ISBN");
                Ok(IsbnOutcome::NoResults(isbn))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::testing::{self, StubLookup};

    fn draft(title: &str, author: &str) -> BookDraft {
        BookDraft {
            title: title.to_string(),
            author: author.to_string(),
            ..BookDraft::default()
        }
    }

    #[tokio::test]
    async fn create_then_find_returns_same_fields() {
        let (catalog, _) = testing::catalog(StubLookup::empty()).await;

        let submission = catalog
            .create(BookDraft {
                genre: Some("Mystery".to_string()),
                year: Some("1926".to_string()),
                ..draft("The Murder of Roger Ackroyd", "Agatha Christie")
            })
            .await
            .unwrap();

        let Submission::Saved(book) = submission else {
            panic!("expected the book to be saved");
        };
        let found = catalog.find(book.id).await.unwrap().unwrap();
        assert_eq!(found.title, "The Murder of Roger Ackroyd");
        assert_eq!(found.author, "Agatha Christie");
        assert_eq!(found.genre.as_deref(), Some("Mystery"));
        assert_eq!(found.year.as_deref(), Some("1926"));
    }

    #[tokio::test]
    async fn create_with_blank_author_is_rejected_and_keeps_input() {
        let (catalog, store) = testing::catalog(StubLookup::empty()).await;

        let submission = catalog
            .create(BookDraft {
                year: Some("2001".to_string()),
                ..draft("Untitled", "")
            })
            .await
            .unwrap();

        match submission {
            Submission::Rejected { id, draft, errors } => {
                assert_eq!(id, None);
                assert_eq!(draft.title, "Untitled");
                assert_eq!(draft.year.as_deref(), Some("2001"));
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "author");
            }
            Submission::Saved(_) => panic!("blank author must not be saved"),
        }

        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn partial_update_changes_only_supplied_fields() {
        let (catalog, store) = testing::catalog(StubLookup::empty()).await;
        let seeded = testing::seed(&store).await;
        let hobbit = &seeded[0];

        let submission = catalog
            .update(
                hobbit.id,
                BookChanges {
                    genre: Some("Children's Fantasy".to_string()),
                    ..BookChanges::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        let Submission::Saved(updated) = submission else {
            panic!("expected update to be saved");
        };
        assert_eq!(updated.title, hobbit.title);
        assert_eq!(updated.author, hobbit.author);
        assert_eq!(updated.year, hobbit.year);
        assert_eq!(updated.genre.as_deref(), Some("Children's Fantasy"));
    }

    #[tokio::test]
    async fn rejected_update_merges_stored_and_submitted_values() {
        let (catalog, store) = testing::catalog(StubLookup::empty()).await;
        let seeded = testing::seed(&store).await;
        let dune = seeded.iter().find(|b| b.title == "Dune").unwrap();

        let submission = catalog
            .update(
                dune.id,
                BookChanges {
                    title: Some(String::new()),
                    year: Some("1966".to_string()),
                    ..BookChanges::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        match submission {
            Submission::Rejected { id, draft, errors } => {
                assert_eq!(id, Some(dune.id));
                assert_eq!(draft.author, "Frank Herbert");
                assert_eq!(draft.year.as_deref(), Some("1966"));
                assert_eq!(errors[0].field, "title");
            }
            Submission::Saved(_) => panic!("blank title must not be saved"),
        }

        let unchanged = catalog.find(dune.id).await.unwrap().unwrap();
        assert_eq!(unchanged.year.as_deref(), Some("1965"));
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_books() {
        let (catalog, _) = testing::catalog(StubLookup::empty()).await;

        assert!(catalog
            .update(404, BookChanges::default())
            .await
            .unwrap()
            .is_none());
        assert!(catalog.delete(404).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_then_find_is_not_found() {
        let (catalog, store) = testing::catalog(StubLookup::empty()).await;
        let seeded = testing::seed(&store).await;

        let removed = catalog.delete(seeded[1].id).await.unwrap().unwrap();
        assert_eq!(removed.id, seeded[1].id);
        assert!(catalog.find(seeded[1].id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unfiltered_listing_pages_through_everything() {
        let (catalog, store) = testing::catalog(StubLookup::empty()).await;
        testing::seed_numbered(&store, 23).await;

        let first = catalog.list(&catalog.query(&ListParams::default())).await.unwrap();
        assert_eq!(first.total_count, 23);
        assert_eq!(first.page_count, 3);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.pages, vec![1, 2, 3]);

        let last = catalog
            .list(&catalog.query(&ListParams {
                page: Some("3".to_string()),
                ..ListParams::default()
            }))
            .await
            .unwrap();
        assert_eq!(last.items.len(), 3);
        assert_eq!(last.current_offset, 20);
    }

    #[tokio::test]
    async fn search_matches_manual_filter() {
        let (catalog, store) = testing::catalog(StubLookup::empty()).await;
        let seeded = testing::seed(&store).await;

        let expected: Vec<i64> = seeded
            .iter()
            .filter(|book| {
                [
                    Some(book.title.as_str()),
                    Some(book.author.as_str()),
                    book.genre.as_deref(),
                    book.year.as_deref(),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.contains("Tolkien"))
            })
            .map(|book| book.id)
            .collect();

        let result = catalog
            .list(&catalog.query(&ListParams {
                search: Some("Tolkien".to_string()),
                ..ListParams::default()
            }))
            .await
            .unwrap();

        let listed: Vec<i64> = result.items.iter().map(|book| book.id).collect();
        assert_eq!(listed, expected);
        assert_eq!(result.total_count, expected.len() as u64);
        assert_eq!(result.page_count, 1);
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty_with_true_totals() {
        let (catalog, store) = testing::catalog(StubLookup::empty()).await;
        testing::seed_numbered(&store, 12).await;

        let result = catalog
            .list(&catalog.query(&ListParams {
                page: Some("7".to_string()),
                ..ListParams::default()
            }))
            .await
            .unwrap();

        assert!(result.items.is_empty());
        assert_eq!(result.total_count, 12);
        assert_eq!(result.page_count, 2);
        assert_eq!(result.current_page, 7);
    }

    #[tokio::test]
    async fn isbn_lookup_outcomes() {
        let found = BookDraft {
            title: "Code Complete".to_string(),
            author: "Steve McConnell".to_string(),
            genre: Some("Computers".to_string()),
            year: Some("2004".to_string()),
        };
        let (catalog, _) = testing::catalog(StubLookup::returning(found.clone())).await;

        match catalog.lookup_isbn("0-7356-1967-0").await.unwrap() {
            IsbnOutcome::Found(draft) => assert_eq!(draft, found),
            other => panic!("expected a match, got {other:?}"),
        }

        match catalog.lookup_isbn("not-an-isbn").await.unwrap() {
            IsbnOutcome::Invalid { input, errors } => {
                assert_eq!(input, "not-an-isbn");
                assert_eq!(errors[0].field, "isbn");
            }
            other => panic!("expected invalid input, got {other:?}"),
        }

        let (empty, _) = testing::catalog(StubLookup::empty()).await;
        assert!(matches!(
            empty.lookup_isbn("9780380815937").await.unwrap(),
            IsbnOutcome::NoResults(_)
        ));
    }

    #[tokio::test]
    async fn isbn_service_failure_is_a_server_error() {
        let (catalog, _) = testing::catalog(StubLookup::failing()).await;

        let err = catalog.lookup_isbn("9780380815937").await.unwrap_err();
        assert!(matches!(err, CatalogError::Lookup(_)));

        let app_error: AppError = err.into();
        assert_eq!(
            app_error.status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
