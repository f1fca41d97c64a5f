//! Server-rendered pages for the catalog.

use askama::Template;

use super::models::{Book, BookDraft, FieldError};
use super::paging::PageResult;

/// Form field values as strings, ready to drop into inputs.
#[derive(Debug, Clone, Default)]
pub struct BookForm {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub year: String,
}

impl From<&BookDraft> for BookForm {
    fn from(draft: &BookDraft) -> Self {
        Self {
            title: draft.title.clone(),
            author: draft.author.clone(),
            genre: draft.genre.clone().unwrap_or_default(),
            year: draft.year.clone().unwrap_or_default(),
        }
    }
}

impl From<&Book> for BookForm {
    fn from(book: &Book) -> Self {
        Self::from(&BookDraft::from(book))
    }
}

pub struct BookRow {
    pub id: i64,
    pub book: BookForm,
}

/// 1-based positions of the first and last row shown.
pub struct ItemRange {
    pub first: u64,
    pub last: u64,
}

pub struct PageLink {
    pub number: u64,
    pub current: bool,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub rows: Vec<BookRow>,
    pub search: String,
    pub limit: u64,
    pub total_count: u64,
    pub page_count: u64,
    /// `None` when the page has no rows
    pub range: Option<ItemRange>,
    pub pages: Vec<PageLink>,
}

impl IndexPage {
    pub fn new(result: PageResult, search: Option<String>) -> Self {
        let range = (!result.items.is_empty()).then(|| ItemRange {
            first: result.current_offset.saturating_add(1),
            last: result
                .current_offset
                .saturating_add(result.items.len() as u64),
        });

        Self {
            rows: result
                .items
                .iter()
                .map(|book| BookRow {
                    id: book.id,
                    book: BookForm::from(book),
                })
                .collect(),
            search: search.unwrap_or_default(),
            limit: result.current_limit,
            total_count: result.total_count,
            page_count: result.page_count,
            range,
            pages: result
                .pages
                .iter()
                .map(|&number| PageLink {
                    number,
                    current: number == result.current_page,
                })
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "new-book.html")]
pub struct NewBookPage {
    pub book: BookForm,
    pub errors: Vec<FieldError>,
}

#[derive(Template)]
#[template(path = "update-book.html")]
pub struct UpdateBookPage {
    pub id: i64,
    pub book: BookForm,
    pub errors: Vec<FieldError>,
}

#[derive(Template)]
#[template(path = "isbn.html")]
pub struct IsbnPage {
    pub isbn: String,
    pub errors: Vec<FieldError>,
}
