//! HTTP handlers for the catalog.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use stacks_http::{error::AppError, response::HtmlTemplate};

use super::catalog::{Catalog, IsbnOutcome, Submission};
use super::models::{Book, BookChanges, BookDraft, FieldError};
use super::paging::ListParams;
use super::views::{BookForm, IndexPage, IsbnPage, NewBookPage, UpdateBookPage};

type HandlerResult<T = Response> = Result<T, AppError>;

pub fn router(catalog: Arc<Catalog>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/books", get(list_books))
        .route("/books/new", get(new_book_form).post(create_book))
        .route("/books/isbn", get(isbn_form).post(lookup_isbn))
        .route("/books/{id}", get(show_book).post(update_book))
        .route("/books/{id}/delete", post(delete_book))
        .route("/json", get(dump_json))
        .route("/error", get(raise_error))
        .with_state(catalog)
}

async fn home() -> Redirect {
    Redirect::to("/books")
}

async fn list_books(
    State(catalog): State<Arc<Catalog>>,
    Query(params): Query<ListParams>,
) -> HandlerResult {
    let query = catalog.query(&params);
    let result = catalog.list(&query).await?;
    Ok(HtmlTemplate::new(IndexPage::new(result, query.term)).into_response())
}

/// Creation form, optionally pre-filled from the query string.
async fn new_book_form(Query(prefill): Query<BookDraft>) -> HtmlTemplate<NewBookPage> {
    HtmlTemplate::new(NewBookPage {
        book: BookForm::from(&prefill.normalized()),
        errors: Vec::new(),
    })
}

async fn create_book(
    State(catalog): State<Arc<Catalog>>,
    Form(draft): Form<BookDraft>,
) -> HandlerResult {
    match catalog.create(draft).await? {
        Submission::Saved(_) => Ok(Redirect::to("/books").into_response()),
        Submission::Rejected { draft, errors, .. } => Ok(HtmlTemplate::new(NewBookPage {
            book: BookForm::from(&draft),
            errors,
        })
        .with_status(StatusCode::UNPROCESSABLE_ENTITY)
        .into_response()),
    }
}

async fn isbn_form() -> HtmlTemplate<IsbnPage> {
    HtmlTemplate::new(IsbnPage {
        isbn: String::new(),
        errors: Vec::new(),
    })
}

#[derive(Debug, Deserialize)]
struct IsbnRequest {
    #[serde(default)]
    isbn: String,
}

async fn lookup_isbn(
    State(catalog): State<Arc<Catalog>>,
    Form(request): Form<IsbnRequest>,
) -> HandlerResult {
    let page = match catalog.lookup_isbn(&request.isbn).await? {
        IsbnOutcome::Found(draft) => HtmlTemplate::new(NewBookPage {
            book: BookForm::from(&draft),
            errors: Vec::new(),
        })
        .into_response(),
        IsbnOutcome::NoResults(isbn) => HtmlTemplate::new(NewBookPage {
            book: BookForm::default(),
            errors: vec![FieldError::new(
                "isbn",
                format!("No books found for ISBN {isbn}. Enter the details by hand."),
            )],
        })
        .into_response(),
        IsbnOutcome::Invalid { input, errors } => HtmlTemplate::new(IsbnPage {
            isbn: input,
            errors,
        })
        .with_status(StatusCode::UNPROCESSABLE_ENTITY)
        .into_response(),
    };

    Ok(page)
}

async fn show_book(
    State(catalog): State<Arc<Catalog>>,
    Path(id): Path<String>,
) -> HandlerResult<HtmlTemplate<UpdateBookPage>> {
    let id = parse_id(&id)?;
    let book = catalog.find(id).await?.ok_or_else(|| missing(id))?;

    Ok(HtmlTemplate::new(UpdateBookPage {
        id,
        book: BookForm::from(&book),
        errors: Vec::new(),
    }))
}

async fn update_book(
    State(catalog): State<Arc<Catalog>>,
    Path(id): Path<String>,
    Form(changes): Form<BookChanges>,
) -> HandlerResult {
    let id = parse_id(&id)?;

    match catalog.update(id, changes).await?.ok_or_else(|| missing(id))? {
        Submission::Saved(_) => Ok(Redirect::to("/books").into_response()),
        Submission::Rejected { draft, errors, .. } => Ok(HtmlTemplate::new(UpdateBookPage {
            id,
            book: BookForm::from(&draft),
            errors,
        })
        .with_status(StatusCode::UNPROCESSABLE_ENTITY)
        .into_response()),
    }
}

async fn delete_book(
    State(catalog): State<Arc<Catalog>>,
    Path(id): Path<String>,
) -> HandlerResult<Redirect> {
    let id = parse_id(&id)?;
    catalog.delete(id).await?.ok_or_else(|| missing(id))?;
    Ok(Redirect::to("/books"))
}

async fn dump_json(State(catalog): State<Arc<Catalog>>) -> HandlerResult<Json<Vec<Book>>> {
    Ok(Json(catalog.all().await?))
}

/// Always fails; exercises the server error page end to end.
async fn raise_error() -> HandlerResult {
    tracing::warn!("custom error route called");
    Err(AppError::Internal(anyhow::anyhow!("Custom 500 error thrown")))
}

/// Ids that are not integers cannot name a book.
fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::not_found(format!("Book '{raw}' not found")))
}

fn missing(id: i64) -> AppError {
    AppError::not_found(format!("Book {id} not found"))
}
