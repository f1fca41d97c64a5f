use serde::{Deserialize, Serialize};

/// A catalogued book as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// System-assigned identifier
    pub id: i64,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    /// Publication year as entered; not necessarily numeric
    pub year: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Candidate field values for a new book, straight from a form or a prefill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
}

impl BookDraft {
    /// Trim every field and turn blank optional fields into `None`.
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            genre: non_blank(self.genre),
            year: non_blank(self.year),
        }
    }

    /// Field-level problems that keep this draft from being stored.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(FieldError::required("title", "Title"));
        }
        if self.author.trim().is_empty() {
            errors.push(FieldError::required("author", "Author"));
        }
        errors
    }
}

impl From<&Book> for BookDraft {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone(),
            year: book.year.clone(),
        }
    }
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookChanges {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
}

impl BookChanges {
    /// Overlay the supplied fields on a stored book.
    ///
    /// A supplied blank `genre` or `year` clears it once the draft is normalized.
    pub fn apply_to(self, book: &Book) -> BookDraft {
        BookDraft {
            title: self.title.unwrap_or_else(|| book.title.clone()),
            author: self.author.unwrap_or_else(|| book.author.clone()),
            genre: self.genre.or_else(|| book.genre.clone()),
            year: self.year.or_else(|| book.year.clone()),
        }
    }
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn required(field: &str, label: &str) -> Self {
        Self::new(field, format!("\"{label}\" is required"))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
