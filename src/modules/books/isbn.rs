//! ISBN lookups against the Google Books volumes API.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use stacks_kernel::settings::IsbnSettings;
use thiserror::Error;

use super::models::BookDraft;

/// A syntactically valid ISBN-10 or ISBN-13, hyphens and spaces removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Isbn(String);

impl Isbn {
    pub fn parse(raw: &str) -> Result<Self, InvalidIsbn> {
        let digits: String = raw
            .chars()
            .filter(|c| !matches!(c, '-' | ' '))
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let valid = digits.is_ascii()
            && match digits.len() {
                10 => {
                    let (body, check) = digits.split_at(9);
                    body.chars().all(|c| c.is_ascii_digit())
                        && check.chars().all(|c| c.is_ascii_digit() || c == 'X')
                }
                13 => digits.chars().all(|c| c.is_ascii_digit()),
                _ => false,
            };

        if valid {
            Ok(Self(digits))
        } else {
            Err(InvalidIsbn(raw.trim().to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("\"{0}\" is not a 10 or 13 digit ISBN")]
pub struct InvalidIsbn(pub String);

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
}

/// Source of book metadata keyed by ISBN.
#[async_trait]
pub trait IsbnLookup: Send + Sync {
    /// `Ok(None)` when the source has no match.
    async fn lookup(&self, isbn: &Isbn) -> Result<Option<BookDraft>, LookupError>;
}

/// [`IsbnLookup`] over the Google Books HTTP API.
pub struct GoogleBooksClient {
    http: reqwest::Client,
    endpoint: String,
}

impl GoogleBooksClient {
    pub fn new(settings: &IsbnSettings) -> Result<Self, LookupError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("stacks/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint: settings.endpoint.clone(),
        })
    }
}

#[async_trait]
impl IsbnLookup for GoogleBooksClient {
    async fn lookup(&self, isbn: &Isbn) -> Result<Option<BookDraft>, LookupError> {
        tracing::info!(%isbn, endpoint = %self.endpoint, "searching Google Books by ISBN");

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("q", format!("isbn:{isbn}"))])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status));
        }

        let volumes: Volumes = response.json().await?;
        tracing::debug!(%isbn, total_items = volumes.total_items, "Google Books responded");

        Ok(volumes.into_draft())
    }
}

/// Volume search response. Every field may be missing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volumes {
    #[serde(default)]
    total_items: u64,
    #[serde(default)]
    items: Option<Vec<Item>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    #[serde(default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    authors: Option<Vec<String>>,
    categories: Option<Vec<String>>,
    published_date: Option<String>,
}

impl Volumes {
    /// Prefill values from the first match.
    fn into_draft(self) -> Option<BookDraft> {
        if self.total_items == 0 {
            return None;
        }

        let VolumeInfo {
            title,
            authors,
            categories,
            published_date,
        } = self.items?.into_iter().next()?.volume_info;

        Some(
            BookDraft {
                title: title.unwrap_or_default(),
                author: first(authors).unwrap_or_default(),
                genre: first(categories),
                // "2004-09-01" and "2004" both give "2004"
                year: published_date.and_then(|date| date.split('-').next().map(str::to_string)),
            }
            .normalized(),
        )
    }
}

fn first(values: Option<Vec<String>>) -> Option<String> {
    values.and_then(|values| values.into_iter().next())
}
