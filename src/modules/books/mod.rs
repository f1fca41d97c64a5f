//! The book catalog: listing, search, CRUD and ISBN-assisted entry.

pub mod catalog;
pub mod isbn;
pub mod models;
pub mod paging;
pub mod routes;
pub mod store;
pub mod views;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use stacks_kernel::{InitCtx, Migration, Module};

use catalog::Catalog;

/// Mounts the catalog routes and owns the `books` table.
pub struct BooksModule {
    catalog: Arc<Catalog>,
}

impl BooksModule {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Schema for the `books` table, usable before a catalog exists.
    pub fn migrations_only() -> Vec<Migration> {
        vec![Migration {
            id: "001_create_books",
            up: store::CREATE_BOOKS,
        }]
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        ctx.settings.catalog.validate()?;

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            default_page_size = ctx.settings.catalog.default_page_size,
            max_page_size = ctx.settings.catalog.max_page_size,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.catalog.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    fn migrations(&self) -> Vec<Migration> {
        Self::migrations_only()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module around a ready catalog
pub fn create_module(catalog: Arc<Catalog>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(catalog))
}

fn html_page(summary: &str) -> serde_json::Value {
    serde_json::json!({
        "summary": summary,
        "tags": ["Books"],
        "responses": {
            "200": {
                "description": "HTML page",
                "content": { "text/html": { "schema": { "type": "string" } } }
            }
        }
    })
}

fn form_post(summary: &str, schema: &str) -> serde_json::Value {
    serde_json::json!({
        "summary": summary,
        "tags": ["Books"],
        "requestBody": {
            "content": {
                "application/x-www-form-urlencoded": {
                    "schema": { "$ref": format!("#/components/schemas/{schema}") }
                }
            }
        },
        "responses": {
            "303": { "description": "Saved; redirects to /books" },
            "422": { "description": "Form re-rendered with validation errors" }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let id_param = serde_json::json!([{
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    }]);

    let mut update = form_post("Update a book; omitted fields keep their value", "BookForm");
    update["parameters"] = id_param.clone();
    let mut show = html_page("Edit form for one book");
    show["parameters"] = id_param.clone();
    show["responses"]["404"] = serde_json::json!({ "description": "No such book" });

    serde_json::json!({
        "paths": {
            "/books": {
                "get": {
                    "summary": "Paginated, searchable book list",
                    "tags": ["Books"],
                    "parameters": [
                        { "name": "search", "in": "query", "schema": { "type": "string" } },
                        { "name": "page", "in": "query", "schema": { "type": "integer", "minimum": 1 } },
                        { "name": "limit", "in": "query", "schema": { "type": "integer", "minimum": 1 } }
                    ],
                    "responses": {
                        "200": {
                            "description": "HTML page",
                            "content": { "text/html": { "schema": { "type": "string" } } }
                        }
                    }
                }
            },
            "/books/new": {
                "get": html_page("Creation form, optionally pre-filled from the query string"),
                "post": form_post("Create a book", "BookForm")
            },
            "/books/isbn": {
                "get": html_page("ISBN lookup form"),
                "post": {
                    "summary": "Look up an ISBN and pre-fill the creation form",
                    "tags": ["Books"],
                    "responses": {
                        "200": { "description": "Creation form" },
                        "422": { "description": "Input is not an ISBN" },
                        "500": { "description": "Metadata service failed" }
                    }
                }
            },
            "/books/{id}": {
                "get": show,
                "post": update
            },
            "/books/{id}/delete": {
                "post": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": id_param,
                    "responses": {
                        "303": { "description": "Deleted; redirects to /books" },
                        "404": { "description": "No such book" }
                    }
                }
            },
            "/json": {
                "get": {
                    "summary": "Every book as JSON",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "All books",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "/error": {
                "get": {
                    "summary": "Always fails with a server error page",
                    "tags": ["Diagnostics"],
                    "responses": { "500": { "description": "Server error page" } }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "genre": { "type": ["string", "null"] },
                        "year": { "type": ["string", "null"] },
                        "created_at": { "type": "string" },
                        "updated_at": { "type": "string" }
                    },
                    "required": ["id", "title", "author", "created_at", "updated_at"]
                },
                "BookForm": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "genre": { "type": "string" },
                        "year": { "type": "string" }
                    }
                }
            }
        }
    })
}
