pub mod models;
pub mod routes;
pub mod service;
pub mod store;
pub mod views;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use libris_kernel::{InitCtx, Module};

use service::BookService;
use store::BookStore;

/// Books module: the catalog and its circulation endpoints
pub struct BooksModule {
    service: Arc<BookService>,
}

impl BooksModule {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self {
            service: Arc::new(BookService::new(store)),
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.service
            .store()
            .prepare()
            .await
            .context("failed to prepare book store")?;

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            data_path = %ctx.settings.storage.data_path.display(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn root_routes(&self) -> Router {
        routes::root_router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn json_body(schema: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "content": { "application/json": { "schema": schema } } })
}

fn described(description: &str, schema: serde_json::Value) -> serde_json::Value {
    let mut response = json_body(schema);
    response["description"] = description.into();
    response
}

fn openapi_fragment() -> serde_json::Value {
    let book = serde_json::json!({ "$ref": "#/components/schemas/Book" });
    let books = serde_json::json!({ "type": "array", "items": book });
    let error = serde_json::json!({ "$ref": "#/components/schemas/ErrorResponse" });
    let id_param = serde_json::json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    });

    serde_json::json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List all books",
                    "tags": ["Books"],
                    "responses": { "200": described("All books", books.clone()) }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": json_body(serde_json::json!({ "$ref": "#/components/schemas/CreateBook" })),
                    "responses": {
                        "201": described("Created book", book.clone()),
                        "400": described("Missing field", error.clone())
                    }
                }
            },
            "/api": {
                "get": {
                    "summary": "List books by filter",
                    "tags": ["Books"],
                    "parameters": [{
                        "name": "filter",
                        "in": "query",
                        "required": false,
                        "schema": { "type": "string", "enum": ["all", "available", "overdue"] }
                    }],
                    "responses": { "200": described("Filtered books", books) }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book as JSON or HTML",
                    "tags": ["Books"],
                    "parameters": [id_param.clone()],
                    "responses": {
                        "200": described("Book", book.clone()),
                        "404": described("Book not found", error.clone())
                    }
                },
                "put": {
                    "summary": "Update title, author or year",
                    "tags": ["Books"],
                    "parameters": [id_param.clone()],
                    "requestBody": json_body(serde_json::json!({ "$ref": "#/components/schemas/UpdateBook" })),
                    "responses": {
                        "200": described("Updated book", book.clone()),
                        "404": described("Book not found", error.clone())
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_param.clone()],
                    "responses": {
                        "200": described("Deletion confirmation", serde_json::json!({
                            "type": "object",
                            "properties": { "message": { "type": "string" } }
                        })),
                        "404": described("Book not found", error.clone())
                    }
                }
            },
            "/{id}/borrow": {
                "post": {
                    "summary": "Check a book out",
                    "tags": ["Books"],
                    "parameters": [id_param.clone()],
                    "requestBody": json_body(serde_json::json!({ "$ref": "#/components/schemas/BorrowBook" })),
                    "responses": {
                        "200": described("Borrowed book", book.clone()),
                        "400": described("Already borrowed or missing field", error.clone()),
                        "404": described("Book not found", error.clone())
                    }
                }
            },
            "/{id}/return": {
                "post": {
                    "summary": "Return a book",
                    "tags": ["Books"],
                    "parameters": [id_param],
                    "responses": {
                        "200": described("Returned book", book),
                        "400": described("Book is not borrowed", error.clone()),
                        "404": described("Book not found", error)
                    }
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
                        "year": { "type": "integer" },
                        "available": { "type": "boolean" },
                        "borrower": { "type": ["string", "null"] },
                        "returnDate": { "type": ["string", "null"], "format": "date" }
                    },
                    "required": ["id", "title", "author", "year", "available"]
                },
                "CreateBook": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "year": { "type": "integer" }
                    },
                    "required": ["title", "author", "year"]
                },
                "UpdateBook": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "year": { "type": "integer" }
                    }
                },
                "BorrowBook": {
                    "type": "object",
                    "properties": {
                        "borrower": { "type": "string" },
                        "returnDate": { "type": "string", "format": "date" }
                    },
                    "required": ["borrower", "returnDate"]
                }
            }
        }
    })
}

/// Create the books module backed by `store`
pub fn create_module(store: Arc<dyn BookStore>) -> Arc<BooksModule> {
    Arc::new(BooksModule::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::MemoryBookStore;

    #[test]
    fn openapi_fragment_documents_every_route() {
        let spec = openapi_fragment();
        for path in ["/", "/api", "/{id}", "/{id}/borrow", "/{id}/return"] {
            assert!(spec["paths"][path].is_object(), "missing {path}");
        }
        assert_eq!(
            spec["components"]["schemas"]["Book"]["properties"]["returnDate"]["format"],
            "date"
        );
    }

    #[test]
    fn module_is_named_after_its_prefix() {
        let module = BooksModule::new(Arc::new(MemoryBookStore::default()));
        assert_eq!(module.name(), "books");
    }
}
