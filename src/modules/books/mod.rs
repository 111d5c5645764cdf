pub mod models;
pub mod repository;
pub mod routes;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use serde_json::json;
use shelf_kernel::{InitCtx, Migration, Module};

use service::BookService;

/// Books catalog module
pub struct BooksModule {
    service: Arc<BookService>,
}

impl BooksModule {
    pub fn new(service: Arc<BookService>) -> Self {
        Self { service }
    }
}

/// Schema owned by the books module.
pub fn schema_migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        up: r#"
            CREATE TABLE IF NOT EXISTS books (
                id SERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                year INT NOT NULL,
                status TEXT NOT NULL
            );
            "#,
    }]
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            backend = ?ctx.settings.database.backend,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    fn migrations(&self) -> Vec<Migration> {
        schema_migrations()
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

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn json_response(description: &str, schema: serde_json::Value) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": { "schema": schema }
        }
    })
}

fn id_parameter() -> serde_json::Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "minimum": 0 }
    })
}

fn book_request_body() -> serde_json::Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/BookRequest" }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let books_envelope = json!({
        "type": "object",
        "properties": {
            "books": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } }
        }
    });
    let book_envelope = json!({
        "type": "object",
        "properties": {
            "message": { "type": "string" },
            "book": { "$ref": "#/components/schemas/Book" }
        }
    });

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "responses": {
                        "200": json_response("All books", books_envelope.clone()),
                        "500": error_response("Internal server error"),
                        "504": error_response("Storage timeout")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": book_request_body(),
                    "responses": {
                        "201": json_response("Created book", book_envelope.clone()),
                        "400": error_response("Malformed body or validation error"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/status": {
                "get": {
                    "summary": "List books with a reading status",
                    "tags": ["Books"],
                    "parameters": [{
                        "name": "status",
                        "in": "query",
                        "required": true,
                        "schema": { "$ref": "#/components/schemas/BookStatus" }
                    }],
                    "responses": {
                        "200": json_response("Matching books", books_envelope),
                        "400": error_response("Missing or unknown status"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": json_response("The book", book_envelope.clone()),
                        "400": error_response("Invalid id"),
                        "404": error_response("Book not found"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/update/{id}": {
                "put": {
                    "summary": "Replace a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "requestBody": book_request_body(),
                    "responses": {
                        "200": json_response("Updated book", book_envelope),
                        "400": error_response("Invalid id, malformed body or validation error"),
                        "404": error_response("Book not found"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/delete/{id}": {
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": json_response("Confirmation", json!({
                            "type": "object",
                            "properties": { "message": { "type": "string" } }
                        })),
                        "400": error_response("Invalid id"),
                        "404": error_response("Book not found"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books storage health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        },
                        "500": error_response("Storage unreachable")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "BookStatus": {
                    "type": "string",
                    "enum": ["planned", "reading", "completed"]
                },
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "description": "Storage-assigned identifier" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "year": { "type": "integer", "maximum": models::MAX_PUBLICATION_YEAR },
                        "status": { "$ref": "#/components/schemas/BookStatus" }
                    },
                    "required": ["id", "title", "author", "year", "status"]
                },
                "BookRequest": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string", "minLength": 1 },
                        "author": { "type": "string", "minLength": 1 },
                        "year": { "type": "integer", "maximum": models::MAX_PUBLICATION_YEAR },
                        "status": { "$ref": "#/components/schemas/BookStatus" }
                    },
                    "required": ["title", "author", "year", "status"]
                }
            }
        }
    })
}

/// Create a new instance of the books module
pub fn create_module(service: Arc<BookService>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(service))
}
