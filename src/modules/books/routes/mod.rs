//! HTTP handlers for the books module.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use shelf_http::error::AppError;

use super::models::{BookId, BookRequest};
use super::service::{BookService, BookServiceError};

type AppState = Arc<BookService>;
type ApiResult = Result<(StatusCode, Json<Value>), AppError>;

/// Routes relative to the module mount point.
pub fn router(service: Arc<BookService>) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/health", get(health_check))
        .route("/status", get(books_by_status))
        .route("/{id}", get(book_by_id))
        .route("/update/{id}", put(update_book))
        .route("/delete/{id}", delete(delete_book))
        .with_state(service)
}

impl From<BookServiceError> for AppError {
    fn from(err: BookServiceError) -> Self {
        match err {
            BookServiceError::Validation(errors) => AppError::validation(
                errors
                    .into_iter()
                    .map(|e| json!({ "field": e.field, "error": e.error }))
                    .collect(),
                "book failed validation",
            ),
            BookServiceError::NotFound(id) => AppError::not_found(format!("book {id} not found")),
            BookServiceError::Timeout(_) => AppError::timeout("storage did not respond in time"),
            BookServiceError::Storage(err) => AppError::Internal(err.into()),
        }
    }
}

/// Path ids must be plain decimal digits that fit the id column.
fn parse_id(raw: &str) -> Result<BookId, AppError> {
    let invalid = || AppError::bad_request(format!("invalid book id '{raw}'"));

    // `str::parse` would also take a leading sign.
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    raw.parse::<BookId>().map_err(|_| invalid())
}

/// Unwrap a JSON body and enforce the required fields.
fn parse_body(payload: Result<Json<BookRequest>, JsonRejection>) -> Result<BookRequest, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        AppError::bad_request(format!("invalid request body: {}", rejection.body_text()))
    })?;

    let missing = request.missing_fields();
    if !missing.is_empty() {
        return Err(AppError::bad_request_with(
            missing
                .iter()
                .map(|field| json!({ "field": field, "error": "required" }))
                .collect(),
            format!("missing required fields: {}", missing.join(", ")),
        ));
    }

    Ok(request)
}

async fn list_books(State(service): State<AppState>) -> ApiResult {
    let books = service.books().await?;
    Ok((StatusCode::OK, Json(json!({ "books": books }))))
}

async fn book_by_id(State(service): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let id = parse_id(&id)?;
    let book = service.book_by_id(id).await?;
    Ok((StatusCode::OK, Json(json!({ "book": book }))))
}

#[derive(Debug, Deserialize)]
struct StatusFilter {
    status: Option<String>,
}

async fn books_by_status(
    State(service): State<AppState>,
    Query(filter): Query<StatusFilter>,
) -> ApiResult {
    let status = filter
        .status
        .filter(|status| !status.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("status query parameter is required"))?;

    let books = service.books_by_status(&status).await?;
    Ok((StatusCode::OK, Json(json!({ "books": books }))))
}

async fn create_book(
    State(service): State<AppState>,
    payload: Result<Json<BookRequest>, JsonRejection>,
) -> ApiResult {
    let request = parse_body(payload)?;
    let book = service.create(&request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "book created successfully", "book": book })),
    ))
}

async fn update_book(
    State(service): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<BookRequest>, JsonRejection>,
) -> ApiResult {
    let id = parse_id(&id)?;
    let request = parse_body(payload)?;
    let book = service.update(id, &request).await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "book successfully updated", "book": book })),
    ))
}

async fn delete_book(State(service): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let id = parse_id(&id)?;
    service.delete(id).await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "book successfully deleted" })),
    ))
}

/// Storage round-trip check
async fn health_check(State(service): State<AppState>) -> Result<&'static str, AppError> {
    service.ping().await?;
    Ok("books module is healthy")
}
