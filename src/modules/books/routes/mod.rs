//! HTTP handlers for the Books module.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use libris_http::error::AppError;
use serde::Deserialize;
use serde_json::json;

use super::models::{Book, BookFilter, BookId, BorrowBook, CreateBook, UpdateBook};
use super::service::{self, BookError, BookService};
use super::views;

type ApiResult<T> = Result<T, AppError>;

impl From<BookError> for AppError {
    fn from(error: BookError) -> Self {
        match error {
            BookError::Validation(message) => AppError::validation(message),
            BookError::Conflict(message) => AppError::conflict(message),
            BookError::NotFound(_) => AppError::not_found("Book not found"),
            BookError::Store(e) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub filter: Option<String>,
}

impl ListQuery {
    fn filter(&self) -> BookFilter {
        BookFilter::parse(self.filter.as_deref())
    }
}

/// Routes mounted under `/books`
pub fn router(service: Arc<BookService>) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/api", get(list_books_filtered))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/{id}/borrow", post(borrow_book))
        .route("/{id}/return", post(return_book))
        .with_state(service)
}

/// Routes served from the site root
pub fn root_router(service: Arc<BookService>) -> Router {
    Router::new()
        .route("/", get(home_page))
        .with_state(service)
}

/// Unknown or non-numeric ids are both "not found"
fn book_id(id: Result<Path<BookId>, PathRejection>) -> ApiResult<BookId> {
    id.map(|Path(id)| id)
        .map_err(|_| AppError::not_found("Book not found"))
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

async fn home_page(
    State(service): State<Arc<BookService>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Html<String>> {
    let filter = query.filter();
    let today = service::today();
    let books = service.list_on(filter, today).await?;
    Ok(Html(views::home_page(&books, filter, today)))
}

async fn list_books(State(service): State<Arc<BookService>>) -> ApiResult<Json<Vec<Book>>> {
    Ok(Json(service.list(BookFilter::All).await?))
}

async fn list_books_filtered(
    State(service): State<Arc<BookService>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Book>>> {
    Ok(Json(service.list(query.filter()).await?))
}

async fn get_book(
    State(service): State<Arc<BookService>>,
    headers: HeaderMap,
    id: Result<Path<BookId>, PathRejection>,
) -> ApiResult<Response> {
    let book = service.get(book_id(id)?).await?;

    if wants_html(&headers) {
        Ok(Html(views::book_page(&book, service::today())).into_response())
    } else {
        Ok(Json(book).into_response())
    }
}

async fn create_book(
    State(service): State<Arc<BookService>>,
    payload: Result<Json<CreateBook>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Book>)> {
    let Json(input) = payload?;
    let book = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    State(service): State<Arc<BookService>>,
    id: Result<Path<BookId>, PathRejection>,
    payload: Result<Json<UpdateBook>, JsonRejection>,
) -> ApiResult<Json<Book>> {
    let id = book_id(id)?;
    let Json(patch) = payload?;
    Ok(Json(service.update(id, patch).await?))
}

async fn borrow_book(
    State(service): State<Arc<BookService>>,
    id: Result<Path<BookId>, PathRejection>,
    payload: Result<Json<BorrowBook>, JsonRejection>,
) -> ApiResult<Json<Book>> {
    let id = book_id(id)?;
    let Json(request) = payload?;
    Ok(Json(service.borrow(id, request).await?))
}

async fn return_book(
    State(service): State<Arc<BookService>>,
    id: Result<Path<BookId>, PathRejection>,
) -> ApiResult<Json<Book>> {
    Ok(Json(service.return_book(book_id(id)?).await?))
}

async fn delete_book(
    State(service): State<Arc<BookService>>,
    id: Result<Path<BookId>, PathRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    service.delete(book_id(id)?).await?;
    Ok(Json(json!({ "message": "Book deleted" })))
}
