//! HTTP handlers for the Books module, mounted under `/api/books`.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookshelf_http::error::AppError;

use super::models::{BookId, BookResponse, CreateBook, UpdateBook};
use super::repository::BookRepository;
use super::service::BookService;

mod openapi;

pub use openapi::openapi;

type SharedService<R> = Arc<BookService<R>>;

/// Build the module router around a shared service.
pub fn router<R>(service: SharedService<R>) -> Router
where
    R: BookRepository + 'static,
{
    Router::new()
        .route("/", get(list_books::<R>).post(create_book::<R>))
        .route("/health", get(health_check))
        .route(
            "/{id}",
            get(get_book::<R>)
                .put(update_book::<R>)
                .delete(delete_book::<R>),
        )
        .with_state(service)
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn list_books<R: BookRepository>(
    State(service): State<SharedService<R>>,
) -> Result<Json<Vec<BookResponse>>, AppError> {
    Ok(Json(service.list().await?))
}

async fn get_book<R: BookRepository>(
    State(service): State<SharedService<R>>,
    id: Result<Path<BookId>, PathRejection>,
) -> Result<Json<BookResponse>, AppError> {
    let id = book_id(id)?;
    Ok(Json(service.get_by_id(id).await?))
}

async fn create_book<R: BookRepository>(
    State(service): State<SharedService<R>>,
    payload: Result<Json<CreateBook>, JsonRejection>,
) -> Result<Json<BookResponse>, AppError> {
    let Json(req) = payload.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let created = service.create(req).await?;
    tracing::info!(book_id = ?created.id, "book created");
    Ok(Json(created))
}

async fn update_book<R: BookRepository>(
    State(service): State<SharedService<R>>,
    id: Result<Path<BookId>, PathRejection>,
    payload: Result<Json<UpdateBook>, JsonRejection>,
) -> Result<Json<BookResponse>, AppError> {
    let id = book_id(id)?;
    let Json(req) = payload.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let updated = service.update(id, req).await?;
    tracing::info!(book_id = id, "book updated");
    Ok(Json(updated))
}

async fn delete_book<R: BookRepository>(
    State(service): State<SharedService<R>>,
    id: Result<Path<BookId>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = book_id(id)?;
    service.delete(id).await?;
    tracing::info!(book_id = id, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn book_id(path: Result<Path<BookId>, PathRejection>) -> Result<BookId, AppError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}
