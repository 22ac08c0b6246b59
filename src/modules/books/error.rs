use bookshelf_http::error::AppError;
use serde_json::json;

use super::models::BookId;
use super::repository::RepositoryError;

/// Failures produced by the book service.
#[derive(Debug, thiserror::Error)]
pub enum BookError {
    #[error("Book {0} not found")]
    NotFound(BookId),

    #[error("A book with the same title and author already exists")]
    Conflict { title: String, author: String },

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] RepositoryError),
}

impl BookError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }
}

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::NotFound(_) => AppError::not_found(err.to_string()),
            BookError::Conflict {
                ref title,
                ref author,
            } => AppError::conflict(
                vec![json!({ "title": title, "author": author })],
                err.to_string(),
            ),
            BookError::MalformedInput(message) => AppError::bad_request(message),
            BookError::StorageUnavailable(source) => {
                tracing::error!(error = %source, "book storage failure");
                AppError::unavailable("book storage is unavailable")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn not_found_maps_to_404() {
        let app_error = AppError::from(BookError::NotFound(7));
        assert_eq!(app_error.status(), StatusCode::NOT_FOUND);
        assert_eq!(app_error.to_string(), "not found: Book 7 not found");
    }

    #[test]
    fn conflict_maps_to_409_with_pair() {
        let app_error = AppError::from(BookError::Conflict {
            title: "Dune".into(),
            author: "Herbert".into(),
        });

        match app_error {
            AppError::Conflict { details, .. } => {
                assert_eq!(details, vec![json!({"title": "Dune", "author": "Herbert"})]);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn malformed_input_maps_to_400() {
        let app_error = AppError::from(BookError::malformed("bad date"));
        assert_eq!(app_error.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn storage_failure_hides_source() {
        let source = RepositoryError::backend(std::io::Error::other("disk on fire"));
        let app_error = AppError::from(BookError::from(source));

        assert_eq!(app_error.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!app_error.to_string().contains("disk on fire"));
    }
}
