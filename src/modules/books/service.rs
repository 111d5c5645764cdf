//! Business rules for the catalog.
//!
//! [`BookService`] validates requests before they reach the repository and
//! bounds every repository call with the configured statement timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::models::{
    Book, BookId, BookRequest, BookStatus, NewBook, UnknownStatus, MAX_PUBLICATION_YEAR,
};
use super::repository::{BookRepository, RepositoryError};

/// One violated business rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub error: String,
}

impl FieldError {
    fn new(field: &'static str, error: impl Into<String>) -> Self {
        Self {
            field,
            error: error.into(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum BookServiceError {
    #[error("book failed validation")]
    Validation(Vec<FieldError>),

    #[error("book {0} not found")]
    NotFound(BookId),

    #[error("storage did not answer within {0:?}")]
    Timeout(Duration),

    #[error("storage failure: {0}")]
    Storage(#[source] RepositoryError),
}

impl From<RepositoryError> for BookServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => BookServiceError::NotFound(id),
            other => BookServiceError::Storage(other),
        }
    }
}

/// Check a request against the catalog rules and turn it into a storable book.
pub fn validate(request: &BookRequest) -> Result<NewBook, BookServiceError> {
    let mut errors = Vec::new();

    if request.title.trim().is_empty() {
        errors.push(FieldError::new("title", "title must not be empty"));
    }
    if request.author.trim().is_empty() {
        errors.push(FieldError::new("author", "author must not be empty"));
    }
    if request.year > MAX_PUBLICATION_YEAR {
        errors.push(FieldError::new(
            "year",
            format!("year cannot be greater than {MAX_PUBLICATION_YEAR}"),
        ));
    }
    let status = match request.status.parse::<BookStatus>() {
        Ok(status) => Some(status),
        Err(err) => {
            errors.push(FieldError::new("status", err.to_string()));
            None
        }
    };

    match status {
        Some(status) if errors.is_empty() => Ok(NewBook {
            title: request.title.clone(),
            author: request.author.clone(),
            year: request.year,
            status,
        }),
        _ => Err(BookServiceError::Validation(errors)),
    }
}

pub struct BookService {
    repository: Arc<dyn BookRepository>,
    statement_timeout: Duration,
}

impl BookService {
    pub fn new(repository: Arc<dyn BookRepository>, statement_timeout: Duration) -> Self {
        Self {
            repository,
            statement_timeout,
        }
    }

    /// Run a repository call under the statement timeout. On expiry the call
    /// is dropped and the caller gets `Timeout`. The statement itself is
    /// aborted by the session `statement_timeout` set in `shelf_db`.
    async fn bounded<T, F>(&self, op: &'static str, call: F) -> Result<T, BookServiceError>
    where
        F: Future<Output = Result<T, RepositoryError>>,
    {
        match tokio::time::timeout(self.statement_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(RepositoryError::NotFound(id))) => {
                tracing::info!(op, id, "book not found");
                Err(BookServiceError::NotFound(id))
            }
            Ok(Err(err)) => {
                tracing::error!(op, error = %err, "repository call failed");
                Err(err.into())
            }
            Err(_) => {
                tracing::error!(
                    op,
                    timeout_ms = self.statement_timeout.as_millis() as u64,
                    "repository call timed out"
                );
                Err(BookServiceError::Timeout(self.statement_timeout))
            }
        }
    }

    pub async fn books(&self) -> Result<Vec<Book>, BookServiceError> {
        const OP: &str = "books.list";
        tracing::info!(op = OP, "listing books");

        let books = self.bounded(OP, self.repository.list()).await?;
        tracing::info!(op = OP, count = books.len(), "books listed");
        Ok(books)
    }

    pub async fn book_by_id(&self, id: BookId) -> Result<Book, BookServiceError> {
        const OP: &str = "books.get";
        tracing::info!(op = OP, id, "getting book by id");

        self.bounded(OP, self.repository.get_by_id(id)).await
    }

    pub async fn books_by_status(&self, status: &str) -> Result<Vec<Book>, BookServiceError> {
        const OP: &str = "books.by_status";
        tracing::info!(op = OP, status, "getting books by status");

        let status: BookStatus = status.parse().map_err(|err: UnknownStatus| {
            tracing::warn!(op = OP, error = %err, "rejected status filter");
            BookServiceError::Validation(vec![FieldError::new("status", err.to_string())])
        })?;

        let books = self
            .bounded(OP, self.repository.list_by_status(status.as_str()))
            .await?;
        tracing::info!(op = OP, count = books.len(), "books listed by status");
        Ok(books)
    }

    pub async fn create(&self, request: &BookRequest) -> Result<Book, BookServiceError> {
        const OP: &str = "books.create";
        tracing::info!(op = OP, title = %request.title, "creating book");

        let book = validate(request).inspect_err(|err| {
            tracing::warn!(op = OP, error = ?err, "rejected book");
        })?;

        let book = self.bounded(OP, self.repository.create(&book)).await?;
        tracing::info!(op = OP, id = book.id, "book created");
        Ok(book)
    }

    pub async fn update(&self, id: BookId, request: &BookRequest) -> Result<Book, BookServiceError> {
        const OP: &str = "books.update";
        tracing::info!(op = OP, id, "updating book");

        let book = validate(request).inspect_err(|err| {
            tracing::warn!(op = OP, id, error = ?err, "rejected book");
        })?;

        let book = self.bounded(OP, self.repository.update(id, &book)).await?;
        tracing::info!(op = OP, id, "book updated");
        Ok(book)
    }

    pub async fn delete(&self, id: BookId) -> Result<(), BookServiceError> {
        const OP: &str = "books.delete";
        tracing::info!(op = OP, id, "deleting book");

        self.bounded(OP, self.repository.delete(id)).await?;
        tracing::info!(op = OP, id, "book deleted");
        Ok(())
    }

    /// Check that storage answers.
    pub async fn ping(&self) -> Result<(), BookServiceError> {
        self.bounded("books.ping", self.repository.ping()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::repository::InMemoryBookRepository;
    use async_trait::async_trait;

    fn service() -> BookService {
        BookService::new(
            Arc::new(InMemoryBookRepository::new()),
            Duration::from_secs(5),
        )
    }

    fn request(title: &str, year: i32, status: &str) -> BookRequest {
        BookRequest {
            title: title.to_string(),
            author: "Herbert".to_string(),
            year,
            status: status.to_string(),
        }
    }

    fn validation_fields(err: BookServiceError) -> Vec<&'static str> {
        match err {
            BookServiceError::Validation(errors) => errors.iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_returns_book_with_fresh_id() {
        let service = service();
        let first = service.create(&request("Dune", 1965, "planned")).await.unwrap();
        let second = service
            .create(&request("Children of Dune", 1976, "reading"))
            .await
            .unwrap();

        assert_eq!(first.title, "Dune");
        assert_eq!(first.author, "Herbert");
        assert_eq!(first.year, 1965);
        assert_eq!(first.status, BookStatus::Planned);
        assert_ne!(first.id, second.id);
        assert_eq!(service.book_by_id(first.id).await.unwrap(), first);
    }

    #[tokio::test]
    async fn boundary_year_is_accepted() {
        let service = service();
        let book = service
            .create(&request("Fresh", MAX_PUBLICATION_YEAR, "planned"))
            .await
            .unwrap();
        assert_eq!(book.year, 2025);

        let ancient = service.create(&request("Iliad", -750, "completed")).await;
        assert!(ancient.is_ok());
    }

    #[tokio::test]
    async fn future_year_is_rejected_and_not_stored() {
        let service = service();
        let err = service
            .create(&request("Tomorrow", 2026, "planned"))
            .await
            .unwrap_err();

        assert_eq!(validation_fields(err), vec!["year"]);
        assert!(service.books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_status_is_rejected_and_not_stored() {
        let service = service();
        let err = service
            .create(&request("Dune", 1965, "abandoned"))
            .await
            .unwrap_err();

        assert_eq!(validation_fields(err), vec!["status"]);
        assert!(service.books().await.unwrap().is_empty());
    }

    #[test]
    fn every_violation_is_reported() {
        let req = BookRequest {
            title: " ".to_string(),
            author: "Herbert".to_string(),
            year: 3000,
            status: "done".to_string(),
        };
        let err = validate(&req).unwrap_err();
        assert_eq!(validation_fields(err), vec!["title", "year", "status"]);
    }

    #[tokio::test]
    async fn missing_book_is_not_found() {
        let service = service();
        assert!(matches!(
            service.book_by_id(42).await,
            Err(BookServiceError::NotFound(42))
        ));
    }

    #[tokio::test]
    async fn update_validates_like_create() {
        let service = service();
        let book = service.create(&request("Dune", 1965, "planned")).await.unwrap();

        let err = service
            .update(book.id, &request("Dune", 2030, "planned"))
            .await
            .unwrap_err();
        assert_eq!(validation_fields(err), vec!["year"]);

        let err = service
            .update(book.id, &request("Dune", 1965, "paused"))
            .await
            .unwrap_err();
        assert_eq!(validation_fields(err), vec!["status"]);

        assert_eq!(service.book_by_id(book.id).await.unwrap(), book);
    }

    #[tokio::test]
    async fn update_of_missing_book_is_not_found() {
        let service = service();
        assert!(matches!(
            service.update(7, &request("Dune", 1965, "reading")).await,
            Err(BookServiceError::NotFound(7))
        ));
        assert!(service.books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_book_once() {
        let service = service();
        let book = service.create(&request("Dune", 1965, "planned")).await.unwrap();

        service.delete(book.id).await.unwrap();
        assert!(matches!(
            service.book_by_id(book.id).await,
            Err(BookServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(book.id).await,
            Err(BookServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn status_filter_returns_exact_set() {
        let service = service();
        let a = service.create(&request("A", 2000, "reading")).await.unwrap();
        service.create(&request("B", 2001, "planned")).await.unwrap();
        let c = service.create(&request("C", 2002, "reading")).await.unwrap();
        service.create(&request("D", 2003, "completed")).await.unwrap();

        let mut ids: Vec<BookId> = service
            .books_by_status("reading")
            .await
            .unwrap()
            .into_iter()
            .map(|book| book.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec![a.id, c.id]);
    }

    #[tokio::test]
    async fn status_filter_rejects_unknown_status() {
        let err = service().books_by_status("lost").await.unwrap_err();
        assert_eq!(validation_fields(err), vec!["status"]);
    }

    struct StalledRepository;

    #[async_trait]
    impl BookRepository for StalledRepository {
        async fn list(&self) -> Result<Vec<Book>, RepositoryError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }

        async fn get_by_id(&self, id: BookId) -> Result<Book, RepositoryError> {
            Err(RepositoryError::NotFound(id))
        }

        async fn list_by_status(&self, _status: &str) -> Result<Vec<Book>, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn create(&self, _book: &NewBook) -> Result<Book, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolClosed))
        }

        async fn update(&self, id: BookId, _book: &NewBook) -> Result<Book, RepositoryError> {
            Err(RepositoryError::NotFound(id))
        }

        async fn delete(&self, id: BookId) -> Result<(), RepositoryError> {
            Err(RepositoryError::NotFound(id))
        }

        async fn ping(&self) -> Result<(), RepositoryError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn slow_storage_times_out() {
        let service = BookService::new(Arc::new(StalledRepository), Duration::from_millis(20));
        assert!(matches!(
            service.books().await,
            Err(BookServiceError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn storage_errors_pass_through() {
        let service = BookService::new(Arc::new(StalledRepository), Duration::from_secs(1));

        assert!(matches!(
            service.create(&request("Dune", 1965, "planned")).await,
            Err(BookServiceError::Storage(RepositoryError::Database(_)))
        ));
        assert!(matches!(
            service.books_by_status("reading").await,
            Err(BookServiceError::Storage(_))
        ));
    }
}
