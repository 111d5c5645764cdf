//! Book persistence.
//!
//! [`BookRepository`] is the only seam that touches storage. The service
//! layer holds it as a trait object so PostgreSQL and the in-memory store are
//! interchangeable.

mod memory;
mod postgres;

pub use memory::InMemoryBookRepository;
pub use postgres::PgBookRepository;

use async_trait::async_trait;

use super::models::{Book, BookId, NewBook};

#[derive(thiserror::Error, Debug)]
pub enum RepositoryError {
    #[error("book {0} not found")]
    NotFound(BookId),

    #[error("book {id} has an invalid stored value: {reason}")]
    InvalidRow { id: BookId, reason: String },

    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait BookRepository: Send + Sync {
    /// All books ordered by id.
    async fn list(&self) -> Result<Vec<Book>, RepositoryError>;

    /// A single book, or `NotFound`.
    async fn get_by_id(&self, id: BookId) -> Result<Book, RepositoryError>;

    /// Books whose stored status equals `status`. The value is not
    /// validated, so unknown text simply matches nothing.
    async fn list_by_status(&self, status: &str) -> Result<Vec<Book>, RepositoryError>;

    /// Insert a book and return it with its assigned id.
    async fn create(&self, book: &NewBook) -> Result<Book, RepositoryError>;

    /// Overwrite every field of an existing book, or `NotFound`.
    async fn update(&self, id: BookId, book: &NewBook) -> Result<Book, RepositoryError>;

    /// Remove a book, or `NotFound` when it does not exist.
    async fn delete(&self, id: BookId) -> Result<(), RepositoryError>;

    /// Cheap round-trip used by health checks.
    async fn ping(&self) -> Result<(), RepositoryError>;
}
