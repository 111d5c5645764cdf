use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BookRepository, RepositoryError};
use crate::modules::books::models::{Book, BookId, NewBook};

#[derive(Default)]
struct Shelf {
    last_id: BookId,
    books: BTreeMap<BookId, Book>,
}

/// Process-local book store with the same contract as the PostgreSQL
/// repository. Ids start at 1 and are never reused, like a `SERIAL` column.
#[derive(Default)]
pub struct InMemoryBookRepository {
    shelf: RwLock<Shelf>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn list(&self) -> Result<Vec<Book>, RepositoryError> {
        Ok(self.shelf.read().await.books.values().cloned().collect())
    }

    async fn get_by_id(&self, id: BookId) -> Result<Book, RepositoryError> {
        self.shelf
            .read()
            .await
            .books
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn list_by_status(&self, status: &str) -> Result<Vec<Book>, RepositoryError> {
        Ok(self
            .shelf
            .read()
            .await
            .books
            .values()
            .filter(|book| book.status.as_str() == status)
            .cloned()
            .collect())
    }

    async fn create(&self, book: &NewBook) -> Result<Book, RepositoryError> {
        let mut shelf = self.shelf.write().await;
        shelf.last_id += 1;
        let book = book.clone().with_id(shelf.last_id);
        shelf.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn update(&self, id: BookId, book: &NewBook) -> Result<Book, RepositoryError> {
        let mut shelf = self.shelf.write().await;
        let slot = shelf
            .books
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound(id))?;
        *slot = book.clone().with_id(id);
        Ok(slot.clone())
    }

    async fn delete(&self, id: BookId) -> Result<(), RepositoryError> {
        self.shelf
            .write()
            .await
            .books
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
