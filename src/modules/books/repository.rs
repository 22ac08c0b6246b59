use std::path::PathBuf;

use async_trait::async_trait;
use bookshelf_db::{DbError, Table};

use super::models::{Book, BookId};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("storage backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}

impl From<DbError> for RepositoryError {
    fn from(err: DbError) -> Self {
        Self::backend(err)
    }
}

/// Storage contract the book service depends on.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Every stored book, in the store's iteration order
    async fn find_all(&self) -> Result<Vec<Book>, RepositoryError>;

    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError>;

    /// Exact match on both fields
    async fn find_by_title_and_author(
        &self,
        title: &str,
        author: &str,
    ) -> Result<Option<Book>, RepositoryError>;

    /// Insert a book without an id (assigning one) or overwrite the book with
    /// the given id. Returns the stored book.
    async fn save(&self, book: Book) -> Result<Book, RepositoryError>;

    async fn exists_by_id(&self, id: BookId) -> Result<bool, RepositoryError>;

    async fn delete_by_id(&self, id: BookId) -> Result<(), RepositoryError>;
}

/// [`BookRepository`] backed by a `bookshelf-db` table.
pub struct TableBookRepository {
    table: Table<Book>,
}

impl TableBookRepository {
    pub fn new(table: Table<Book>) -> Self {
        Self { table }
    }

    pub fn in_memory() -> Self {
        Self::new(Table::in_memory())
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DbError> {
        Table::open(path).map(Self::new)
    }
}

#[async_trait]
impl BookRepository for TableBookRepository {
    async fn find_all(&self) -> Result<Vec<Book>, RepositoryError> {
        Ok(self
            .table
            .all()
            .await
            .into_iter()
            .map(|(_, book)| book)
            .collect())
    }

    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        Ok(self.table.get(id).await)
    }

    async fn find_by_title_and_author(
        &self,
        title: &str,
        author: &str,
    ) -> Result<Option<Book>, RepositoryError> {
        let found = self
            .table
            .find(|book| book.title == title && book.author == author)
            .await;
        Ok(found.map(|(_, book)| book))
    }

    async fn save(&self, book: Book) -> Result<Book, RepositoryError> {
        match book.id {
            Some(id) => {
                self.table.upsert(id, book.clone()).await?;
                Ok(book)
            }
            None => {
                let (_, saved) = self
                    .table
                    .insert_with(|id| Book {
                        id: Some(id),
                        ..book
                    })
                    .await?;
                Ok(saved)
            }
        }
    }

    async fn exists_by_id(&self, id: BookId) -> Result<bool, RepositoryError> {
        Ok(self.table.contains(id).await)
    }

    async fn delete_by_id(&self, id: BookId) -> Result<(), RepositoryError> {
        self.table.remove(id).await?;
        Ok(())
    }
}
