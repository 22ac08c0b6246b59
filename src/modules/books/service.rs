use super::error::BookError;
use super::mapper::BookMapper;
use super::models::{BookId, BookResponse, CreateBook, UpdateBook};
use super::repository::BookRepository;

/// Book catalog use cases.
///
/// Stateless between calls: every operation reads from the repository, acts,
/// and saves or deletes before returning. Failures are returned, never logged.
pub struct BookService<R> {
    repository: R,
    mapper: BookMapper,
}

impl<R: BookRepository> BookService<R> {
    pub fn new(repository: R, mapper: BookMapper) -> Self {
        Self { repository, mapper }
    }

    pub async fn list(&self) -> Result<Vec<BookResponse>, BookError> {
        let books = self.repository.find_all().await?;
        Ok(books
            .iter()
            .map(|book| self.mapper.to_response(book))
            .collect())
    }

    pub async fn get_by_id(&self, id: BookId) -> Result<BookResponse, BookError> {
        let book = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(BookError::NotFound(id))?;
        Ok(self.mapper.to_response(&book))
    }

    /// Create a book unless one with the same title and author exists.
    ///
    /// The lookup and the save are separate repository calls, so two
    /// concurrent creates of the same pair can both succeed unless the store
    /// enforces uniqueness itself.
    pub async fn create(&self, req: CreateBook) -> Result<BookResponse, BookError> {
        if self
            .repository
            .find_by_title_and_author(&req.title, &req.author)
            .await?
            .is_some()
        {
            return Err(BookError::Conflict {
                title: req.title,
                author: req.author,
            });
        }

        let book = self.mapper.from_create_request(req)?;
        let saved = self.repository.save(book).await?;
        Ok(self.mapper.to_response(&saved))
    }

    /// Apply a partial update. The title/author pair is not re-checked for
    /// uniqueness here.
    pub async fn update(&self, id: BookId, req: UpdateBook) -> Result<BookResponse, BookError> {
        let mut book = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(BookError::NotFound(id))?;

        self.mapper.apply_update(req, &mut book)?;

        let saved = self.repository.save(book).await?;
        Ok(self.mapper.to_response(&saved))
    }

    pub async fn delete(&self, id: BookId) -> Result<(), BookError> {
        if !self.repository.exists_by_id(id).await? {
            return Err(BookError::NotFound(id));
        }
        self.repository.delete_by_id(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::Book;
    use crate::modules::books::repository::{RepositoryError, TableBookRepository};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Wraps a real repository and counts writes.
    #[derive(Clone)]
    struct CountingRepository {
        inner: Arc<TableBookRepository>,
        saves: Arc<AtomicUsize>,
        deletes: Arc<AtomicUsize>,
    }

    impl CountingRepository {
        fn new() -> Self {
            Self {
                inner: Arc::new(TableBookRepository::in_memory()),
                saves: Arc::new(AtomicUsize::new(0)),
                deletes: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn writes(&self) -> (usize, usize) {
            (
                self.saves.load(Ordering::SeqCst),
                self.deletes.load(Ordering::SeqCst),
            )
        }
    }

    #[async_trait]
    impl BookRepository for CountingRepository {
        async fn find_all(&self) -> Result<Vec<Book>, RepositoryError> {
            self.inner.find_all().await
        }

        async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_title_and_author(
            &self,
            title: &str,
            author: &str,
        ) -> Result<Option<Book>, RepositoryError> {
            self.inner.find_by_title_and_author(title, author).await
        }

        async fn save(&self, book: Book) -> Result<Book, RepositoryError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save(book).await
        }

        async fn exists_by_id(&self, id: BookId) -> Result<bool, RepositoryError> {
            self.inner.exists_by_id(id).await
        }

        async fn delete_by_id(&self, id: BookId) -> Result<(), RepositoryError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.inner.delete_by_id(id).await
        }
    }

    /// Every call fails as if the backing store were down.
    struct UnavailableRepository;

    fn down() -> RepositoryError {
        RepositoryError::backend(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "store offline",
        ))
    }

    #[async_trait]
    impl BookRepository for UnavailableRepository {
        async fn find_all(&self) -> Result<Vec<Book>, RepositoryError> {
            Err(down())
        }

        async fn find_by_id(&self, _id: BookId) -> Result<Option<Book>, RepositoryError> {
            Err(down())
        }

        async fn find_by_title_and_author(
            &self,
            _title: &str,
            _author: &str,
        ) -> Result<Option<Book>, RepositoryError> {
            Err(down())
        }

        async fn save(&self, _book: Book) -> Result<Book, RepositoryError> {
            Err(down())
        }

        async fn exists_by_id(&self, _id: BookId) -> Result<bool, RepositoryError> {
            Err(down())
        }

        async fn delete_by_id(&self, _id: BookId) -> Result<(), RepositoryError> {
            Err(down())
        }
    }

    fn dune() -> CreateBook {
        CreateBook {
            title: "Dune".into(),
            author: "Herbert".into(),
            isbn: "9780441013593".into(),
            published_date: Some("1965-08-01".into()),
            price: Some(Decimal::new(1299, 2)),
        }
    }

    fn service() -> (BookService<CountingRepository>, CountingRepository) {
        let repo = CountingRepository::new();
        (BookService::new(repo.clone(), BookMapper), repo)
    }

    #[tokio::test]
    async fn create_returns_first_id_and_echoes_input() {
        let (service, _) = service();

        let created = service.create(dune()).await.unwrap();

        assert_eq!(
            created,
            BookResponse {
                id: Some(1),
                title: "Dune".into(),
                author: "Herbert".into(),
                isbn: "9780441013593".into(),
                published_date: Some("1965-08-01".into()),
                price: Some(Decimal::new(1299, 2)),
            }
        );
        assert_eq!(service.get_by_id(1).await.unwrap(), created);
    }

    #[tokio::test]
    async fn duplicate_create_conflicts_without_writing() {
        let (service, repo) = service();
        let original = service.create(dune()).await.unwrap();

        let mut again = dune();
        again.isbn = "different".into();
        let err = service.create(again).await.unwrap_err();

        assert!(matches!(
            err,
            BookError::Conflict { ref title, ref author } if title == "Dune" && author == "Herbert"
        ));
        assert_eq!(repo.writes(), (1, 0));
        assert_eq!(service.list().await.unwrap(), vec![original]);
    }

    #[tokio::test]
    async fn same_title_different_author_is_allowed() {
        let (service, _) = service();
        service.create(dune()).await.unwrap();

        let mut other = dune();
        other.author = "Someone Else".into();
        let created = service.create(other).await.unwrap();

        assert_eq!(created.id, Some(2));
        assert_eq!(service.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn malformed_date_on_create_saves_nothing() {
        let (service, repo) = service();
        let mut req = dune();
        req.published_date = Some("August 1965".into());

        let err = service.create(req).await.unwrap_err();

        assert!(matches!(err, BookError::MalformedInput(_)));
        assert_eq!(repo.writes(), (0, 0));
    }

    #[tokio::test]
    async fn missing_ids_are_not_found_and_storage_is_untouched() {
        let (service, repo) = service();
        service.create(dune()).await.unwrap();
        let before = service.list().await.unwrap();

        assert!(matches!(
            service.get_by_id(99).await,
            Err(BookError::NotFound(99))
        ));
        assert!(matches!(
            service.update(99, UpdateBook::default()).await,
            Err(BookError::NotFound(99))
        ));
        assert!(matches!(
            service.delete(99).await,
            Err(BookError::NotFound(99))
        ));

        assert_eq!(repo.writes(), (1, 0));
        assert_eq!(service.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn update_changes_only_requested_fields() {
        let (service, _) = service();
        let before = service.create(dune()).await.unwrap();

        let updated = service
            .update(
                1,
                UpdateBook {
                    price: Decimal::new(1450, 2).into(),
                    ..UpdateBook::default()
                },
            )
            .await
            .unwrap();

        let expected = BookResponse {
            price: Some(Decimal::new(1450, 2)),
            ..before
        };
        assert_eq!(updated, expected);
        assert_eq!(service.get_by_id(1).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn update_may_introduce_duplicate_pair() {
        let (service, _) = service();
        service.create(dune()).await.unwrap();
        let mut other = dune();
        other.title = "Children of Dune".into();
        service.create(other).await.unwrap();

        let updated = service
            .update(
                2,
                UpdateBook {
                    title: "Dune".to_string().into(),
                    ..UpdateBook::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Dune");
        let dunes = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter(|b| b.title == "Dune" && b.author == "Herbert")
            .count();
        assert_eq!(dunes, 2);
    }

    #[tokio::test]
    async fn malformed_update_is_not_saved() {
        let (service, repo) = service();
        let before = service.create(dune()).await.unwrap();

        let err = service
            .update(
                1,
                UpdateBook {
                    isbn: "123".to_string().into(),
                    published_date: "not-a-date".to_string().into(),
                    ..UpdateBook::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BookError::MalformedInput(_)));
        assert_eq!(repo.writes(), (1, 0));
        assert_eq!(service.get_by_id(1).await.unwrap(), before);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let (service, repo) = service();
        service.create(dune()).await.unwrap();

        service.delete(1).await.unwrap();

        assert!(matches!(
            service.get_by_id(1).await,
            Err(BookError::NotFound(1))
        ));
        assert_eq!(repo.writes(), (1, 1));
    }

    #[tokio::test]
    async fn list_follows_store_order() {
        let (service, _) = service();
        for title in ["A", "B", "C"] {
            let mut req = dune();
            req.title = title.into();
            service.create(req).await.unwrap();
        }

        let titles: Vec<_> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn storage_failures_surface_as_unavailable() {
        let service = BookService::new(UnavailableRepository, BookMapper);

        assert!(matches!(
            service.list().await,
            Err(BookError::StorageUnavailable(_))
        ));
        assert!(matches!(
            service.create(dune()).await,
            Err(BookError::StorageUnavailable(_))
        ));
        assert!(matches!(
            service.delete(1).await,
            Err(BookError::StorageUnavailable(_))
        ));
    }
}
