pub mod error;
pub mod mapper;
pub mod models;
pub mod repository;
pub mod routes;
pub mod service;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{settings::DatabaseSettings, InitCtx, Module};

use mapper::BookMapper;
use repository::{BookRepository, TableBookRepository};
use service::BookService;

/// Books module: catalog CRUD over a [`BookRepository`]
pub struct BooksModule<R> {
    service: Arc<BookService<R>>,
}

impl<R: BookRepository> BooksModule<R> {
    pub fn new(repository: R) -> Self {
        Self {
            service: Arc::new(BookService::new(repository, BookMapper)),
        }
    }
}

#[async_trait]
impl<R> Module for BooksModule<R>
where
    R: BookRepository + 'static,
{
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let books = self
            .service
            .list()
            .await
            .context("failed to read the book catalog")?;

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            books = books.len(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(Arc::clone(&self.service))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(routes::openapi())
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

/// Open the configured store and wrap it in a books module
pub fn create_module(database: &DatabaseSettings) -> anyhow::Result<Arc<dyn Module>> {
    let repository = match &database.path {
        Some(path) => TableBookRepository::open(path)
            .with_context(|| format!("failed to open book store at {}", path.display()))?,
        None => {
            tracing::warn!("no database path configured; books are kept in memory only");
            TableBookRepository::in_memory()
        }
    };

    Ok(Arc::new(BooksModule::new(repository)))
}
