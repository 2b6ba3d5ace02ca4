//! Book catalog service and external catalog synchronization

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{
    config::CatalogConfig,
    error::{AppError, AppResult},
    models::book::{Book, BookUpsert, ExternalBook, SyncReport},
    repository::Repository,
};

/// Remote source of book metadata
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_books(&self) -> AppResult<Vec<ExternalBook>>;
}

/// Catalog served as a JSON array over HTTP
pub struct HttpCatalogSource {
    client: reqwest::Client,
    url: String,
}

impl HttpCatalogSource {
    pub fn new(config: &CatalogConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_books(&self) -> AppResult<Vec<ExternalBook>> {
        tracing::debug!("Fetching external catalog from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::ExternalCatalog(format!("Catalog request failed: {}", e)))?;

        response
            .json::<Vec<ExternalBook>>()
            .await
            .map_err(|e| AppError::ExternalCatalog(format!("Invalid catalog payload: {}", e)))
    }
}

/// A normalized batch pulled from a [`CatalogSource`]
#[derive(Debug, Default)]
pub struct FeedBatch {
    pub fetched: usize,
    pub skipped: usize,
    pub books: Vec<BookUpsert>,
}

/// Pulls records from a source and turns them into upserts
#[derive(Clone)]
pub struct CatalogFeed {
    source: Arc<dyn CatalogSource>,
}

impl CatalogFeed {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self { source }
    }

    /// Fetch and normalize. Untitled records are dropped and, when an id
    /// repeats within the batch, the last record wins.
    pub async fn pull(&self) -> AppResult<FeedBatch> {
        let records = self.source.fetch_books().await?;
        let fetched = records.len();

        let mut order: Vec<i64> = Vec::new();
        let mut by_id: HashMap<i64, BookUpsert> = HashMap::new();

        for record in records {
            let id = record.id;
            match record.into_upsert() {
                Some(book) => {
                    if by_id.insert(id, book).is_none() {
                        order.push(id);
                    }
                }
                None => tracing::warn!("Skipping external book {} without a title", id),
            }
        }

        let books: Vec<BookUpsert> = order.iter().filter_map(|id| by_id.remove(id)).collect();

        Ok(FeedBatch {
            fetched,
            skipped: fetched - books.len(),
            books,
        })
    }
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    feed: CatalogFeed,
    default_stock: i32,
}

impl CatalogService {
    pub fn new(repository: Repository, feed: CatalogFeed, default_stock: i32) -> Self {
        Self {
            repository,
            feed,
            default_stock,
        }
    }

    /// List all books
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    /// Get book by external ID
    pub async fn get_book(&self, external_id: i64) -> AppResult<Book> {
        self.repository.books.get_by_external_id(external_id).await
    }

    /// Set the number of copies owned, keeping copies on loan accounted for
    pub async fn update_stock(&self, external_id: i64, stock_quantity: i32) -> AppResult<Book> {
        let mut tx = self.repository.begin().await?;

        let mut book = self
            .repository
            .books
            .lock_by_external_id(&mut tx, external_id)
            .await?;
        book.set_stock(stock_quantity)?;
        self.repository.books.save_stock(&mut tx, &book).await?;

        tx.commit().await?;

        tracing::info!(
            "Stock of '{}' set to {} ({} available)",
            book.title,
            book.stock_quantity,
            book.available_quantity
        );
        Ok(book)
    }

    /// Upsert every book of the external catalog in a single transaction
    pub async fn sync(&self) -> AppResult<SyncReport> {
        tracing::info!("Synchronizing books from external catalog");

        let batch = self.feed.pull().await?;
        let mut report = SyncReport {
            fetched: batch.fetched,
            skipped: batch.skipped,
            ..SyncReport::default()
        };

        let mut tx = self.repository.begin().await?;
        for book in &batch.books {
            let created = self
                .repository
                .books
                .upsert(&mut tx, book, self.default_stock)
                .await?;
            if created {
                tracing::debug!("Created book '{}' ({})", book.title, book.external_id);
                report.created += 1;
            } else {
                tracing::debug!("Updated book '{}' ({})", book.title, book.external_id);
                report.updated += 1;
            }
        }
        tx.commit().await?;

        tracing::info!(
            "Synchronization completed: {} fetched, {} created, {} updated, {} skipped",
            report.fetched,
            report.created,
            report.updated,
            report.skipped
        );
        Ok(report)
    }
}
