//! Business logic services

pub mod catalog;
pub mod reservations;
pub mod users;

use std::sync::Arc;

use crate::{config::CatalogConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub users: users::UsersService,
    pub reservations: reservations::ReservationsService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, catalog_config: &CatalogConfig) -> AppResult<Self> {
        let source = catalog::HttpCatalogSource::new(catalog_config)?;
        let feed = catalog::CatalogFeed::new(Arc::new(source));

        Ok(Self {
            catalog: catalog::CatalogService::new(
                repository.clone(),
                feed,
                catalog_config.default_stock,
            ),
            users: users::UsersService::new(repository.clone()),
            reservations: reservations::ReservationsService::new(repository.clone()),
            repository,
        })
    }

    /// Check that the database answers
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
