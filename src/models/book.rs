//! Book (catalog entry) model, stock rules and external catalog records

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

/// Price given to synced books that arrive without a usable one
pub fn default_price() -> Decimal {
    Decimal::new(1000, 2)
}

/// Book model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    /// Identifier assigned by the external catalog
    pub external_id: i64,
    pub title: String,
    pub authors: Vec<String>,
    pub first_publish_year: Option<i32>,
    pub edition_count: Option<i32>,
    pub has_fulltext: Option<bool>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub available_quantity: i32,
}

impl Book {
    /// Copies currently out on loan
    pub fn outstanding(&self) -> i32 {
        self.stock_quantity - self.available_quantity
    }

    /// Take one copy off the shelf for a new reservation.
    pub fn checkout_copy(&mut self) -> AppResult<()> {
        if self.available_quantity <= 0 {
            return Err(AppError::InsufficientStock(format!(
                "No copies of '{}' are available",
                self.title
            )));
        }
        self.available_quantity -= 1;
        Ok(())
    }

    /// Put a returned copy back on the shelf.
    pub fn restore_copy(&mut self) -> AppResult<()> {
        if self.available_quantity >= self.stock_quantity {
            return Err(AppError::Internal(format!(
                "Book {} already has all {} copies available",
                self.external_id, self.stock_quantity
            )));
        }
        self.available_quantity += 1;
        Ok(())
    }

    /// Change the total number of copies, keeping outstanding loans intact.
    pub fn set_stock(&mut self, stock_quantity: i32) -> AppResult<()> {
        if stock_quantity < 0 {
            return Err(AppError::Validation(
                "Stock quantity cannot be negative".to_string(),
            ));
        }

        let outstanding = self.outstanding();
        if stock_quantity < outstanding {
            return Err(AppError::Conflict(format!(
                "Cannot reduce stock below the {} copies currently reserved",
                outstanding
            )));
        }

        self.stock_quantity = stock_quantity;
        self.available_quantity = stock_quantity - outstanding;
        Ok(())
    }
}

/// Stock update query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct UpdateStock {
    pub stock_quantity: i32,
}

/// Book record as published by the external catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalBook {
    pub id: i64,
    pub title: Option<String>,
    pub author_name: Option<Vec<String>>,
    pub first_publish_year: Option<i32>,
    pub edition_count: Option<i32>,
    pub has_fulltext: Option<bool>,
    pub price: Option<Decimal>,
}

/// Normalized catalog data written to the `books` table.
/// Stock is never part of an upsert; it is only set when a book is first inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct BookUpsert {
    pub external_id: i64,
    pub title: String,
    pub authors: Vec<String>,
    pub first_publish_year: Option<i32>,
    pub edition_count: Option<i32>,
    pub has_fulltext: Option<bool>,
    pub price: Decimal,
}

impl ExternalBook {
    /// Returns `None` for records without a title.
    pub fn into_upsert(self) -> Option<BookUpsert> {
        let title = self.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;

        let price = self
            .price
            .filter(|p| *p > Decimal::ZERO)
            .map(|p| p.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
            .unwrap_or_else(default_price);

        Some(BookUpsert {
            external_id: self.id,
            title,
            authors: self.author_name.unwrap_or_default(),
            first_publish_year: self.first_publish_year,
            edition_count: self.edition_count,
            has_fulltext: self.has_fulltext,
            price,
        })
    }
}

/// Outcome of a catalog synchronization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SyncReport {
    /// Records received from the external catalog
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
    /// Records dropped during normalization (missing title, duplicate id)
    pub skipped: usize,
}
