//! Reservation ledger: rentals against available stock, returns and late fees
//!
//! Create and return each run in one transaction that locks the book row, so
//! two requests on the same book never observe the same available count.
//! Any error before `commit` drops the transaction and rolls everything back.

use chrono::{NaiveDate, Utc};
use validator::Validate;

use crate::{
    error::AppResult,
    models::reservation::{
        CreateReservation, NewReservation, ReservationDetails, ReservationStatus,
        ReturnReservation,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
}

impl ReservationsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Rent one copy of a book
    pub async fn create_reservation(
        &self,
        request: CreateReservation,
    ) -> AppResult<ReservationDetails> {
        request.validate()?;
        tracing::info!(
            "Creating reservation for user {} and book {}",
            request.user_id,
            request.book_external_id
        );

        let mut tx = self.repository.begin().await?;

        let user = self
            .repository
            .users
            .lock_shared(&mut tx, request.user_id)
            .await?;
        let mut book = self
            .repository
            .books
            .lock_by_external_id(&mut tx, request.book_external_id)
            .await?;

        book.checkout_copy()?;
        let new = NewReservation::open(
            &user,
            &book,
            request.rental_days,
            request.start_date,
            Utc::now(),
        )?;

        self.repository.books.save_stock(&mut tx, &book).await?;
        let id = self.repository.reservations.insert(&mut tx, &new).await?;
        let details = self.repository.reservations.get_details_in(&mut tx, id).await?;

        tx.commit().await?;

        tracing::info!(
            "Reservation {} created, {} copies of '{}' left",
            id,
            book.available_quantity,
            book.title
        );
        Ok(details)
    }

    /// Close an active reservation, charging late days if any
    pub async fn return_reservation(
        &self,
        id: i64,
        request: ReturnReservation,
    ) -> AppResult<ReservationDetails> {
        tracing::info!("Processing return of reservation {}", id);

        let mut tx = self.repository.begin().await?;

        let mut reservation = self.repository.reservations.lock_by_id(&mut tx, id).await?;
        let mut book = self
            .repository
            .books
            .lock_by_external_id(&mut tx, reservation.book_external_id)
            .await?;

        let days_late = reservation.close(book.price, request.return_date)?;
        book.restore_copy()?;

        self.repository.books.save_stock(&mut tx, &book).await?;
        self.repository
            .reservations
            .save_return(&mut tx, &reservation)
            .await?;
        let details = self.repository.reservations.get_details_in(&mut tx, id).await?;

        tx.commit().await?;

        match reservation.status {
            ReservationStatus::Overdue => tracing::warn!(
                "Reservation {} returned {} days late, late fee {}",
                id,
                days_late,
                reservation.late_fee
            ),
            ReservationStatus::Returned => {
                tracing::info!("Reservation {} returned on time", id)
            }
            ReservationStatus::Active => {}
        }
        tracing::info!("Reservation {} total fee: {}", id, reservation.total_fee);

        Ok(details)
    }

    /// Get reservation by ID
    pub async fn get_reservation(&self, id: i64) -> AppResult<ReservationDetails> {
        self.repository.reservations.get_details(id).await
    }

    pub async fn list_reservations(&self) -> AppResult<Vec<ReservationDetails>> {
        self.repository.reservations.list().await
    }

    /// Get reservations of a user
    pub async fn get_user_reservations(&self, user_id: i64) -> AppResult<Vec<ReservationDetails>> {
        // Verify user exists
        self.repository.users.get_by_id(user_id).await?;
        self.repository.reservations.list_by_user(user_id).await
    }

    /// Reservations currently out on loan
    pub async fn list_active(&self) -> AppResult<Vec<ReservationDetails>> {
        self.repository
            .reservations
            .list_by_status(ReservationStatus::Active)
            .await
    }

    /// Active reservations past their due date as of today (UTC)
    pub async fn list_overdue(&self) -> AppResult<Vec<ReservationDetails>> {
        self.list_overdue_as_of(Utc::now().date_naive()).await
    }

    pub async fn list_overdue_as_of(&self, today: NaiveDate) -> AppResult<Vec<ReservationDetails>> {
        let mut overdue: Vec<ReservationDetails> = self
            .list_active()
            .await?
            .into_iter()
            .filter(|r| r.is_overdue_on(today))
            .collect();
        overdue.sort_by_key(|r| (r.expected_return_date, r.id));
        Ok(overdue)
    }
}
