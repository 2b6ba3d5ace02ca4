//! Reservations repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::reservation::{NewReservation, Reservation, ReservationDetails, ReservationStatus},
};

/// Projection shared by every details query; callers append WHERE / ORDER BY.
const DETAILS_SELECT: &str = r#"
    SELECT r.id, r.user_id, u.name AS user_name,
           r.book_external_id, b.title AS book_title,
           r.rental_days, r.start_date, r.expected_return_date, r.actual_return_date,
           r.daily_rate, r.base_fee, r.late_fee, r.total_fee, r.status, r.created_at
    FROM reservations r
    JOIN users u ON u.id = r.user_id
    JOIN books b ON b.external_id = r.book_external_id
"#;

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get reservation details by ID
    pub async fn get_details(&self, id: i64) -> AppResult<ReservationDetails> {
        let sql = format!("{} WHERE r.id = $1", DETAILS_SELECT);
        sqlx::query_as::<_, ReservationDetails>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Same as [`Self::get_details`], seeing the transaction's own writes
    pub async fn get_details_in(
        &self,
        conn: &mut PgConnection,
        id: i64,
    ) -> AppResult<ReservationDetails> {
        let sql = format!("{} WHERE r.id = $1", DETAILS_SELECT);
        sqlx::query_as::<_, ReservationDetails>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn list(&self) -> AppResult<Vec<ReservationDetails>> {
        let sql = format!("{} ORDER BY r.id", DETAILS_SELECT);
        let rows = sqlx::query_as::<_, ReservationDetails>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<ReservationDetails>> {
        let sql = format!("{} WHERE r.user_id = $1 ORDER BY r.id", DETAILS_SELECT);
        let rows = sqlx::query_as::<_, ReservationDetails>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_by_status(
        &self,
        status: ReservationStatus,
    ) -> AppResult<Vec<ReservationDetails>> {
        let sql = format!("{} WHERE r.status = $1 ORDER BY r.id", DETAILS_SELECT);
        let rows = sqlx::query_as::<_, ReservationDetails>(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Load a reservation and hold its row lock until the transaction ends
    pub async fn lock_by_id(&self, conn: &mut PgConnection, id: i64) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Insert an ACTIVE reservation and return its ID
    pub async fn insert(&self, conn: &mut PgConnection, new: &NewReservation) -> AppResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO reservations (
                user_id, book_external_id, rental_days, start_date, expected_return_date,
                daily_rate, base_fee, late_fee, total_fee, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(new.user_id)
        .bind(new.book_external_id)
        .bind(new.rental_days)
        .bind(new.start_date)
        .bind(new.expected_return_date)
        .bind(new.daily_rate)
        .bind(new.base_fee)
        .bind(ReservationStatus::Active)
        .bind(new.created_at)
        .fetch_one(&mut *conn)
        .await?;

        Ok(id)
    }

    /// Persist the outcome of [`Reservation::close`]
    pub async fn save_return(
        &self,
        conn: &mut PgConnection,
        reservation: &Reservation,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE reservations
            SET actual_return_date = $1, late_fee = $2, total_fee = $3, status = $4
            WHERE id = $5
            "#,
        )
        .bind(reservation.actual_return_date)
        .bind(reservation.late_fee)
        .bind(reservation.total_fee)
        .bind(reservation.status)
        .bind(reservation.id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Reservation with id {} not found", id))
}
