//! Reservation (rental) model, fee computation and lifecycle transitions

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::book::Book;
use super::user::User;
use crate::error::{AppError, AppResult};

/// Share of the book price charged per day past the expected return date
pub fn late_fee_rate() -> Decimal {
    Decimal::new(15, 2)
}

/// Half-up rounding to cents.
fn round_fee(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// price × rental days
pub fn base_fee(price: Decimal, rental_days: i32) -> Decimal {
    round_fee(price * Decimal::from(rental_days))
}

/// price × 15% × days late
pub fn late_fee(price: Decimal, days_late: i64) -> Decimal {
    round_fee(price * late_fee_rate() * Decimal::from(days_late))
}

/// Reservation status as stored. OVERDUE is only ever set when a late return is
/// processed; an ACTIVE reservation past its due date keeps reading ACTIVE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "reservation_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ReservationStatus {
    Active,
    Returned,
    Overdue,
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ReservationStatus::Active => "ACTIVE",
            ReservationStatus::Returned => "RETURNED",
            ReservationStatus::Overdue => "OVERDUE",
        };
        write!(f, "{}", label)
    }
}

/// Reservation model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    pub id: i64,
    pub user_id: i64,
    pub book_external_id: i64,
    pub rental_days: i32,
    pub start_date: NaiveDate,
    pub expected_return_date: NaiveDate,
    pub actual_return_date: Option<NaiveDate>,
    pub daily_rate: Decimal,
    pub base_fee: Decimal,
    pub late_fee: Decimal,
    pub total_fee: Decimal,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Close an active reservation on `return_date`, charging late days against
    /// `price`. Returns the number of days late (0 for on-time or early returns).
    ///
    /// A `return_date` before `start_date` is refused with a validation error
    /// instead of being treated as an early return. The reservation is left
    /// untouched when an error is returned.
    pub fn close(&mut self, price: Decimal, return_date: NaiveDate) -> AppResult<i64> {
        match self.status {
            ReservationStatus::Active => {}
            ReservationStatus::Returned | ReservationStatus::Overdue => {
                return Err(AppError::InvalidState(format!(
                    "Reservation {} was already returned ({})",
                    self.id, self.status
                )));
            }
        }

        if return_date < self.start_date {
            return Err(AppError::Validation(format!(
                "Return date {} is before the rental start date {}",
                return_date, self.start_date
            )));
        }

        let days_late = return_date
            .signed_duration_since(self.expected_return_date)
            .num_days();

        if days_late > 0 {
            self.late_fee = late_fee(price, days_late);
            self.total_fee = self.base_fee + self.late_fee;
            self.status = ReservationStatus::Overdue;
        } else {
            self.late_fee = Decimal::ZERO;
            self.total_fee = self.base_fee;
            self.status = ReservationStatus::Returned;
        }
        self.actual_return_date = Some(return_date);

        Ok(days_late.max(0))
    }
}

/// Reservation ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub user_id: i64,
    pub book_external_id: i64,
    pub rental_days: i32,
    pub start_date: NaiveDate,
    pub expected_return_date: NaiveDate,
    pub daily_rate: Decimal,
    pub base_fee: Decimal,
    pub created_at: DateTime<Utc>,
}

impl NewReservation {
    /// Price a rental of `book` by `user`. Stock is not touched here; the caller
    /// takes the copy with [`Book::checkout_copy`] in the same transaction.
    pub fn open(
        user: &User,
        book: &Book,
        rental_days: i32,
        start_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        if rental_days <= 0 {
            return Err(AppError::Validation(
                "Rental days must be positive".to_string(),
            ));
        }

        let expected_return_date = start_date
            .checked_add_days(Days::new(rental_days as u64))
            .ok_or_else(|| AppError::Validation("Rental period is out of range".to_string()))?;

        Ok(Self {
            user_id: user.id,
            book_external_id: book.external_id,
            rental_days,
            start_date,
            expected_return_date,
            daily_rate: book.price,
            base_fee: base_fee(book.price, rental_days),
            created_at: now,
        })
    }
}

/// Reservation joined with user and book data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ReservationDetails {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub book_external_id: i64,
    pub book_title: String,
    pub rental_days: i32,
    pub start_date: NaiveDate,
    pub expected_return_date: NaiveDate,
    pub actual_return_date: Option<NaiveDate>,
    /// Book price when the reservation was made
    pub daily_rate: Decimal,
    pub base_fee: Decimal,
    pub late_fee: Decimal,
    pub total_fee: Decimal,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

impl ReservationDetails {
    /// Still out on loan with its expected return date strictly before `today`.
    /// A reservation due today is not overdue yet; a closed one never is.
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        self.status == ReservationStatus::Active && self.expected_return_date < today
    }
}

/// Create reservation request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReservation {
    pub user_id: i64,
    pub book_external_id: i64,
    #[validate(range(min = 1, message = "Rental days must be positive"))]
    pub rental_days: i32,
    pub start_date: NaiveDate,
}

/// Return request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReturnReservation {
    pub return_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn user() -> User {
        User {
            id: 1,
            name: "Juan Pérez".to_string(),
            email: "juan@example.com".to_string(),
            phone: None,
            created_at: Utc::now(),
        }
    }

    fn book(price: Decimal) -> Book {
        Book {
            external_id: 258027,
            title: "The Lord of the Rings".to_string(),
            authors: vec![],
            first_publish_year: None,
            edition_count: None,
            has_fulltext: None,
            price,
            stock_quantity: 10,
            available_quantity: 5,
        }
    }

    fn active(new: NewReservation) -> Reservation {
        Reservation {
            id: 7,
            user_id: new.user_id,
            book_external_id: new.book_external_id,
            rental_days: new.rental_days,
            start_date: new.start_date,
            expected_return_date: new.expected_return_date,
            actual_return_date: None,
            daily_rate: new.daily_rate,
            base_fee: new.base_fee,
            late_fee: Decimal::ZERO,
            total_fee: new.base_fee,
            status: ReservationStatus::Active,
            created_at: new.created_at,
        }
    }

    #[test]
    fn test_base_fee_rounding() {
        assert_eq!(base_fee(Decimal::new(1599, 2), 7), Decimal::new(11193, 2));
    }

    #[test]
    fn test_late_fee_rounds_half_up() {
        // 15.99 × 0.15 × 3 = 7.1955
        assert_eq!(late_fee(Decimal::new(1599, 2), 3), Decimal::new(720, 2));
        // 0.10 × 0.15 × 1 = 0.015
        assert_eq!(late_fee(Decimal::new(10, 2), 1), Decimal::new(2, 2));
    }

    #[test]
    fn test_open_computes_dates_and_fees() {
        let new = NewReservation::open(
            &user(),
            &book(Decimal::new(2000, 2)),
            5,
            date(2024, 1, 1),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(new.expected_return_date, date(2024, 1, 6));
        assert_eq!(new.base_fee, Decimal::new(10000, 2));
        assert_eq!(new.daily_rate, Decimal::new(2000, 2));
        assert_eq!(new.user_id, 1);
        assert_eq!(new.book_external_id, 258027);
    }

    #[test]
    fn test_open_rejects_non_positive_days() {
        for days in [0, -3] {
            let err = NewReservation::open(
                &user(),
                &book(Decimal::ONE),
                days,
                date(2024, 1, 1),
                Utc::now(),
            )
            .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[test]
    fn test_late_return_scenario() {
        let price = Decimal::new(2000, 2);
        let new =
            NewReservation::open(&user(), &book(price), 5, date(2024, 1, 1), Utc::now()).unwrap();
        let mut reservation = active(new);

        let days_late = reservation.close(price, date(2024, 1, 9)).unwrap();

        assert_eq!(days_late, 3);
        assert_eq!(reservation.late_fee, Decimal::new(900, 2));
        assert_eq!(reservation.total_fee, Decimal::new(10900, 2));
        assert_eq!(reservation.status, ReservationStatus::Overdue);
        assert_eq!(reservation.actual_return_date, Some(date(2024, 1, 9)));
    }

    #[test]
    fn test_late_fee_added_to_base_fee() {
        let price = Decimal::new(1599, 2);
        let new =
            NewReservation::open(&user(), &book(price), 7, date(2024, 3, 1), Utc::now()).unwrap();
        let mut reservation = active(new);

        reservation.close(price, date(2024, 3, 11)).unwrap();

        assert_eq!(reservation.base_fee, Decimal::new(11193, 2));
        assert_eq!(reservation.late_fee, Decimal::new(720, 2));
        assert_eq!(reservation.total_fee, Decimal::new(11913, 2));
    }

    #[test]
    fn test_on_time_and_early_returns() {
        let price = Decimal::new(2000, 2);
        for return_date in [date(2024, 1, 6), date(2024, 1, 3), date(2024, 1, 1)] {
            let new = NewReservation::open(&user(), &book(price), 5, date(2024, 1, 1), Utc::now())
                .unwrap();
            let mut reservation = active(new);

            assert_eq!(reservation.close(price, return_date).unwrap(), 0);
            assert_eq!(reservation.late_fee, Decimal::ZERO);
            assert_eq!(reservation.total_fee, Decimal::new(10000, 2));
            assert_eq!(reservation.status, ReservationStatus::Returned);
        }
    }

    #[test]
    fn test_second_return_is_rejected_without_changes() {
        let price = Decimal::new(2000, 2);
        let new =
            NewReservation::open(&user(), &book(price), 5, date(2024, 1, 1), Utc::now()).unwrap();
        let mut reservation = active(new);
        reservation.close(price, date(2024, 1, 9)).unwrap();
        let closed = reservation.clone();

        let err = reservation.close(price, date(2024, 1, 20)).unwrap_err();

        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(reservation, closed);
    }

    #[test]
    fn test_return_before_start_is_rejected() {
        let price = Decimal::new(2000, 2);
        let new =
            NewReservation::open(&user(), &book(price), 5, date(2024, 1, 10), Utc::now()).unwrap();
        let mut reservation = active(new);

        let err = reservation.close(price, date(2024, 1, 9)).unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(reservation.status, ReservationStatus::Active);
        assert_eq!(reservation.actual_return_date, None);
    }

    fn details(status: ReservationStatus, expected_return_date: NaiveDate) -> ReservationDetails {
        ReservationDetails {
            id: 7,
            user_id: 1,
            user_name: "Juan Pérez".to_string(),
            book_external_id: 258027,
            book_title: "The Lord of the Rings".to_string(),
            rental_days: 5,
            start_date: date(2024, 1, 1),
            expected_return_date,
            actual_return_date: None,
            daily_rate: Decimal::new(2000, 2),
            base_fee: Decimal::new(10000, 2),
            late_fee: Decimal::ZERO,
            total_fee: Decimal::new(10000, 2),
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_overdue_boundary() {
        let today = date(2024, 1, 6);

        assert!(!details(ReservationStatus::Active, date(2024, 1, 6)).is_overdue_on(today));
        assert!(details(ReservationStatus::Active, date(2024, 1, 5)).is_overdue_on(today));
        assert!(!details(ReservationStatus::Active, date(2024, 1, 7)).is_overdue_on(today));
    }

    #[test]
    fn test_closed_reservations_are_never_overdue() {
        let today = date(2024, 2, 1);
        for status in [ReservationStatus::Returned, ReservationStatus::Overdue] {
            assert!(!details(status, date(2024, 1, 6)).is_overdue_on(today));
        }
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ReservationStatus::Overdue).unwrap(),
            "\"OVERDUE\""
        );
        let status: ReservationStatus = serde_json::from_str("\"ACTIVE\"").unwrap();
        assert_eq!(status, ReservationStatus::Active);
    }

    #[test]
    fn test_create_request_validation() {
        let request = CreateReservation {
            user_id: 1,
            book_external_id: 2,
            rental_days: 0,
            start_date: date(2024, 1, 1),
        };
        assert!(request.validate().is_err());

        let request = CreateReservation {
            rental_days: 14,
            ..request
        };
        assert!(request.validate().is_ok());
    }
}
