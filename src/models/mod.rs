//! Data models for the rental server

pub mod book;
pub mod reservation;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookUpsert, ExternalBook, SyncReport};
pub use reservation::{Reservation, ReservationDetails, ReservationStatus};
pub use user::User;
