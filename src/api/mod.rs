//! API handlers for the rental server REST endpoints

pub mod books;
pub mod health;
pub mod openapi;
pub mod reservations;
pub mod users;
