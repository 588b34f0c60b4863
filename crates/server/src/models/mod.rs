//! Domain models for the server.
//!
//! These types represent validated domain objects separate from database row types.

pub mod account;
pub mod barber;

pub use account::Account;
pub use barber::{Barber, BarberFilter, BarberSort};
