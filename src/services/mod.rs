//! Service layer over the database repositories

pub mod rentals;

pub use rentals::{DEFAULT_RESULT_LIMIT, RentalService};
