//! Database connection and repositories

pub mod properties;
pub mod reservations;
pub mod users;

use anyhow::Result;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use properties::{
    CreateProperty, PropertyRecord, PropertyRepository, PropertySearch, PropertyWithRating,
};
pub use reservations::{GuestStay, ReservationRepository};
pub use users::{CreateUser, UserRecord, UserRepository};

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database wrapper from an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the maximum connection pool size from environment or default
    fn get_max_connections() -> u32 {
        std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10)
    }

    /// Create a new database connection pool
    pub async fn connect(url: &str) -> Result<Self> {
        let max_connections = Self::get_max_connections();
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        Ok(Self { pool })
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get a user repository
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Get a property repository
    pub fn properties(&self) -> PropertyRepository {
        PropertyRepository::new(self.pool.clone())
    }

    /// Get a reservation repository
    pub fn reservations(&self) -> ReservationRepository {
        ReservationRepository::new(self.pool.clone())
    }
}
