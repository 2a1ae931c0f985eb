//! User account database operations

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// User record from database
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Input for creating a user
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by email. The argument is lowercased before matching;
    /// stored values are compared as-is.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, name, email, password FROM users WHERE email = $1",
        )
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Get a user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, name, email, password FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Create a new user, returning the stored row
    pub async fn create(&self, input: CreateUser) -> Result<UserRecord> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (name, email, password)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password
            "#,
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.password)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }
}
