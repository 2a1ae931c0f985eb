//! Reservation database operations

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

/// A completed stay: reservation fields joined with the reserved property
/// and the property's review average
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GuestStay {
    pub reservation_id: i64,
    pub guest_id: i64,
    pub property_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub owner_id: i64,
    pub title: String,
    pub description: String,
    pub thumbnail_photo_url: String,
    pub cover_photo_url: String,
    pub cost_per_night: i64,
    pub street: String,
    pub city: String,
    pub province: String,
    pub post_code: String,
    pub country: String,
    pub parking_spaces: i32,
    pub number_of_bathrooms: i32,
    pub number_of_bedrooms: i32,
    pub average_rating: Option<Decimal>,
}

pub struct ReservationRepository {
    pool: PgPool,
}

impl ReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List a guest's completed stays (end date strictly before today),
    /// oldest first, capped at `limit`
    pub async fn list_completed_for_guest(
        &self,
        guest_id: i64,
        limit: i64,
    ) -> Result<Vec<GuestStay>> {
        let records = sqlx::query_as::<_, GuestStay>(
            r#"
            SELECT r.id AS reservation_id, r.guest_id, r.property_id, r.start_date, r.end_date,
                   p.owner_id, p.title, p.description, p.thumbnail_photo_url, p.cover_photo_url,
                   p.cost_per_night, p.street, p.city, p.province, p.post_code, p.country,
                   p.parking_spaces, p.number_of_bathrooms, p.number_of_bedrooms,
                   avg(pr.rating) AS average_rating
            FROM reservations r
            JOIN properties p ON r.property_id = p.id
            JOIN property_reviews pr ON p.id = pr.property_id
            WHERE r.guest_id = $1 AND r.end_date < CURRENT_DATE
            GROUP BY p.id, r.id
            ORDER BY r.start_date
            LIMIT $2
            "#,
        )
        .bind(guest_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
