//! Rental service facade over the database repositories
//!
//! Reproduces the error contract of the portal's data module: account and
//! stay-history operations log failures and resolve to an absent value,
//! while property search and creation surface failures to the caller. The
//! repositories underneath always return typed results, so `Ok(None)` and
//! `Err` stay distinguishable everywhere except behind this facade.

use anyhow::Result;

use crate::db::{
    CreateProperty, CreateUser, Database, GuestStay, PropertyRecord, PropertySearch,
    PropertyWithRating, UserRecord,
};

/// Result cap applied when the caller does not pass a limit
pub const DEFAULT_RESULT_LIMIT: i64 = 10;

/// Facade over the rental database; holds only the pool handle and no
/// other state
#[derive(Clone)]
pub struct RentalService {
    db: Database,
}

impl RentalService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Look up a user by email. Resolves to `None` both when no user
    /// matches and when the query fails; the failure is logged.
    pub async fn user_by_email(&self, email: &str) -> Option<UserRecord> {
        match self.db.users().get_by_email(email).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(error = %e, email, "User lookup by email failed");
                None
            }
        }
    }

    /// Look up a user by id. Same absent-value contract as
    /// [user_by_email](Self::user_by_email).
    pub async fn user_by_id(&self, id: i64) -> Option<UserRecord> {
        match self.db.users().get_by_id(id).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(error = %e, id, "User lookup by id failed");
                None
            }
        }
    }

    /// Register a new user. Resolves to the stored row including its
    /// generated id, or `None` when the insert fails; the failure is
    /// logged.
    pub async fn register_user(&self, input: CreateUser) -> Option<UserRecord> {
        match self.db.users().create(input).await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::error!(error = %e, "User creation failed");
                None
            }
        }
    }

    /// List a guest's completed stays, oldest first. Resolves to `None`
    /// when the query fails, not an empty list; the failure is logged.
    pub async fn completed_stays_for_guest(
        &self,
        guest_id: i64,
        limit: Option<i64>,
    ) -> Option<Vec<GuestStay>> {
        let limit = limit.unwrap_or(DEFAULT_RESULT_LIMIT);
        match self
            .db
            .reservations()
            .list_completed_for_guest(guest_id, limit)
            .await
        {
            Ok(stays) => Some(stays),
            Err(e) => {
                tracing::error!(error = %e, guest_id, "Reservation listing failed");
                None
            }
        }
    }

    /// Search properties matching the given filters, cheapest first.
    /// Query failures surface to the caller unchanged.
    pub async fn search_properties(
        &self,
        filter: &PropertySearch,
        limit: Option<i64>,
    ) -> Result<Vec<PropertyWithRating>> {
        self.db
            .properties()
            .search(filter, limit.unwrap_or(DEFAULT_RESULT_LIMIT))
            .await
    }

    /// Add a property, returning the stored row including its generated
    /// id. Query failures surface to the caller unchanged.
    pub async fn add_property(&self, input: CreateProperty) -> Result<PropertyRecord> {
        self.db.properties().create(input).await
    }
}
