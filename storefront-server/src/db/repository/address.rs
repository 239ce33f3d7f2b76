//! Address Repository
//!
//! Addresses are a collaborator table. Checkout only needs to prove that an
//! address id exists and belongs to the buyer.

use super::RepoResult;
use crate::db::models::Address;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Clone)]
pub struct AddressRepository {
    pool: SqlitePool,
}

impl AddressRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Resolve an address id scoped to its owner
    ///
    /// Returns `None` both for unknown ids and for addresses owned by someone
    /// else, so callers cannot distinguish (and leak) the two cases.
    pub async fn resolve(&self, address_id: &str, user_id: &str) -> RepoResult<Option<Address>> {
        let address = sqlx::query_as::<_, Address>(
            "SELECT * FROM addresses WHERE id = ? AND user_id = ?",
        )
        .bind(address_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(address)
    }

    /// Insert an address for a user
    pub async fn insert(
        &self,
        user_id: &str,
        line1: &str,
        city: &str,
        postal_code: &str,
        country: &str,
    ) -> RepoResult<Address> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO addresses (id, user_id, line1, line2, city, postal_code, country, created_at)
            VALUES (?, ?, ?, NULL, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(line1)
        .bind(city)
        .bind(postal_code)
        .bind(country)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Address {
            id,
            user_id: user_id.to_string(),
            line1: line1.to_string(),
            line2: None,
            city: city.to_string(),
            postal_code: postal_code.to_string(),
            country: country.to_string(),
            created_at: now,
        })
    }
}
