//! Address model (collaborator table, read-only here)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery/billing address owned by a user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Address {
    pub id: String,
    pub user_id: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
}
