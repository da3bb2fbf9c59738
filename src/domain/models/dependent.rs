use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A linked profile (typically a child) an account can book on behalf of.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Dependent {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Dependent {
    pub fn new(user_id: String, name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            name,
            created_at: Utc::now(),
        }
    }
}
