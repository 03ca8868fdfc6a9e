use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Hospital {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub state: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Hospital {
    /// `"{city}, {state}"`, as shown in listings and exports.
    pub fn location(&self) -> String {
        hospital_location(&self.city, &self.state)
    }
}

pub(crate) fn hospital_location(city: &str, state: &str) -> String {
    format!("{}, {}", city, state)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Department {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub name: String,
}
