use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// A candidate's résumé. Sections are kept as an ordered JSON document:
/// `education`, `work_experience`, `skills`, `certifications`, `languages`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Resume {
    pub candidate_id: Uuid,
    pub summary: Option<String>,
    pub content: JsonValue,
    pub updated_at: DateTime<Utc>,
}

pub const RESUME_SECTIONS: [&str; 5] = [
    "education",
    "work_experience",
    "skills",
    "certifications",
    "languages",
];
