use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::resume::{Resume, RESUME_SECTIONS};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResumePayload {
    #[validate(length(max = 5000))]
    pub summary: Option<String>,
    /// Section name to an ordered list of entries.
    #[validate(custom(function = "validate_sections"))]
    #[serde(default = "empty_object")]
    pub content: JsonValue,
}

fn empty_object() -> JsonValue {
    JsonValue::Object(Default::default())
}

fn validate_sections(content: &JsonValue) -> Result<(), ValidationError> {
    let Some(sections) = content.as_object() else {
        return Err(ValidationError::new("content_must_be_object"));
    };
    for (name, entries) in sections {
        if !RESUME_SECTIONS.contains(&name.as_str()) {
            return Err(ValidationError::new("unknown_section"));
        }
        if !entries.is_array() {
            return Err(ValidationError::new("section_must_be_list"));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeResponse {
    pub candidate_id: Uuid,
    pub summary: Option<String>,
    pub content: JsonValue,
    pub updated_at: DateTime<Utc>,
}

impl From<Resume> for ResumeResponse {
    fn from(value: Resume) -> Self {
        Self {
            candidate_id: value.candidate_id,
            summary: value.summary,
            content: value.content,
            updated_at: value.updated_at,
        }
    }
}
