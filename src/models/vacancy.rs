use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacancyStatus {
    Draft,
    Open,
    Filled,
    Closed,
}

impl VacancyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VacancyStatus::Draft => "draft",
            VacancyStatus::Open => "open",
            VacancyStatus::Filled => "filled",
            VacancyStatus::Closed => "closed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VacancyStatus::Draft => "Rascunho",
            VacancyStatus::Open => "Publicada",
            VacancyStatus::Filled => "Preenchida",
            VacancyStatus::Closed => "Fechada",
        }
    }

    /// Status changes a recruiter may make by hand. `Filled` is only ever set by
    /// the lifecycle coordinator once enough applications are approved.
    pub fn can_transition_manually(self, to: VacancyStatus) -> bool {
        use VacancyStatus::*;
        matches!(
            (self, to),
            (Draft, Open) | (Draft, Closed) | (Open, Closed) | (Closed, Open)
        )
    }
}

impl fmt::Display for VacancyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VacancyStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(VacancyStatus::Draft),
            "open" => Ok(VacancyStatus::Open),
            "filled" => Ok(VacancyStatus::Filled),
            "closed" => Ok(VacancyStatus::Closed),
            other => Err(UnknownVariant::new("vacancy status", other)),
        }
    }
}

impl TryFrom<String> for VacancyStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vacancy {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub requirements: String,
    pub hospital_id: Uuid,
    pub department_id: Option<Uuid>,
    pub recruiter_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: VacancyStatus,
    pub positions: i32,
    pub filled_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vacancy {
    pub fn is_open(&self) -> bool {
        self.status == VacancyStatus::Open
    }
}
