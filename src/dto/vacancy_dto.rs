use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::vacancy::{Vacancy, VacancyStatus};
use crate::services::vacancy_service::VacancyList;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateVacancyPayload {
    #[validate(length(min = 1, max = 200), custom(function = "crate::utils::validation::not_blank"))]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: String,
    pub hospital_id: Uuid,
    pub department_id: Option<Uuid>,
    /// Required when an admin creates a vacancy on behalf of a recruiter.
    pub recruiter_id: Option<Uuid>,
    #[validate(range(min = 1))]
    pub positions: Option<i32>,
    pub status: Option<VacancyStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateVacancyPayload {
    #[validate(length(min = 1, max = 200), custom(function = "crate::utils::validation::not_blank"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub department_id: Option<Uuid>,
    #[validate(range(min = 1))]
    pub positions: Option<i32>,
    pub status: Option<VacancyStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacancyResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub requirements: String,
    pub hospital_id: Uuid,
    pub department_id: Option<Uuid>,
    pub recruiter_id: Uuid,
    pub status: VacancyStatus,
    pub status_label: String,
    pub positions: i32,
    pub filled_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacancyListResponse {
    pub items: Vec<VacancyResponse>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VacancyListQuery {
    pub page: Option<String>,
    pub status: Option<String>,
    pub hospital: Option<String>,
    pub search: Option<String>,
}

impl From<Vacancy> for VacancyResponse {
    fn from(value: Vacancy) -> Self {
        Self {
            status_label: value.status.label().to_string(),
            id: value.id,
            title: value.title,
            description: value.description,
            requirements: value.requirements,
            hospital_id: value.hospital_id,
            department_id: value.department_id,
            recruiter_id: value.recruiter_id,
            status: value.status,
            positions: value.positions,
            filled_date: value.filled_date,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<VacancyList> for VacancyListResponse {
    fn from(value: VacancyList) -> Self {
        Self {
            items: value.items.into_iter().map(Into::into).collect(),
            total: value.page.total,
            page: value.page.page,
            per_page: value.page.per_page,
            total_pages: value.page.total_pages,
        }
    }
}
