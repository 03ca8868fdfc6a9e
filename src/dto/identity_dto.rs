use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::principal::{CandidateProfile, Principal, Role};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePrincipalPayload {
    pub role: Role,
    #[validate(length(min = 1, max = 150), custom(function = "crate::utils::validation::not_blank"))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    #[validate(email, length(max = 255))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRolePayload {
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CandidateProfilePayload {
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 20))]
    pub whatsapp: Option<String>,
    #[validate(length(max = 14))]
    pub cpf: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(equal = 2))]
    pub state: Option<String>,
    #[validate(length(max = 10))]
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipalResponse {
    pub id: Uuid,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Principal> for PrincipalResponse {
    fn from(value: Principal) -> Self {
        Self {
            full_name: value.full_name(),
            id: value.id,
            role: value.role,
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email,
            is_active: value.is_active,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfileResponse {
    pub principal_id: Uuid,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub cpf: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<CandidateProfile> for CandidateProfileResponse {
    fn from(value: CandidateProfile) -> Self {
        Self {
            principal_id: value.principal_id,
            phone: value.phone,
            whatsapp: value.whatsapp,
            cpf: value.cpf,
            date_of_birth: value.date_of_birth,
            address: value.address,
            city: value.city,
            state: value.state,
            postal_code: value.postal_code,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub principal: PrincipalResponse,
    pub profile: Option<CandidateProfileResponse>,
}
