use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::hospital::{Department, Hospital};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateHospitalPayload {
    #[validate(length(min = 1, max = 200), custom(function = "crate::utils::validation::not_blank"))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(equal = 2))]
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDepartmentPayload {
    #[validate(length(min = 1, max = 200), custom(function = "crate::utils::validation::not_blank"))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HospitalResponse {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub state: String,
    pub location: String,
    pub is_active: bool,
}

impl From<Hospital> for HospitalResponse {
    fn from(value: Hospital) -> Self {
        Self {
            location: value.location(),
            id: value.id,
            name: value.name,
            city: value.city,
            state: value.state,
            is_active: value.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentResponse {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub name: String,
}

impl From<Department> for DepartmentResponse {
    fn from(value: Department) -> Self {
        Self {
            id: value.id,
            hospital_id: value.hospital_id,
            name: value.name,
        }
    }
}
