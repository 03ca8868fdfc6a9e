use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::hospital_dto::{
        CreateDepartmentPayload, CreateHospitalPayload, DepartmentResponse, HospitalResponse,
    },
    error::Result,
    models::principal::Actor,
    AppState,
};

#[utoipa::path(
    post,
    path = "/hospitals",
    request_body = CreateHospitalPayload,
    responses(
        (status = 201, description = "Hospital created", body = HospitalResponse),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Admins only")
    )
)]
#[axum::debug_handler]
pub async fn create_hospital(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateHospitalPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let hospital = state.hospital_service.create(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(HospitalResponse::from(hospital))))
}

#[utoipa::path(
    get,
    path = "/hospitals",
    responses(
        (status = 200, description = "Hospitals visible to the caller")
    )
)]
#[axum::debug_handler]
pub async fn list_hospitals(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let hospitals = state.hospital_service.list(&actor).await?;
    let items: Vec<HospitalResponse> = hospitals.into_iter().map(Into::into).collect();
    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/hospitals/{id}/departments",
    params(
        ("id" = Uuid, Path, description = "Hospital ID")
    ),
    request_body = CreateDepartmentPayload,
    responses(
        (status = 201, description = "Department created", body = DepartmentResponse),
        (status = 400, description = "Invalid payload or duplicate name"),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Hospital not found")
    )
)]
#[axum::debug_handler]
pub async fn create_department(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateDepartmentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let department = state
        .hospital_service
        .create_department(&actor, id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(DepartmentResponse::from(department))))
}

#[utoipa::path(
    get,
    path = "/hospitals/{id}/departments",
    params(
        ("id" = Uuid, Path, description = "Hospital ID")
    ),
    responses(
        (status = 200, description = "Departments of the hospital"),
        (status = 404, description = "Hospital not found")
    )
)]
#[axum::debug_handler]
pub async fn list_departments(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let departments = state.hospital_service.list_departments(&actor, id).await?;
    let items: Vec<DepartmentResponse> = departments.into_iter().map(Into::into).collect();
    Ok(Json(items))
}
