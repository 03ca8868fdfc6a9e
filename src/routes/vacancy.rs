use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::vacancy_dto::{
        CreateVacancyPayload, UpdateVacancyPayload, VacancyListQuery, VacancyListResponse,
        VacancyResponse,
    },
    error::Result,
    models::principal::Actor,
    AppState,
};

#[utoipa::path(
    post,
    path = "/vacancies",
    request_body = CreateVacancyPayload,
    responses(
        (status = 201, description = "Vacancy created successfully", body = VacancyResponse),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Only recruiters and admins create vacancies")
    )
)]
#[axum::debug_handler]
pub async fn create_vacancy(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateVacancyPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let vacancy = state.vacancy_service.create(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(VacancyResponse::from(vacancy))))
}

#[utoipa::path(
    patch,
    path = "/vacancies/{id}",
    params(
        ("id" = Uuid, Path, description = "Vacancy ID")
    ),
    request_body = UpdateVacancyPayload,
    responses(
        (status = 200, description = "Vacancy updated successfully", body = VacancyResponse),
        (status = 400, description = "Invalid payload or status change"),
        (status = 403, description = "Not the owning recruiter"),
        (status = 404, description = "Vacancy not found")
    )
)]
#[axum::debug_handler]
pub async fn update_vacancy(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVacancyPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let vacancy = state.vacancy_service.update(&actor, id, payload).await?;
    Ok(Json(VacancyResponse::from(vacancy)))
}

#[utoipa::path(
    get,
    path = "/vacancies",
    params(
        ("page" = Option<String>, Query, description = "Page number"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("hospital" = Option<Uuid>, Query, description = "Filter by hospital"),
        ("search" = Option<String>, Query, description = "Search in title")
    ),
    responses(
        (status = 200, description = "List of vacancies", body = VacancyListResponse)
    )
)]
#[axum::debug_handler]
pub async fn list_vacancies(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<VacancyListQuery>,
) -> Result<impl IntoResponse> {
    let result = state.vacancy_service.list(&actor, query).await?;
    Ok(Json(VacancyListResponse::from(result)))
}

#[utoipa::path(
    get,
    path = "/vacancies/{id}",
    params(
        ("id" = Uuid, Path, description = "Vacancy ID")
    ),
    responses(
        (status = 200, description = "Vacancy found", body = VacancyResponse),
        (status = 404, description = "Vacancy not found")
    )
)]
#[axum::debug_handler]
pub async fn get_vacancy(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let vacancy = state.vacancy_service.get(&actor, id).await?;
    Ok(Json(VacancyResponse::from(vacancy)))
}
