use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::resume_dto::{ResumePayload, ResumeResponse},
    error::{Error, Result},
    models::principal::Actor,
    AppState,
};

#[utoipa::path(
    get,
    path = "/resume",
    responses(
        (status = 200, description = "Own résumé", body = ResumeResponse),
        (status = 403, description = "Candidates only"),
        (status = 404, description = "No résumé yet")
    )
)]
#[axum::debug_handler]
pub async fn get_own_resume(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let Actor::Candidate(id) = actor else {
        return Err(Error::PermissionDenied);
    };
    let resume = state
        .resume_service
        .get(&actor, id)
        .await?
        .ok_or_else(|| Error::NotFound("Resume not found".to_string()))?;
    Ok(Json(ResumeResponse::from(resume)))
}

#[utoipa::path(
    put,
    path = "/resume",
    request_body = ResumePayload,
    responses(
        (status = 200, description = "Résumé saved", body = ResumeResponse),
        (status = 400, description = "Unknown section or malformed content"),
        (status = 403, description = "Candidates only")
    )
)]
#[axum::debug_handler]
pub async fn put_resume(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<ResumePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let resume = state.resume_service.upsert(&actor, payload).await?;
    Ok(Json(ResumeResponse::from(resume)))
}

#[utoipa::path(
    get,
    path = "/candidates/{id}/resume",
    params(
        ("id" = Uuid, Path, description = "Candidate principal ID")
    ),
    responses(
        (status = 200, description = "Candidate résumé", body = ResumeResponse),
        (status = 404, description = "Not found or not visible")
    )
)]
#[axum::debug_handler]
pub async fn candidate_resume(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let resume = state
        .resume_service
        .get(&actor, id)
        .await?
        .ok_or_else(|| Error::NotFound("Resume not found".to_string()))?;
    Ok(Json(ResumeResponse::from(resume)))
}
