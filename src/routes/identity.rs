use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::identity_dto::{
        CandidateProfilePayload, CandidateProfileResponse, ChangeRolePayload,
        CreatePrincipalPayload, MeResponse, PrincipalResponse,
    },
    error::{Error, Result},
    models::principal::Actor,
    services::authorization::ensure_admin,
    AppState,
};

#[utoipa::path(
    post,
    path = "/admin/principals",
    request_body = CreatePrincipalPayload,
    responses(
        (status = 201, description = "Principal created", body = PrincipalResponse),
        (status = 400, description = "Invalid payload or email taken"),
        (status = 403, description = "Admins only")
    )
)]
#[axum::debug_handler]
pub async fn create_principal(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreatePrincipalPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let principal = state.identity_service.create_principal(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(PrincipalResponse::from(principal))))
}

#[utoipa::path(
    patch,
    path = "/admin/principals/{id}/role",
    params(
        ("id" = Uuid, Path, description = "Principal ID")
    ),
    request_body = ChangeRolePayload,
    responses(
        (status = 200, description = "Role changed", body = PrincipalResponse),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Principal not found")
    )
)]
#[axum::debug_handler]
pub async fn change_role(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeRolePayload>,
) -> Result<impl IntoResponse> {
    let principal = state
        .identity_service
        .change_role(&actor, id, payload.role)
        .await?;
    Ok(Json(PrincipalResponse::from(principal)))
}

#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "The authenticated principal", body = MeResponse)
    )
)]
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let principal = state.identity_service.get_principal(actor.id()).await?;
    let profile = match actor {
        Actor::Candidate(id) => state
            .identity_service
            .get_candidate_profile(&actor, id)
            .await?
            .map(Into::into),
        _ => None,
    };
    Ok(Json(MeResponse {
        principal: principal.into(),
        profile,
    }))
}

#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "Own candidate profile", body = CandidateProfileResponse),
        (status = 403, description = "Candidates only"),
        (status = 404, description = "No profile yet")
    )
)]
#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let Actor::Candidate(id) = actor else {
        return Err(Error::PermissionDenied);
    };
    let profile = state
        .identity_service
        .get_candidate_profile(&actor, id)
        .await?
        .ok_or_else(|| Error::NotFound("Profile not found".to_string()))?;
    Ok(Json(CandidateProfileResponse::from(profile)))
}

#[utoipa::path(
    put,
    path = "/profile",
    request_body = CandidateProfilePayload,
    responses(
        (status = 200, description = "Profile saved", body = CandidateProfileResponse),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Candidates only")
    )
)]
#[axum::debug_handler]
pub async fn put_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CandidateProfilePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let profile = state
        .identity_service
        .upsert_candidate_profile(&actor, payload)
        .await?;
    Ok(Json(CandidateProfileResponse::from(profile)))
}

#[utoipa::path(
    get,
    path = "/candidates/{id}/profile",
    params(
        ("id" = Uuid, Path, description = "Candidate principal ID")
    ),
    responses(
        (status = 200, description = "Candidate profile", body = CandidateProfileResponse),
        (status = 404, description = "Not found or not visible")
    )
)]
#[axum::debug_handler]
pub async fn candidate_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let profile = state
        .identity_service
        .get_candidate_profile(&actor, id)
        .await?
        .ok_or_else(|| Error::NotFound("Profile not found".to_string()))?;
    Ok(Json(CandidateProfileResponse::from(profile)))
}

#[utoipa::path(
    get,
    path = "/admin/audit/{entity_type}/{entity_id}",
    params(
        ("entity_type" = String, Path, description = "application or vacancy"),
        ("entity_id" = Uuid, Path, description = "Entity ID")
    ),
    responses(
        (status = 200, description = "Audit trail, oldest first"),
        (status = 403, description = "Admins only")
    )
)]
#[axum::debug_handler]
pub async fn audit_trail(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((entity_type, entity_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse> {
    ensure_admin(&actor)?;
    let entries = state
        .audit_service
        .for_entity(&entity_type, entity_id)
        .await?;
    Ok(Json(entries))
}
