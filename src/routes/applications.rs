use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    Extension,
};
use tokio_util::io::ReaderStream;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::application_dto::{
        ApplicationDetailResponse, ApplicationListItem, ApplicationListQuery,
        ApplicationListResponse, ApplicationResponse, DetailAction, EvaluationPayload,
        EvaluationResponse, EvaluationsResponse, StatusCountsResponse, SubmitApplicationPayload,
        ToggleFavoriteResponse,
    },
    error::{Error, Result},
    models::{
        application::{ApplicationStatus, ComplementaryInfo},
        principal::Actor,
    },
    services::{
        application_service::{NewApplication, ResumeUpload},
        authorization::ensure_staff,
        export_service::{ExportFormat, ExportService},
        query_service::ApplicationFilter,
        storage_service::content_type_for,
    },
    utils::time::now,
    AppState,
};

/// Multipart form: `cover_letter` text, `complementary` JSON, `resume` file.
#[utoipa::path(
    post,
    path = "/applications/apply/{vacancy_id}",
    params(
        ("vacancy_id" = Uuid, Path, description = "Vacancy ID")
    ),
    responses(
        (status = 201, description = "Application submitted", body = ApplicationResponse),
        (status = 400, description = "Invalid form or vacancy closed"),
        (status = 404, description = "Vacancy not found"),
        (status = 409, description = "Candidate already applied")
    )
)]
#[axum::debug_handler]
pub async fn apply(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(vacancy_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut form = SubmitApplicationPayload::default();
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "cover_letter" => form.cover_letter = Some(field.text().await?),
            "complementary" => {
                let raw = field.text().await?;
                if !raw.trim().is_empty() {
                    form.complementary = Some(serde_json::from_str::<ComplementaryInfo>(&raw)?);
                }
            }
            "resume" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await?;
                if !data.is_empty() {
                    upload = Some(ResumeUpload { file_name, data });
                }
            }
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }
    form.validate()?;

    let new = NewApplication {
        cover_letter: form.cover_letter,
        resume_blob_ref: None,
        complementary: form.complementary,
    };
    let application = state
        .application_service
        .submit_with_resume(&actor, vacancy_id, new, upload)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApplicationResponse::for_actor(application, &actor)),
    ))
}

#[utoipa::path(
    get,
    path = "/applications/list",
    params(
        ("status" = Option<String>, Query, description = "Application status"),
        ("vacancy" = Option<Uuid>, Query, description = "Vacancy ID"),
        ("hospital" = Option<Uuid>, Query, description = "Hospital ID"),
        ("date" = Option<String>, Query, description = "today, week, month, 7, 30 or 90"),
        ("search" = Option<String>, Query, description = "Candidate name, email or vacancy title"),
        ("favorites" = Option<String>, Query, description = "Only `true` is accepted"),
        ("score_sort" = Option<String>, Query, description = "high_to_low or low_to_high"),
        ("page" = Option<String>, Query, description = "1-based page number")
    ),
    responses(
        (status = 200, description = "Role-scoped applications", body = ApplicationListResponse),
        (status = 400, description = "Malformed filter")
    )
)]
#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    let filter = ApplicationFilter::parse(&query)?;
    let page = state
        .query_service
        .list(&actor, &filter, query.page.as_deref())
        .await?;
    Ok(Json(ApplicationListResponse::for_actor(page, &actor)))
}

#[utoipa::path(
    get,
    path = "/applications/detail/{id}",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Application detail", body = ApplicationDetailResponse),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn detail(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let detail = state.application_service.detail(&actor, id).await?;
    Ok(Json(ApplicationDetailResponse::from(detail)))
}

#[utoipa::path(
    post,
    path = "/applications/detail/{id}",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = DetailAction,
    responses(
        (status = 200, description = "Action applied", body = ApplicationDetailResponse),
        (status = 400, description = "Invalid payload or transition"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn detail_action(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(action): Json<DetailAction>,
) -> Result<impl IntoResponse> {
    let service = &state.application_service;
    let detail = match action {
        DetailAction::SaveAll(payload) => service.save_all(&actor, id, payload).await?,
        DetailAction::UpdateStatus(payload) => {
            payload.validate()?;
            let to = payload.status.trim().parse::<ApplicationStatus>()?;
            service.update_status(&actor, id, to, payload.note).await?;
            service.detail(&actor, id).await?
        }
        DetailAction::SetNotes(payload) => {
            payload.validate()?;
            service
                .set_recruiter_notes(&actor, id, payload.recruiter_notes)
                .await?;
            service.detail(&actor, id).await?
        }
    };
    Ok(Json(ApplicationDetailResponse::from(detail)))
}

#[utoipa::path(
    get,
    path = "/applications/toggle-favorite/{id}",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Current favorite state for the caller"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn favorite_state(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let is_favorite = state.favorite_service.is_favorite(&actor, id).await?;
    Ok(Json(serde_json::json!({ "is_favorite": is_favorite })))
}

#[utoipa::path(
    post,
    path = "/applications/toggle-favorite/{id}",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "New favorite state", body = ToggleFavoriteResponse),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let is_favorite = state.favorite_service.toggle(&actor, id).await?;
    Ok(Json(ToggleFavoriteResponse::new(is_favorite)))
}

/// Same filters and order as the list, without pagination.
#[utoipa::path(
    get,
    path = "/applications/export",
    params(
        ("format" = Option<String>, Query, description = "csv (default) or excel"),
        ("status" = Option<String>, Query, description = "Application status"),
        ("vacancy" = Option<Uuid>, Query, description = "Vacancy ID"),
        ("hospital" = Option<Uuid>, Query, description = "Hospital ID"),
        ("date" = Option<String>, Query, description = "today, week, month, 7, 30 or 90"),
        ("search" = Option<String>, Query, description = "Candidate name, email or vacancy title"),
        ("favorites" = Option<String>, Query, description = "Only `true` is accepted"),
        ("score_sort" = Option<String>, Query, description = "high_to_low or low_to_high")
    ),
    responses(
        (status = 200, description = "CSV or XLSX file"),
        (status = 400, description = "Malformed filter"),
        (status = 403, description = "Candidates cannot export")
    )
)]
#[axum::debug_handler]
pub async fn export(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    ensure_staff(&actor)?;
    let format = ExportFormat::parse(query.format.as_deref())?;
    let filter = ApplicationFilter::parse(&query)?;

    let rows = state.query_service.fetch_all(&actor, &filter).await?;
    let offset = state.query_service.display_offset();
    let file = tokio::task::spawn_blocking(move || {
        ExportService::render(format, &rows, offset, now())
    })
    .await
    .map_err(|e| Error::Internal(format!("export task failed: {e}")))??;

    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    ))
}

#[utoipa::path(
    get,
    path = "/applications/api/available-for-interview",
    responses(
        (status = 200, description = "Applications in pending, under_review or interview"),
        (status = 403, description = "Candidates cannot schedule interviews")
    )
)]
#[axum::debug_handler]
pub async fn available_for_interview(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let rows = state.query_service.available_for_interview(&actor).await?;
    let items: Vec<ApplicationListItem> = rows
        .into_iter()
        .map(|row| ApplicationListItem::for_actor(row, &actor))
        .collect();
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/applications/stats",
    responses(
        (status = 200, description = "Per-status counts and total", body = StatusCountsResponse)
    )
)]
#[axum::debug_handler]
pub async fn stats(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    let filter = ApplicationFilter::parse(&query)?;
    let counts = state.query_service.status_counts(&actor, &filter).await?;
    Ok(Json(StatusCountsResponse::from(counts)))
}

#[utoipa::path(
    get,
    path = "/applications/evaluations/{id}",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Evaluations and aggregate", body = EvaluationsResponse),
        (status = 403, description = "Candidates cannot read evaluations"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn list_evaluations(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let evaluations = state.evaluation_service.list(&actor, id).await?;
    let aggregate = state.evaluation_service.aggregate(&actor, id).await?;
    Ok(Json(EvaluationsResponse {
        items: evaluations.into_iter().map(Into::into).collect(),
        aggregate: aggregate.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/applications/evaluations/{id}",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = EvaluationPayload,
    responses(
        (status = 200, description = "Evaluation stored", body = EvaluationResponse),
        (status = 400, description = "Score out of range"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn upsert_evaluation(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EvaluationPayload>,
) -> Result<impl IntoResponse> {
    let evaluation = state.evaluation_service.upsert(&actor, id, payload).await?;
    Ok(Json(EvaluationResponse::from(evaluation)))
}

#[utoipa::path(
    get,
    path = "/applications/resume/{id}",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Résumé file"),
        (status = 404, description = "Application or résumé not found"),
        (status = 503, description = "Storage unavailable")
    )
)]
#[axum::debug_handler]
pub async fn download_resume(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let (key, file) = state.application_service.resume_download(&actor, id).await?;
    let file_name = key.rsplit('/').next().unwrap_or("resume").to_string();
    let disposition = format!("attachment; filename=\"{}\"", file_name);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type_for(&key).to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(ReaderStream::new(file)),
    ))
}
