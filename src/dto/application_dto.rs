use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::identity_dto::CandidateProfileResponse;
use crate::models::application::{Application, ApplicationStatus, ComplementaryInfo};
use crate::models::evaluation::{format_score, round_score, ApplicationEvaluation, EvaluationAggregate};
use crate::models::principal::Actor;
use crate::services::application_service::ApplicationDetail;
use crate::services::query_service::{ApplicationPage, ApplicationRow, StatusCounts};

/// Raw query string shared by the list, export and stats endpoints. Values are
/// validated by the query engine so malformed filters map to a validation error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationListQuery {
    pub status: Option<String>,
    pub vacancy: Option<String>,
    pub hospital: Option<String>,
    pub date: Option<String>,
    pub search: Option<String>,
    pub favorites: Option<String>,
    pub score_sort: Option<String>,
    pub page: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SubmitApplicationPayload {
    #[validate(length(max = 10000))]
    pub cover_letter: Option<String>,
    pub complementary: Option<ComplementaryInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StatusUpdatePayload {
    pub status: String,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NotesPayload {
    #[validate(length(max = 10000))]
    pub recruiter_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EvaluationPayload {
    pub technical_score: i32,
    pub experience_score: i32,
    pub cultural_fit_score: i32,
    #[validate(length(max = 5000))]
    pub comments: Option<String>,
}

/// The recruiter's detail form. Every part is optional; whatever is present is
/// applied together or not at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SaveAllPayload {
    pub status: Option<String>,
    #[validate(length(max = 10000))]
    pub recruiter_notes: Option<String>,
    pub is_favorite: Option<bool>,
    #[validate(nested)]
    pub evaluation: Option<EvaluationPayload>,
}

/// Body of `POST /applications/detail/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DetailAction {
    SaveAll(SaveAllPayload),
    UpdateStatus(StatusUpdatePayload),
    SetNotes(NotesPayload),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub vacancy_id: Uuid,
    pub status: ApplicationStatus,
    pub status_label: String,
    pub cover_letter: Option<String>,
    pub has_resume: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recruiter_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationResponse {
    /// Recruiter notes never reach the candidate.
    pub fn for_actor(value: Application, actor: &Actor) -> Self {
        Self {
            id: value.id,
            candidate_id: value.candidate_id,
            vacancy_id: value.vacancy_id,
            status: value.status,
            status_label: value.status.label().to_string(),
            cover_letter: value.cover_letter,
            has_resume: value.resume_blob_ref.is_some(),
            recruiter_notes: value.recruiter_notes.filter(|_| actor.is_staff()),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationListItem {
    pub id: Uuid,
    pub status: ApplicationStatus,
    pub status_label: String,
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub vacancy_id: Uuid,
    pub vacancy_title: String,
    pub hospital_id: Uuid,
    pub hospital_name: String,
    pub hospital_location: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

impl ApplicationListItem {
    pub fn for_actor(row: ApplicationRow, actor: &Actor) -> Self {
        let staff = actor.is_staff();
        Self {
            candidate_name: row.candidate_name(),
            hospital_location: row.hospital_location(),
            status_label: row.status.label().to_string(),
            score: staff.then(|| format_score(row.score_key)),
            evaluation_count: staff.then_some(row.evaluation_count),
            is_favorite: staff.then_some(row.is_favorite),
            id: row.id,
            status: row.status,
            candidate_id: row.candidate_id,
            candidate_email: row.email,
            vacancy_id: row.vacancy_id,
            vacancy_title: row.vacancy_title,
            hospital_id: row.hospital_id,
            hospital_name: row.hospital_name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationListResponse {
    pub items: Vec<ApplicationListItem>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl ApplicationListResponse {
    pub fn for_actor(value: ApplicationPage, actor: &Actor) -> Self {
        Self {
            items: value
                .items
                .into_iter()
                .map(|row| ApplicationListItem::for_actor(row, actor))
                .collect(),
            total: value.page.total,
            page: value.page.page,
            per_page: value.page.per_page,
            total_pages: value.page.total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResponse {
    pub id: Uuid,
    pub application_id: Uuid,
    pub evaluator_id: Uuid,
    pub technical_score: i16,
    pub experience_score: i16,
    pub cultural_fit_score: i16,
    pub total: i32,
    pub average: Decimal,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ApplicationEvaluation> for EvaluationResponse {
    fn from(value: ApplicationEvaluation) -> Self {
        Self {
            total: value.total(),
            average: value.average(),
            id: value.id,
            application_id: value.application_id,
            evaluator_id: value.evaluator_id,
            technical_score: value.technical_score,
            experience_score: value.experience_score,
            cultural_fit_score: value.cultural_fit_score,
            comments: value.comments,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResponse {
    pub count: i64,
    pub avg_technical: Option<Decimal>,
    pub avg_experience: Option<Decimal>,
    pub avg_cultural_fit: Option<Decimal>,
    pub avg_total: Option<Decimal>,
    /// One decimal place, or `N/A` when nobody has evaluated yet.
    pub display: String,
}

impl From<EvaluationAggregate> for AggregateResponse {
    fn from(value: EvaluationAggregate) -> Self {
        Self {
            count: value.count,
            avg_technical: value.averages.map(|a| a.technical),
            avg_experience: value.averages.map(|a| a.experience),
            avg_cultural_fit: value.averages.map(|a| a.cultural_fit),
            avg_total: value.averages.map(|a| round_score(a.total)),
            display: value.display_total(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationsResponse {
    pub items: Vec<EvaluationResponse>,
    pub aggregate: AggregateResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDetailResponse {
    pub application: ApplicationResponse,
    pub candidate_name: String,
    pub candidate_email: String,
    pub candidate_profile: Option<CandidateProfileResponse>,
    pub vacancy_title: String,
    pub hospital_name: String,
    pub hospital_location: String,
    pub complementary: Option<ComplementaryInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluations: Option<Vec<EvaluationResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<AggregateResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

impl From<ApplicationDetail> for ApplicationDetailResponse {
    fn from(value: ApplicationDetail) -> Self {
        let actor = value.viewer;
        Self {
            candidate_name: value.row.candidate_name(),
            hospital_location: value.row.hospital_location(),
            candidate_email: value.row.email.clone(),
            vacancy_title: value.row.vacancy_title.clone(),
            hospital_name: value.row.hospital_name.clone(),
            is_favorite: actor.is_staff().then_some(value.row.is_favorite),
            application: ApplicationResponse::for_actor(value.row.into_application(), &actor),
            candidate_profile: value.profile.map(Into::into),
            complementary: value.complementary,
            evaluations: value
                .evaluations
                .map(|items| items.into_iter().map(Into::into).collect()),
            aggregate: value.aggregate.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleFavoriteResponse {
    pub success: bool,
    pub is_favorite: bool,
    pub message: String,
}

impl ToggleFavoriteResponse {
    pub fn new(is_favorite: bool) -> Self {
        let message = if is_favorite {
            "Candidatura adicionada aos favoritos"
        } else {
            "Candidatura removida dos favoritos"
        };
        Self {
            success: true,
            is_favorite,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCountItem {
    pub status: ApplicationStatus,
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCountsResponse {
    pub counts: Vec<StatusCountItem>,
    pub total: i64,
}

impl From<StatusCounts> for StatusCountsResponse {
    fn from(value: StatusCounts) -> Self {
        Self {
            total: value.total(),
            counts: value
                .iter()
                .map(|(status, count)| StatusCountItem {
                    status,
                    label: status.label().to_string(),
                    count,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detail_actions_are_tagged() {
        let action: DetailAction = serde_json::from_value(json!({
            "action": "save_all",
            "status": "interview",
            "is_favorite": true,
            "evaluation": {"technical_score": 8, "experience_score": 7, "cultural_fit_score": 9}
        }))
        .unwrap();
        match action {
            DetailAction::SaveAll(payload) => {
                assert_eq!(payload.status.as_deref(), Some("interview"));
                assert_eq!(payload.is_favorite, Some(true));
                assert_eq!(payload.evaluation.unwrap().technical_score, 8);
            }
            other => panic!("unexpected action {other:?}"),
        }

        let withdraw: DetailAction =
            serde_json::from_value(json!({"action": "update_status", "status": "withdrawn"}))
                .unwrap();
        assert!(matches!(withdraw, DetailAction::UpdateStatus(_)));
        assert!(serde_json::from_value::<DetailAction>(json!({"action": "delete"})).is_err());
    }

    #[test]
    fn notes_are_hidden_from_candidates() {
        let candidate = Uuid::new_v4();
        let application = Application {
            id: Uuid::new_v4(),
            candidate_id: candidate,
            vacancy_id: Uuid::new_v4(),
            status: ApplicationStatus::UnderReview,
            cover_letter: None,
            resume_blob_ref: None,
            recruiter_notes: Some("perfil forte".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let own = ApplicationResponse::for_actor(application.clone(), &Actor::Candidate(candidate));
        assert!(own.recruiter_notes.is_none());
        let staff = ApplicationResponse::for_actor(application, &Actor::Admin(Uuid::new_v4()));
        assert_eq!(staff.recruiter_notes.as_deref(), Some("perfil forte"));
    }

    #[test]
    fn toggle_messages_follow_state() {
        assert!(ToggleFavoriteResponse::new(true).message.contains("adicionada"));
        assert!(ToggleFavoriteResponse::new(false).message.contains("removida"));
    }
}
