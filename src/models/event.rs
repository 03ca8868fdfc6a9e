use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::application::ApplicationStatus;

/// In-process events emitted by the application lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    ApplicationSubmitted {
        application_id: Uuid,
        candidate_id: Uuid,
        vacancy_id: Uuid,
    },
    ApplicationStatusChanged {
        application_id: Uuid,
        actor_id: Uuid,
        from: ApplicationStatus,
        to: ApplicationStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    EvaluationUpserted {
        application_id: Uuid,
        evaluator_id: Uuid,
        evaluation_id: Uuid,
    },
    VacancyFilled {
        vacancy_id: Uuid,
        filled_date: DateTime<Utc>,
        approved_count: i64,
    },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::ApplicationSubmitted { .. } => "application_submitted",
            DomainEvent::ApplicationStatusChanged { .. } => "application_status_changed",
            DomainEvent::EvaluationUpserted { .. } => "evaluation_upserted",
            DomainEvent::VacancyFilled { .. } => "vacancy_filled",
        }
    }

    /// `(entity_type, entity_id)` the event is about.
    pub fn subject(&self) -> (&'static str, Uuid) {
        match self {
            DomainEvent::ApplicationSubmitted { application_id, .. }
            | DomainEvent::ApplicationStatusChanged { application_id, .. }
            | DomainEvent::EvaluationUpserted { application_id, .. } => {
                ("application", *application_id)
            }
            DomainEvent::VacancyFilled { vacancy_id, .. } => ("vacancy", *vacancy_id),
        }
    }

    pub fn actor_id(&self) -> Option<Uuid> {
        match self {
            DomainEvent::ApplicationSubmitted { candidate_id, .. } => Some(*candidate_id),
            DomainEvent::ApplicationStatusChanged { actor_id, .. } => Some(*actor_id),
            DomainEvent::EvaluationUpserted { evaluator_id, .. } => Some(*evaluator_id),
            DomainEvent::VacancyFilled { .. } => None,
        }
    }
}
