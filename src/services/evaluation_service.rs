use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::dto::application_dto::EvaluationPayload;
use crate::error::Result;
use crate::models::evaluation::{ApplicationEvaluation, EvaluationAggregate, Scores};
use crate::models::event::DomainEvent;
use crate::models::principal::Actor;
use crate::services::application_service::{lock_application, LockedApplication};
use crate::services::authorization::{ensure_can_mutate, ensure_staff, ensure_visible, Mutation};
use crate::services::event_bus::EventBus;
use crate::services::query_service::fetch_row;
use crate::utils::validation::normalize_optional;

const EVALUATION_COLUMNS: &str = "id, application_id, evaluator_id, technical_score, \
     experience_score, cultural_fit_score, comments, created_at, updated_at";

#[derive(Clone)]
pub struct EvaluationService {
    pool: PgPool,
    events: EventBus,
}

impl EvaluationService {
    pub fn new(pool: PgPool, events: EventBus) -> Self {
        Self { pool, events }
    }

    /// One evaluation per (application, evaluator); a second submission replaces the first.
    pub async fn upsert(
        &self,
        actor: &Actor,
        application_id: Uuid,
        payload: EvaluationPayload,
    ) -> Result<ApplicationEvaluation> {
        let mut tx = self.pool.begin().await?;
        let locked = lock_application(&mut tx, application_id).await?;
        let (evaluation, event) = upsert_in_tx(&mut tx, actor, &locked, payload).await?;
        tx.commit().await?;

        self.events.publish(event);
        Ok(evaluation)
    }

    pub async fn list(&self, actor: &Actor, application_id: Uuid) -> Result<Vec<ApplicationEvaluation>> {
        let mut conn = self.pool.acquire().await?;
        authorize_read(&mut conn, actor, application_id).await?;
        list_for(&mut conn, application_id).await
    }

    pub async fn aggregate(&self, actor: &Actor, application_id: Uuid) -> Result<EvaluationAggregate> {
        let mut conn = self.pool.acquire().await?;
        authorize_read(&mut conn, actor, application_id).await?;
        aggregate_for(&mut conn, application_id).await
    }
}

async fn authorize_read(conn: &mut PgConnection, actor: &Actor, application_id: Uuid) -> Result<()> {
    let row = fetch_row(conn, actor.id(), application_id).await?;
    ensure_visible(actor, &row.scope())?;
    ensure_staff(actor)
}

/// Authorization runs before score validation so an outsider learns nothing
/// about the bounds.
pub async fn upsert_in_tx(
    conn: &mut PgConnection,
    actor: &Actor,
    locked: &LockedApplication,
    payload: EvaluationPayload,
) -> Result<(ApplicationEvaluation, DomainEvent)> {
    ensure_can_mutate(actor, &locked.scope(), Mutation::Evaluate)?;
    let scores = Scores::new(
        payload.technical_score,
        payload.experience_score,
        payload.cultural_fit_score,
    )?;
    payload.validate()?;

    let evaluation = sqlx::query_as::<_, ApplicationEvaluation>(&format!(
        r#"
        INSERT INTO application_evaluations (
            application_id, evaluator_id, technical_score, experience_score,
            cultural_fit_score, comments
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (application_id, evaluator_id) DO UPDATE SET
            technical_score = EXCLUDED.technical_score,
            experience_score = EXCLUDED.experience_score,
            cultural_fit_score = EXCLUDED.cultural_fit_score,
            comments = EXCLUDED.comments,
            updated_at = NOW()
        RETURNING {EVALUATION_COLUMNS}
        "#
    ))
    .bind(locked.id)
    .bind(actor.id())
    .bind(scores.technical)
    .bind(scores.experience)
    .bind(scores.cultural_fit)
    .bind(normalize_optional(payload.comments))
    .fetch_one(&mut *conn)
    .await?;

    tracing::info!(
        application_id = %locked.id,
        evaluation_id = %evaluation.id,
        actor = %actor,
        total = evaluation.total(),
        "evaluation saved"
    );
    let event = DomainEvent::EvaluationUpserted {
        application_id: locked.id,
        evaluator_id: actor.id(),
        evaluation_id: evaluation.id,
    };
    Ok((evaluation, event))
}

pub async fn list_for(conn: &mut PgConnection, application_id: Uuid) -> Result<Vec<ApplicationEvaluation>> {
    let rows = sqlx::query_as::<_, ApplicationEvaluation>(&format!(
        r#"
        SELECT {EVALUATION_COLUMNS}
        FROM application_evaluations
        WHERE application_id = $1
        ORDER BY created_at ASC, id ASC
        "#
    ))
    .bind(application_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

pub async fn aggregate_for(conn: &mut PgConnection, application_id: Uuid) -> Result<EvaluationAggregate> {
    let evaluations = list_for(conn, application_id).await?;
    Ok(EvaluationAggregate::from_evaluations(&evaluations))
}
