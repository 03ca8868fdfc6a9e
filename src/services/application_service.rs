use bytes::Bytes;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::dto::application_dto::SaveAllPayload;
use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus, ComplementaryInfo};
use crate::models::evaluation::{ApplicationEvaluation, EvaluationAggregate};
use crate::models::event::DomainEvent;
use crate::models::principal::{Actor, CandidateProfile};
use crate::models::vacancy::VacancyStatus;
use crate::services::authorization::{
    ensure_can_mutate, ensure_visible, AccessScope, Mutation,
};
use crate::services::evaluation_service::{list_for, upsert_in_tx};
use crate::services::event_bus::EventBus;
use crate::services::favorite_service::set_in_tx;
use crate::services::lifecycle_service::LifecycleCoordinator;
use crate::services::query_service::{fetch_row, ApplicationRow};
use crate::services::storage_service::BlobStore;
use crate::utils::validation::normalize_optional;

const APPLICATION_COLUMNS: &str = "id, candidate_id, vacancy_id, status, cover_letter, \
     resume_blob_ref, recruiter_notes, created_at, updated_at";

/// An application row locked together with its vacancy for the rest of the
/// transaction, with the ownership facts the policy needs.
#[derive(Debug, Clone, FromRow)]
pub struct LockedApplication {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub vacancy_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,
    pub recruiter_id: Uuid,
}

impl LockedApplication {
    pub fn scope(&self) -> AccessScope {
        AccessScope {
            candidate_id: self.candidate_id,
            recruiter_id: self.recruiter_id,
        }
    }
}

pub async fn lock_application(conn: &mut PgConnection, id: Uuid) -> Result<LockedApplication> {
    sqlx::query_as::<_, LockedApplication>(
        r#"
        SELECT a.id, a.candidate_id, a.vacancy_id, a.status, v.recruiter_id
        FROM applications a
        JOIN vacancies v ON v.id = a.vacancy_id
        WHERE a.id = $1
        FOR UPDATE OF a, v
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| Error::NotFound("Application not found".to_string()))
}

#[derive(Debug, Clone, Default)]
pub struct NewApplication {
    pub cover_letter: Option<String>,
    pub resume_blob_ref: Option<String>,
    pub complementary: Option<ComplementaryInfo>,
}

pub struct ResumeUpload {
    pub file_name: String,
    pub data: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub application_id: Uuid,
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
    pub vacancy_filled: bool,
}

pub struct ApplicationDetail {
    pub viewer: Actor,
    pub row: ApplicationRow,
    pub profile: Option<CandidateProfile>,
    pub complementary: Option<ComplementaryInfo>,
    /// Staff only.
    pub evaluations: Option<Vec<ApplicationEvaluation>>,
    pub aggregate: Option<EvaluationAggregate>,
}

#[derive(Clone)]
pub struct ApplicationService {
    pool: PgPool,
    events: EventBus,
    storage: BlobStore,
}

impl ApplicationService {
    pub fn new(pool: PgPool, events: EventBus, storage: BlobStore) -> Self {
        Self {
            pool,
            events,
            storage,
        }
    }

    pub async fn submit(
        &self,
        actor: &Actor,
        vacancy_id: Uuid,
        new: NewApplication,
    ) -> Result<Application> {
        let Actor::Candidate(candidate_id) = *actor else {
            return Err(Error::PermissionDenied);
        };
        if let Some(info) = &new.complementary {
            info.validate()?;
        }

        let mut tx = self.pool.begin().await?;
        // Shared lock: a concurrent fill waits for this insert, and vice versa.
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM vacancies WHERE id = $1 FOR SHARE")
                .bind(vacancy_id)
                .fetch_optional(&mut *tx)
                .await?;
        let status = status
            .ok_or_else(|| Error::NotFound("Vacancy not found".to_string()))
            .and_then(|s| Ok(VacancyStatus::try_from(s)?))?;
        if status != VacancyStatus::Open {
            return Err(Error::VacancyClosed);
        }

        let application = sqlx::query_as::<_, Application>(&format!(
            r#"
            INSERT INTO applications (candidate_id, vacancy_id, status, cover_letter, resume_blob_ref)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(candidate_id)
        .bind(vacancy_id)
        .bind(ApplicationStatus::Pending.as_str())
        .bind(normalize_optional(new.cover_letter))
        .bind(new.resume_blob_ref)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(info) = &new.complementary {
            insert_complementary(&mut tx, application.id, info).await?;
        }
        tx.commit().await?;

        tracing::info!(application_id = %application.id, %vacancy_id, actor = %actor, "application submitted");
        self.events.publish(DomainEvent::ApplicationSubmitted {
            application_id: application.id,
            candidate_id,
            vacancy_id,
        });
        Ok(application)
    }

    /// Stores the résumé first and removes it again if the application is rejected.
    pub async fn submit_with_resume(
        &self,
        actor: &Actor,
        vacancy_id: Uuid,
        mut new: NewApplication,
        upload: Option<ResumeUpload>,
    ) -> Result<Application> {
        let Some(upload) = upload else {
            return self.submit(actor, vacancy_id, new).await;
        };
        let Actor::Candidate(candidate_id) = *actor else {
            return Err(Error::PermissionDenied);
        };

        let key = self
            .storage
            .put_resume(candidate_id, &upload.file_name, &upload.data)
            .await?;
        new.resume_blob_ref = Some(key.clone());

        match self.submit(actor, vacancy_id, new).await {
            Ok(application) => Ok(application),
            Err(e) => {
                if let Err(cleanup) = self.storage.remove(&key).await {
                    tracing::warn!(error = ?cleanup, key = %key, "failed to remove orphaned resume");
                }
                Err(e)
            }
        }
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Application> {
        let mut conn = self.pool.acquire().await?;
        let row = fetch_row(&mut conn, actor.id(), id).await?;
        ensure_visible(actor, &row.scope())?;
        Ok(row.into_application())
    }

    pub async fn detail(&self, actor: &Actor, id: Uuid) -> Result<ApplicationDetail> {
        let mut conn = self.pool.acquire().await?;
        load_detail(&mut conn, actor, id).await
    }

    pub async fn update_status(
        &self,
        actor: &Actor,
        id: Uuid,
        to: ApplicationStatus,
        note: Option<String>,
    ) -> Result<StatusChange> {
        let mut tx = self.pool.begin().await?;
        let locked = lock_application(&mut tx, id).await?;
        let (change, events) = update_status_in_tx(&mut tx, actor, &locked, to, note).await?;
        tx.commit().await?;

        self.events.publish_all(events);
        Ok(change)
    }

    pub async fn set_recruiter_notes(
        &self,
        actor: &Actor,
        id: Uuid,
        notes: Option<String>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let locked = lock_application(&mut tx, id).await?;
        set_notes_in_tx(&mut tx, actor, &locked, notes).await?;
        tx.commit().await?;
        Ok(())
    }

    /// The recruiter's composite form: status, notes, favorite and evaluation
    /// in one transaction. A status equal to the current one is left alone.
    pub async fn save_all(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: SaveAllPayload,
    ) -> Result<ApplicationDetail> {
        payload.validate()?;
        let status = payload
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<ApplicationStatus>)
            .transpose()?;

        let mut tx = self.pool.begin().await?;
        let locked = lock_application(&mut tx, id).await?;
        ensure_visible(actor, &locked.scope())?;
        if !actor.is_staff() {
            return Err(Error::PermissionDenied);
        }

        let mut events = Vec::new();
        if let Some(to) = status.filter(|to| *to != locked.status) {
            let (_, emitted) = update_status_in_tx(&mut tx, actor, &locked, to, None).await?;
            events.extend(emitted);
        }
        if let Some(notes) = payload.recruiter_notes {
            set_notes_in_tx(&mut tx, actor, &locked, Some(notes)).await?;
        }
        if let Some(desired) = payload.is_favorite {
            ensure_can_mutate(actor, &locked.scope(), Mutation::Favorite)?;
            set_in_tx(&mut tx, locked.id, actor.id(), desired).await?;
        }
        if let Some(evaluation) = payload.evaluation {
            let (_, event) = upsert_in_tx(&mut tx, actor, &locked, evaluation).await?;
            events.push(event);
        }

        let detail = load_detail(&mut tx, actor, id).await?;
        tx.commit().await?;

        tracing::info!(application_id = %id, actor = %actor, "application saved");
        self.events.publish_all(events);
        Ok(detail)
    }

    /// Returns the stored key and an open handle for streaming.
    pub async fn resume_download(&self, actor: &Actor, id: Uuid) -> Result<(String, tokio::fs::File)> {
        let application = self.get(actor, id).await?;
        let key = application
            .resume_blob_ref
            .ok_or_else(|| Error::NotFound("Application has no resume".to_string()))?;
        let file = self.storage.open(&key).await?;
        tracing::info!(application_id = %id, actor = %actor, key = %key, "resume downloaded");
        Ok((key, file))
    }
}

/// Policy first, then the transition table: invisible is `NotFound`, visible
/// but not allowed is `PermissionDenied`, allowed but illegal is `InvalidTransition`.
pub async fn update_status_in_tx(
    conn: &mut PgConnection,
    actor: &Actor,
    locked: &LockedApplication,
    to: ApplicationStatus,
    note: Option<String>,
) -> Result<(StatusChange, Vec<DomainEvent>)> {
    ensure_can_mutate(actor, &locked.scope(), Mutation::Status(to))?;
    let from = locked.status;
    if !from.can_transition(to) {
        return Err(Error::InvalidTransition { from, to });
    }

    sqlx::query("UPDATE applications SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(locked.id)
        .bind(to.as_str())
        .execute(&mut *conn)
        .await?;

    tracing::info!(application_id = %locked.id, actor = %actor, %from, %to, "application status changed");
    let mut events = vec![DomainEvent::ApplicationStatusChanged {
        application_id: locked.id,
        actor_id: actor.id(),
        from,
        to,
        note: normalize_optional(note),
    }];
    let filled = LifecycleCoordinator::on_status_changed(conn, locked.vacancy_id, to).await?;
    let vacancy_filled = filled.is_some();
    events.extend(filled);

    Ok((
        StatusChange {
            application_id: locked.id,
            from,
            to,
            vacancy_filled,
        },
        events,
    ))
}

async fn set_notes_in_tx(
    conn: &mut PgConnection,
    actor: &Actor,
    locked: &LockedApplication,
    notes: Option<String>,
) -> Result<()> {
    ensure_can_mutate(actor, &locked.scope(), Mutation::Notes)?;
    sqlx::query("UPDATE applications SET recruiter_notes = $2, updated_at = NOW() WHERE id = $1")
        .bind(locked.id)
        .bind(normalize_optional(notes))
        .execute(&mut *conn)
        .await?;
    tracing::debug!(application_id = %locked.id, actor = %actor, "recruiter notes updated");
    Ok(())
}

async fn load_detail(conn: &mut PgConnection, actor: &Actor, id: Uuid) -> Result<ApplicationDetail> {
    let row = fetch_row(conn, actor.id(), id).await?;
    ensure_visible(actor, &row.scope())?;

    let profile = sqlx::query_as::<_, CandidateProfile>(
        r#"
        SELECT principal_id, phone, whatsapp, cpf, date_of_birth, address, city, state,
               postal_code, updated_at
        FROM candidate_profiles
        WHERE principal_id = $1
        "#,
    )
    .bind(row.candidate_id)
    .fetch_optional(&mut *conn)
    .await?;

    let complementary = sqlx::query_as::<_, ComplementaryInfo>(
        "SELECT * FROM application_complementary_info WHERE application_id = $1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let (evaluations, aggregate) = if actor.is_staff() {
        let evaluations = list_for(conn, id).await?;
        let aggregate = EvaluationAggregate::from_evaluations(&evaluations);
        (Some(evaluations), Some(aggregate))
    } else {
        (None, None)
    };

    Ok(ApplicationDetail {
        viewer: *actor,
        row,
        profile,
        complementary,
        evaluations,
        aggregate,
    })
}

async fn insert_complementary(
    conn: &mut PgConnection,
    application_id: Uuid,
    info: &ComplementaryInfo,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO application_complementary_info (
            application_id, currently_employed_here, present_role, has_area_experience,
            area_experience_description, last_role, experience_length,
            available_morning, available_afternoon, available_night, available_business_hours,
            available_day_shift, available_night_shift, immediate_start, previously_worked_here,
            previous_area_role, previous_termination_date, has_relatives_here, kinship_degree,
            relative_name_and_sector, is_pcd, cid, needs_accommodations, accommodations_description,
            council_name, council_registration_number, council_registration_valid_until,
            truthfulness_declared, notice_accepted, data_use_authorized
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
            $11, $12, $13, $14, $15, $16, $17, $18, $19, $20,
            $21, $22, $23, $24, $25, $26, $27, $28, $29, $30
        )
        "#,
    )
    .bind(application_id)
    .bind(info.currently_employed_here)
    .bind(&info.present_role)
    .bind(info.has_area_experience)
    .bind(&info.area_experience_description)
    .bind(&info.last_role)
    .bind(info.experience_length.as_str())
    .bind(info.available_morning)
    .bind(info.available_afternoon)
    .bind(info.available_night)
    .bind(info.available_business_hours)
    .bind(info.available_day_shift)
    .bind(info.available_night_shift)
    .bind(info.immediate_start)
    .bind(info.previously_worked_here)
    .bind(&info.previous_area_role)
    .bind(info.previous_termination_date)
    .bind(info.has_relatives_here)
    .bind(&info.kinship_degree)
    .bind(&info.relative_name_and_sector)
    .bind(info.is_pcd)
    .bind(&info.cid)
    .bind(info.needs_accommodations)
    .bind(&info.accommodations_description)
    .bind(&info.council_name)
    .bind(&info.council_registration_number)
    .bind(info.council_registration_valid_until)
    .bind(info.truthfulness_declared)
    .bind(info.notice_accepted)
    .bind(info.data_use_authorized)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
