use crate::dto::resume_dto::ResumePayload;
use crate::error::{Error, Result};
use crate::models::principal::Actor;
use crate::models::resume::Resume;
use crate::services::identity_service::IdentityService;
use crate::utils::validation::normalize_optional;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct ResumeService {
    pool: PgPool,
    identity: IdentityService,
}

impl ResumeService {
    pub fn new(pool: PgPool, identity: IdentityService) -> Self {
        Self { pool, identity }
    }

    /// Same audience as the candidate profile: the owner, admins, and recruiters
    /// the candidate applied to.
    pub async fn get(&self, actor: &Actor, candidate_id: Uuid) -> Result<Option<Resume>> {
        self.identity.get_candidate_profile(actor, candidate_id).await?;
        let resume = sqlx::query_as::<_, Resume>(
            "SELECT candidate_id, summary, content, updated_at FROM resumes WHERE candidate_id = $1",
        )
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(resume)
    }

    pub async fn upsert(&self, actor: &Actor, payload: ResumePayload) -> Result<Resume> {
        let Actor::Candidate(candidate_id) = *actor else {
            return Err(Error::PermissionDenied);
        };
        let resume = sqlx::query_as::<_, Resume>(
            r#"
            INSERT INTO resumes (candidate_id, summary, content)
            VALUES ($1, $2, $3)
            ON CONFLICT (candidate_id) DO UPDATE SET
                summary = EXCLUDED.summary,
                content = EXCLUDED.content,
                updated_at = NOW()
            RETURNING candidate_id, summary, content, updated_at
            "#,
        )
        .bind(candidate_id)
        .bind(normalize_optional(payload.summary))
        .bind(&payload.content)
        .fetch_one(&self.pool)
        .await?;
        Ok(resume)
    }
}
