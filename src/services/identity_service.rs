use crate::dto::identity_dto::{CandidateProfilePayload, CreatePrincipalPayload};
use crate::error::{Error, Result};
use crate::models::principal::{Actor, CandidateProfile, Principal, Role};
use crate::services::authorization::{ensure_admin, visible_set, VisibleSet};
use crate::utils::validation::normalize_optional;
use sqlx::PgPool;
use uuid::Uuid;

const PRINCIPAL_COLUMNS: &str =
    "id, role, first_name, last_name, email, is_active, created_at, updated_at";
const EMAIL_UNIQUE: &str = "principals_email_key";

#[derive(Clone)]
pub struct IdentityService {
    pool: PgPool,
}

impl IdentityService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_principal(&self, id: Uuid) -> Result<Principal> {
        sqlx::query_as::<_, Principal>(&format!(
            "SELECT {PRINCIPAL_COLUMNS} FROM principals WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Principal not found".to_string()))
    }

    /// Resolves a token subject into an actor. The stored role wins over any claim.
    pub async fn resolve_actor(&self, id: Uuid) -> Result<Actor> {
        let principal = match self.get_principal(id).await {
            Ok(principal) => principal,
            Err(Error::NotFound(_)) => {
                return Err(Error::Unauthorized("unknown principal".to_string()))
            }
            Err(e) => return Err(e),
        };
        if !principal.is_active {
            return Err(Error::Unauthorized("inactive principal".to_string()));
        }
        Ok(principal.actor())
    }

    pub async fn create_principal(
        &self,
        actor: &Actor,
        payload: CreatePrincipalPayload,
    ) -> Result<Principal> {
        ensure_admin(actor)?;

        let principal = sqlx::query_as::<_, Principal>(&format!(
            r#"
            INSERT INTO principals (role, first_name, last_name, email)
            VALUES ($1, $2, $3, $4)
            RETURNING {PRINCIPAL_COLUMNS}
            "#
        ))
        .bind(payload.role.as_str())
        .bind(payload.first_name.trim())
        .bind(payload.last_name.trim())
        .bind(payload.email.trim().to_lowercase())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.constraint() == Some(EMAIL_UNIQUE) => {
                Error::Validation("email already registered".to_string())
            }
            _ => Error::from(e),
        })?;

        tracing::info!(principal_id = %principal.id, role = %principal.role, actor = %actor, "principal created");
        Ok(principal)
    }

    pub async fn change_role(&self, actor: &Actor, id: Uuid, role: Role) -> Result<Principal> {
        ensure_admin(actor)?;

        let principal = sqlx::query_as::<_, Principal>(&format!(
            r#"
            UPDATE principals
            SET role = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {PRINCIPAL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Principal not found".to_string()))?;

        tracing::info!(principal_id = %id, role = %role, actor = %actor, "principal role changed");
        Ok(principal)
    }

    /// Candidates read their own profile; recruiters read profiles of candidates
    /// who applied to one of their vacancies; admins read any.
    pub async fn get_candidate_profile(
        &self,
        actor: &Actor,
        candidate_id: Uuid,
    ) -> Result<Option<CandidateProfile>> {
        let allowed = match visible_set(actor) {
            VisibleSet::All => true,
            VisibleSet::SubmittedBy(id) => id == candidate_id,
            VisibleSet::VacanciesOwnedBy(recruiter_id) => {
                sqlx::query_scalar::<_, bool>(
                    r#"
                    SELECT EXISTS (
                        SELECT 1 FROM applications a
                        JOIN vacancies v ON v.id = a.vacancy_id
                        WHERE a.candidate_id = $1 AND v.recruiter_id = $2
                    )
                    "#,
                )
                .bind(candidate_id)
                .bind(recruiter_id)
                .fetch_one(&self.pool)
                .await?
            }
        };
        if !allowed {
            return Err(Error::NotFound("Candidate not found".to_string()));
        }

        let profile = sqlx::query_as::<_, CandidateProfile>(
            r#"
            SELECT principal_id, phone, whatsapp, cpf, date_of_birth, address, city, state,
                   postal_code, updated_at
            FROM candidate_profiles
            WHERE principal_id = $1
            "#,
        )
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    pub async fn upsert_candidate_profile(
        &self,
        actor: &Actor,
        payload: CandidateProfilePayload,
    ) -> Result<CandidateProfile> {
        let Actor::Candidate(candidate_id) = *actor else {
            return Err(Error::PermissionDenied);
        };

        let profile = sqlx::query_as::<_, CandidateProfile>(
            r#"
            INSERT INTO candidate_profiles (
                principal_id, phone, whatsapp, cpf, date_of_birth, address, city, state, postal_code
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (principal_id) DO UPDATE SET
                phone = EXCLUDED.phone,
                whatsapp = EXCLUDED.whatsapp,
                cpf = EXCLUDED.cpf,
                date_of_birth = EXCLUDED.date_of_birth,
                address = EXCLUDED.address,
                city = EXCLUDED.city,
                state = EXCLUDED.state,
                postal_code = EXCLUDED.postal_code,
                updated_at = NOW()
            RETURNING principal_id, phone, whatsapp, cpf, date_of_birth, address, city, state,
                      postal_code, updated_at
            "#,
        )
        .bind(candidate_id)
        .bind(normalize_optional(payload.phone))
        .bind(normalize_optional(payload.whatsapp))
        .bind(normalize_optional(payload.cpf))
        .bind(payload.date_of_birth)
        .bind(normalize_optional(payload.address))
        .bind(normalize_optional(payload.city))
        .bind(normalize_optional(payload.state).map(|s| s.to_uppercase()))
        .bind(normalize_optional(payload.postal_code))
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }
}
