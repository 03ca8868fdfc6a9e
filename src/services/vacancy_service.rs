use crate::dto::vacancy_dto::{CreateVacancyPayload, UpdateVacancyPayload, VacancyListQuery};
use crate::error::{Error, Result};
use crate::models::principal::{Actor, Role};
use crate::models::vacancy::{Vacancy, VacancyStatus};
use crate::services::authorization::{visible_set, VisibleSet};
use crate::services::event_bus::EventBus;
use crate::services::lifecycle_service::LifecycleCoordinator;
use crate::utils::pagination::{like_pattern, parse_page, PageInfo};
use crate::utils::validation::normalize_optional;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const VACANCY_COLUMNS: &str = "v.id, v.title, v.description, v.requirements, v.hospital_id, \
     v.department_id, v.recruiter_id, v.status, v.positions, v.filled_date, v.created_at, v.updated_at";

#[derive(Clone)]
pub struct VacancyService {
    pool: PgPool,
    events: EventBus,
    page_size: i64,
}

pub struct VacancyList {
    pub items: Vec<Vacancy>,
    pub page: PageInfo,
}

impl VacancyService {
    pub fn new(pool: PgPool, events: EventBus, page_size: i64) -> Self {
        Self {
            pool,
            events,
            page_size,
        }
    }

    pub async fn create(&self, actor: &Actor, payload: CreateVacancyPayload) -> Result<Vacancy> {
        let recruiter_id = match (*actor, payload.recruiter_id) {
            (Actor::Recruiter(id), None) => id,
            (Actor::Recruiter(id), Some(named)) if named == id => id,
            (Actor::Admin(_), Some(named)) => named,
            (Actor::Admin(_), None) => {
                return Err(Error::Validation("recruiter_id is required".to_string()))
            }
            _ => return Err(Error::PermissionDenied),
        };
        let status = payload.status.unwrap_or(VacancyStatus::Draft);
        if !matches!(status, VacancyStatus::Draft | VacancyStatus::Open) {
            return Err(Error::Validation(
                "a vacancy starts as draft or open".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        ensure_recruiter(&mut tx, recruiter_id).await?;
        ensure_placement(&mut tx, payload.hospital_id, payload.department_id).await?;

        let vacancy = sqlx::query_as::<_, Vacancy>(&format!(
            r#"
            INSERT INTO vacancies AS v (
                title, description, requirements, hospital_id, department_id,
                recruiter_id, status, positions
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {VACANCY_COLUMNS}
            "#
        ))
        .bind(payload.title.trim())
        .bind(normalize_optional(payload.description))
        .bind(payload.requirements.trim())
        .bind(payload.hospital_id)
        .bind(payload.department_id)
        .bind(recruiter_id)
        .bind(status.as_str())
        .bind(payload.positions.unwrap_or(1))
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(vacancy_id = %vacancy.id, actor = %actor, status = %vacancy.status, "vacancy created");
        Ok(vacancy)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateVacancyPayload,
    ) -> Result<Vacancy> {
        let mut tx = self.pool.begin().await?;
        let current = lock_vacancy(&mut tx, id).await?;
        if !can_see(&mut tx, actor, &current).await? {
            return Err(Error::NotFound("Vacancy not found".to_string()));
        }
        if !owns(actor, &current) {
            return Err(Error::PermissionDenied);
        }

        let status = match payload.status {
            Some(to) if to != current.status => {
                if !current.status.can_transition_manually(to) {
                    return Err(Error::Validation(format!(
                        "vacancy cannot move from {} to {}",
                        current.status, to
                    )));
                }
                to
            }
            _ => current.status,
        };
        if current.status == VacancyStatus::Filled
            && payload.positions.is_some_and(|p| p != current.positions)
        {
            return Err(Error::Validation(
                "positions of a filled vacancy cannot change".to_string(),
            ));
        }
        if let Some(department_id) = payload.department_id {
            ensure_placement(&mut tx, current.hospital_id, Some(department_id)).await?;
        }

        let vacancy = sqlx::query_as::<_, Vacancy>(&format!(
            r#"
            UPDATE vacancies AS v
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                requirements = COALESCE($4, requirements),
                department_id = COALESCE($5, department_id),
                positions = COALESCE($6, positions),
                status = $7,
                updated_at = NOW()
            WHERE v.id = $1
            RETURNING {VACANCY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(payload.title.as_deref().map(str::trim))
        .bind(normalize_optional(payload.description))
        .bind(payload.requirements.as_deref().map(str::trim))
        .bind(payload.department_id)
        .bind(payload.positions)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        // Lowering positions or reopening may already satisfy the approvals on record.
        let filled = LifecycleCoordinator::fill_if_complete(&mut tx, id).await?;
        let vacancy = if filled.is_some() {
            lock_vacancy(&mut tx, id).await?
        } else {
            vacancy
        };
        tx.commit().await?;

        if current.status != vacancy.status {
            tracing::info!(vacancy_id = %id, actor = %actor, from = %current.status, to = %vacancy.status, "vacancy status changed");
        }
        self.events.publish_all(filled);
        Ok(vacancy)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Vacancy> {
        let mut conn = self.pool.acquire().await?;
        let vacancy = sqlx::query_as::<_, Vacancy>(&format!(
            "SELECT {VACANCY_COLUMNS} FROM vacancies v WHERE v.id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound("Vacancy not found".to_string()))?;

        if !can_see(&mut conn, actor, &vacancy).await? {
            return Err(Error::NotFound("Vacancy not found".to_string()));
        }
        Ok(vacancy)
    }

    pub async fn list(&self, actor: &Actor, query: VacancyListQuery) -> Result<VacancyList> {
        let status = normalize_optional(query.status)
            .map(|s| s.parse::<VacancyStatus>())
            .transpose()?;
        let hospital_id = normalize_optional(query.hospital)
            .map(|h| {
                h.parse::<Uuid>()
                    .map_err(|_| Error::Validation("hospital must be a UUID".to_string()))
            })
            .transpose()?;
        let search = normalize_optional(query.search);

        let push_filters = |builder: &mut QueryBuilder<'_, Postgres>| {
            builder.push(" WHERE TRUE");
            match visible_set(actor) {
                VisibleSet::All => {}
                VisibleSet::VacanciesOwnedBy(recruiter_id) => {
                    builder
                        .push(" AND (v.status = ")
                        .push_bind(VacancyStatus::Open.as_str())
                        .push(" OR v.recruiter_id = ")
                        .push_bind(recruiter_id)
                        .push(")");
                }
                VisibleSet::SubmittedBy(candidate_id) => {
                    builder
                        .push(" AND (v.status = ")
                        .push_bind(VacancyStatus::Open.as_str())
                        .push(" OR EXISTS (SELECT 1 FROM applications a WHERE a.vacancy_id = v.id AND a.candidate_id = ")
                        .push_bind(candidate_id)
                        .push("))");
                }
            }
            if let Some(status) = status {
                builder.push(" AND v.status = ").push_bind(status.as_str());
            }
            if let Some(hospital_id) = hospital_id {
                builder.push(" AND v.hospital_id = ").push_bind(hospital_id);
            }
            if let Some(search) = &search {
                builder
                    .push(" AND v.title ILIKE ")
                    .push_bind(like_pattern(search));
            }
        };

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM vacancies v");
        push_filters(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let page = PageInfo::clamp(
            parse_page(query.page.as_deref()),
            self.page_size,
            total,
        );

        let mut items = QueryBuilder::<Postgres>::new(format!(
            "SELECT {VACANCY_COLUMNS} FROM vacancies v"
        ));
        push_filters(&mut items);
        items
            .push(" ORDER BY v.created_at DESC, v.id DESC LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = items.build_query_as::<Vacancy>().fetch_all(&self.pool).await?;

        Ok(VacancyList { items, page })
    }
}

fn owns(actor: &Actor, vacancy: &Vacancy) -> bool {
    match *actor {
        Actor::Admin(_) => true,
        Actor::Recruiter(id) => vacancy.recruiter_id == id,
        Actor::Candidate(_) => false,
    }
}

async fn can_see(conn: &mut PgConnection, actor: &Actor, vacancy: &Vacancy) -> Result<bool> {
    if vacancy.is_open() || owns(actor, vacancy) {
        return Ok(true);
    }
    let Actor::Candidate(candidate_id) = *actor else {
        return Ok(false);
    };
    let applied = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM applications WHERE vacancy_id = $1 AND candidate_id = $2)",
    )
    .bind(vacancy.id)
    .bind(candidate_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(applied)
}

async fn lock_vacancy(conn: &mut PgConnection, id: Uuid) -> Result<Vacancy> {
    sqlx::query_as::<_, Vacancy>(&format!(
        "SELECT {VACANCY_COLUMNS} FROM vacancies v WHERE v.id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| Error::NotFound("Vacancy not found".to_string()))
}

async fn ensure_recruiter(conn: &mut PgConnection, id: Uuid) -> Result<()> {
    let role: Option<String> =
        sqlx::query_scalar("SELECT role FROM principals WHERE id = $1 AND is_active")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
    match role.map(Role::try_from).transpose()? {
        Some(Role::Recruiter) => Ok(()),
        Some(_) => Err(Error::Validation(
            "vacancies must be owned by a recruiter".to_string(),
        )),
        None => Err(Error::NotFound("Recruiter not found".to_string())),
    }
}

async fn ensure_placement(
    conn: &mut PgConnection,
    hospital_id: Uuid,
    department_id: Option<Uuid>,
) -> Result<()> {
    let hospital_active: Option<bool> =
        sqlx::query_scalar("SELECT is_active FROM hospitals WHERE id = $1")
            .bind(hospital_id)
            .fetch_optional(&mut *conn)
            .await?;
    match hospital_active {
        Some(true) => {}
        Some(false) => {
            return Err(Error::Validation("hospital is inactive".to_string()));
        }
        None => return Err(Error::NotFound("Hospital not found".to_string())),
    }

    if let Some(department_id) = department_id {
        let belongs = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM departments WHERE id = $1 AND hospital_id = $2)",
        )
        .bind(department_id)
        .bind(hospital_id)
        .fetch_one(&mut *conn)
        .await?;
        if !belongs {
            return Err(Error::Validation(
                "department does not belong to the hospital".to_string(),
            ));
        }
    }
    Ok(())
}
