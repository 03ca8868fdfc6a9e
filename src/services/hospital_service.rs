use crate::dto::hospital_dto::{CreateDepartmentPayload, CreateHospitalPayload};
use crate::error::{Error, Result};
use crate::models::hospital::{Department, Hospital};
use crate::models::principal::Actor;
use crate::services::authorization::ensure_admin;
use sqlx::PgPool;
use uuid::Uuid;

const DEPARTMENT_UNIQUE: &str = "departments_hospital_name_key";

#[derive(Clone)]
pub struct HospitalService {
    pool: PgPool,
}

impl HospitalService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, actor: &Actor, payload: CreateHospitalPayload) -> Result<Hospital> {
        ensure_admin(actor)?;
        let hospital = sqlx::query_as::<_, Hospital>(
            r#"
            INSERT INTO hospitals (name, city, state)
            VALUES ($1, $2, $3)
            RETURNING id, name, city, state, is_active, created_at
            "#,
        )
        .bind(payload.name.trim())
        .bind(payload.city.trim())
        .bind(payload.state.trim().to_uppercase())
        .fetch_one(&self.pool)
        .await?;
        Ok(hospital)
    }

    /// Inactive hospitals are only listed for admins.
    pub async fn list(&self, actor: &Actor) -> Result<Vec<Hospital>> {
        let items = sqlx::query_as::<_, Hospital>(
            r#"
            SELECT id, name, city, state, is_active, created_at
            FROM hospitals
            WHERE is_active OR $1
            ORDER BY name ASC
            "#,
        )
        .bind(actor.is_admin())
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Hospital> {
        sqlx::query_as::<_, Hospital>(
            r#"
            SELECT id, name, city, state, is_active, created_at
            FROM hospitals
            WHERE id = $1 AND (is_active OR $2)
            "#,
        )
        .bind(id)
        .bind(actor.is_admin())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Hospital not found".to_string()))
    }

    pub async fn create_department(
        &self,
        actor: &Actor,
        hospital_id: Uuid,
        payload: CreateDepartmentPayload,
    ) -> Result<Department> {
        ensure_admin(actor)?;
        self.get(actor, hospital_id).await?;

        let department = sqlx::query_as::<_, Department>(
            r#"
            INSERT INTO departments (hospital_id, name)
            VALUES ($1, $2)
            RETURNING id, hospital_id, name
            "#,
        )
        .bind(hospital_id)
        .bind(payload.name.trim())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.constraint() == Some(DEPARTMENT_UNIQUE) => {
                Error::Validation("department already exists in this hospital".to_string())
            }
            _ => Error::from(e),
        })?;
        Ok(department)
    }

    pub async fn list_departments(&self, actor: &Actor, hospital_id: Uuid) -> Result<Vec<Department>> {
        self.get(actor, hospital_id).await?;
        let items = sqlx::query_as::<_, Department>(
            "SELECT id, hospital_id, name FROM departments WHERE hospital_id = $1 ORDER BY name ASC",
        )
        .bind(hospital_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }
}
