//! Keeps a vacancy's status in step with its approved applications. Runs on the
//! caller's connection so the fill check commits or rolls back with the write
//! that triggered it.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::Result;
use crate::models::application::ApplicationStatus;
use crate::models::event::DomainEvent;
use crate::models::vacancy::VacancyStatus;

pub struct LifecycleCoordinator;

/// Only open vacancies fill, and only once approvals reach the position count.
pub fn should_fill(status: VacancyStatus, positions: i32, approved: i64) -> bool {
    status == VacancyStatus::Open && approved >= i64::from(positions.max(1))
}

impl LifecycleCoordinator {
    pub async fn on_status_changed(
        conn: &mut PgConnection,
        vacancy_id: Uuid,
        to: ApplicationStatus,
    ) -> Result<Option<DomainEvent>> {
        if to != ApplicationStatus::Approved {
            return Ok(None);
        }
        Self::fill_if_complete(conn, vacancy_id).await
    }

    /// Marks the vacancy filled when enough applications are approved. The
    /// vacancy row is locked for the rest of the transaction.
    pub async fn fill_if_complete(
        conn: &mut PgConnection,
        vacancy_id: Uuid,
    ) -> Result<Option<DomainEvent>> {
        let (status, positions): (String, i32) =
            sqlx::query_as("SELECT status, positions FROM vacancies WHERE id = $1 FOR UPDATE")
                .bind(vacancy_id)
                .fetch_one(&mut *conn)
                .await?;
        let status = VacancyStatus::try_from(status)?;
        if status != VacancyStatus::Open {
            return Ok(None);
        }

        let approved: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM applications WHERE vacancy_id = $1 AND status = $2",
        )
        .bind(vacancy_id)
        .bind(ApplicationStatus::Approved.as_str())
        .fetch_one(&mut *conn)
        .await?;

        if !should_fill(status, positions, approved) {
            tracing::debug!(%vacancy_id, approved, positions, "vacancy still has open positions");
            return Ok(None);
        }

        let filled_date: DateTime<Utc> = sqlx::query_scalar(
            r#"
            UPDATE vacancies
            SET status = $2, filled_date = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING filled_date
            "#,
        )
        .bind(vacancy_id)
        .bind(VacancyStatus::Filled.as_str())
        .fetch_one(&mut *conn)
        .await?;

        tracing::info!(%vacancy_id, approved, positions, "vacancy filled");
        Ok(Some(DomainEvent::VacancyFilled {
            vacancy_id,
            filled_date,
            approved_count: approved,
        }))
    }
}
