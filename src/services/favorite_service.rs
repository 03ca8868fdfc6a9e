use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::principal::Actor;
use crate::services::application_service::lock_application;
use crate::services::authorization::{ensure_can_mutate, ensure_visible, Mutation};
use crate::services::query_service::fetch_row;

/// Per-recruiter bookmarks on applications.
#[derive(Clone)]
pub struct FavoriteService {
    pool: PgPool,
}

impl FavoriteService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Flips the caller's mark and returns the new state.
    pub async fn toggle(&self, actor: &Actor, application_id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let locked = lock_application(&mut tx, application_id).await?;
        ensure_can_mutate(actor, &locked.scope(), Mutation::Favorite)?;

        let removed = sqlx::query(
            "DELETE FROM application_favorites WHERE application_id = $1 AND recruiter_id = $2",
        )
        .bind(application_id)
        .bind(actor.id())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed == 0 {
            insert(&mut tx, application_id, actor.id()).await?;
        }
        tx.commit().await?;

        let is_favorite = removed == 0;
        tracing::info!(%application_id, actor = %actor, is_favorite, "favorite toggled");
        Ok(is_favorite)
    }

    pub async fn is_favorite(&self, actor: &Actor, application_id: Uuid) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        let row = fetch_row(&mut conn, actor.id(), application_id).await?;
        ensure_visible(actor, &row.scope())?;
        Ok(row.is_favorite)
    }
}

/// Sets the mark to `desired` regardless of its current state. The caller has
/// already authorized the actor.
pub async fn set_in_tx(
    conn: &mut PgConnection,
    application_id: Uuid,
    recruiter_id: Uuid,
    desired: bool,
) -> Result<()> {
    if desired {
        insert(conn, application_id, recruiter_id).await
    } else {
        sqlx::query(
            "DELETE FROM application_favorites WHERE application_id = $1 AND recruiter_id = $2",
        )
        .bind(application_id)
        .bind(recruiter_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

async fn insert(conn: &mut PgConnection, application_id: Uuid, recruiter_id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO application_favorites (application_id, recruiter_id)
        VALUES ($1, $2)
        ON CONFLICT (application_id, recruiter_id) DO NOTHING
        "#,
    )
    .bind(application_id)
    .bind(recruiter_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
