use crate::error::Result;
use crate::models::audit_log::AuditLog;
use crate::models::event::DomainEvent;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

#[derive(Clone)]
pub struct AuditService {
    pool: PgPool,
}

impl AuditService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn log(
        &self,
        actor_id: Option<Uuid>,
        action: &str,
        entity_type: &str,
        entity_id: Uuid,
        changes: Option<JsonValue>,
    ) -> Result<AuditLog> {
        let row = sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_logs (actor_id, action, entity_type, entity_id, changes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, actor_id, action, entity_type, entity_id, changes, created_at
            "#,
        )
        .bind(actor_id)
        .bind(action)
        .bind(entity_type)
        .bind(entity_id)
        .bind(changes)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn record(&self, event: &DomainEvent) -> Result<AuditLog> {
        let (entity_type, entity_id) = event.subject();
        let changes = serde_json::to_value(event)?;
        self.log(event.actor_id(), event.name(), entity_type, entity_id, Some(changes))
            .await
    }

    pub async fn for_entity(&self, entity_type: &str, entity_id: Uuid) -> Result<Vec<AuditLog>> {
        let rows = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT id, actor_id, action, entity_type, entity_id, changes, created_at
            FROM audit_logs
            WHERE entity_type = $1 AND entity_id = $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Persists every event until the bus is dropped. A lagging receiver skips
    /// the overwritten events and keeps going.
    pub async fn run(self, mut events: broadcast::Receiver<DomainEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Err(e) = self.record(&event).await {
                        tracing::error!(error = ?e, event = event.name(), "failed to write audit log");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "audit subscriber lagged behind the event bus");
                }
                Err(RecvError::Closed) => {
                    tracing::info!("event bus closed, audit subscriber stopping");
                    break;
                }
            }
        }
    }
}
