//! `DisputeRepo` over SQLite. The (order_id, status) index backs the
//! active-dispute guard query that implements the order lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rm_core::models::{Dispute, DisputeStatus};
use rm_core::traits::DisputeRepo;
use sqlx::Row;
use uuid::Uuid;

use crate::{blob_to_uuid, enum_from_token, enum_token, uuid_to_blob, SqliteMarketRepo};

fn row_to_dispute(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<Dispute> {
    Ok(Dispute {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        order_id: blob_to_uuid(row.get::<Vec<u8>, _>("order_id").as_slice()),
        product_id: row
            .get::<Option<Vec<u8>>, _>("product_id")
            .map(|b| blob_to_uuid(b.as_slice())),
        initiator_id: blob_to_uuid(row.get::<Vec<u8>, _>("initiator_id").as_slice()),
        respondent_id: blob_to_uuid(row.get::<Vec<u8>, _>("respondent_id").as_slice()),
        reason: enum_from_token(&row.get::<String, _>("reason"))?,
        description: row.get("description"),
        amount_requested_cents: row.get("amount_requested_cents"),
        status: enum_from_token(&row.get::<String, _>("status"))?,
        evidence: serde_json::from_str(&row.get::<String, _>("evidence"))?,
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
    })
}

#[async_trait]
impl DisputeRepo for SqliteMarketRepo {
    async fn create_dispute(&self, dispute: Dispute) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO disputes (id, order_id, product_id, initiator_id, respondent_id,
                reason, description, amount_requested_cents, status, evidence,
                created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(dispute.id))
        .bind(uuid_to_blob(dispute.order_id))
        .bind(dispute.product_id.map(uuid_to_blob))
        .bind(uuid_to_blob(dispute.initiator_id))
        .bind(uuid_to_blob(dispute.respondent_id))
        .bind(enum_token(&dispute.reason)?)
        .bind(dispute.description)
        .bind(dispute.amount_requested_cents)
        .bind(enum_token(&dispute.status)?)
        .bind(serde_json::to_string(&dispute.evidence)?)
        .bind(dispute.created_at)
        .bind(dispute.updated_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn get_dispute(&self, id: Uuid) -> anyhow::Result<Option<Dispute>> {
        let row = sqlx::query("SELECT * FROM disputes WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(row_to_dispute).transpose()
    }

    async fn active_for_order(&self, order_id: Uuid) -> anyhow::Result<Vec<Dispute>> {
        let rows = sqlx::query(
            "SELECT * FROM disputes
             WHERE order_id = ? AND status IN ('opened', 'negotiating', 'escalated')",
        )
        .bind(uuid_to_blob(order_id))
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(row_to_dispute).collect()
    }

    async fn set_status(&self, id: Uuid, status: DisputeStatus) -> anyhow::Result<()> {
        let result = sqlx::query("UPDATE disputes SET status = ?, updated_at = ? WHERE id = ?")
            .bind(enum_token(&status)?)
            .bind(Utc::now())
            .bind(uuid_to_blob(id))
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            anyhow::bail!("dispute {id} not found");
        }
        Ok(())
    }
}
