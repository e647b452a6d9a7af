//! `OrderRepo` over SQLite. The timeline rides in a JSON column and is only
//! ever appended to, inside the same transaction as the status write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rm_core::models::{Order, OrderStatus, TimelineEntry};
use rm_core::traits::OrderRepo;
use sqlx::Row;
use uuid::Uuid;

use crate::{blob_to_uuid, enum_from_token, enum_token, uuid_to_blob, SqliteMarketRepo};

fn row_to_order(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<Order> {
    Ok(Order {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        buyer_id: blob_to_uuid(row.get::<Vec<u8>, _>("buyer_id").as_slice()),
        vendor_id: blob_to_uuid(row.get::<Vec<u8>, _>("vendor_id").as_slice()),
        items: serde_json::from_str(&row.get::<String, _>("items"))?,
        subtotal_cents: row.get("subtotal_cents"),
        delivery_cents: row.get("delivery_cents"),
        total_cents: row.get("total_cents"),
        payment_method: row.get("payment_method"),
        city: row.get("city"),
        address: row.get("address"),
        comment: row.get("comment"),
        status: enum_from_token(&row.get::<String, _>("status"))?,
        timeline: serde_json::from_str(&row.get::<String, _>("timeline"))?,
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}

#[async_trait]
impl OrderRepo for SqliteMarketRepo {
    async fn create_order(&self, order: Order) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO orders (id, buyer_id, vendor_id, items, subtotal_cents, delivery_cents,
                total_cents, payment_method, city, address, comment, status, timeline, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(order.id))
        .bind(uuid_to_blob(order.buyer_id))
        .bind(uuid_to_blob(order.vendor_id))
        .bind(serde_json::to_string(&order.items)?)
        .bind(order.subtotal_cents)
        .bind(order.delivery_cents)
        .bind(order.total_cents)
        .bind(order.payment_method)
        .bind(order.city)
        .bind(order.address)
        .bind(order.comment)
        .bind(enum_token(&order.status)?)
        .bind(serde_json::to_string(&order.timeline)?)
        .bind(order.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> anyhow::Result<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(row_to_order).transpose()
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT * FROM orders WHERE buyer_id = ? OR vendor_id = ? ORDER BY created_at DESC",
        )
        .bind(uuid_to_blob(user_id))
        .bind(uuid_to_blob(user_id))
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(row_to_order).collect()
    }

    /// Atomic status write + timeline append.
    ///
    /// # Developer Note
    /// Using a Transaction (tx) ensures we never end up with a status change
    /// without its audit entry, or an audit entry pointing at a stale status.
    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        entry: TimelineEntry,
    ) -> anyhow::Result<()> {
        let mut tx = self.pool().begin().await?;

        let row = sqlx::query("SELECT timeline FROM orders WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| anyhow::anyhow!("order {id} not found"))?;
        let mut timeline: Vec<TimelineEntry> =
            serde_json::from_str(&row.get::<String, _>("timeline"))?;
        timeline.push(entry);

        sqlx::query("UPDATE orders SET status = ?, timeline = ? WHERE id = ?")
            .bind(enum_token(&status)?)
            .bind(serde_json::to_string(&timeline)?)
            .bind(uuid_to_blob(id))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
