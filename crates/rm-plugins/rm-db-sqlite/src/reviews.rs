//! `ReviewRepo` over SQLite. The UNIQUE (author_id, product_id) constraint
//! backs up the workflow's duplicate guard, and the rating aggregate is a
//! COUNT/AVG over the live rows — never an incrementally maintained float.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rm_core::models::{RatingSummary, Review, ReviewStatus};
use rm_core::traits::ReviewRepo;
use sqlx::Row;
use uuid::Uuid;

use crate::{blob_to_uuid, enum_from_token, enum_token, uuid_to_blob, SqliteMarketRepo};

fn row_to_review(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<Review> {
    Ok(Review {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        product_id: blob_to_uuid(row.get::<Vec<u8>, _>("product_id").as_slice()),
        order_id: blob_to_uuid(row.get::<Vec<u8>, _>("order_id").as_slice()),
        author_id: blob_to_uuid(row.get::<Vec<u8>, _>("author_id").as_slice()),
        rating: row.get::<i64, _>("rating") as u8,
        body: row.get("body"),
        status: enum_from_token(&row.get::<String, _>("status"))?,
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}

#[async_trait]
impl ReviewRepo for SqliteMarketRepo {
    async fn create_review(&self, review: Review) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO reviews (id, product_id, order_id, author_id, rating, body, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(review.id))
        .bind(uuid_to_blob(review.product_id))
        .bind(uuid_to_blob(review.order_id))
        .bind(uuid_to_blob(review.author_id))
        .bind(i64::from(review.rating))
        .bind(review.body)
        .bind(enum_token(&review.status)?)
        .bind(review.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn find_by_author_and_product(
        &self,
        author_id: Uuid,
        product_id: Uuid,
    ) -> anyhow::Result<Option<Review>> {
        let row = sqlx::query("SELECT * FROM reviews WHERE author_id = ? AND product_id = ?")
            .bind(uuid_to_blob(author_id))
            .bind(uuid_to_blob(product_id))
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(row_to_review).transpose()
    }

    async fn rating_summary(&self, product_id: Uuid) -> anyhow::Result<RatingSummary> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS cnt, COALESCE(AVG(rating), 0.0) AS mean
             FROM reviews WHERE product_id = ? AND status = ?",
        )
        .bind(uuid_to_blob(product_id))
        .bind(enum_token(&ReviewStatus::Published)?)
        .fetch_one(self.pool())
        .await?;
        Ok(RatingSummary {
            count: row.get::<i64, _>("cnt") as u32,
            average: row.get::<f64, _>("mean"),
        })
    }
}
