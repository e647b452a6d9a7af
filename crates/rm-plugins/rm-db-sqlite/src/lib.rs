//! # rm-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational
//! model and the `rm-core` domain models. Repeating-group fields (line
//! items, timeline, read-by sets, context) are stored as JSON text columns;
//! everything queried by id or joined on lives in real columns.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

mod disputes;
mod messaging;
mod orders;
mod reviews;

#[cfg(test)]
mod tests;

pub struct SqliteMarketRepo {
    pool: SqlitePool,
}

// Helpers for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Uuid {
    Uuid::from_slice(blob).unwrap_or_default()
}

/// Serializes a unit-variant enum to its snake_case token for a TEXT column.
fn enum_token<T: Serialize>(value: &T) -> anyhow::Result<String> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => anyhow::bail!("expected a string token, got {other}"),
    }
}

fn enum_from_token<T: DeserializeOwned>(token: &str) -> anyhow::Result<T> {
    Ok(serde_json::from_value(serde_json::Value::String(
        token.to_string(),
    ))?)
}

impl SqliteMarketRepo {
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        // An in-memory SQLite database lives inside a single connection;
        // more than one connection in the pool would see an empty schema.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        log::info!("sqlite schema ready at {url}");
        Ok(repo)
    }

    async fn ensure_schema(&self) -> anyhow::Result<()> {
        let statements = [
            "CREATE TABLE IF NOT EXISTS orders (
                id              BLOB PRIMARY KEY,
                buyer_id        BLOB NOT NULL,
                vendor_id       BLOB NOT NULL,
                items           TEXT NOT NULL,
                subtotal_cents  INTEGER NOT NULL,
                delivery_cents  INTEGER NOT NULL,
                total_cents     INTEGER NOT NULL,
                payment_method  TEXT NOT NULL,
                city            TEXT NOT NULL,
                address         TEXT NOT NULL,
                comment         TEXT,
                status          TEXT NOT NULL,
                timeline        TEXT NOT NULL,
                created_at      TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS disputes (
                id                      BLOB PRIMARY KEY,
                order_id                BLOB NOT NULL,
                product_id              BLOB,
                initiator_id            BLOB NOT NULL,
                respondent_id           BLOB NOT NULL,
                reason                  TEXT NOT NULL,
                description             TEXT NOT NULL,
                amount_requested_cents  INTEGER NOT NULL,
                status                  TEXT NOT NULL,
                evidence                TEXT NOT NULL,
                created_at              TEXT NOT NULL,
                updated_at              TEXT NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_disputes_order ON disputes (order_id, status)",
            "CREATE TABLE IF NOT EXISTS conversations (
                id              BLOB PRIMARY KEY,
                kind            TEXT NOT NULL,
                participants    TEXT NOT NULL,
                context         TEXT NOT NULL,
                last_message_at TEXT NOT NULL,
                created_at      TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS conversation_participants (
                conversation_id BLOB NOT NULL,
                user_id         BLOB NOT NULL,
                PRIMARY KEY (conversation_id, user_id)
            )",
            "CREATE TABLE IF NOT EXISTS messages (
                id              BLOB PRIMARY KEY,
                conversation_id BLOB NOT NULL,
                sender_id       BLOB NOT NULL,
                body            TEXT NOT NULL,
                attachments     TEXT NOT NULL,
                read_by         TEXT NOT NULL,
                created_at      TEXT NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_messages_conversation
                ON messages (conversation_id, created_at)",
            "CREATE TABLE IF NOT EXISTS reviews (
                id          BLOB PRIMARY KEY,
                product_id  BLOB NOT NULL,
                order_id    BLOB NOT NULL,
                author_id   BLOB NOT NULL,
                rating      INTEGER NOT NULL,
                body        TEXT NOT NULL,
                status      TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                UNIQUE (author_id, product_id)
            )",
        ];
        for sql in statements {
            sqlx::query(sql).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
