//! `ConversationRepo` over SQLite. Participants are mirrored into a join
//! table so membership queries are real queries; the authoritative
//! participant list still lives on the conversation row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rm_core::models::{Conversation, ConversationKind, Message};
use rm_core::traits::ConversationRepo;
use sqlx::Row;
use uuid::Uuid;

use crate::{blob_to_uuid, enum_from_token, enum_token, uuid_to_blob, SqliteMarketRepo};

fn row_to_conversation(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<Conversation> {
    Ok(Conversation {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        kind: enum_from_token(&row.get::<String, _>("kind"))?,
        participants: serde_json::from_str(&row.get::<String, _>("participants"))?,
        context: serde_json::from_str(&row.get::<String, _>("context"))?,
        last_message_at: row.get::<DateTime<Utc>, _>("last_message_at"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}

fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<Message> {
    Ok(Message {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        conversation_id: blob_to_uuid(row.get::<Vec<u8>, _>("conversation_id").as_slice()),
        sender_id: blob_to_uuid(row.get::<Vec<u8>, _>("sender_id").as_slice()),
        body: row.get("body"),
        attachments: serde_json::from_str(&row.get::<String, _>("attachments"))?,
        read_by: serde_json::from_str(&row.get::<String, _>("read_by"))?,
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}

#[async_trait]
impl ConversationRepo for SqliteMarketRepo {
    /// Conversation row + participant rows in one transaction, so a thread
    /// can never exist half-registered.
    async fn create_conversation(&self, conversation: Conversation) -> anyhow::Result<()> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            "INSERT INTO conversations (id, kind, participants, context, last_message_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(conversation.id))
        .bind(enum_token(&conversation.kind)?)
        .bind(serde_json::to_string(&conversation.participants)?)
        .bind(serde_json::to_string(&conversation.context)?)
        .bind(conversation.last_message_at)
        .bind(conversation.created_at)
        .execute(&mut *tx)
        .await?;

        for user_id in &conversation.participants {
            sqlx::query(
                "INSERT OR IGNORE INTO conversation_participants (conversation_id, user_id)
                 VALUES (?, ?)",
            )
            .bind(uuid_to_blob(conversation.id))
            .bind(uuid_to_blob(*user_id))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_conversation(&self, id: Uuid) -> anyhow::Result<Option<Conversation>> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(row_to_conversation).transpose()
    }

    async fn find_by_kind_for_participant(
        &self,
        kind: ConversationKind,
        user_id: Uuid,
    ) -> anyhow::Result<Vec<Conversation>> {
        let rows = sqlx::query(
            "SELECT c.* FROM conversations c
             JOIN conversation_participants p ON p.conversation_id = c.id
             WHERE c.kind = ? AND p.user_id = ?",
        )
        .bind(enum_token(&kind)?)
        .bind(uuid_to_blob(user_id))
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(row_to_conversation).collect()
    }

    async fn list_for_participant(&self, user_id: Uuid) -> anyhow::Result<Vec<Conversation>> {
        let rows = sqlx::query(
            "SELECT c.* FROM conversations c
             JOIN conversation_participants p ON p.conversation_id = c.id
             WHERE p.user_id = ?
             ORDER BY c.last_message_at DESC",
        )
        .bind(uuid_to_blob(user_id))
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(row_to_conversation).collect()
    }

    /// Message insert + parent timestamp bump in one transaction: a message
    /// without an updated thread timestamp is an inconsistency we refuse to
    /// persist.
    async fn create_message(&self, message: Message) -> anyhow::Result<()> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            "INSERT INTO messages (id, conversation_id, sender_id, body, attachments, read_by, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(message.id))
        .bind(uuid_to_blob(message.conversation_id))
        .bind(uuid_to_blob(message.sender_id))
        .bind(message.body)
        .bind(serde_json::to_string(&message.attachments)?)
        .bind(serde_json::to_string(&message.read_by)?)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await?;

        let bumped = sqlx::query("UPDATE conversations SET last_message_at = ? WHERE id = ?")
            .bind(message.created_at)
            .bind(uuid_to_blob(message.conversation_id))
            .execute(&mut *tx)
            .await?;
        if bumped.rows_affected() == 0 {
            anyhow::bail!("conversation {} not found", message.conversation_id);
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_message(&self, id: Uuid) -> anyhow::Result<Option<Message>> {
        let row = sqlx::query("SELECT * FROM messages WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(row_to_message).transpose()
    }

    async fn list_messages(&self, conversation_id: Uuid) -> anyhow::Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE conversation_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(uuid_to_blob(conversation_id))
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(row_to_message).collect()
    }

    async fn mark_read(&self, message_id: Uuid, user_id: Uuid) -> anyhow::Result<()> {
        let mut tx = self.pool().begin().await?;

        let row = sqlx::query("SELECT read_by FROM messages WHERE id = ?")
            .bind(uuid_to_blob(message_id))
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| anyhow::anyhow!("message {message_id} not found"))?;
        let mut read_by: Vec<Uuid> = serde_json::from_str(&row.get::<String, _>("read_by"))?;
        if !read_by.contains(&user_id) {
            read_by.push(user_id);
            sqlx::query("UPDATE messages SET read_by = ? WHERE id = ?")
                .bind(serde_json::to_string(&read_by)?)
                .bind(uuid_to_blob(message_id))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
