//! Conversations and messages: participant-only access and deduplicated
//! thread creation.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::guards;
use crate::models::{Actor, Conversation, ConversationKind, Message};
use crate::traits::ConversationRepo;

pub struct MessageCenter {
    conversations: Arc<dyn ConversationRepo>,
}

impl MessageCenter {
    pub fn new(conversations: Arc<dyn ConversationRepo>) -> Self {
        Self { conversations }
    }

    /// Returns the existing conversation for (kind, participant set, context)
    /// or creates one. Re-requesting the same triple never creates a
    /// duplicate and never bumps the timestamp of the existing thread.
    pub async fn get_or_create_conversation(
        &self,
        kind: ConversationKind,
        participants: Vec<Uuid>,
        context: serde_json::Value,
        actor: &Actor,
    ) -> Result<Conversation> {
        if participants.is_empty() {
            return Err(AppError::ValidationError("conversation needs participants".into()));
        }
        if !participants.contains(&actor.id) {
            return Err(AppError::Forbidden(
                "you must be a participant of the conversation you create".into(),
            ));
        }
        self.get_or_create_conversation_for(kind, participants, context)
            .await
    }

    /// Dedup core without the requester check; also used by dispute
    /// escalation, where the participant set is the two counterparties and
    /// the trigger may be an admin.
    pub(crate) async fn get_or_create_conversation_for(
        &self,
        kind: ConversationKind,
        participants: Vec<Uuid>,
        context: serde_json::Value,
    ) -> Result<Conversation> {
        // Any member works as the probe: a matching thread contains all of
        // them.
        let probe = participants[0];
        let candidates = self
            .conversations
            .find_by_kind_for_participant(kind, probe)
            .await?;
        let existing = candidates.into_iter().find(|c| {
            guards::same_participant_set(&c.participants, &participants)
                && guards::same_context(&c.context, &context)
        });
        if let Some(found) = existing {
            return Ok(found);
        }

        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::now_v7(),
            kind,
            participants,
            context,
            last_message_at: now,
            created_at: now,
        };
        self.conversations
            .create_conversation(conversation.clone())
            .await?;
        log::info!("conversation {} created ({:?})", conversation.id, kind);
        Ok(conversation)
    }

    /// Sends a message. The sender has implicitly read their own message;
    /// the parent's `last_message_at` bump rides in the same transaction as
    /// the insert.
    pub async fn send_message(
        &self,
        conversation_id: Uuid,
        actor: &Actor,
        body: String,
        attachments: Vec<String>,
    ) -> Result<Message> {
        if body.trim().is_empty() && attachments.is_empty() {
            return Err(AppError::ValidationError("message has no content".into()));
        }

        let conversation = self.load(conversation_id).await?;
        if !guards::is_participant(&conversation, actor) {
            return Err(AppError::Forbidden(
                "you are not a participant of this conversation".into(),
            ));
        }

        let message = Message {
            id: Uuid::now_v7(),
            conversation_id,
            sender_id: actor.id,
            body,
            attachments,
            read_by: vec![actor.id],
            created_at: Utc::now(),
        };
        self.conversations.create_message(message.clone()).await?;
        Ok(message)
    }

    /// The actor's conversations, most recently active first.
    pub async fn list_conversations(&self, actor: &Actor) -> Result<Vec<Conversation>> {
        Ok(self.conversations.list_for_participant(actor.id).await?)
    }

    /// Messages in ascending creation order; participant-only.
    pub async fn list_messages(
        &self,
        conversation_id: Uuid,
        actor: &Actor,
    ) -> Result<Vec<Message>> {
        let conversation = self.load(conversation_id).await?;
        if !guards::is_participant(&conversation, actor) {
            return Err(AppError::Forbidden(
                "you are not a participant of this conversation".into(),
            ));
        }
        Ok(self.conversations.list_messages(conversation_id).await?)
    }

    /// Marks a message as read by the actor. Appending twice is harmless.
    pub async fn mark_read(&self, message_id: Uuid, actor: &Actor) -> Result<()> {
        let message = self
            .conversations
            .get_message(message_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Message".into(), message_id.to_string()))?;
        let conversation = self.load(message.conversation_id).await?;
        if !guards::is_participant(&conversation, actor) {
            return Err(AppError::Forbidden(
                "you are not a participant of this conversation".into(),
            ));
        }
        Ok(self.conversations.mark_read(message_id, actor.id).await?)
    }

    async fn load(&self, conversation_id: Uuid) -> Result<Conversation> {
        self.conversations
            .get_conversation(conversation_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("Conversation".into(), conversation_id.to_string())
            })
    }
}
