//! CRUD over the per-user conversation list.

use std::sync::Arc;

use chrono::Utc;
use study_assistant_gateway::Role;
use uuid::Uuid;

use crate::records::{Conversation, Message, derive_title};
use crate::state::{StateStore, StoreError};

/// The per-user conversation collection.
///
/// Every mutation rewrites the entire collection into the backing
/// [`StateStore`] — this is the intentional "full-document rewrite"
/// persistence strategy, not an incremental patch.
pub struct ConversationStore {
    state: Arc<dyn StateStore>,
    key: String,
    conversations: Vec<Conversation>,
    active: Option<Uuid>,
}

impl ConversationStore {
    /// Opens the conversation collection of the given user, activating
    /// the most recent conversation if any exist.
    pub fn open(
        state: Arc<dyn StateStore>,
        user_id: Uuid,
    ) -> Result<Self, StoreError> {
        let key = format!("conversations_{user_id}");
        let conversations: Vec<Conversation> = match state.load(&key)? {
            Some(blob) => serde_json::from_str(&blob)?,
            None => vec![],
        };
        let active = conversations.first().map(|conversation| conversation.id);
        Ok(Self {
            state,
            key,
            conversations,
            active,
        })
    }

    /// Returns all conversations, most recent first.
    #[inline]
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Returns the active conversation, if any.
    pub fn active(&self) -> Option<&Conversation> {
        let active = self.active?;
        self.conversations
            .iter()
            .find(|conversation| conversation.id == active)
    }

    /// Activates the conversation with the given identifier.
    pub fn select(&mut self, id: Uuid) -> Result<(), StoreError> {
        if !self.conversations.iter().any(|c| c.id == id) {
            return Err(StoreError::UnknownConversation(id));
        }
        self.active = Some(id);
        Ok(())
    }

    /// Inserts a new empty conversation at the head of the list and
    /// activates it.
    pub fn create(
        &mut self,
        model: impl Into<String>,
    ) -> Result<&Conversation, StoreError> {
        let conversation = Conversation::new(model);
        self.active = Some(conversation.id);
        self.conversations.insert(0, conversation);
        self.persist()?;
        Ok(&self.conversations[0])
    }

    /// Removes a conversation. If it was the active one, activation
    /// falls to the most recent remaining conversation, or to none.
    pub fn delete(&mut self, id: Uuid) -> Result<(), StoreError> {
        let before = self.conversations.len();
        self.conversations.retain(|conversation| conversation.id != id);
        if self.conversations.len() == before {
            return Err(StoreError::UnknownConversation(id));
        }
        if self.active == Some(id) {
            self.active =
                self.conversations.first().map(|conversation| conversation.id);
        }
        self.persist()
    }

    /// Appends a user message. If it is the first message of the
    /// conversation, the title becomes the first
    /// [`TITLE_MAX_CHARS`](crate::TITLE_MAX_CHARS) characters of the
    /// content; the title is never recomputed afterwards.
    pub fn append_user_message(
        &mut self,
        conversation_id: Uuid,
        content: &str,
    ) -> Result<Uuid, StoreError> {
        let conversation = self.conversation_mut(conversation_id)?;
        if conversation.messages.is_empty() {
            conversation.title = derive_title(content);
        }
        let message = Message::new(Role::User, content);
        let message_id = message.id;
        conversation.messages.push(message);
        conversation.updated_at = Utc::now();
        self.persist()?;
        Ok(message_id)
    }

    /// Appends the empty assistant placeholder for the current turn.
    ///
    /// The placeholder is inserted before any network call resolves so
    /// that a persisted assistant message exists even if the stream
    /// yields nothing.
    pub fn append_assistant_placeholder(
        &mut self,
        conversation_id: Uuid,
    ) -> Result<Uuid, StoreError> {
        let conversation = self.conversation_mut(conversation_id)?;
        let message = Message::new(Role::Assistant, "");
        let message_id = message.id;
        conversation.messages.push(message);
        conversation.updated_at = Utc::now();
        self.persist()?;
        Ok(message_id)
    }

    /// Replaces the content of a message, typically the placeholder
    /// with the latest accumulator value. Called once per recognized
    /// delta.
    pub fn set_message_content(
        &mut self,
        conversation_id: Uuid,
        message_id: Uuid,
        content: &str,
    ) -> Result<(), StoreError> {
        let conversation = self.conversation_mut(conversation_id)?;
        let Some(message) = conversation
            .messages
            .iter_mut()
            .find(|message| message.id == message_id)
        else {
            return Err(StoreError::UnknownMessage(message_id));
        };
        message.content = content.to_owned();
        conversation.updated_at = Utc::now();
        self.persist()
    }

    /// Records the model identifier used for the next turn.
    pub fn set_model(
        &mut self,
        conversation_id: Uuid,
        model: &str,
    ) -> Result<(), StoreError> {
        let conversation = self.conversation_mut(conversation_id)?;
        if conversation.model == model {
            return Ok(());
        }
        model.clone_into(&mut conversation.model);
        conversation.updated_at = Utc::now();
        self.persist()
    }

    fn conversation_mut(
        &mut self,
        id: Uuid,
    ) -> Result<&mut Conversation, StoreError> {
        self.conversations
            .iter_mut()
            .find(|conversation| conversation.id == id)
            .ok_or(StoreError::UnknownConversation(id))
    }

    fn persist(&self) -> Result<(), StoreError> {
        let blob = serde_json::to_string(&self.conversations)?;
        self.state.save(&self.key, &blob)
    }
}
