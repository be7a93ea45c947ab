//! The persisted record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use study_assistant_gateway::Role;
use uuid::Uuid;

/// Conversation titles are truncated to this many characters.
pub const TITLE_MAX_CHARS: usize = 50;

/// One message inside a conversation.
///
/// Messages are append-only. The assistant placeholder for the current
/// turn is the only message whose content is mutated after insertion,
/// and it is frozen once the stream resolves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The unique identifier of this message.
    pub id: Uuid,
    /// Who authored this message.
    pub role: Role,
    /// The text content.
    pub content: String,
    /// When this message was created.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub(crate) fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A chat conversation owned by one user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// The unique identifier of this conversation.
    pub id: Uuid,
    /// The display title, derived from the first user message.
    pub title: String,
    /// The messages, in insertion order. Never reordered.
    pub messages: Vec<Message>,
    /// The model identifier selected for this conversation.
    pub model: String,
    /// When this conversation was created.
    pub created_at: DateTime<Utc>,
    /// When this conversation was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub(crate) fn new(model: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: "New Conversation".to_string(),
            messages: vec![],
            model: model.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A generated assignment. Immutable once created; deletable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// The unique identifier of this assignment.
    pub id: Uuid,
    /// The school subject.
    pub subject: String,
    /// The topic within the subject.
    pub topic: String,
    /// The difficulty level.
    pub difficulty: String,
    /// How many questions were requested.
    pub question_count: u32,
    /// The requested question-type descriptor.
    pub question_types: String,
    /// The full generated text body.
    pub content: String,
    /// When this assignment was generated.
    pub created_at: DateTime<Utc>,
}

/// Truncates message content into a conversation title.
pub(crate) fn derive_title(content: &str) -> String {
    content.chars().take(TITLE_MAX_CHARS).collect()
}
