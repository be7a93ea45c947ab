use serde::{Deserialize, Serialize};

/// A request to be sent to a generation endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GenerationRequest {
    /// A chat completion over the conversation so far.
    Chat(ChatRequest),
    /// A single-document assignment generation.
    Assignment(AssignmentRequest),
}

/// The input for the chat generation endpoint.
///
/// The endpoint prepends its own system instructions, so the turns
/// here only carry user and assistant roles.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatRequest {
    /// The conversation turns, oldest first, ending with the user turn
    /// being answered.
    pub messages: Vec<ChatTurn>,
    /// The model identifier selected for this conversation.
    pub model: String,
}

/// One turn of a chat conversation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatTurn {
    /// Who produced this turn.
    pub role: Role,
    /// The text content of the turn.
    pub content: String,
}

/// The author of a message.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A message written by the user.
    User,
    /// A message produced by the model.
    Assistant,
}

/// The input for the assignment generation endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AssignmentRequest {
    /// The school subject, e.g. "Biology".
    pub subject: String,
    /// The topic within the subject.
    pub topic: String,
    /// The difficulty level, e.g. "Medium".
    pub difficulty: String,
    /// How many questions to generate.
    pub question_count: u32,
    /// A free-form descriptor of the desired question types.
    pub question_types: String,
}
