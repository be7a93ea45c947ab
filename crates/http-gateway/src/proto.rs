use serde::Serialize;
use study_assistant_gateway::{AssignmentRequest, ChatRequest, Role};

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct WireChatRequest<'a> {
    messages: Vec<WireTurn<'a>>,
    model: &'a str,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct WireTurn<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAssignmentRequest<'a> {
    subject: &'a str,
    topic: &'a str,
    difficulty: &'a str,
    question_count: u32,
    question_types: &'a str,
}

pub fn chat_request(req: &ChatRequest) -> WireChatRequest<'_> {
    WireChatRequest {
        messages: req
            .messages
            .iter()
            .map(|turn| WireTurn {
                role: turn.role,
                content: &turn.content,
            })
            .collect(),
        model: &req.model,
    }
}

pub fn assignment_request(
    req: &AssignmentRequest,
) -> WireAssignmentRequest<'_> {
    WireAssignmentRequest {
        subject: &req.subject,
        topic: &req.topic,
        difficulty: &req.difficulty,
        question_count: req.question_count,
        question_types: &req.question_types,
    }
}
