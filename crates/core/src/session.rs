use std::sync::Arc;

use study_assistant_gateway::{
    AssignmentRequest, ChatRequest, ChatTurn, Gateway, GatewayError,
    GenerationRequest,
};
use study_assistant_store::{
    Assignment, AssignmentStore, Conversation, ConversationStore,
    MemoryStore, StateStore, StoreError,
};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::UserProfile;
use crate::gateway_client::GatewayClient;

/// The model selected for new sessions unless overridden.
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet";

/// The fixed assistant message recorded when a chat generation fails.
const APOLOGY: &str = "I apologise, but I encountered an error processing \
                       your request. Please try again.";

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A generation is already in flight; the new one is rejected, not
    /// queued.
    #[error("a generation is already in flight")]
    GenerationInFlight,
    /// The generation endpoint or the stream failed. For chat turns
    /// the apology message has already been recorded when this is
    /// returned.
    #[error("generation failed: {0}")]
    GenerationFailed(Box<dyn GatewayError>),
    /// Subject, topic and difficulty are required to generate an
    /// assignment.
    #[error("missing required assignment fields")]
    IncompleteAssignmentForm,
    /// The persistence layer failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    client: GatewayClient,
    state: Option<Arc<dyn StateStore>>,
    model: Option<String>,
}

impl SessionBuilder {
    /// Creates a session builder with a specified gateway.
    pub fn with_gateway<G: Gateway + 'static>(gateway: G) -> Self {
        Self {
            client: GatewayClient::new(gateway),
            state: None,
            model: None,
        }
    }

    /// Sets the state store backing the session's collections.
    ///
    /// Without one the session falls back to an in-memory store,
    /// which is useful for tests and demos.
    #[inline]
    pub fn with_state_store(mut self, state: Arc<dyn StateStore>) -> Self {
        self.state = Some(state);
        self
    }

    /// Sets the initially selected model.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Builds a new session for the given user, opening both of the
    /// user's collections.
    pub fn build(self, user: UserProfile) -> Result<Session, SessionError> {
        let state = self
            .state
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let conversations =
            ConversationStore::open(Arc::clone(&state), user.id)?;
        let assignments = AssignmentStore::open(state, user.id)?;
        Ok(Session {
            user,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            client: self.client,
            conversations,
            assignments,
            is_generating: false,
        })
    }
}

/// The explicit per-user application state: the signed-in user, their
/// conversation and assignment collections, and the gateway client.
///
/// All mutation happens on a single logical thread of control between
/// suspension points; exactly one stream may be consumed at a time,
/// and a second send while a generation is in flight is rejected.
/// There is no cancellation primitive: an in-flight generation runs to
/// completion or failure. Teardown is `Drop` — every mutation has
/// already been persisted by the time it returns.
pub struct Session {
    user: UserProfile,
    model: String,
    client: GatewayClient,
    conversations: ConversationStore,
    assignments: AssignmentStore,
    is_generating: bool,
}

impl Session {
    /// Returns the signed-in user.
    #[inline]
    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    /// Returns the currently selected model identifier.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Selects the model used for subsequent turns.
    #[inline]
    pub fn set_model<S: Into<String>>(&mut self, model: S) {
        self.model = model.into();
    }

    /// Returns all conversations, most recent first.
    #[inline]
    pub fn conversations(&self) -> &[Conversation] {
        self.conversations.conversations()
    }

    /// Returns the active conversation, if any.
    #[inline]
    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.conversations.active()
    }

    /// Creates a new empty conversation and activates it.
    pub fn new_conversation(&mut self) -> Result<Uuid, SessionError> {
        Ok(self.conversations.create(&self.model)?.id)
    }

    /// Activates a conversation.
    pub fn select_conversation(&mut self, id: Uuid) -> Result<(), SessionError> {
        Ok(self.conversations.select(id)?)
    }

    /// Deletes a conversation. If it was active, activation falls to
    /// the most recent remaining conversation or to none.
    pub fn delete_conversation(&mut self, id: Uuid) -> Result<(), SessionError> {
        Ok(self.conversations.delete(id)?)
    }

    /// Sends a user message on the active conversation (creating one
    /// if none is active) and streams the assistant answer into it.
    ///
    /// The user message is appended first, then an empty assistant
    /// placeholder; both are persisted before the network call
    /// resolves. Each recognized delta rewrites the placeholder with
    /// the full accumulated text and re-persists the collection. If
    /// the generation fails, the user turn is kept and the placeholder
    /// becomes a fixed apology — no partial content survives.
    pub async fn send_message(
        &mut self,
        content: &str,
    ) -> Result<(), SessionError> {
        if self.is_generating {
            return Err(SessionError::GenerationInFlight);
        }

        let conversation_id = match self.conversations.active() {
            Some(conversation) => conversation.id,
            None => self.conversations.create(&self.model)?.id,
        };
        self.conversations.set_model(conversation_id, &self.model)?;
        self.conversations
            .append_user_message(conversation_id, content)?;
        let request = self.chat_request(conversation_id)?;
        let placeholder = self
            .conversations
            .append_assistant_placeholder(conversation_id)?;

        self.is_generating = true;
        let result = self
            .stream_into_placeholder(conversation_id, placeholder, request)
            .await;
        self.is_generating = false;

        if let Err(err) = result {
            warn!("chat turn failed, recording the apology message");
            self.conversations.set_message_content(
                conversation_id,
                placeholder,
                APOLOGY,
            )?;
            return Err(err);
        }
        Ok(())
    }

    async fn stream_into_placeholder(
        &mut self,
        conversation_id: Uuid,
        placeholder: Uuid,
        request: ChatRequest,
    ) -> Result<(), SessionError> {
        let mut stream = self
            .client
            .send_request(GenerationRequest::Chat(request))
            .await
            .map_err(SessionError::GenerationFailed)?;
        while let Some(accumulated) = stream
            .next_delta()
            .await
            .map_err(SessionError::GenerationFailed)?
        {
            // Full-document rewrite per delta, by design.
            self.conversations.set_message_content(
                conversation_id,
                placeholder,
                &accumulated,
            )?;
        }
        Ok(())
    }

    fn chat_request(
        &self,
        conversation_id: Uuid,
    ) -> Result<ChatRequest, SessionError> {
        let conversation = self
            .conversations
            .conversations()
            .iter()
            .find(|conversation| conversation.id == conversation_id)
            .ok_or(StoreError::UnknownConversation(conversation_id))?;
        Ok(ChatRequest {
            messages: conversation
                .messages
                .iter()
                .map(|message| ChatTurn {
                    role: message.role,
                    content: message.content.clone(),
                })
                .collect(),
            model: conversation.model.clone(),
        })
    }

    /// Returns all assignments, most recent first.
    #[inline]
    pub fn assignments(&self) -> &[Assignment] {
        self.assignments.assignments()
    }

    /// Returns the selected assignment, if any.
    #[inline]
    pub fn selected_assignment(&self) -> Option<&Assignment> {
        self.assignments.selected()
    }

    /// Selects an assignment.
    pub fn select_assignment(&mut self, id: Uuid) -> Result<(), SessionError> {
        Ok(self.assignments.select(id)?)
    }

    /// Deletes an assignment, clearing the selection if it was the
    /// selected one.
    pub fn delete_assignment(&mut self, id: Uuid) -> Result<(), SessionError> {
        Ok(self.assignments.delete(id)?)
    }

    /// Generates an assignment and stores it at the head of the list.
    ///
    /// Unlike chat turns, nothing is persisted while the stream is in
    /// flight — only the final accumulated text is kept. On failure
    /// nothing is stored at all.
    pub async fn generate_assignment(
        &mut self,
        request: AssignmentRequest,
    ) -> Result<&Assignment, SessionError> {
        if self.is_generating {
            return Err(SessionError::GenerationInFlight);
        }
        if request.subject.is_empty()
            || request.topic.is_empty()
            || request.difficulty.is_empty()
        {
            return Err(SessionError::IncompleteAssignmentForm);
        }

        self.is_generating = true;
        let result = self.collect_assignment_text(&request).await;
        self.is_generating = false;

        let content = result?;
        Ok(self.assignments.insert(&request, content)?)
    }

    async fn collect_assignment_text(
        &mut self,
        request: &AssignmentRequest,
    ) -> Result<String, SessionError> {
        let mut stream = self
            .client
            .send_request(GenerationRequest::Assignment(request.clone()))
            .await
            .map_err(SessionError::GenerationFailed)?;
        while stream
            .next_delta()
            .await
            .map_err(SessionError::GenerationFailed)?
            .is_some()
        {}
        Ok(stream.accumulated().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use study_assistant_gateway::Role;
    use study_assistant_test_gateway::{PresetResponse, TestGateway};

    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            email: "alex@example.com".to_string(),
            name: "Alex".to_string(),
            education_level: "GCSE".to_string(),
            subjects: vec!["Biology".to_string()],
            created_at: Utc::now(),
        }
    }

    fn session(gateway: TestGateway) -> Session {
        SessionBuilder::with_gateway(gateway)
            .build(profile())
            .unwrap()
    }

    fn assignment_request() -> AssignmentRequest {
        AssignmentRequest {
            subject: "Biology".to_string(),
            topic: "Photosynthesis".to_string(),
            difficulty: "Medium".to_string(),
            question_count: 5,
            question_types: "mixed".to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_message_sets_title_and_streams_answer() {
        let gateway = TestGateway::default();
        gateway.push_response(PresetResponse::with_deltas([
            "Photosynthesis is how ",
            "plants make food.",
        ]));
        let mut session = session(gateway);

        session.send_message("Explain photosynthesis").await.unwrap();

        let conversation = session.active_conversation().unwrap();
        assert_eq!(conversation.title, "Explain photosynthesis");
        assert_eq!(conversation.messages.len(), 2);
        assert_eq!(conversation.messages[0].role, Role::User);
        assert_eq!(conversation.messages[0].content, "Explain photosynthesis");
        assert_eq!(conversation.messages[1].role, Role::Assistant);
        assert_eq!(
            conversation.messages[1].content,
            "Photosynthesis is how plants make food."
        );
    }

    #[tokio::test]
    async fn test_failed_turn_keeps_user_message_and_apologises() {
        let gateway = TestGateway::default();
        gateway.push_response(
            PresetResponse::with_deltas(["partial "]).failing_after(1),
        );
        let mut session = session(gateway);

        let result = session.send_message("Explain photosynthesis").await;
        assert!(matches!(result, Err(SessionError::GenerationFailed(_))));

        let conversation = session.active_conversation().unwrap();
        assert_eq!(conversation.messages.len(), 2);
        assert_eq!(conversation.messages[0].role, Role::User);
        assert_eq!(conversation.messages[1].role, Role::Assistant);
        // No partial content is retained, only the fixed apology.
        assert_eq!(
            conversation.messages[1].content,
            "I apologise, but I encountered an error processing your \
             request. Please try again."
        );
    }

    #[tokio::test]
    async fn test_endpoint_failure_before_any_delta() {
        // An empty script makes the send itself fail, like an HTTP 500.
        let gateway = TestGateway::default();
        let mut session = session(gateway);

        let result = session.send_message("Hello?").await;
        assert!(matches!(result, Err(SessionError::GenerationFailed(_))));

        let conversation = session.active_conversation().unwrap();
        assert_eq!(conversation.messages[0].content, "Hello?");
        assert!(
            conversation.messages[1].content.starts_with("I apologise")
        );
    }

    #[tokio::test]
    async fn test_delta_free_stream_persists_empty_assistant_message() {
        let gateway = TestGateway::default();
        gateway.push_response(PresetResponse::with_deltas(
            Vec::<String>::new(),
        ));
        let mut session = session(gateway);

        session.send_message("Anyone there?").await.unwrap();

        let conversation = session.active_conversation().unwrap();
        assert_eq!(conversation.messages.len(), 2);
        assert_eq!(conversation.messages[1].role, Role::Assistant);
        assert_eq!(conversation.messages[1].content, "");
    }

    #[tokio::test]
    async fn test_title_never_recomputed() {
        let gateway = TestGateway::default();
        gateway.push_response(PresetResponse::with_deltas(["First."]));
        gateway.push_response(PresetResponse::with_deltas(["Second."]));
        let mut session = session(gateway);

        session.send_message("Explain photosynthesis").await.unwrap();
        session.send_message("Now explain osmosis").await.unwrap();

        let conversation = session.active_conversation().unwrap();
        assert_eq!(conversation.title, "Explain photosynthesis");
        assert_eq!(conversation.messages.len(), 4);
    }

    #[tokio::test]
    async fn test_send_records_selected_model() {
        let gateway = TestGateway::default();
        gateway.push_response(PresetResponse::with_deltas(["Hi."]));
        let mut session = session(gateway);
        session.set_model("gpt-4");

        session.send_message("Hello").await.unwrap();
        assert_eq!(session.active_conversation().unwrap().model, "gpt-4");
    }

    #[tokio::test]
    async fn test_generate_assignment_keeps_only_final_text() {
        let gateway = TestGateway::default();
        gateway.push_response(PresetResponse::with_deltas([
            "Assignment: Photosynthesis\n\n",
            "1. Describe the role of chlorophyll.\n",
        ]));
        let mut session = session(gateway);

        let assignment = session
            .generate_assignment(assignment_request())
            .await
            .unwrap();
        assert_eq!(
            assignment.content,
            "Assignment: Photosynthesis\n\n\
             1. Describe the role of chlorophyll.\n"
        );
        assert_eq!(assignment.subject, "Biology");
        assert_eq!(session.assignments().len(), 1);
        assert_eq!(
            session.selected_assignment().unwrap().id,
            session.assignments()[0].id
        );
    }

    #[tokio::test]
    async fn test_failed_assignment_stores_nothing() {
        let gateway = TestGateway::default();
        gateway.push_response(
            PresetResponse::with_deltas(["half an "]).failing_after(1),
        );
        let mut session = session(gateway);

        let result = session.generate_assignment(assignment_request()).await;
        assert!(matches!(result, Err(SessionError::GenerationFailed(_))));
        assert!(session.assignments().is_empty());
        assert!(session.selected_assignment().is_none());
    }

    #[tokio::test]
    async fn test_incomplete_assignment_form_rejected() {
        let gateway = TestGateway::default();
        let mut session = session(gateway);

        let mut request = assignment_request();
        request.topic = String::new();
        let result = session.generate_assignment(request).await;
        assert!(matches!(
            result,
            Err(SessionError::IncompleteAssignmentForm)
        ));
    }

    #[tokio::test]
    async fn test_delete_only_selected_assignment_clears_selection() {
        let gateway = TestGateway::default();
        gateway.push_response(PresetResponse::with_deltas(["Body."]));
        let mut session = session(gateway);

        let id = session
            .generate_assignment(assignment_request())
            .await
            .unwrap()
            .id;
        session.delete_assignment(id).unwrap();
        assert!(session.assignments().is_empty());
        assert!(session.selected_assignment().is_none());
    }

    #[tokio::test]
    async fn test_rebuilt_session_sees_persisted_state() {
        let state: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        let user = profile();

        let gateway = TestGateway::default();
        gateway.push_response(PresetResponse::with_deltas(["Hello!"]));
        let mut session = SessionBuilder::with_gateway(gateway.clone())
            .with_state_store(Arc::clone(&state) as Arc<dyn StateStore>)
            .build(user.clone())
            .unwrap();
        session.send_message("Hi").await.unwrap();
        drop(session);

        let session = SessionBuilder::with_gateway(gateway)
            .with_state_store(state)
            .build(user)
            .unwrap();
        let conversation = session.active_conversation().unwrap();
        assert_eq!(conversation.messages[1].content, "Hello!");
    }
}
