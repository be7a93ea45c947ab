//! CRUD over the per-user assignment list.

use std::sync::Arc;

use chrono::Utc;
use study_assistant_gateway::AssignmentRequest;
use uuid::Uuid;

use crate::records::Assignment;
use crate::state::{StateStore, StoreError};

/// The per-user assignment collection.
///
/// Same whole-collection persistence strategy as
/// [`ConversationStore`](crate::ConversationStore). Assignments are
/// immutable once stored; there is no update-in-place.
pub struct AssignmentStore {
    state: Arc<dyn StateStore>,
    key: String,
    assignments: Vec<Assignment>,
    selected: Option<Uuid>,
}

impl AssignmentStore {
    /// Opens the assignment collection of the given user. Nothing is
    /// selected initially.
    pub fn open(
        state: Arc<dyn StateStore>,
        user_id: Uuid,
    ) -> Result<Self, StoreError> {
        let key = format!("assignments_{user_id}");
        let assignments: Vec<Assignment> = match state.load(&key)? {
            Some(blob) => serde_json::from_str(&blob)?,
            None => vec![],
        };
        Ok(Self {
            state,
            key,
            assignments,
            selected: None,
        })
    }

    /// Returns all assignments, most recent first.
    #[inline]
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Returns the selected assignment, if any.
    pub fn selected(&self) -> Option<&Assignment> {
        let selected = self.selected?;
        self.assignments
            .iter()
            .find(|assignment| assignment.id == selected)
    }

    /// Selects the assignment with the given identifier.
    pub fn select(&mut self, id: Uuid) -> Result<(), StoreError> {
        if !self.assignments.iter().any(|a| a.id == id) {
            return Err(StoreError::UnknownAssignment(id));
        }
        self.selected = Some(id);
        Ok(())
    }

    /// Inserts a newly generated assignment at the head of the list
    /// and selects it.
    pub fn insert(
        &mut self,
        request: &AssignmentRequest,
        content: String,
    ) -> Result<&Assignment, StoreError> {
        let assignment = Assignment {
            id: Uuid::new_v4(),
            subject: request.subject.clone(),
            topic: request.topic.clone(),
            difficulty: request.difficulty.clone(),
            question_count: request.question_count,
            question_types: request.question_types.clone(),
            content,
            created_at: Utc::now(),
        };
        self.selected = Some(assignment.id);
        self.assignments.insert(0, assignment);
        self.persist()?;
        Ok(&self.assignments[0])
    }

    /// Removes an assignment. If it was selected, the selection is
    /// cleared — it does not fall to another record.
    pub fn delete(&mut self, id: Uuid) -> Result<(), StoreError> {
        let before = self.assignments.len();
        self.assignments.retain(|assignment| assignment.id != id);
        if self.assignments.len() == before {
            return Err(StoreError::UnknownAssignment(id));
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.persist()
    }

    fn persist(&self) -> Result<(), StoreError> {
        let blob = serde_json::to_string(&self.assignments)?;
        self.state.save(&self.key, &blob)
    }
}

#[cfg(test)]
mod tests {
    use crate::state::MemoryStore;

    use super::*;

    fn request() -> AssignmentRequest {
        AssignmentRequest {
            subject: "Biology".to_string(),
            topic: "Photosynthesis".to_string(),
            difficulty: "Medium".to_string(),
            question_count: 5,
            question_types: "mixed".to_string(),
        }
    }

    #[test]
    fn test_insert_selects_and_heads_list() {
        let state = Arc::new(MemoryStore::new());
        let mut assignments =
            AssignmentStore::open(state, Uuid::new_v4()).unwrap();
        let first = assignments
            .insert(&request(), "Assignment one".to_string())
            .unwrap()
            .id;
        let second = assignments
            .insert(&request(), "Assignment two".to_string())
            .unwrap()
            .id;
        let ids: Vec<_> =
            assignments.assignments().iter().map(|a| a.id).collect();
        assert_eq!(ids, [second, first]);
        assert_eq!(assignments.selected().unwrap().id, second);
    }

    #[test]
    fn test_delete_only_selected_clears_selection() {
        let state = Arc::new(MemoryStore::new());
        let mut assignments =
            AssignmentStore::open(state, Uuid::new_v4()).unwrap();
        let id = assignments
            .insert(&request(), "The only one".to_string())
            .unwrap()
            .id;

        assignments.delete(id).unwrap();
        assert!(assignments.assignments().is_empty());
        assert!(assignments.selected().is_none());
    }

    #[test]
    fn test_delete_unselected_keeps_selection() {
        let state = Arc::new(MemoryStore::new());
        let mut assignments =
            AssignmentStore::open(state, Uuid::new_v4()).unwrap();
        let first = assignments
            .insert(&request(), "one".to_string())
            .unwrap()
            .id;
        let second = assignments
            .insert(&request(), "two".to_string())
            .unwrap()
            .id;
        assignments.delete(first).unwrap();
        assert_eq!(assignments.selected().unwrap().id, second);
    }

    #[test]
    fn test_reopen_sees_last_write_without_selection() {
        let state = Arc::new(MemoryStore::new());
        let user = Uuid::new_v4();
        let mut assignments =
            AssignmentStore::open(state.clone(), user).unwrap();
        assignments
            .insert(&request(), "Persisted body".to_string())
            .unwrap();

        let reopened = AssignmentStore::open(state, user).unwrap();
        assert_eq!(reopened.assignments().len(), 1);
        assert_eq!(reopened.assignments()[0].content, "Persisted body");
        assert!(reopened.selected().is_none());
    }
}
