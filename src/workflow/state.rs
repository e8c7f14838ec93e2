//! Workflow State
//!
//! The persisted progress marker handed to a [`StateStore`](super::StateStore)
//! between invocations: which stage runs next, and the serialized output of
//! the stage before it.

use serde::{Deserialize, Serialize};

use super::result::StageResult;

/// Persistent state for one workflow instance.
///
/// The zero value (`Default`) is the initial state: stage 0, no pending
/// result. A finished workflow is reset back to it, so the next call starts
/// a fresh run.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkflowState {
    /// Index of the stage that runs on the next call
    #[serde(default)]
    pub current_stage: usize,

    /// Output of the previous stage (absent before the first stage)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_result: Option<StageResult>,
}

impl WorkflowState {
    /// Creates the initial state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state positioned at `stage` with the given pending result.
    pub fn at(stage: usize, pending_result: Option<StageResult>) -> Self {
        Self {
            current_stage: stage,
            pending_result,
        }
    }

    /// Returns true if this is the state a fresh workflow starts from.
    pub fn is_initial(&self) -> bool {
        self.current_stage == 0 && self.pending_result.is_none()
    }

    /// Moves to the next stage, carrying `result` forward as its input.
    pub fn advance(&mut self, result: StageResult) {
        self.pending_result = Some(result);
        self.current_stage += 1;
    }

    /// Returns to the initial state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_creation() {
        let state = WorkflowState::new();
        assert_eq!(state.current_stage, 0);
        assert!(state.pending_result.is_none());
        assert!(state.is_initial());
    }

    #[test]
    fn test_advance() {
        let mut state = WorkflowState::new();
        state.advance(StageResult::encode(&"first").unwrap());

        assert_eq!(state.current_stage, 1);
        assert!(!state.is_initial());
        let carried: String = state.pending_result.as_ref().unwrap().decode().unwrap();
        assert_eq!(carried, "first");
    }

    #[test]
    fn test_reset_returns_to_initial() {
        let mut state = WorkflowState::at(3, Some(StageResult::encode(&1).unwrap()));
        state.reset();
        assert_eq!(state, WorkflowState::default());
    }

    #[test]
    fn test_position_without_payload_is_not_initial() {
        let state = WorkflowState::at(1, None);
        assert!(!state.is_initial());
    }

    #[test]
    fn test_state_serialization_roundtrip() {
        let state = WorkflowState::at(1, Some(StageResult::encode(&vec!["a", "b"]).unwrap()));

        let json = serde_json::to_string_pretty(&state).unwrap();
        let loaded: WorkflowState = serde_json::from_str(&json).unwrap();

        assert_eq!(loaded, state);
        let items: Vec<String> = loaded.pending_result.unwrap().decode().unwrap();
        assert_eq!(items, vec!["a", "b"]);
    }

    #[test]
    fn test_initial_state_serializes_without_payload() {
        let json = serde_json::to_string(&WorkflowState::new()).unwrap();
        assert_eq!(json, r#"{"current_stage":0}"#);

        let loaded: WorkflowState = serde_json::from_str("{}").unwrap();
        assert!(loaded.is_initial());
    }

    #[test]
    fn test_state_yaml_roundtrip() {
        let state = WorkflowState::at(2, Some(StageResult::encode(&serde_json::json!({"k": 1})).unwrap()));

        let yaml = serde_yaml::to_string(&state).unwrap();
        let loaded: WorkflowState = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(loaded, state);
    }
}
