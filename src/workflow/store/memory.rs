//! In-memory state store.

use std::sync::Mutex;

use super::{StateStore, StoreError};
use crate::workflow::state::WorkflowState;

/// Keeps a single workflow state in process memory.
///
/// Useful for tests and for hosts that keep the process alive between
/// calls. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<WorkflowState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `state`.
    pub fn with_state(state: WorkflowState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Returns a copy of the stored state.
    pub fn snapshot(&self) -> Result<WorkflowState, StoreError> {
        self.load()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<WorkflowState, StoreError> {
        let state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(state.clone())
    }

    fn save(&self, state: &WorkflowState) -> Result<(), StoreError> {
        let mut stored = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        *stored = state.clone();
        Ok(())
    }
}
