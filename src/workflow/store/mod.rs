//! State Persistence
//!
//! The [`StateStore`] contract the orchestrator loads from and saves to,
//! plus the stores bundled with the crate:
//!
//! - [`MemoryStore`]: a single in-process record
//! - [`FileStore`]: one JSON or YAML file per workflow
//! - [`KeyedStore`]: many workflow instances, each behind its own lock
//!
//! One store (or one keyed instance handle) holds exactly one in-flight
//! workflow. Callers must serialize `advance` calls against the same
//! record; concurrent calls race and the last save wins.

pub mod file;
pub mod keyed;
pub mod memory;

use std::sync::Arc;

pub use crate::error::StoreError;
pub use file::FileStore;
pub use keyed::{InstanceStore, KeyedStore};
pub use memory::MemoryStore;

use super::state::WorkflowState;

/// Reads and persists workflow state.
pub trait StateStore {
    /// Returns the most recently saved state, or the initial state if
    /// nothing was ever saved.
    fn load(&self) -> Result<WorkflowState, StoreError>;

    /// Persists `state`, replacing any previous value.
    fn save(&self, state: &WorkflowState) -> Result<(), StoreError>;
}

impl<S: StateStore + ?Sized> StateStore for &S {
    fn load(&self) -> Result<WorkflowState, StoreError> {
        (**self).load()
    }

    fn save(&self, state: &WorkflowState) -> Result<(), StoreError> {
        (**self).save(state)
    }
}

impl<S: StateStore + ?Sized> StateStore for Arc<S> {
    fn load(&self) -> Result<WorkflowState, StoreError> {
        (**self).load()
    }

    fn save(&self, state: &WorkflowState) -> Result<(), StoreError> {
        (**self).save(state)
    }
}

impl<S: StateStore + ?Sized> StateStore for Box<S> {
    fn load(&self) -> Result<WorkflowState, StoreError> {
        (**self).load()
    }

    fn save(&self, state: &WorkflowState) -> Result<(), StoreError> {
        (**self).save(state)
    }
}
