//! Workflow Definition Module
//!
//! The pieces an [`Orchestrator`](crate::execution::Orchestrator) is built
//! from and the state it moves between calls.
//!
//! # Structure
//!
//! - [`result`]: Serialized stage results (the result codec)
//! - [`state`]: Persisted workflow progress
//! - [`stage`]: The stage contract
//! - [`context`]: Cancellation and deadline signalling for stages
//! - [`store`]: State persistence contract and bundled stores

pub mod context;
pub mod result;
pub mod stage;
pub mod state;
pub mod store;

pub use context::StageContext;
pub use result::StageResult;
pub use stage::{DynStage, FnStage, Stage, StageError, StageOutcome};
pub use state::WorkflowState;
pub use store::{FileStore, InstanceStore, KeyedStore, MemoryStore, StateStore};
