//! Workflow Execution Module
//!
//! Provides the orchestrator that advances a workflow one stage per call,
//! persisting progress between calls.
//!
//! # Architecture
//!
//! - [`orchestrator`]: The advancement protocol and its builder

pub mod orchestrator;

pub use orchestrator::{Orchestrator, OrchestratorBuilder, Progress};
