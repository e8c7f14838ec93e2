//! Stepwise - Resumable Workflow Engine
//!
//! Runs a fixed sequence of stages one stage per call, persisting progress
//! and the intermediate result between calls. Built for request/response
//! hosts (one HTTP call per stage, one CLI invocation per stage) where the
//! process may not survive from one stage to the next.
//!
//! # Architecture
//!
//! The library is organized into two main modules:
//!
//! - [`workflow`]: Stage contract, state model, result codec and state stores
//! - [`execution`]: The orchestrator that advances a workflow
//!
//! # Example
//!
//! ```rust,no_run
//! use stepwise::execution::Orchestrator;
//! use stepwise::workflow::{FileStore, FnStage, StageContext, StageResult};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let workflow = Orchestrator::builder(FileStore::new(".stepwise/signup.json"))
//!         .stage(FnStage::new("email", |_ctx: &StageContext, _prev: Option<&StageResult>| {
//!             Ok("peter@example.com")
//!         }))
//!         .stage(FnStage::new("confirm", |_ctx: &StageContext, prev: Option<&StageResult>| {
//!             let email: String = prev.ok_or("missing email")?.decode()?;
//!             Ok(format!("confirmed {}", email))
//!         }))
//!         .build()?;
//!
//!     // Each call runs one stage; the last one returns the result
//!     if let Some(result) = workflow.advance(&StageContext::new())? {
//!         println!("{}", result.decode::<String>()?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod execution;
pub mod workflow;

// Re-export commonly used types
pub use error::{CodecError, ContextError, StoreError, WorkflowError};
pub use execution::{Orchestrator, Progress};
pub use workflow::{Stage, StageContext, StageError, StageResult, StateStore, WorkflowState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "Stepwise";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_app_name() {
        assert_eq!(APP_NAME, "Stepwise");
    }

    #[test]
    fn test_module_exports_state() {
        let state = WorkflowState::default();
        assert!(state.is_initial());
    }

    #[test]
    fn test_version_format() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
        for part in parts {
            assert!(part.parse::<u32>().is_ok(), "Version components should be numeric");
        }
    }
}
