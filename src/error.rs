//! Error Types
//!
//! Every failure an [`Orchestrator`](crate::execution::Orchestrator) call can
//! report, plus the narrower errors raised by stores, the result codec and
//! the stage context.

use std::error::Error as StdError;

use thiserror::Error;

use crate::workflow::result::StageResult;
use crate::workflow::stage::StageError;

/// Errors returned by the result codec.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Failed to encode stage result")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to decode stage result")]
    Decode(#[source] serde_json::Error),
}

/// Errors returned by a [`StateStore`](crate::workflow::store::StateStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("State store I/O error")]
    Io(#[from] std::io::Error),

    #[error("State store JSON error")]
    Json(#[from] serde_json::Error),

    #[error("State store YAML error")]
    Yaml(#[from] serde_yaml::Error),

    #[error("State store unavailable: {0}")]
    Unavailable(String),

    #[error("State store lock was poisoned by a panicking writer")]
    Poisoned,
}

/// Errors a stage can raise from [`StageContext::check`](crate::workflow::StageContext::check).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("Workflow call was cancelled")]
    Cancelled,

    #[error("Workflow call deadline exceeded")]
    DeadlineExceeded,
}

/// Errors returned by [`Orchestrator::advance`](crate::execution::Orchestrator::advance).
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Nothing ran and nothing was saved.
    #[error("Failed to load workflow state")]
    Load(#[source] StoreError),

    /// The prior state was saved back unchanged.
    #[error("Stage {index} failed")]
    Stage {
        index: usize,
        #[source]
        source: StageError,
    },

    /// The stage succeeded but its output could not be serialized.
    #[error("Stage {index} returned a result that could not be encoded")]
    Encoding {
        index: usize,
        #[source]
        source: CodecError,
    },

    /// The stage succeeded but the advanced state was not persisted.
    ///
    /// `result` holds what the call would have returned had the save
    /// succeeded: the final result on completion, `None` mid-workflow.
    #[error("Stage succeeded but saving workflow state failed")]
    Save {
        #[source]
        source: StoreError,
        result: Option<StageResult>,
    },

    #[error("Workflow has no stages")]
    EmptyWorkflow,
}

impl WorkflowError {
    /// Returns true if the stage ran to completion and only persistence failed.
    pub fn is_save_failure(&self) -> bool {
        matches!(self, Self::Save { .. })
    }

    /// Index of the stage that failed, if the error came from a stage.
    pub fn stage_index(&self) -> Option<usize> {
        match self {
            Self::Stage { index, .. } | Self::Encoding { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Renders an error and every source below it as one line, outermost first.
///
/// Messages above never repeat their source, so this is how the full cause
/// reaches logs and the command line.
pub fn report(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
