//! Workflow Orchestrator
//!
//! Runs exactly one stage per [`Orchestrator::advance`] call:
//! 1. Loads the current state from the store
//! 2. Runs the stage it points at, feeding it the pending result
//! 3. Encodes the stage output
//! 4. Either moves to the next stage or, after the last stage, resets the
//!    state and returns the final result
//! 5. Saves the state, whatever happened in steps 2-4
//!
//! A failed stage leaves the state exactly as it was loaded, so the next
//! call retries the same stage with the same input.

use log::{debug, error, info, warn};

use crate::error::{report, WorkflowError};
use crate::workflow::{DynStage, Stage, StageContext, StageOutcome, StageResult, StateStore, WorkflowState};

/// Snapshot of where a workflow instance stands, from [`Orchestrator::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Index of the stage the next call runs
    pub current_stage: usize,
    pub total_stages: usize,
    /// Whether a previous stage's output is waiting to be consumed
    pub has_pending_result: bool,
}

impl Progress {
    /// Returns true if no stage of the current run has completed yet.
    pub fn is_fresh(&self) -> bool {
        self.current_stage == 0 && !self.has_pending_result
    }

    /// Number of stages left, including the one the next call runs.
    pub fn remaining(&self) -> usize {
        self.total_stages.saturating_sub(self.current_stage)
    }
}

/// Drives a fixed sequence of stages, one per call, persisting progress in
/// a [`StateStore`].
///
/// # Example
///
/// ```rust
/// use stepwise::execution::Orchestrator;
/// use stepwise::workflow::{FnStage, MemoryStore, StageContext, StageResult};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let workflow = Orchestrator::builder(MemoryStore::new())
///         .stage(FnStage::new("count", |_ctx: &StageContext, _prev: Option<&StageResult>| Ok(1)))
///         .stage(FnStage::new("double", |_ctx: &StageContext, prev: Option<&StageResult>| {
///             let n: i32 = prev.map(|p| p.decode()).transpose()?.unwrap_or_default();
///             Ok(n * 2)
///         }))
///         .build()?;
///
///     let ctx = StageContext::new();
///     assert!(workflow.advance(&ctx)?.is_none());
///
///     let result = workflow.advance(&ctx)?.expect("workflow finished");
///     assert_eq!(result.decode::<i32>()?, 2);
///     Ok(())
/// }
/// ```
pub struct Orchestrator<S> {
    store: S,
    stages: Vec<Box<dyn DynStage>>,
}

impl<S: StateStore> Orchestrator<S> {
    /// Creates an orchestrator from a store and a non-empty stage list.
    pub fn new(store: S, stages: Vec<Box<dyn DynStage>>) -> Result<Self, WorkflowError> {
        if stages.is_empty() {
            return Err(WorkflowError::EmptyWorkflow);
        }
        Ok(Self { store, stages })
    }

    /// Starts building an orchestrator over `store`.
    pub fn builder(store: S) -> OrchestratorBuilder<S> {
        OrchestratorBuilder {
            store,
            stages: Vec::new(),
        }
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs the pending stage and persists the new state.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - A stage completed; call again to continue
    /// * `Ok(Some(result))` - The last stage completed; the stored state was
    ///   reset so the next call starts a new run
    /// * `Err(WorkflowError::Load)` - Nothing ran and nothing was saved
    /// * `Err(WorkflowError::Stage | WorkflowError::Encoding)` - The state was
    ///   saved back unchanged
    /// * `Err(WorkflowError::Save)` - The stage completed but the new state
    ///   was not persisted; the error carries the result this call would have
    ///   returned
    ///
    /// # Panics
    ///
    /// Panics if the stored stage index is outside the stage list. The index
    /// is only ever written by this type, so this means the persisted state
    /// was tampered with or belongs to a different workflow.
    pub fn advance(&self, ctx: &StageContext) -> Result<Option<StageResult>, WorkflowError> {
        let mut state = self.store.load().map_err(|e| {
            warn!("Failed to load workflow state: {}", report(&e));
            WorkflowError::Load(e)
        })?;

        let outcome = self.run_pending(ctx, &mut state);

        // Saved on every path past a successful load.
        match (outcome, self.store.save(&state)) {
            (outcome, Ok(())) => outcome,
            (Ok(result), Err(source)) => {
                error!("Stage completed but saving workflow state failed: {}", report(&source));
                Err(WorkflowError::Save { source, result })
            }
            (Err(e), Err(save_err)) => {
                error!("Failed to re-save workflow state after error: {}", report(&save_err));
                Err(e)
            }
        }
    }

    /// Reports the stored progress without running or saving anything.
    pub fn status(&self) -> Result<Progress, WorkflowError> {
        let state = self.store.load().map_err(WorkflowError::Load)?;
        Ok(Progress {
            current_stage: state.current_stage,
            total_stages: self.stages.len(),
            has_pending_result: state.pending_result.is_some(),
        })
    }

    /// Abandons any run in progress by saving the initial state.
    pub fn reset(&self) -> Result<(), WorkflowError> {
        self.store
            .save(&WorkflowState::default())
            .map_err(|source| WorkflowError::Save { source, result: None })?;
        info!("Workflow state reset");
        Ok(())
    }

    fn run_pending(
        &self,
        ctx: &StageContext,
        state: &mut WorkflowState,
    ) -> Result<Option<StageResult>, WorkflowError> {
        let index = state.current_stage;
        let Some(stage) = self.stages.get(index) else {
            error!(
                "Workflow state points at stage {} but only {} stages exist",
                index,
                self.stages.len()
            );
            panic!(
                "invalid workflow state: stage index {} out of range for {} stages",
                index,
                self.stages.len()
            );
        };

        debug!(
            "Running stage {}/{} ({})",
            index + 1,
            self.stages.len(),
            stage.stage_name()
        );

        let result = match stage.run_encoded(ctx, state.pending_result.as_ref()) {
            StageOutcome::Completed(result) => result,
            StageOutcome::Failed(source) => {
                warn!("Stage {} ({}) failed: {}", index, stage.stage_name(), report(&*source));
                return Err(WorkflowError::Stage { index, source });
            }
            StageOutcome::Unencodable(source) => {
                warn!("Stage {} ({}) result not encodable: {}", index, stage.stage_name(), report(&source));
                return Err(WorkflowError::Encoding { index, source });
            }
        };

        if index == self.stages.len() - 1 {
            info!("Workflow completed after {} stages", self.stages.len());
            state.reset();
            return Ok(Some(result));
        }

        debug!("Stage {} completed ({} bytes)", index, result.len());
        state.advance(result);
        Ok(None)
    }
}

/// Builder returned by [`Orchestrator::builder`].
pub struct OrchestratorBuilder<S> {
    store: S,
    stages: Vec<Box<dyn DynStage>>,
}

impl<S: StateStore> OrchestratorBuilder<S> {
    /// Appends a stage; stages run in the order they are added.
    pub fn stage<T: Stage + 'static>(mut self, stage: T) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Appends an already boxed stage.
    pub fn boxed_stage(mut self, stage: Box<dyn DynStage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Fails with [`WorkflowError::EmptyWorkflow`] if no stage was added.
    pub fn build(self) -> Result<Orchestrator<S>, WorkflowError> {
        Orchestrator::new(self.store, self.stages)
    }
}
