//! Stage Contract
//!
//! A stage is one ordered unit of work. It receives the serialized output
//! of the stage before it and returns a new value, which the orchestrator
//! encodes and carries forward.
//!
//! The engine does not check that consecutive stages agree on types: each
//! stage decodes its input into whatever shape it expects.

use std::error::Error;
use std::marker::PhantomData;

use serde::Serialize;

use crate::error::CodecError;

use super::context::StageContext;
use super::result::StageResult;

/// Error type returned by stages.
pub type StageError = Box<dyn Error + Send + Sync>;

/// A runnable step in a workflow.
///
/// Stages may run more than once with the same input (a caller retrying
/// after a failed save re-runs the same stage), so side effects should
/// tolerate at-least-once execution.
///
/// # Example
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use stepwise::workflow::{Stage, StageContext, StageError, StageResult};
///
/// #[derive(Serialize, Deserialize, Default)]
/// struct Person {
///     name: String,
///     surname: String,
/// }
///
/// struct AddSurname(String);
///
/// impl Stage for AddSurname {
///     type Output = Person;
///
///     fn run(&self, _ctx: &StageContext, previous: Option<&StageResult>) -> Result<Person, StageError> {
///         let mut person: Person = match previous {
///             Some(result) => result.decode()?,
///             None => Person::default(),
///         };
///         person.surname = self.0.clone();
///         Ok(person)
///     }
/// }
/// ```
pub trait Stage: Send + Sync {
    /// Value produced by the stage; encoded before it leaves the engine.
    type Output: Serialize;

    /// Runs the stage.
    ///
    /// `previous` is `None` only for the first stage of a run.
    fn run(
        &self,
        ctx: &StageContext,
        previous: Option<&StageResult>,
    ) -> Result<Self::Output, StageError>;

    /// Name used in log messages.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Outcome of running a type-erased stage.
#[derive(Debug)]
pub enum StageOutcome {
    /// The stage ran and its output was encoded
    Completed(StageResult),
    /// The stage itself failed
    Failed(StageError),
    /// The stage succeeded but its output could not be encoded
    Unencodable(CodecError),
}

/// Object-safe view of a [`Stage`], so stages with different output types
/// can share one sequence. Implemented for every `Stage`.
pub trait DynStage: Send + Sync {
    fn run_encoded(&self, ctx: &StageContext, previous: Option<&StageResult>) -> StageOutcome;

    fn stage_name(&self) -> &str;
}

impl<S: Stage> DynStage for S {
    fn run_encoded(&self, ctx: &StageContext, previous: Option<&StageResult>) -> StageOutcome {
        match self.run(ctx, previous) {
            Ok(value) => match StageResult::encode(&value) {
                Ok(result) => StageOutcome::Completed(result),
                Err(e) => StageOutcome::Unencodable(e),
            },
            Err(e) => StageOutcome::Failed(e),
        }
    }

    fn stage_name(&self) -> &str {
        self.name()
    }
}

/// A stage built from a closure.
///
/// ```rust
/// use stepwise::workflow::{FnStage, StageContext};
///
/// let greet = FnStage::new("greet", |_ctx: &StageContext, _prev| Ok("hello"));
/// ```
pub struct FnStage<F, T> {
    name: String,
    func: F,
    _output: PhantomData<fn() -> T>,
}

impl<F, T> FnStage<F, T>
where
    F: Fn(&StageContext, Option<&StageResult>) -> Result<T, StageError> + Send + Sync,
    T: Serialize,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
            _output: PhantomData,
        }
    }
}

impl<F, T> Stage for FnStage<F, T>
where
    F: Fn(&StageContext, Option<&StageResult>) -> Result<T, StageError> + Send + Sync,
    T: Serialize,
{
    type Output = T;

    fn run(&self, ctx: &StageContext, previous: Option<&StageResult>) -> Result<T, StageError> {
        (self.func)(ctx, previous)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
