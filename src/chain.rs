//! Lazily evaluated pipelines.
//!
//! A [`Chain`] is an ordered list of [`Step`]s. Nothing runs while the chain
//! is being built; [`Chain::evaluate`] threads a value through every step in
//! order. Steps are dispatched by kind:
//!
//! - a [`Recorder`] is evaluated against the running value;
//! - a [`Binder`] holding placeholders has them resolved against the running
//!   value, then is invoked;
//! - any other binder or [`Function`] is called with the running value;
//! - a nested [`Chain`] is evaluated with the running value;
//! - a [`Stage`] runs with the running value.
//!
//! # Operators
//!
//! `P | step` starts a chain, `chain | step` appends, `chain | chain`
//! concatenates, `value | P` seeds the pending input and `chain | END`
//! evaluates the pending input.
//!
//! ```rust
//! use pipewright::{END, P, X, Value};
//!
//! let result = Value::from(4) | P | (X + 1) | (X * 10) | END;
//! assert_eq!(result.unwrap(), Value::Int(50));
//! ```

use std::fmt::{self, Debug, Display, Formatter};
use std::ops::BitOr;
use std::sync::Arc;

use crate::binder::{ArgumentList, Binder};
use crate::error::{Error, Result};
use crate::function::Function;
use crate::recorder::{Placeholder, Recorder};
use crate::value::Value;

// =============================================================================
// Stage
// =============================================================================

/// An external step, such as a sink write or a process invocation.
pub trait Stage: Send + Sync {
    /// Name shown when the chain is displayed.
    fn name(&self) -> String;

    /// Consumes the running value and produces the next one.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn run(&self, input: Value) -> Result<Value>;
}

// =============================================================================
// Step
// =============================================================================

/// One element of a chain.
#[derive(Clone)]
pub enum Step {
    /// A registered function called with the running value.
    Function(Function),
    /// A partially bound function.
    Bound(Binder),
    /// A recorded expression evaluated against the running value.
    Recorder(Recorder),
    /// A nested chain.
    Chain(Chain),
    /// An external stage.
    Stage(Arc<dyn Stage>),
}

impl Step {
    /// Wraps an external stage.
    pub fn stage(stage: impl Stage + 'static) -> Self {
        Self::Stage(Arc::new(stage))
    }

    /// Runs the step against `input`.
    ///
    /// # Errors
    ///
    /// Propagates the error raised by the step.
    pub fn run(&self, input: Value) -> Result<Value> {
        match self {
            Self::Function(function) => function.call1(input),
            Self::Bound(binder) if binder.has_placeholders() => binder.resolve(&input)?.invoke(),
            Self::Bound(binder) => binder.call(ArgumentList::new().with_positional(input)),
            Self::Recorder(recorder) => recorder.evaluate(input),
            Self::Chain(chain) => chain.evaluate(input),
            Self::Stage(stage) => stage.run(input),
        }
    }
}

impl Display for Step {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(function) => formatter.write_str(function.name()),
            Self::Bound(binder) => write!(formatter, "{binder}"),
            Self::Recorder(recorder) => write!(formatter, "{recorder}"),
            Self::Chain(chain) => write!(formatter, "{chain}"),
            Self::Stage(stage) => formatter.write_str(&stage.name()),
        }
    }
}

impl Debug for Step {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(function) => formatter.debug_tuple("Function").field(function).finish(),
            Self::Bound(binder) => formatter.debug_tuple("Bound").field(binder).finish(),
            Self::Recorder(recorder) => formatter.debug_tuple("Recorder").field(recorder).finish(),
            Self::Chain(chain) => formatter.debug_tuple("Chain").field(chain).finish(),
            Self::Stage(stage) => formatter.debug_tuple("Stage").field(&stage.name()).finish(),
        }
    }
}

impl From<Function> for Step {
    fn from(function: Function) -> Self {
        Self::Function(function)
    }
}

impl From<Binder> for Step {
    fn from(binder: Binder) -> Self {
        Self::Bound(binder)
    }
}

impl From<Recorder> for Step {
    fn from(recorder: Recorder) -> Self {
        Self::Recorder(recorder)
    }
}

impl From<Placeholder> for Step {
    fn from(placeholder: Placeholder) -> Self {
        Self::Recorder(placeholder.recorder())
    }
}

impl From<Chain> for Step {
    fn from(chain: Chain) -> Self {
        Self::Chain(chain)
    }
}

impl From<Arc<dyn Stage>> for Step {
    fn from(stage: Arc<dyn Stage>) -> Self {
        Self::Stage(stage)
    }
}

impl TryFrom<Value> for Step {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Function(function) => Ok(Self::Function(function)),
            Value::Curried(binder) => Ok(Self::Bound(*binder)),
            other => Err(Error::NotCallable {
                type_name: other.type_name(),
            }),
        }
    }
}

// =============================================================================
// Chain
// =============================================================================

/// An ordered list of steps with an optional pending input.
///
/// Chains are immutable values: appending or concatenating returns a new
/// chain.
#[derive(Clone, Debug, Default)]
pub struct Chain {
    steps: Vec<Step>,
    input: Option<Value>,
}

impl Chain {
    /// Creates an empty chain.
    pub const fn new() -> Self {
        Self {
            steps: Vec::new(),
            input: None,
        }
    }

    /// Creates an empty chain with a pending input for [`Chain::end`].
    pub fn with_input(input: impl Into<Value>) -> Self {
        Self {
            steps: Vec::new(),
            input: Some(input.into()),
        }
    }

    /// Appends a step.
    #[must_use]
    pub fn append(mut self, step: impl Into<Step>) -> Self {
        self.steps.push(step.into());
        self
    }

    /// Alias of [`Chain::append`].
    #[must_use]
    pub fn pipe(self, step: impl Into<Step>) -> Self {
        self.append(step)
    }

    /// Appends a callable value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotCallable`] when `value` is neither a function nor
    /// a curried function.
    pub fn try_append(self, value: Value) -> Result<Self> {
        Ok(self.append(Step::try_from(value)?))
    }

    /// Appends every step of `other`.
    ///
    /// The pending input of `self` is kept; that of `other` is dropped.
    #[must_use]
    pub fn concat(mut self, other: Self) -> Self {
        self.steps.extend(other.steps);
        self
    }

    /// The steps in evaluation order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` when the chain has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The pending input, if any.
    pub const fn input(&self) -> Option<&Value> {
        self.input.as_ref()
    }

    /// Threads `input` through every step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyChain`] for a chain without steps, or the first
    /// error raised by a step.
    pub fn evaluate(&self, input: impl Into<Value>) -> Result<Value> {
        if self.steps.is_empty() {
            return Err(Error::EmptyChain);
        }
        tracing::debug!(steps = self.steps.len(), "evaluating chain");
        let result = self
            .steps
            .iter()
            .enumerate()
            .try_fold(input.into(), |running, (index, step)| {
                tracing::trace!(index, %step, "dispatching step");
                step.run(running)
            })?;
        tracing::debug!("chain evaluated");
        Ok(result)
    }

    /// Evaluates the pending input, or [`Value::Nil`] when there is none.
    ///
    /// # Errors
    ///
    /// See [`Chain::evaluate`].
    pub fn end(&self) -> Result<Value> {
        self.evaluate(self.input.clone().unwrap_or_default())
    }
}

impl Display for Chain {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("[P: ")?;
        for (index, step) in self.steps.iter().enumerate() {
            if index > 0 {
                formatter.write_str(" -> ")?;
            }
            write!(formatter, "{step}")?;
        }
        formatter.write_str(" ]")
    }
}

// =============================================================================
// Operators
// =============================================================================

/// Starts a chain: `P | step`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pipe;

/// The chain starter.
pub const P: Pipe = Pipe;

/// Terminal sentinel: `chain | END` evaluates the pending input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct End;

/// The terminal sentinel.
pub const END: End = End;

macro_rules! impl_pipe_operators {
    ($($step:ty),* $(,)?) => {
        $(
            impl BitOr<$step> for Pipe {
                type Output = Chain;

                fn bitor(self, step: $step) -> Chain {
                    Chain::new().append(step)
                }
            }

            impl BitOr<$step> for Chain {
                type Output = Self;

                fn bitor(self, step: $step) -> Self {
                    self.append(step)
                }
            }

            impl BitOr<$step> for Recorder {
                type Output = Chain;

                fn bitor(self, step: $step) -> Chain {
                    Chain::new().append(self).append(step)
                }
            }
        )*
    };
}

pub(crate) use impl_pipe_operators;

impl_pipe_operators!(Function, Binder, Recorder, Placeholder, Step, Arc<dyn Stage>);

impl BitOr<Chain> for Pipe {
    type Output = Chain;

    fn bitor(self, chain: Chain) -> Chain {
        chain
    }
}

impl BitOr for Chain {
    type Output = Self;

    fn bitor(self, other: Self) -> Self {
        self.concat(other)
    }
}

impl BitOr<Chain> for Recorder {
    type Output = Chain;

    fn bitor(self, chain: Chain) -> Chain {
        Chain::new().append(self).concat(chain)
    }
}

impl BitOr<Pipe> for Value {
    type Output = Chain;

    fn bitor(self, _: Pipe) -> Chain {
        Chain::with_input(self)
    }
}

impl BitOr<End> for Chain {
    type Output = Result<Value>;

    fn bitor(self, _: End) -> Result<Value> {
        self.end()
    }
}

static_assertions::assert_impl_all!(Chain: Send, Sync, Clone);
static_assertions::assert_impl_all!(Step: Send, Sync);
