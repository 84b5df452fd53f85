//! Symbolic expressions recorded against a future input.
//!
//! A [`Recorder`] stands for a value that is not known yet. Operations on it
//! are not performed; they are appended as [`RecordedStep`]s and replayed
//! later, in order, against a concrete value. `(X + 1).floordiv(2)` is
//! `(x + 1) // 2`, never `x + 1 // 2`.
//!
//! Every recorder has a process-unique identity. Expressions may combine
//! several independent recorders; [`Recorder::apply`] binds one identity
//! per call, while [`Recorder::evaluate`] binds every remaining identity to
//! the same value.
//!
//! # Examples
//!
//! ```rust
//! use pipewright::recorder::{Recorder, Symbolic};
//! use pipewright::Value;
//!
//! let r = Recorder::new();
//! let expression = r / 3 * 2 + 1;
//! assert_eq!(expression.evaluate(Value::Int(3)).unwrap(), Value::Float(3.0));
//! ```

use std::fmt::{self, Display, Formatter};
use std::ops;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::{SmallVec, smallvec};

use crate::error::{Error, Result};
use crate::hooks::{Category, HookTable, Operation};
use crate::value::Value;

// =============================================================================
// Identity and installed hooks
// =============================================================================

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of a recorder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaceholderId(u64);

impl PlaceholderId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw identifier.
    pub const fn get(self) -> u64 {
        self.0
    }
}

static INSTALLED_HOOKS: LazyLock<HookTable> = LazyLock::new(|| {
    HookTable::with_categories([
        Category::NumericLeft,
        Category::NumericRight,
        Category::NumericAssign,
        Category::NumericUnary,
        Category::Container,
        Category::Compare,
        Category::Attribute,
    ])
    // `|` composes chains and is never recorded
    .with_filter(|name, _| !matches!(name, "or" | "ror"))
});

/// The hooks a recorder accepts.
pub fn installed_hooks() -> &'static HookTable {
    &INSTALLED_HOOKS
}

// =============================================================================
// Operands and steps
// =============================================================================

/// One captured operand of a recorded step.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// A literal captured at record time.
    Literal(Value),
    /// The running value of the recorder that owns the step.
    Current,
    /// A sub-expression replayed with the same bindings.
    Nested(Recorder),
}

impl<T: Into<Value>> From<T> for Operand {
    fn from(value: T) -> Self {
        Self::Literal(value.into())
    }
}

impl From<Recorder> for Operand {
    fn from(recorder: Recorder) -> Self {
        Self::Nested(recorder)
    }
}

impl From<Placeholder> for Operand {
    fn from(_: Placeholder) -> Self {
        Self::Nested(Recorder::new())
    }
}

/// An operation and its captured operands.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedStep {
    operation: Operation,
    operands: SmallVec<[Operand; 2]>,
}

impl RecordedStep {
    /// The recorded operation.
    pub const fn operation(&self) -> Operation {
        self.operation
    }

    /// The captured operands, receiver first.
    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }
}

// =============================================================================
// Recorder
// =============================================================================

/// A recorded expression over one or more future inputs.
///
/// An empty recorder is the identity function.
#[derive(Clone, Debug, PartialEq)]
pub struct Recorder {
    id: PlaceholderId,
    steps: Vec<RecordedStep>,
    bound: Vec<(PlaceholderId, Value)>,
}

/// Result of [`Recorder::apply`].
#[derive(Clone, Debug, PartialEq)]
pub enum Applied {
    /// Every identity is bound; this is the replayed result.
    Value(Value),
    /// Identities remain unbound.
    Partial(Recorder),
}

impl Applied {
    /// Supplies the next value.
    ///
    /// A finished value is called with `value` when it is callable.
    ///
    /// # Errors
    ///
    /// Returns replay errors, or [`Error::NotCallable`] when a finished
    /// value cannot be called.
    pub fn apply(self, value: impl Into<Value>) -> Result<Self> {
        match self {
            Self::Partial(recorder) => recorder.apply(value),
            Self::Value(finished) => finished.call1(value.into()).map(Self::Value),
        }
    }

    /// Returns the finished value, if any.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Partial(_) => None,
        }
    }

    /// Returns `true` while identities remain unbound.
    pub const fn is_partial(&self) -> bool {
        matches!(self, Self::Partial(_))
    }
}

impl Recorder {
    /// Creates an empty recorder with a fresh identity.
    pub fn new() -> Self {
        Self {
            id: PlaceholderId::next(),
            steps: Vec::new(),
            bound: Vec::new(),
        }
    }

    /// The identity of this recorder.
    pub const fn id(&self) -> PlaceholderId {
        self.id
    }

    /// The recorded steps in replay order.
    pub fn steps(&self) -> &[RecordedStep] {
        &self.steps
    }

    /// Returns `true` when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Appends a step for an arbitrary operation.
    ///
    /// The receiver operand must be given explicitly, usually as
    /// [`Operand::Current`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperand`] when the operation is not an
    /// installed hook or the operand count does not match its arity.
    pub fn record(
        mut self,
        operation: Operation,
        operands: impl IntoIterator<Item = Operand>,
    ) -> Result<Self> {
        let operands: SmallVec<[Operand; 2]> = operands.into_iter().collect();
        if !installed_hooks().contains(operation)
            || operands.len() != operation.implementation().arity()
        {
            return Err(Error::UnsupportedOperand {
                operation: operation.name(),
                operands: format!("recorder with {} operand(s)", operands.len()),
            });
        }
        self.push_mut(operation, operands);
        Ok(self)
    }

    fn push_mut(&mut self, operation: Operation, operands: SmallVec<[Operand; 2]>) {
        self.steps.push(RecordedStep {
            operation,
            operands,
        });
    }

    fn push(mut self, operation: Operation, operands: SmallVec<[Operand; 2]>) -> Self {
        self.push_mut(operation, operands);
        self
    }

    fn collect_identities(&self, identities: &mut Vec<PlaceholderId>) {
        if !identities.contains(&self.id) {
            identities.push(self.id);
        }
        for step in &self.steps {
            for operand in &step.operands {
                if let Operand::Nested(nested) = operand {
                    nested.collect_identities(identities);
                }
            }
        }
    }

    fn collect_bindings(&self, bindings: &mut Vec<(PlaceholderId, Value)>) {
        for (id, value) in &self.bound {
            if !bindings.iter().any(|(known, _)| known == id) {
                bindings.push((*id, value.clone()));
            }
        }
        for step in &self.steps {
            for operand in &step.operands {
                if let Operand::Nested(nested) = operand {
                    nested.collect_bindings(bindings);
                }
            }
        }
    }

    /// Distinct identities in first-appearance order: this recorder first,
    /// then nested recorders depth-first in step order.
    pub fn placeholders(&self) -> Vec<PlaceholderId> {
        let mut identities = Vec::new();
        self.collect_identities(&mut identities);
        identities
    }

    /// Identities that have not received a value through [`Recorder::apply`].
    pub fn unbound(&self) -> Vec<PlaceholderId> {
        let mut bindings = Vec::new();
        self.collect_bindings(&mut bindings);
        self.placeholders()
            .into_iter()
            .filter(|id| !bindings.iter().any(|(known, _)| known == id))
            .collect()
    }

    /// Binds `value` to the first unbound identity.
    ///
    /// # Errors
    ///
    /// Returns replay errors once every identity is bound.
    pub fn apply(&self, value: impl Into<Value>) -> Result<Applied> {
        let unbound = self.unbound();
        let mut next = self.clone();
        let value = value.into();
        match unbound.as_slice() {
            [] => next.evaluate(value).map(Applied::Value),
            [last] => {
                next.bound.push((*last, value));
                next.evaluate(Value::Nil).map(Applied::Value)
            }
            [first, ..] => {
                next.bound.push((*first, value));
                Ok(Applied::Partial(next))
            }
        }
    }

    /// Binds every remaining identity to `value` and replays.
    ///
    /// Evaluation is pure: the recorded steps are left untouched.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a step implementation.
    pub fn evaluate(&self, value: impl Into<Value>) -> Result<Value> {
        let value = value.into();
        let mut bindings = Vec::new();
        self.collect_bindings(&mut bindings);
        for id in self.placeholders() {
            if !bindings.iter().any(|(known, _)| *known == id) {
                bindings.push((id, value.clone()));
            }
        }
        self.replay(&bindings)
    }

    fn replay(&self, bindings: &[(PlaceholderId, Value)]) -> Result<Value> {
        let mut running = bindings
            .iter()
            .find_map(|(id, value)| (*id == self.id).then(|| value.clone()))
            .unwrap_or_default();
        for step in &self.steps {
            let operands = step
                .operands
                .iter()
                .map(|operand| match operand {
                    Operand::Literal(value) => Ok(value.clone()),
                    Operand::Current => Ok(running.clone()),
                    Operand::Nested(nested) => nested.replay(bindings),
                })
                .collect::<Result<SmallVec<[Value; 3]>>>()?;
            tracing::trace!(operation = step.operation.name(), "replaying recorded step");
            running = step.operation.apply(&operands)?;
        }
        Ok(running)
    }

    fn render(&self, identities: &[PlaceholderId]) -> String {
        let index = identities
            .iter()
            .position(|id| *id == self.id)
            .unwrap_or_default();
        let mut rendered = format!("_{index}");
        for step in &self.steps {
            let operands: Vec<String> = step
                .operands
                .iter()
                .map(|operand| match operand {
                    Operand::Literal(value) => value.to_string(),
                    Operand::Current => rendered.clone(),
                    Operand::Nested(nested) => nested.render(identities),
                })
                .collect();
            rendered = format!("{}({})", step.operation.name(), operands.join(", "));
        }
        rendered
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Recorder {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.render(&self.placeholders()))
    }
}

// =============================================================================
// Placeholder
// =============================================================================

/// The class-level placeholder: every operation on it starts a fresh
/// [`Recorder`] with its own identity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Placeholder;

/// The placeholder constant.
pub const X: Placeholder = Placeholder;

impl Placeholder {
    /// Starts a fresh recorder.
    pub fn recorder(self) -> Recorder {
        Recorder::new()
    }
}

// =============================================================================
// Symbolic builder
// =============================================================================

fn unary<S: Symbolic>(receiver: S, operation: Operation) -> Recorder {
    receiver
        .into_recorder()
        .push(operation, smallvec![Operand::Current])
}

fn binary<S: Symbolic>(receiver: S, operation: Operation, other: Operand) -> Recorder {
    receiver
        .into_recorder()
        .push(operation, smallvec![Operand::Current, other])
}

macro_rules! numeric_methods {
    ($($method:ident, $reversed:ident, $assign:ident => $operation:ident, $reversed_operation:ident, $assign_operation:ident);* $(;)?) => {
        $(
            #[doc = concat!("Records `", stringify!($method), "` with `other` on the right.")]
            fn $method(self, other: impl Into<Operand>) -> Recorder {
                binary(self, Operation::$operation, other.into())
            }

            #[doc = concat!("Records `", stringify!($method), "` with `other` on the left.")]
            fn $reversed(self, other: impl Into<Operand>) -> Recorder {
                binary(self, Operation::$reversed_operation, other.into())
            }

            #[doc = concat!("Records the in-place form of `", stringify!($method), "`.")]
            fn $assign(self, other: impl Into<Operand>) -> Recorder {
                binary(self, Operation::$assign_operation, other.into())
            }
        )*
    };
}

macro_rules! recorded_methods {
    (unary { $($unary:ident => $unary_operation:ident),* $(,)? }
     binary { $($binary:ident => $binary_operation:ident),* $(,)? }) => {
        $(
            #[doc = concat!("Records `", stringify!($unary), "`.")]
            fn $unary(self) -> Recorder {
                unary(self, Operation::$unary_operation)
            }
        )*
        $(
            #[doc = concat!("Records `", stringify!($binary), "`.")]
            fn $binary(self, other: impl Into<Operand>) -> Recorder {
                binary(self, Operation::$binary_operation, other.into())
            }
        )*
    };
}

/// Fluent builder over recorded operations.
///
/// Implemented by [`Recorder`] (appends to the same recorder) and
/// [`Placeholder`] (starts a fresh one).
pub trait Symbolic: Sized {
    /// Converts the receiver into the recorder the next step is appended to.
    fn into_recorder(self) -> Recorder;

    numeric_methods! {
        add, radd, iadd => Add, RAdd, IAdd;
        sub, rsub, isub => Sub, RSub, ISub;
        mul, rmul, imul => Mul, RMul, IMul;
        matmul, rmatmul, imatmul => MatMul, RMatMul, IMatMul;
        truediv, rtruediv, itruediv => TrueDiv, RTrueDiv, ITrueDiv;
        floordiv, rfloordiv, ifloordiv => FloorDiv, RFloorDiv, IFloorDiv;
        modulo, rmodulo, imodulo => Mod, RMod, IMod;
        divmod, rdivmod, idivmod => DivMod, RDivMod, IDivMod;
        pow, rpow, ipow => Pow, RPow, IPow;
        lshift, rlshift, ilshift => LShift, RLShift, ILShift;
        rshift, rrshift, irshift => RShift, RRShift, IRShift;
        bitand, rbitand, ibitand => And, RAnd, IAnd;
        bitxor, rbitxor, ibitxor => Xor, RXor, IXor;
    }

    recorded_methods! {
        unary {
            neg => Neg,
            pos => Pos,
            abs => Abs,
            invert => Invert,
            round => Round,
            trunc => Trunc,
            floor => Floor,
            ceil => Ceil,
            len => Len,
            reversed => Reversed,
            iter => Iter,
        }
        binary {
            less_than => Lt,
            less_equal => Le,
            equals => Eq,
            not_equals => Ne,
            greater_than => Gt,
            greater_equal => Ge,
            get => GetItem,
            remove => DelItem,
            contains => Contains,
        }
    }

    /// Records the in-place form of `|`.
    fn ibitor(self, other: impl Into<Operand>) -> Recorder {
        binary(self, Operation::IOr, other.into())
    }

    /// Records an item assignment; the result is the updated container.
    fn set(self, key: impl Into<Operand>, value: impl Into<Operand>) -> Recorder {
        self.into_recorder().push(
            Operation::SetItem,
            smallvec![Operand::Current, key.into(), value.into()],
        )
    }

    /// Records an attribute read.
    fn attr(self, name: impl Into<String>) -> Recorder {
        binary(self, Operation::GetAttr, Operand::Literal(Value::Str(name.into())))
    }
}

impl Symbolic for Recorder {
    fn into_recorder(self) -> Recorder {
        self
    }
}

impl Symbolic for Placeholder {
    fn into_recorder(self) -> Recorder {
        Recorder::new()
    }
}

// =============================================================================
// Operator sugar
// =============================================================================

macro_rules! impl_operators {
    ($($trait:ident::$method:ident, $assign:ident::$assign_method:ident => $operation:ident),* $(,)?) => {
        paste::paste! {
            $(
                impl<T: Into<Operand>> ops::$trait<T> for Recorder {
                    type Output = Recorder;

                    fn $method(self, other: T) -> Recorder {
                        binary(self, Operation::$operation, other.into())
                    }
                }

                impl<T: Into<Operand>> ops::$trait<T> for Placeholder {
                    type Output = Recorder;

                    fn $method(self, other: T) -> Recorder {
                        binary(self, Operation::$operation, other.into())
                    }
                }

                impl<T: Into<Operand>> ops::$assign<T> for Recorder {
                    fn $assign_method(&mut self, other: T) {
                        self.push_mut(
                            Operation::[<I $operation>],
                            smallvec![Operand::Current, other.into()],
                        );
                    }
                }

                impl_operators!(@literal $trait::$method => [<R $operation>], i64, f64);
            )*
        }
    };
    (@literal $trait:ident::$method:ident => $reversed:ident, $($literal:ty),*) => {
        $(
            impl ops::$trait<Recorder> for $literal {
                type Output = Recorder;

                fn $method(self, recorder: Recorder) -> Recorder {
                    binary(recorder, Operation::$reversed, Operand::from(self))
                }
            }

            impl ops::$trait<Placeholder> for $literal {
                type Output = Recorder;

                fn $method(self, placeholder: Placeholder) -> Recorder {
                    binary(placeholder, Operation::$reversed, Operand::from(self))
                }
            }
        )*
    };
}

impl_operators! {
    Add::add, AddAssign::add_assign => Add,
    Sub::sub, SubAssign::sub_assign => Sub,
    Mul::mul, MulAssign::mul_assign => Mul,
    Div::div, DivAssign::div_assign => TrueDiv,
    Rem::rem, RemAssign::rem_assign => Mod,
    BitAnd::bitand, BitAndAssign::bitand_assign => And,
    BitXor::bitxor, BitXorAssign::bitxor_assign => Xor,
    Shl::shl, ShlAssign::shl_assign => LShift,
    Shr::shr, ShrAssign::shr_assign => RShift,
}

impl ops::Neg for Recorder {
    type Output = Self;

    fn neg(self) -> Self {
        unary(self, Operation::Neg)
    }
}

impl ops::Neg for Placeholder {
    type Output = Recorder;

    fn neg(self) -> Recorder {
        unary(self, Operation::Neg)
    }
}

/// `!r` records `invert`.
impl ops::Not for Recorder {
    type Output = Self;

    fn not(self) -> Self {
        unary(self, Operation::Invert)
    }
}

impl ops::Not for Placeholder {
    type Output = Recorder;

    fn not(self) -> Recorder {
        unary(self, Operation::Invert)
    }
}

static_assertions::assert_impl_all!(Recorder: Send, Sync, Clone);
