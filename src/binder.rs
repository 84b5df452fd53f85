//! Incremental argument binding (currying) over registered functions.
//!
//! A [`Binder`] keeps one slot per declared parameter of its [`Function`]
//! and absorbs positional and keyword arguments across any number of
//! partial calls. Binding never mutates a binder: every call returns a new
//! one with an extended copy of the slot table.
//!
//! Arguments may be concrete values or placeholder expressions. A binder
//! holding placeholders is resolved against a concrete value before it is
//! invoked, which is how a chain step refers to the running value.
//!
//! # Examples
//!
//! ```rust
//! use pipewright::binder::Binder;
//! use pipewright::function::{Function, Signature};
//! use pipewright::{args, Value};
//!
//! let triple = Function::new(
//!     "triple",
//!     Signature::new().required("x").required("y").required("z"),
//!     |frame| Ok(Value::Tuple(vec![frame["x"].clone(), frame["y"].clone(), frame["z"].clone()])),
//! );
//!
//! let binder = Binder::curry(triple).unwrap();
//! let result = binder
//!     .bind(args![; x = 1]).unwrap()
//!     .bind(args![; y = 2]).unwrap()
//!     .invoke_with(args![3]).unwrap();
//! assert_eq!(result, Value::from((1, 2, 3)));
//! ```

use std::fmt::{self, Display, Formatter};

use crate::error::{Error, Result};
use crate::function::{Arguments, Function, ParameterKind};
use crate::recorder::{Placeholder, Recorder};
use crate::value::Value;

// =============================================================================
// Argument
// =============================================================================

/// A call-site argument: a concrete value or a placeholder expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Argument {
    /// A concrete value.
    Value(Value),
    /// An expression evaluated against the running value before invocation.
    Placeholder(Recorder),
}

impl Argument {
    /// Returns `true` for placeholder expressions.
    pub const fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    fn resolve(&mut self, value: &Value) -> Result<()> {
        if let Self::Placeholder(recorder) = self {
            *self = Self::Value(recorder.evaluate(value.clone())?);
        }
        Ok(())
    }

    fn into_value(self, callable: &str) -> Result<Value> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Placeholder(_) => Err(Error::UnresolvedPlaceholder {
                callable: callable.to_string(),
            }),
        }
    }
}

impl<T: Into<Value>> From<T> for Argument {
    fn from(value: T) -> Self {
        Self::Value(value.into())
    }
}

impl From<Recorder> for Argument {
    fn from(recorder: Recorder) -> Self {
        Self::Placeholder(recorder)
    }
}

impl From<Placeholder> for Argument {
    fn from(_: Placeholder) -> Self {
        Self::Placeholder(Recorder::new())
    }
}

impl Display for Argument {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(formatter, "{value}"),
            Self::Placeholder(recorder) => write!(formatter, "{recorder}"),
        }
    }
}

/// Positional and keyword arguments for a binding step.
///
/// Usually built with [`args!`](crate::args).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArgumentList {
    positional: Vec<Argument>,
    keywords: Vec<(String, Argument)>,
}

impl ArgumentList {
    /// Creates an empty argument list.
    pub const fn new() -> Self {
        Self {
            positional: Vec::new(),
            keywords: Vec::new(),
        }
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn with_positional(mut self, argument: impl Into<Argument>) -> Self {
        self.positional.push(argument.into());
        self
    }

    /// Appends a keyword argument.
    #[must_use]
    pub fn with_keyword(mut self, name: impl Into<String>, argument: impl Into<Argument>) -> Self {
        self.keywords.push((name.into(), argument.into()));
        self
    }

    /// Returns `true` when no argument is present.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keywords.is_empty()
    }

    /// Splits into positional and keyword parts.
    pub fn into_parts(self) -> (Vec<Argument>, Vec<(String, Argument)>) {
        (self.positional, self.keywords)
    }
}

impl From<Arguments> for ArgumentList {
    fn from(arguments: Arguments) -> Self {
        let (positional, keywords) = arguments.into_parts();
        Self {
            positional: positional.into_iter().map(Argument::Value).collect(),
            keywords: keywords
                .into_iter()
                .map(|(name, value)| (name, Argument::Value(value)))
                .collect(),
        }
    }
}

/// Builds an [`ArgumentList`]: positional arguments first, then keyword
/// arguments after a `;`.
///
/// # Examples
///
/// ```rust
/// use pipewright::{args, X};
///
/// let positional = args![1, "two"];
/// let mixed = args![1; scale = 2.5];
/// let keywords_only = args![; verbose = true];
/// let with_placeholder = args![X + 1];
/// # let _ = (positional, mixed, keywords_only, with_placeholder);
/// ```
#[macro_export]
macro_rules! args {
    ($($positional:expr),* $(,)? $(; $($name:ident = $value:expr),* $(,)?)?) => {{
        #[allow(unused_mut)]
        let mut arguments = $crate::binder::ArgumentList::new();
        $(
            arguments = arguments.with_positional($positional);
        )*
        $($(
            arguments = arguments.with_keyword(stringify!($name), $value);
        )*)?
        arguments
    }};
}

// =============================================================================
// Binder
// =============================================================================

/// How [`Binder::call`] decides whether to invoke.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BindingMode {
    /// Invoke only once every required slot is bound; every callee error is
    /// returned as is.
    #[default]
    Strict,
    /// Attempt the invocation even while slots are unbound, and read a
    /// signature-mismatch error from the callee as "more arguments needed".
    Legacy,
}

#[derive(Clone, Debug, PartialEq)]
enum Slot {
    Unbound,
    Default(Value),
    Bound(Argument),
    Variadic(Vec<Argument>),
    Extra(Vec<(String, Argument)>),
}

/// A function with a partially filled argument table.
#[derive(Clone, Debug, PartialEq)]
pub struct Binder {
    function: Function,
    slots: Vec<Slot>,
    mode: BindingMode,
}

impl Binder {
    /// Creates a binder with nothing bound yet.
    pub fn new(function: Function) -> Self {
        let slots = function
            .signature()
            .parameters()
            .iter()
            .map(|parameter| match parameter.kind() {
                ParameterKind::Required => Slot::Unbound,
                ParameterKind::WithDefault => {
                    Slot::Default(parameter.default().cloned().unwrap_or_default())
                }
                ParameterKind::VariadicPositional => Slot::Variadic(Vec::new()),
                ParameterKind::VariadicKeyword => Slot::Extra(Vec::new()),
            })
            .collect();
        Self {
            function,
            slots,
            mode: BindingMode::default(),
        }
    }

    /// Creates a binder over a callable value and applies `arguments`.
    ///
    /// A curried value continues from its current table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCallable`] when `target` is not callable,
    /// [`Error::InvalidSignature`] when its signature is declared out of order,
    /// or a binding error from [`Binder::bind`].
    pub fn create(target: impl Into<Value>, arguments: ArgumentList) -> Result<Self> {
        match target.into() {
            Value::Function(function) => {
                function.signature().check(function.name())?;
                Self::new(function).bind(arguments)
            }
            Value::Curried(binder) => binder.bind(arguments),
            other => Err(Error::InvalidCallable {
                type_name: other.type_name(),
            }),
        }
    }

    /// Shorthand for [`Binder::create`] without arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCallable`] when `target` is not callable.
    pub fn curry(target: impl Into<Value>) -> Result<Self> {
        Self::create(target, ArgumentList::new())
    }

    /// Switches the invocation policy of [`Binder::call`].
    #[must_use]
    pub const fn with_mode(mut self, mode: BindingMode) -> Self {
        self.mode = mode;
        self
    }

    /// The current invocation policy.
    pub const fn mode(&self) -> BindingMode {
        self.mode
    }

    /// The curried function.
    pub const fn function(&self) -> &Function {
        &self.function
    }

    /// Returns a new binder with `arguments` applied.
    ///
    /// Positional arguments go to the first slot that is unbound, still
    /// holding only its default, or variadic. Keywords naming a declared
    /// slot overwrite it; other keywords go to the variadic-keyword slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TooManyPositional`] when no slot can take a
    /// positional argument, and [`Error::UnexpectedKeyword`] when a keyword
    /// matches nothing.
    pub fn bind(&self, arguments: ArgumentList) -> Result<Self> {
        let mut next = self.clone();
        let (positional, keywords) = arguments.into_parts();
        for argument in positional {
            next.bind_positional(argument)?;
        }
        for (keyword, argument) in keywords {
            next.bind_keyword(keyword, argument)?;
        }
        tracing::trace!(
            callable = %self.function.name(),
            fully_bound = next.is_fully_bound(),
            "bound arguments"
        );
        Ok(next)
    }

    fn bind_positional(&mut self, argument: Argument) -> Result<()> {
        let target = self
            .slots
            .iter_mut()
            .find(|slot| matches!(slot, Slot::Unbound | Slot::Default(_) | Slot::Variadic(_)));
        match target {
            Some(Slot::Variadic(values)) => values.push(argument),
            Some(slot) => *slot = Slot::Bound(argument),
            None => {
                return Err(Error::TooManyPositional {
                    callable: self.function.name().to_string(),
                    accepted: self.function.signature().positional_capacity(),
                });
            }
        }
        Ok(())
    }

    fn bind_keyword(&mut self, keyword: String, argument: Argument) -> Result<()> {
        if let Some(index) = self.function.signature().slot_of(&keyword) {
            self.slots[index] = Slot::Bound(argument);
            return Ok(());
        }
        let extra = self.slots.iter_mut().find_map(|slot| match slot {
            Slot::Extra(entries) => Some(entries),
            _ => None,
        });
        let Some(entries) = extra else {
            return Err(Error::UnexpectedKeyword {
                callable: self.function.name().to_string(),
                keyword,
            });
        };
        match entries.iter_mut().find(|(name, _)| *name == keyword) {
            Some((_, existing)) => *existing = argument,
            None => entries.push((keyword, argument)),
        }
        Ok(())
    }

    /// Returns `true` once no required slot is unbound.
    pub fn is_fully_bound(&self) -> bool {
        !self.slots.iter().any(|slot| matches!(slot, Slot::Unbound))
    }

    /// Names of the unbound required parameters, in declaration order.
    pub fn missing(&self) -> Vec<String> {
        self.function
            .signature()
            .parameters()
            .iter()
            .zip(&self.slots)
            .filter(|(_, slot)| matches!(slot, Slot::Unbound))
            .map(|(parameter, _)| parameter.name().to_string())
            .collect()
    }

    fn arguments(&self) -> impl Iterator<Item = &Argument> {
        self.slots.iter().flat_map(|slot| {
            let (single, values, entries): (Option<&Argument>, &[Argument], &[(String, Argument)]) =
                match slot {
                    Slot::Bound(argument) => (Some(argument), &[], &[]),
                    Slot::Variadic(values) => (None, values.as_slice(), &[]),
                    Slot::Extra(entries) => (None, &[], entries.as_slice()),
                    Slot::Unbound | Slot::Default(_) => (None, &[], &[]),
                };
            single
                .into_iter()
                .chain(values)
                .chain(entries.iter().map(|(_, argument)| argument))
        })
    }

    /// Returns `true` when any bound argument is a placeholder expression.
    pub fn has_placeholders(&self) -> bool {
        self.arguments().any(Argument::is_placeholder)
    }

    /// Returns a copy with every placeholder argument evaluated against `value`.
    ///
    /// # Errors
    ///
    /// Propagates errors raised while evaluating a placeholder.
    pub fn resolve(&self, value: &Value) -> Result<Self> {
        let mut resolved = self.clone();
        for slot in &mut resolved.slots {
            match slot {
                Slot::Bound(argument) => argument.resolve(value)?,
                Slot::Variadic(values) => {
                    for argument in values {
                        argument.resolve(value)?;
                    }
                }
                Slot::Extra(entries) => {
                    for (_, argument) in entries {
                        argument.resolve(value)?;
                    }
                }
                Slot::Unbound | Slot::Default(_) => {}
            }
        }
        Ok(resolved)
    }

    /// Re-assembles the table into call arguments.
    ///
    /// Slots are walked in declaration order. The first slot holding no
    /// explicit value stops positional assembly; every named slot after it
    /// is passed by keyword. Variadic-keyword entries always go by keyword.
    fn assemble(&self) -> (Vec<Argument>, Vec<(String, Argument)>) {
        let mut positional = Vec::new();
        let mut keywords = Vec::new();
        let mut stopped = false;
        for (parameter, slot) in self.function.signature().parameters().iter().zip(&self.slots) {
            match slot {
                Slot::Unbound => stopped = true,
                Slot::Bound(argument) if !stopped => positional.push(argument.clone()),
                Slot::Bound(argument) => {
                    keywords.push((parameter.name().to_string(), argument.clone()));
                }
                Slot::Default(value) => {
                    stopped = true;
                    keywords.push((parameter.name().to_string(), Argument::Value(value.clone())));
                }
                Slot::Variadic(values) if !stopped => positional.extend(values.iter().cloned()),
                Slot::Variadic(_) => {}
                Slot::Extra(entries) => keywords.extend(entries.iter().cloned()),
            }
        }
        (positional, keywords)
    }

    /// Positional arguments as they would be passed on invocation.
    pub fn positional(&self) -> Vec<Argument> {
        self.assemble().0
    }

    /// Keyword arguments as they would be passed on invocation.
    pub fn keywords(&self) -> Vec<(String, Argument)> {
        self.assemble().1
    }

    /// Calls the function with the bound arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFullyBound`] while required slots are unbound,
    /// [`Error::UnresolvedPlaceholder`] while placeholders remain, or
    /// whatever the function raises.
    pub fn invoke(&self) -> Result<Value> {
        if !self.is_fully_bound() {
            return Err(Error::NotFullyBound {
                callable: self.function.name().to_string(),
                missing: self.missing(),
            });
        }
        self.invoke_unchecked()
    }

    fn invoke_unchecked(&self) -> Result<Value> {
        let name = self.function.name();
        let (positional, keywords) = self.assemble();
        let mut arguments = Arguments::new();
        for argument in positional {
            arguments = arguments.with_positional(argument.into_value(name)?);
        }
        for (keyword, argument) in keywords {
            arguments = arguments.with_keyword(keyword, argument.into_value(name)?);
        }
        tracing::debug!(callable = %name, "invoking curried function");
        self.function.call(arguments)
    }

    /// Binds `arguments`, then invokes.
    ///
    /// # Errors
    ///
    /// See [`Binder::bind`] and [`Binder::invoke`].
    pub fn invoke_with(&self, arguments: ArgumentList) -> Result<Value> {
        self.bind(arguments)?.invoke()
    }

    /// Binds `arguments` and invokes when the result is complete.
    ///
    /// A binder that is still missing arguments, or that holds placeholders
    /// waiting for a value, is returned as [`Value::Curried`].
    ///
    /// # Errors
    ///
    /// See [`Binder::bind`] and [`Binder::invoke`].
    pub fn call(&self, arguments: ArgumentList) -> Result<Value> {
        let bound = self.bind(arguments)?;
        if bound.has_placeholders() {
            return Ok(Value::from(bound));
        }
        if bound.is_fully_bound() {
            return bound.invoke();
        }
        match self.mode {
            BindingMode::Strict => Ok(Value::from(bound)),
            BindingMode::Legacy => match bound.invoke_unchecked() {
                Err(error) if error.is_signature_mismatch() => {
                    tracing::debug!(
                        callable = %self.function.name(),
                        %error,
                        "treating call failure as a partial binding"
                    );
                    Ok(Value::from(bound))
                }
                result => result,
            },
        }
    }
}

impl Display for Binder {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let mut rendered = Vec::new();
        for (parameter, slot) in self.function.signature().parameters().iter().zip(&self.slots) {
            match slot {
                Slot::Bound(argument) => rendered.push(format!("{}={argument}", parameter.name())),
                Slot::Variadic(values) if !values.is_empty() => {
                    let values: Vec<_> = values.iter().map(ToString::to_string).collect();
                    rendered.push(format!("{}=({})", parameter.name(), values.join(", ")));
                }
                Slot::Extra(entries) => {
                    rendered.extend(entries.iter().map(|(name, argument)| format!("{name}={argument}")));
                }
                _ => {}
            }
        }
        if rendered.is_empty() {
            write!(formatter, "<curry {}>", self.function.name())
        } else {
            write!(formatter, "<curry {} {}>", self.function.name(), rendered.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::Signature;
    use crate::recorder::X;
    use rstest::{fixture, rstest};

    #[fixture]
    fn triple() -> Function {
        Function::new(
            "triple",
            Signature::new().required("x").required("y").required("z"),
            |frame| {
                Ok(Value::Tuple(vec![
                    frame["x"].clone(),
                    frame["y"].clone(),
                    frame["z"].clone(),
                ]))
            },
        )
    }

    #[fixture]
    fn scaled() -> Function {
        Function::new(
            "scaled",
            Signature::new()
                .required("value")
                .with_default("factor", 2)
                .with_default("offset", 0),
            |frame| {
                crate::hooks::implementations::add(
                    &crate::hooks::implementations::mul(&frame["value"], &frame["factor"])?,
                    &frame["offset"],
                )
            },
        )
    }

    #[fixture]
    fn gather() -> Function {
        Function::new(
            "gather",
            Signature::new()
                .required("first")
                .variadic_positional("rest")
                .variadic_keyword("options"),
            |frame| {
                Ok(Value::from((
                    Value::List(frame.rest().to_vec()),
                    Value::Map(frame.extra().clone()),
                )))
            },
        )
    }

    #[rstest]
    fn test_keywords_then_positional(triple: Function) {
        let result = Binder::curry(triple)
            .unwrap()
            .bind(args![; x = 1])
            .unwrap()
            .bind(args![; y = 2])
            .unwrap()
            .invoke_with(args![3])
            .unwrap();
        assert_eq!(result, Value::from((1, 2, 3)));
    }

    #[rstest]
    fn test_call_returns_curried_until_complete(triple: Function) {
        let binder = Binder::curry(triple).unwrap();
        let partial = binder.call(args![1]).unwrap();
        assert!(matches!(partial, Value::Curried(_)));
        let partial = partial.call1(Value::Int(2)).unwrap();
        let result = partial.call1(Value::Int(3)).unwrap();
        assert_eq!(result, Value::from((1, 2, 3)));
    }

    #[rstest]
    fn test_invoke_before_fully_bound(triple: Function) {
        let binder = Binder::create(triple, args![1]).unwrap();
        let error = binder.invoke().unwrap_err();
        assert!(
            matches!(error, Error::NotFullyBound { ref missing, .. } if missing == &["y", "z"])
        );
    }

    #[rstest]
    fn test_binding_never_mutates_the_source(triple: Function) {
        let binder = Binder::create(triple, args![1]).unwrap();
        let extended = binder.bind(args![2]).unwrap();
        assert_eq!(binder.missing(), ["y", "z"]);
        assert_eq!(extended.missing(), ["z"]);
    }

    #[rstest]
    fn test_create_rejects_non_callables() {
        let error = Binder::curry(3).unwrap_err();
        assert!(matches!(error, Error::InvalidCallable { type_name: "int" }));
    }

    #[rstest]
    fn test_create_rejects_named_slot_after_variadic() {
        let misordered = Function::new(
            "misordered",
            Signature::new()
                .required("a")
                .variadic_positional("rest")
                .with_default("key", 5),
            |_| Ok(Value::Nil),
        );
        let error = Binder::create(misordered, args![1, 2, 3]).unwrap_err();
        assert!(matches!(
            error,
            Error::InvalidSignature { ref parameter, .. } if parameter == "key"
        ));
    }

    #[rstest]
    fn test_create_continues_from_curried_value(triple: Function) {
        let partial = Value::from(Binder::create(triple, args![1, 2]).unwrap());
        let result = Binder::create(partial, args![3]).unwrap().invoke().unwrap();
        assert_eq!(result, Value::from((1, 2, 3)));
    }

    #[rstest]
    fn test_too_many_positional(triple: Function) {
        let error = Binder::create(triple, args![1, 2, 3, 4]).unwrap_err();
        assert!(matches!(error, Error::TooManyPositional { accepted: 3, .. }));
    }

    #[rstest]
    fn test_unexpected_keyword(triple: Function) {
        let error = Binder::create(triple, args![; w = 1]).unwrap_err();
        assert!(matches!(error, Error::UnexpectedKeyword { ref keyword, .. } if keyword == "w"));
    }

    #[rstest]
    fn test_default_slots_are_fully_bound_from_the_start(scaled: Function) {
        let binder = Binder::create(scaled, args![5]).unwrap();
        assert!(binder.is_fully_bound());
        assert_eq!(binder.invoke().unwrap(), Value::Int(10));
    }

    #[rstest]
    fn test_positional_fills_default_slots_in_order(scaled: Function) {
        let binder = Binder::create(scaled, args![5, 3]).unwrap();
        assert_eq!(binder.positional(), vec![Argument::from(5), Argument::from(3)]);
        assert_eq!(binder.keywords(), vec![("offset".to_string(), Argument::from(0))]);
        assert_eq!(binder.invoke().unwrap(), Value::Int(15));
    }

    #[rstest]
    fn test_untouched_default_stops_positional_assembly(scaled: Function) {
        let binder = Binder::create(scaled, args![5; offset = 1]).unwrap();
        assert_eq!(binder.positional(), vec![Argument::from(5)]);
        assert_eq!(
            binder.keywords(),
            vec![
                ("factor".to_string(), Argument::from(2)),
                ("offset".to_string(), Argument::from(1)),
            ]
        );
        assert_eq!(binder.invoke().unwrap(), Value::Int(11));
    }

    #[rstest]
    fn test_variadic_slots_accumulate(gather: Function) {
        let first = Binder::create(gather, args![1, 2]).unwrap();
        let second = first.bind(args![3; verbose = true]).unwrap();
        let result = second.invoke().unwrap();
        assert_eq!(
            result,
            Value::from((vec![2, 3], crate::record! { "verbose" => true }))
        );
        assert!(first.keywords().is_empty());
    }

    #[rstest]
    fn test_resolve_substitutes_placeholders(triple: Function) {
        let binder = Binder::create(triple, args![X, X + 1, 0]).unwrap();
        assert!(binder.has_placeholders());
        assert!(matches!(
            binder.invoke().unwrap_err(),
            Error::UnresolvedPlaceholder { .. }
        ));
        let resolved = binder.resolve(&Value::Int(10)).unwrap();
        assert!(!resolved.has_placeholders());
        assert_eq!(resolved.invoke().unwrap(), Value::from((10, 11, 0)));
    }

    #[rstest]
    fn test_call_with_placeholder_stays_curried(triple: Function) {
        let result = Binder::curry(triple).unwrap().call(args![X, 1, 2]).unwrap();
        assert!(matches!(result, Value::Curried(_)));
    }

    #[rstest]
    fn test_legacy_mode_reads_mismatch_as_partial(triple: Function) {
        let binder = Binder::curry(triple).unwrap().with_mode(BindingMode::Legacy);
        let partial = binder.call(args![1]).unwrap();
        let Value::Curried(partial) = partial else {
            panic!("expected a curried value");
        };
        assert_eq!(partial.mode(), BindingMode::Legacy);
        assert_eq!(partial.invoke_with(args![2, 3]).unwrap(), Value::from((1, 2, 3)));
    }

    #[rstest]
    fn test_legacy_mode_propagates_other_failures() {
        let failing = Function::new(
            "failing",
            Signature::new().required("a").required("b"),
            |_| Err(Error::failed("failing", "boom")),
        );
        let binder = Binder::curry(failing).unwrap().with_mode(BindingMode::Legacy);
        assert!(matches!(binder.call(args![1, 2]).unwrap_err(), Error::Failed { .. }));
    }

    #[rstest]
    fn test_display_lists_bound_arguments(triple: Function, gather: Function) {
        assert_eq!(Binder::curry(triple.clone()).unwrap().to_string(), "<curry triple>");
        let binder = Binder::create(triple, args![1; y = 2]).unwrap();
        assert_eq!(binder.to_string(), "<curry triple x=1, y=2>");
        let binder = Binder::create(gather, args![1, 2, 3; mode = "fast"]).unwrap();
        assert_eq!(binder.to_string(), "<curry gather first=1, rest=(2, 3), mode=\"fast\">");
    }

    #[rstest]
    fn test_arguments_from_resolved_call_arguments() {
        let list = ArgumentList::from(Arguments::new().with_positional(1).with_keyword("k", 2));
        assert_eq!(list, args![1; k = 2]);
        assert!(!list.is_empty());
        assert!(args![].is_empty());
    }
}
