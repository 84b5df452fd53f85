//! Registered native functions and their explicit signatures.
//!
//! A [`Function`] pairs a Rust closure with a [`Signature`]: an ordered list
//! of [`Parameter`] descriptors declared once at registration time. The
//! binder reads the signature to know which slots remain unbound; a call
//! matches [`Arguments`] against it and hands the body a [`Frame`] keyed by
//! parameter name.
//!
//! # Examples
//!
//! ```rust
//! use pipewright::function::{Arguments, Function, Signature};
//! use pipewright::Value;
//!
//! let describe = Function::new(
//!     "describe",
//!     Signature::new().required("name").with_default("greeting", "hello"),
//!     |frame| {
//!         let greeting = frame["greeting"].as_str().unwrap_or_default().to_string();
//!         let name = frame["name"].as_str().unwrap_or_default().to_string();
//!         Ok(Value::from(format!("{greeting}, {name}")))
//!     },
//! );
//!
//! let result = describe.call(Arguments::positional(vec![Value::from("world")])).unwrap();
//! assert_eq!(result, Value::from("hello, world"));
//! ```

use std::collections::BTreeMap;
use std::fmt::{self, Debug, Formatter};
use std::ops::Index;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::value::Value;

// =============================================================================
// Signature
// =============================================================================

/// How a parameter receives its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// Must be supplied, positionally or by name.
    Required,
    /// Falls back to a declared default when not supplied.
    WithDefault,
    /// Collects every surplus positional value (`*args`).
    VariadicPositional,
    /// Collects every unmatched keyword (`**kwargs`).
    VariadicKeyword,
}

impl ParameterKind {
    /// Returns `true` for the kinds that occupy a single named slot.
    pub const fn is_named_slot(self) -> bool {
        matches!(self, Self::Required | Self::WithDefault)
    }
}

/// One declared parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    name: String,
    kind: ParameterKind,
    default: Option<Value>,
}

impl Parameter {
    /// The parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parameter kind.
    pub const fn kind(&self) -> ParameterKind {
        self.kind
    }

    /// The declared default, present only for [`ParameterKind::WithDefault`].
    pub const fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Ordered parameter descriptors of a function.
///
/// Parameters are declared in call order with the builder methods. The usual
/// ordering applies: required parameters, then parameters with defaults, then
/// at most one variadic-positional and one variadic-keyword parameter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Signature {
    parameters: Vec<Parameter>,
}

impl Signature {
    /// Creates an empty signature.
    pub const fn new() -> Self {
        Self {
            parameters: Vec::new(),
        }
    }

    fn push(mut self, name: impl Into<String>, kind: ParameterKind, default: Option<Value>) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            kind,
            default,
        });
        self
    }

    /// Declares a required parameter.
    #[must_use]
    pub fn required(self, name: impl Into<String>) -> Self {
        self.push(name, ParameterKind::Required, None)
    }

    /// Declares a parameter with a default value.
    #[must_use]
    pub fn with_default(self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.push(name, ParameterKind::WithDefault, Some(default.into()))
    }

    /// Declares the variadic-positional parameter.
    #[must_use]
    pub fn variadic_positional(self, name: impl Into<String>) -> Self {
        self.push(name, ParameterKind::VariadicPositional, None)
    }

    /// Declares the variadic-keyword parameter.
    #[must_use]
    pub fn variadic_keyword(self, name: impl Into<String>) -> Self {
        self.push(name, ParameterKind::VariadicKeyword, None)
    }

    /// Checks the declaration order, reporting the first misplaced parameter.
    ///
    /// Required parameters come before parameters with defaults, named
    /// parameters before the variadic-positional one, and nothing follows the
    /// variadic-keyword parameter. Names must be unique.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSignature`] naming `callable`.
    pub fn check(&self, callable: &str) -> Result<()> {
        let mut seen_default = false;
        let mut seen_rest = false;
        let mut seen_extra = false;
        for (index, parameter) in self.parameters.iter().enumerate() {
            let problem = match parameter.kind {
                _ if seen_extra => Some("no parameter may follow the variadic-keyword parameter"),
                _ if self.parameters[..index]
                    .iter()
                    .any(|earlier| earlier.name == parameter.name) =>
                {
                    Some("parameter names must be unique")
                }
                ParameterKind::Required | ParameterKind::WithDefault if seen_rest => {
                    Some("named parameters must precede the variadic-positional parameter")
                }
                ParameterKind::Required if seen_default => {
                    Some("a required parameter cannot follow a parameter with a default")
                }
                ParameterKind::VariadicPositional if seen_rest => {
                    Some("only one variadic-positional parameter is allowed")
                }
                _ => None,
            };
            if let Some(problem) = problem {
                return Err(Error::InvalidSignature {
                    callable: callable.to_string(),
                    parameter: parameter.name.clone(),
                    problem,
                });
            }
            match parameter.kind {
                ParameterKind::Required => {}
                ParameterKind::WithDefault => seen_default = true,
                ParameterKind::VariadicPositional => seen_rest = true,
                ParameterKind::VariadicKeyword => seen_extra = true,
            }
        }
        Ok(())
    }

    /// The declared parameters in order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Index of the required or default parameter called `name`.
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.parameters
            .iter()
            .position(|parameter| parameter.kind.is_named_slot() && parameter.name == name)
    }

    /// Returns `true` when a variadic-positional parameter is declared.
    pub fn has_variadic_positional(&self) -> bool {
        self.parameters
            .iter()
            .any(|parameter| parameter.kind == ParameterKind::VariadicPositional)
    }

    /// Returns `true` when a variadic-keyword parameter is declared.
    pub fn has_variadic_keyword(&self) -> bool {
        self.parameters
            .iter()
            .any(|parameter| parameter.kind == ParameterKind::VariadicKeyword)
    }

    /// Number of parameters that can be filled positionally one by one.
    pub fn positional_capacity(&self) -> usize {
        self.parameters
            .iter()
            .filter(|parameter| parameter.kind.is_named_slot())
            .count()
    }
}

// =============================================================================
// Arguments and Frame
// =============================================================================

/// Fully resolved call-site arguments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments {
    positional: Vec<Value>,
    keywords: Vec<(String, Value)>,
}

impl Arguments {
    /// Creates an empty argument list.
    pub const fn new() -> Self {
        Self {
            positional: Vec::new(),
            keywords: Vec::new(),
        }
    }

    /// Creates an argument list from positional values only.
    pub const fn positional(values: Vec<Value>) -> Self {
        Self {
            positional: values,
            keywords: Vec::new(),
        }
    }

    /// Appends a positional value.
    #[must_use]
    pub fn with_positional(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Appends a keyword value.
    #[must_use]
    pub fn with_keyword(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keywords.push((name.into(), value.into()));
        self
    }

    /// The positional values.
    pub fn positional_values(&self) -> &[Value] {
        &self.positional
    }

    /// The keyword values in call order.
    pub fn keyword_values(&self) -> &[(String, Value)] {
        &self.keywords
    }

    /// Splits into positional and keyword parts.
    pub fn into_parts(self) -> (Vec<Value>, Vec<(String, Value)>) {
        (self.positional, self.keywords)
    }
}

/// Arguments matched against a signature, as seen by a function body.
///
/// Indexing by an undeclared name yields [`Value::Nil`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    named: Vec<(String, Value)>,
    rest: Vec<Value>,
    extra: BTreeMap<String, Value>,
}

static NIL: Value = Value::Nil;

impl Frame {
    /// Looks up a required or default parameter.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.named
            .iter()
            .find_map(|(parameter, value)| (parameter == name).then_some(value))
    }

    /// Moves a parameter's value out, leaving [`Value::Nil`] behind.
    pub fn take(&mut self, name: &str) -> Value {
        self.named
            .iter_mut()
            .find(|(parameter, _)| parameter == name)
            .map_or(Value::Nil, |(_, value)| std::mem::take(value))
    }

    /// Values collected by the variadic-positional parameter.
    pub fn rest(&self) -> &[Value] {
        &self.rest
    }

    /// Entries collected by the variadic-keyword parameter.
    pub const fn extra(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }

    /// Moves the variadic-positional values out.
    pub fn take_rest(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.rest)
    }

    /// Moves the variadic-keyword entries out.
    pub fn take_extra(&mut self) -> BTreeMap<String, Value> {
        std::mem::take(&mut self.extra)
    }

    /// Named values in declaration order.
    pub fn named(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.named.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl Index<&str> for Frame {
    type Output = Value;

    fn index(&self, name: &str) -> &Value {
        self.get(name).unwrap_or(&NIL)
    }
}

// =============================================================================
// Function
// =============================================================================

type Body = dyn Fn(Frame) -> Result<Value> + Send + Sync;

struct FunctionInner {
    name: String,
    signature: Signature,
    body: Box<Body>,
}

/// A named native callable with an explicit [`Signature`].
///
/// Cloning is cheap; clones share the same body. Two functions are equal
/// only when they are clones of the same registration.
#[derive(Clone)]
pub struct Function {
    inner: Arc<FunctionInner>,
}

impl Function {
    /// Registers a function.
    pub fn new<F>(name: impl Into<String>, signature: Signature, body: F) -> Self
    where
        F: Fn(Frame) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(FunctionInner {
                name: name.into(),
                signature,
                body: Box::new(body),
            }),
        }
    }

    /// Registers a one-parameter function (parameter name `value`).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pipewright::function::Function;
    /// use pipewright::Value;
    ///
    /// let negate = Function::unary("negate", |value| {
    ///     Ok(Value::Bool(!value.is_truthy()))
    /// });
    /// assert_eq!(negate.call1(Value::Int(0)).unwrap(), Value::Bool(true));
    /// ```
    pub fn unary<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new(name, Signature::new().required("value"), move |mut frame| {
            body(frame.take("value"))
        })
    }

    /// Registers a two-parameter function (parameter names `left`, `right`).
    pub fn binary<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Value, Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new(
            name,
            Signature::new().required("left").required("right"),
            move |mut frame| {
                let left = frame.take("left");
                let right = frame.take("right");
                body(left, right)
            },
        )
    }

    /// The registered name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The declared signature.
    pub fn signature(&self) -> &Signature {
        &self.inner.signature
    }

    /// Calls the function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSignature`] when the signature is declared out
    /// of order, a signature-mismatch error ([`Error::MissingArgument`],
    /// [`Error::DuplicateArgument`], [`Error::TooManyPositional`],
    /// [`Error::UnexpectedKeyword`]) when the arguments do not fit, or
    /// whatever the body returns.
    pub fn call(&self, arguments: Arguments) -> Result<Value> {
        let frame = self.match_arguments(arguments)?;
        tracing::trace!(function = %self.inner.name, "calling native function");
        (self.inner.body)(frame)
    }

    /// Calls the function with a single positional argument.
    ///
    /// # Errors
    ///
    /// See [`Function::call`].
    pub fn call1(&self, argument: Value) -> Result<Value> {
        self.call(Arguments::positional(vec![argument]))
    }

    fn match_arguments(&self, arguments: Arguments) -> Result<Frame> {
        self.inner.signature.check(&self.inner.name)?;
        let parameters = self.inner.signature.parameters();
        let (positional, keywords) = arguments.into_parts();

        let mut slots: Vec<Option<Value>> = vec![None; parameters.len()];
        let mut frame = Frame::default();

        let mut named_slots = parameters
            .iter()
            .enumerate()
            .filter(|(_, parameter)| parameter.kind.is_named_slot())
            .map(|(index, _)| index);
        for value in positional {
            if let Some(index) = named_slots.next() {
                slots[index] = Some(value);
            } else if self.inner.signature.has_variadic_positional() {
                frame.rest.push(value);
            } else {
                return Err(Error::TooManyPositional {
                    callable: self.inner.name.clone(),
                    accepted: self.inner.signature.positional_capacity(),
                });
            }
        }

        for (keyword, value) in keywords {
            match self.inner.signature.slot_of(&keyword) {
                Some(index) if slots[index].is_some() => {
                    return Err(Error::DuplicateArgument {
                        callable: self.inner.name.clone(),
                        parameter: keyword,
                    });
                }
                Some(index) => slots[index] = Some(value),
                None if self.inner.signature.has_variadic_keyword() => {
                    frame.extra.insert(keyword, value);
                }
                None => {
                    return Err(Error::UnexpectedKeyword {
                        callable: self.inner.name.clone(),
                        keyword,
                    });
                }
            }
        }

        for (parameter, slot) in parameters.iter().zip(slots) {
            if !parameter.kind.is_named_slot() {
                continue;
            }
            let value = match (slot, &parameter.default) {
                (Some(value), _) => value,
                (None, Some(default)) => default.clone(),
                (None, None) => {
                    return Err(Error::MissingArgument {
                        callable: self.inner.name.clone(),
                        parameter: parameter.name.clone(),
                    });
                }
            };
            frame.named.push((parameter.name.clone(), value));
        }

        Ok(frame)
    }
}

impl Debug for Function {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Function")
            .field("name", &self.inner.name)
            .field("signature", &self.inner.signature)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn triple() -> Function {
        Function::new(
            "triple",
            Signature::new().required("x").required("y").with_default("z", 0),
            |frame| {
                Ok(Value::Tuple(vec![
                    frame["x"].clone(),
                    frame["y"].clone(),
                    frame["z"].clone(),
                ]))
            },
        )
    }

    #[rstest]
    fn test_positional_and_keyword_matching() {
        let arguments = Arguments::new().with_positional(1).with_keyword("y", 2);
        let result = triple().call(arguments).unwrap();
        assert_eq!(result, Value::from((1, 2, 0)));
    }

    #[rstest]
    fn test_missing_required_argument() {
        let error = triple().call(Arguments::positional(vec![Value::Int(1)])).unwrap_err();
        assert!(matches!(error, Error::MissingArgument { ref parameter, .. } if parameter == "y"));
    }

    #[rstest]
    fn test_duplicate_argument() {
        let arguments = Arguments::new().with_positional(1).with_keyword("x", 2);
        let error = triple().call(arguments).unwrap_err();
        assert!(matches!(error, Error::DuplicateArgument { ref parameter, .. } if parameter == "x"));
    }

    #[rstest]
    fn test_too_many_positional_without_variadic() {
        let arguments = Arguments::positional(vec![1.into(), 2.into(), 3.into(), 4.into()]);
        let error = triple().call(arguments).unwrap_err();
        assert!(matches!(error, Error::TooManyPositional { accepted: 3, .. }));
    }

    #[rstest]
    fn test_variadic_parameters_collect_surplus() {
        let gather = Function::new(
            "gather",
            Signature::new()
                .required("first")
                .variadic_positional("args")
                .variadic_keyword("kwargs"),
            |frame| {
                let keys: Value = frame.extra().keys().map(String::as_str).collect();
                Ok(Value::from((Value::List(frame.rest().to_vec()), keys)))
            },
        );
        let arguments = Arguments::positional(vec![1.into(), 2.into(), 3.into()])
            .with_keyword("b", 0)
            .with_keyword("a", 0);
        let result = gather.call(arguments).unwrap();
        assert_eq!(result, Value::from((vec![2, 3], vec!["a", "b"])));
    }

    #[rstest]
    fn test_frame_index_of_unknown_name_is_nil() {
        let frame = Frame::default();
        assert_eq!(frame["missing"], Value::Nil);
    }

    #[rstest]
    fn test_function_equality_is_identity() {
        let first = Function::unary("id", Ok);
        let second = Function::unary("id", Ok);
        assert_eq!(first, first.clone());
        assert_ne!(first, second);
    }

    #[rstest]
    fn test_signature_queries() {
        let signature = Signature::new()
            .required("a")
            .with_default("b", 1)
            .variadic_positional("args");
        assert_eq!(signature.slot_of("b"), Some(1));
        assert_eq!(signature.slot_of("args"), None);
        assert!(signature.has_variadic_positional());
        assert!(!signature.has_variadic_keyword());
        assert_eq!(signature.positional_capacity(), 2);
    }

    #[rstest]
    #[case(
        Signature::new().required("a").variadic_positional("rest").with_default("key", 5),
        "key"
    )]
    #[case(Signature::new().with_default("a", 1).required("b"), "b")]
    #[case(Signature::new().variadic_keyword("extra").required("a"), "a")]
    #[case(Signature::new().variadic_positional("one").variadic_positional("two"), "two")]
    #[case(Signature::new().required("a").with_default("a", 1), "a")]
    fn test_signature_out_of_order_is_rejected(
        #[case] signature: Signature,
        #[case] misplaced: &str,
    ) {
        let error = signature.check("misplaced").unwrap_err();
        assert!(matches!(error, Error::InvalidSignature { ref parameter, .. } if parameter == misplaced));

        let function = Function::new("misplaced", signature, |_| Ok(Value::Nil));
        let error = function
            .call(Arguments::positional(vec![1.into(), 2.into(), 3.into()]))
            .unwrap_err();
        assert!(matches!(error, Error::InvalidSignature { ref callable, .. } if callable == "misplaced"));
    }

    #[rstest]
    fn test_conventional_signature_passes_the_order_check() {
        let signature = Signature::new()
            .required("a")
            .with_default("b", 1)
            .variadic_positional("args")
            .variadic_keyword("kwargs");
        assert!(signature.check("ordered").is_ok());
    }
}
