//! The dynamic value model threaded through chains, binders and recorders.
//!
//! Every step of a pipeline consumes and produces a [`Value`]. Values are
//! immutable: operations that "modify" a container (such as `setitem`)
//! return a new container instead.
//!
//! Maps double as attribute-bearing records: `attr("a")` on a map reads the
//! entry stored under `"a"`.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use crate::binder::{ArgumentList, Binder};
use crate::error::{Error, Result};
use crate::function::{Arguments, Function};

/// A dynamically typed value.
///
/// # Examples
///
/// ```rust
/// use pipewright::Value;
///
/// let value = Value::from(vec![1, 2, 3]);
/// assert_eq!(value.type_name(), "list");
/// assert_eq!(value.to_string(), "[1, 2, 3]");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// The absent value.
    #[default]
    Nil,
    /// A boolean. Participates in integer arithmetic as `0`/`1`.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A double precision float.
    Float(f64),
    /// A string.
    Str(String),
    /// A growable sequence.
    List(Vec<Value>),
    /// A fixed sequence (produced by `divmod`, multi-value returns, ...).
    Tuple(Vec<Value>),
    /// A string-keyed map, also used as a record for attribute access.
    Map(BTreeMap<String, Value>),
    /// A registered native function.
    #[cfg_attr(feature = "serde", serde(skip))]
    Function(Function),
    /// A partially bound function.
    #[cfg_attr(feature = "serde", serde(skip))]
    Curried(Box<Binder>),
}

impl Value {
    /// Returns the type name used in error messages.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Map(_) => "map",
            Self::Function(_) => "function",
            Self::Curried(_) => "curried",
        }
    }

    /// Returns `true` for functions and curried functions.
    pub const fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_) | Self::Curried(_))
    }

    /// Truthiness: `nil`, `false`, zero and empty containers are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Nil => false,
            Self::Bool(flag) => *flag,
            Self::Int(integer) => *integer != 0,
            Self::Float(float) => *float != 0.0,
            Self::Str(string) => !string.is_empty(),
            Self::List(items) | Self::Tuple(items) => !items.is_empty(),
            Self::Map(entries) => !entries.is_empty(),
            Self::Function(_) | Self::Curried(_) => true,
        }
    }

    /// Returns the integer payload of `Int` (and `Bool` as `0`/`1`).
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(integer) => Some(*integer),
            Self::Bool(flag) => Some(*flag as i64),
            _ => None,
        }
    }

    /// Returns the numeric payload widened to `f64`.
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(float) => Some(*float),
            Self::Int(integer) => Some(*integer as f64),
            Self::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Returns the string payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(string) => Some(string),
            _ => None,
        }
    }

    /// Returns the items of a list or tuple.
    pub fn as_slice(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) | Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Materializes an iterable value.
    ///
    /// Lists and tuples yield their items, strings their characters and maps
    /// their keys.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperand`] for non-iterable values.
    pub fn to_sequence(&self) -> Result<Vec<Self>> {
        match self {
            Self::List(items) | Self::Tuple(items) => Ok(items.clone()),
            Self::Str(string) => Ok(string.chars().map(|c| Self::Str(c.to_string())).collect()),
            Self::Map(entries) => Ok(entries.keys().cloned().map(Self::Str).collect()),
            other => Err(Error::UnsupportedOperand {
                operation: "iter",
                operands: other.type_name().to_string(),
            }),
        }
    }

    /// Calls a callable value with already resolved arguments.
    ///
    /// A curried function that is still partial after absorbing the
    /// arguments is returned as a new [`Value::Curried`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotCallable`] for non-callable values, or whatever
    /// the callee raises.
    pub fn call(&self, arguments: Arguments) -> Result<Self> {
        match self {
            Self::Function(function) => function.call(arguments),
            Self::Curried(binder) => binder.call(ArgumentList::from(arguments)),
            other => Err(Error::NotCallable {
                type_name: other.type_name(),
            }),
        }
    }

    /// Calls a callable value with a single positional argument.
    ///
    /// # Errors
    ///
    /// See [`Value::call`].
    pub fn call1(&self, argument: Self) -> Result<Self> {
        self.call(Arguments::positional(vec![argument]))
    }
}

impl Display for Value {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        fn write_items(
            formatter: &mut Formatter<'_>,
            items: &[Value],
            open: &str,
            close: &str,
        ) -> fmt::Result {
            formatter.write_str(open)?;
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    formatter.write_str(", ")?;
                }
                write!(formatter, "{item}")?;
            }
            if close == ")" && items.len() == 1 {
                formatter.write_str(",")?;
            }
            formatter.write_str(close)
        }

        match self {
            Self::Nil => formatter.write_str("nil"),
            Self::Bool(flag) => write!(formatter, "{flag}"),
            Self::Int(integer) => write!(formatter, "{integer}"),
            Self::Float(float) if float.is_finite() && float.fract() == 0.0 => {
                write!(formatter, "{float:.1}")
            }
            Self::Float(float) => write!(formatter, "{float}"),
            Self::Str(string) => write!(formatter, "{string:?}"),
            Self::List(items) => write_items(formatter, items, "[", "]"),
            Self::Tuple(items) => write_items(formatter, items, "(", ")"),
            Self::Map(entries) => {
                formatter.write_str("{")?;
                for (index, (key, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        formatter.write_str(", ")?;
                    }
                    write!(formatter, "{key:?}: {value}")?;
                }
                formatter.write_str("}")
            }
            Self::Function(function) => write!(formatter, "<function {}>", function.name()),
            Self::Curried(binder) => write!(formatter, "{binder}"),
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Nil
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

macro_rules! impl_from_integer {
    ($($integer:ty),*) => {
        $(
            impl From<$integer> for Value {
                fn from(integer: $integer) -> Self {
                    Self::Int(i64::from(integer))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<usize> for Value {
    fn from(integer: usize) -> Self {
        Self::Int(i64::try_from(integer).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(float: f64) -> Self {
        Self::Float(float)
    }
}

impl From<f32> for Value {
    fn from(float: f32) -> Self {
        Self::Float(f64::from(float))
    }
}

impl From<&str> for Value {
    fn from(string: &str) -> Self {
        Self::Str(string.to_string())
    }
}

impl From<String> for Value {
    fn from(string: String) -> Self {
        Self::Str(string)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Self>> for Value {
    fn from(entries: BTreeMap<String, Self>) -> Self {
        Self::Map(entries)
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Value {
    fn from((first, second): (A, B)) -> Self {
        Self::Tuple(vec![first.into(), second.into()])
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>> From<(A, B, C)> for Value {
    fn from((first, second, third): (A, B, C)) -> Self {
        Self::Tuple(vec![first.into(), second.into(), third.into()])
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Self::Function(function)
    }
}

impl From<Binder> for Value {
    fn from(binder: Binder) -> Self {
        Self::Curried(Box::new(binder))
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iterator: I) -> Self {
        Self::List(iterator.into_iter().map(Into::into).collect())
    }
}

/// Builds a [`Value::Map`] from `key => value` pairs.
///
/// # Examples
///
/// ```rust
/// use pipewright::{record, Value};
///
/// let point = record! { "x" => 1, "y" => 2 };
/// assert_eq!(point.to_string(), r#"{"x": 1, "y": 2}"#);
/// ```
#[macro_export]
macro_rules! record {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut entries = ::std::collections::BTreeMap::<::std::string::String, $crate::Value>::new();
        $(
            entries.insert(::std::string::String::from($key), $crate::Value::from($value));
        )*
        $crate::Value::Map(entries)
    }};
}
