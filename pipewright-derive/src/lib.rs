//! Attribute macro for declaring pipewright functions.
//!
//! A registered pipewright function carries an explicit signature so the
//! binder can track which parameters are still unbound. Writing the
//! signature by hand is repetitive; [`macro@callable`] derives it from an
//! ordinary Rust `fn` whose parameters are all `Value`s.
//!
//! # Example
//!
//! ```rust,ignore
//! use pipewright::{callable, Value};
//!
//! #[callable]
//! fn scale(value: Value, #[default(2)] factor: Value) -> pipewright::Result<Value> {
//!     pipewright::hooks::implementations::mul(&value, &factor)
//! }
//!
//! let function = scale();
//! assert_eq!(function.call1(Value::Int(4)).unwrap(), Value::Int(8));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod callable;

use proc_macro::TokenStream;

/// Turns a `fn` over `Value`s into a constructor of a registered function.
///
/// The annotated function keeps its name and visibility but takes no
/// arguments and returns `pipewright::function::Function`. The original body
/// becomes the function body.
///
/// # Parameters
///
/// Every parameter must be a plain identifier. Its kind is chosen by an
/// optional attribute:
///
/// | Attribute | Kind | Rust type |
/// |---|---|---|
/// | none | required | `Value` |
/// | `#[default(expr)]` | with default | `Value` |
/// | `#[rest]` | variadic positional | `Vec<Value>` |
/// | `#[extra]` | variadic keyword | `BTreeMap<String, Value>` |
///
/// # Options
///
/// `#[callable(name = "other")]` registers the function under another name.
///
/// # Generated Code
///
/// ```rust,ignore
/// fn scale() -> ::pipewright::function::Function {
///     fn body(value: Value, factor: Value) -> pipewright::Result<Value> { ... }
///     ::pipewright::function::Function::new(
///         "scale",
///         ::pipewright::function::Signature::new()
///             .required("value")
///             .with_default("factor", 2),
///         |mut frame| body(frame.take("value"), frame.take("factor")),
///     )
/// }
/// ```
#[proc_macro_attribute]
pub fn callable(attribute: TokenStream, item: TokenStream) -> TokenStream {
    callable::callable_impl(attribute, item)
}
