//! # pipewright
//!
//! Lazily evaluated pipelines, incremental currying and placeholder
//! expressions over a dynamic [`Value`] model.
//!
//! ## Overview
//!
//! - **Binder** ([`binder`]): binds arguments to a registered [`Function`]
//!   one call at a time and tracks which parameters are still unbound.
//! - **Recorder** ([`recorder`]): records operations applied to the
//!   placeholder [`X`] and replays them against a value later.
//! - **Chain** ([`chain`]): threads a value through an ordered list of steps,
//!   built with `P | step | step` and evaluated with `| END`.
//! - **Builtins** ([`builtins`]): ready-made functions such as `map`,
//!   `filter` and `sorted`.
//!
//! ## Feature Flags
//!
//! - `io`: record sinks and sources, file adapters, `tee` and `redirect`
//! - `process`: shell commands as chain stages
//! - `derive`: the [`macro@callable`] attribute
//! - `serde`: `Serialize`/`Deserialize` for [`Value`]
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use pipewright::prelude::*;
//!
//! let add = Function::new(
//!     "add",
//!     Signature::new().required("x").required("y"),
//!     |frame| pipewright::hooks::implementations::add(&frame["x"], &frame["y"]),
//! );
//! let add_ten = Binder::create(add, args![; y = 10]).unwrap();
//!
//! let result = Value::from(5) | P | add_ten | (X * 2) | END;
//! assert_eq!(result.unwrap(), Value::Int(30));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_closure_for_method_calls)]

extern crate self as pipewright;

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use pipewright::prelude::*;
/// ```
pub mod prelude {
    pub use crate::args;
    pub use crate::binder::{Argument, ArgumentList, Binder, BindingMode};
    pub use crate::chain::{Chain, END, P, Stage, Step};
    pub use crate::error::{Error, Result};
    pub use crate::function::{Arguments, Frame, Function, Signature};
    pub use crate::hooks::Operation;
    pub use crate::record;
    pub use crate::recorder::{Recorder, Symbolic, X};
    pub use crate::value::Value;

    #[cfg(feature = "io")]
    pub use crate::io::{MemorySink, Sink, Source};

    #[cfg(feature = "process")]
    pub use crate::process::Command;

    #[cfg(feature = "derive")]
    pub use pipewright_derive::callable;
}

pub mod binder;
pub mod builtins;
pub mod chain;
pub mod error;
pub mod function;
pub mod hooks;
pub mod recorder;
pub mod value;

#[cfg(feature = "io")]
pub mod io;

#[cfg(feature = "process")]
pub mod process;

pub use binder::Binder;
pub use chain::{Chain, END, P, Step};
pub use error::{Error, Result};
pub use function::Function;
pub use recorder::{Recorder, Symbolic, X};
pub use value::Value;

#[cfg(feature = "derive")]
pub use pipewright_derive::callable;
