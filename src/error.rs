//! Error types shared by every layer of the crate.
//!
//! All failures are local and synchronous: they are raised where they occur
//! and propagate to the caller with `?`. Nothing is retried internally.

/// Convenient alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the binder, the recorder, the chain engine and the
/// external adapters.
///
/// # Examples
///
/// ```rust
/// use pipewright::Error;
///
/// let error = Error::EmptyChain;
/// assert_eq!(error.to_string(), "cannot evaluate a chain without steps");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The target of a binder is not invocable.
    #[error("cannot curry a value of type `{type_name}`: it is not callable")]
    InvalidCallable {
        /// Type name of the rejected value.
        type_name: &'static str,
    },

    /// `invoke` was attempted while required parameters are still unbound.
    #[error("`{callable}` is not fully bound, missing: {}", .missing.join(", "))]
    NotFullyBound {
        /// Name of the curried function.
        callable: String,
        /// Names of the unbound required parameters, in declaration order.
        missing: Vec<String>,
    },

    /// A keyword matched no declared parameter and no variadic-keyword slot exists.
    #[error("`{callable}` got an unexpected keyword argument `{keyword}`")]
    UnexpectedKeyword {
        /// Name of the callee.
        callable: String,
        /// The offending keyword.
        keyword: String,
    },

    /// More positional values were supplied than the signature can hold.
    #[error("`{callable}` takes {accepted} positional argument(s) but more were given")]
    TooManyPositional {
        /// Name of the callee.
        callable: String,
        /// Number of positional parameters the signature declares.
        accepted: usize,
    },

    /// A required parameter received no value at call time.
    #[error("`{callable}` is missing required argument `{parameter}`")]
    MissingArgument {
        /// Name of the callee.
        callable: String,
        /// The missing parameter.
        parameter: String,
    },

    /// A parameter received both a positional and a keyword value.
    #[error("`{callable}` got multiple values for argument `{parameter}`")]
    DuplicateArgument {
        /// Name of the callee.
        callable: String,
        /// The parameter bound twice.
        parameter: String,
    },

    /// A signature declares its parameters out of order.
    #[error("invalid signature for `{callable}` at parameter `{parameter}`: {problem}")]
    InvalidSignature {
        /// Name of the function.
        callable: String,
        /// The first misplaced parameter.
        parameter: String,
        /// Which ordering rule it breaks.
        problem: &'static str,
    },

    /// A chain step is neither a function, a binder, a recorder nor a chain.
    #[error("a value of type `{type_name}` cannot be used as a chain step")]
    NotCallable {
        /// Type name of the rejected value.
        type_name: &'static str,
    },

    /// `evaluate` was called on a chain with zero steps.
    #[error("cannot evaluate a chain without steps")]
    EmptyChain,

    /// A symbolic operation has no implementation for the given operands.
    #[error("unsupported operand(s) for `{operation}`: {operands}")]
    UnsupportedOperand {
        /// Hook name of the operation.
        operation: &'static str,
        /// Type names of the operands, comma separated.
        operands: String,
    },

    /// A binder still holds placeholder operands at invocation time.
    #[error("`{callable}` still holds placeholder arguments; resolve it against a value first")]
    UnresolvedPlaceholder {
        /// Name of the curried function.
        callable: String,
    },

    /// Division or modulo by zero.
    #[error("division by zero in `{operation}`")]
    ZeroDivision {
        /// Hook name of the operation.
        operation: &'static str,
    },

    /// Sequence index outside the sequence.
    #[error("index {index} out of range for length {length}")]
    IndexOutOfRange {
        /// Requested index (possibly negative).
        index: i64,
        /// Length of the indexed sequence.
        length: usize,
    },

    /// Map lookup of an absent key.
    #[error("key `{key}` not found")]
    KeyNotFound {
        /// The absent key.
        key: String,
    },

    /// Attribute access on a value without that attribute.
    #[error("`{type_name}` has no attribute `{attribute}`")]
    AttributeNotFound {
        /// Type name of the receiver.
        type_name: &'static str,
        /// The requested attribute.
        attribute: String,
    },

    /// Integer arithmetic left the `i64` range.
    #[error("integer overflow in `{operation}`")]
    Overflow {
        /// Hook name of the operation.
        operation: &'static str,
    },

    /// A native function reported a failure of its own.
    #[error("`{callable}` failed: {message}")]
    Failed {
        /// Name of the failing function.
        callable: String,
        /// Human readable reason.
        message: String,
    },

    /// No registered file type matches the requested path.
    #[error("no registered file type matches `{path}`")]
    UnknownFileType {
        /// The rejected path.
        path: String,
    },

    /// Underlying I/O failure in an external adapter.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A process step received a value it cannot feed to stdin.
    #[error("process input must be nil, a string or a list of strings, got `{type_name}`")]
    InvalidProcessInput {
        /// Type name of the rejected value.
        type_name: &'static str,
    },

    /// An external process exited unsuccessfully.
    #[error("command `{command}` exited with {status}")]
    ProcessFailed {
        /// The shell command line.
        command: String,
        /// Rendered exit status.
        status: String,
    },
}

impl Error {
    /// Builds a [`Error::Failed`] for a native function body.
    pub fn failed(callable: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            callable: callable.into(),
            message: message.into(),
        }
    }

    /// Returns `true` for errors describing a call whose shape does not fit
    /// the callee's signature.
    ///
    /// [`BindingMode::Legacy`](crate::binder::BindingMode::Legacy) treats these
    /// as "more arguments are needed".
    pub const fn is_signature_mismatch(&self) -> bool {
        matches!(
            self,
            Self::MissingArgument { .. }
                | Self::DuplicateArgument { .. }
                | Self::TooManyPositional { .. }
                | Self::UnexpectedKeyword { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_not_fully_bound_lists_missing_parameters() {
        let error = Error::NotFullyBound {
            callable: "f".to_string(),
            missing: vec!["y".to_string(), "z".to_string()],
        };
        assert_eq!(error.to_string(), "`f` is not fully bound, missing: y, z");
    }

    #[rstest]
    fn test_unsupported_operand_display() {
        let error = Error::UnsupportedOperand {
            operation: "add",
            operands: "int, str".to_string(),
        };
        assert_eq!(error.to_string(), "unsupported operand(s) for `add`: int, str");
    }

    #[rstest]
    #[case(Error::MissingArgument { callable: "f".into(), parameter: "x".into() }, true)]
    #[case(Error::TooManyPositional { callable: "f".into(), accepted: 1 }, true)]
    #[case(Error::UnexpectedKeyword { callable: "f".into(), keyword: "k".into() }, true)]
    #[case(Error::EmptyChain, false)]
    #[case(Error::ZeroDivision { operation: "truediv" }, false)]
    fn test_signature_mismatch_classification(#[case] error: Error, #[case] expected: bool) {
        assert_eq!(error.is_signature_mismatch(), expected);
    }

    #[rstest]
    fn test_io_error_is_transparent() {
        let error = Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(error.to_string(), "gone");
    }
}
