//! The catalog of operator hooks a symbolic recorder can intercept.
//!
//! Hooks are grouped into [`Category`] values addressed by path-like keys
//! (`"numeric/left"`, `"container"`, ...). Each [`Operation`] carries a
//! hook name and a canonical [`Implementation`] over [`Value`]s. Numeric
//! binary operations come in three forms: the left form (`add`), the
//! mirrored form used when the left operand is a literal (`radd`) and the
//! in-place form (`iadd`).
//!
//! # Examples
//!
//! ```rust
//! use pipewright::hooks::{Category, HookTable, Operation};
//! use pipewright::Value;
//!
//! assert_eq!(HookTable::lookup(Category::Compare), ["lt", "le", "eq", "ne", "gt", "ge"]);
//!
//! let radd = HookTable::canonical_impl("radd").unwrap();
//! assert!(radd.is_reversed());
//! assert_eq!(
//!     radd.call(&[Value::from("a"), Value::from("b")]).unwrap(),
//!     Value::from("ba"),
//! );
//! assert_eq!(Operation::from_name("floordiv"), Some(Operation::FloorDiv));
//! ```

pub mod implementations;

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::value::Value;

// =============================================================================
// Category
// =============================================================================

/// A group of hooks addressed by a path-like key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// `basic/compare`: rich comparisons.
    Compare,
    /// `basic/format`: `repr` and `str`.
    Format,
    /// `basic/other`: truthiness.
    Truth,
    /// `attribute_access/attr`: attribute reads.
    Attribute,
    /// `container`: length, item access, membership and iteration.
    Container,
    /// `numeric/left`: binary numeric operators with the receiver on the left.
    NumericLeft,
    /// `numeric/right`: mirrored binary numeric operators.
    NumericRight,
    /// `numeric/assign`: in-place binary numeric operators.
    NumericAssign,
    /// `numeric/other`: unary numeric operators and rounding.
    NumericUnary,
}

impl Category {
    /// Every category in catalog order.
    pub const ALL: [Self; 9] = [
        Self::Compare,
        Self::Format,
        Self::Truth,
        Self::Attribute,
        Self::Container,
        Self::NumericLeft,
        Self::NumericRight,
        Self::NumericAssign,
        Self::NumericUnary,
    ];

    /// The path-like key of the category.
    pub const fn path(self) -> &'static str {
        match self {
            Self::Compare => "basic/compare",
            Self::Format => "basic/format",
            Self::Truth => "basic/other",
            Self::Attribute => "attribute_access/attr",
            Self::Container => "container",
            Self::NumericLeft => "numeric/left",
            Self::NumericRight => "numeric/right",
            Self::NumericAssign => "numeric/assign",
            Self::NumericUnary => "numeric/other",
        }
    }

    /// Resolves a path-like key, with or without a leading `/`.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.strip_prefix('/').unwrap_or(path);
        Self::ALL.into_iter().find(|category| category.path() == path)
    }

    /// Every category whose path lies under `prefix` (`"numeric"` selects
    /// the four numeric groups).
    pub fn under(prefix: &str) -> Vec<Self> {
        let prefix = prefix.trim_end_matches('/');
        Self::ALL
            .into_iter()
            .filter(|category| {
                let path = category.path();
                path == prefix
                    || path
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .collect()
    }
}

// =============================================================================
// Implementation
// =============================================================================

type UnaryFn = fn(&Value) -> Result<Value>;
type BinaryFn = fn(&Value, &Value) -> Result<Value>;
type TernaryFn = fn(&Value, &Value, &Value) -> Result<Value>;

#[derive(Clone, Copy)]
enum Arity {
    Unary(UnaryFn),
    Binary(BinaryFn),
    Reversed(BinaryFn),
    Ternary(TernaryFn),
}

/// The canonical function computing a hook over concrete values.
///
/// Mirrored hooks swap their two operands before delegating to the left
/// form, so `radd(a, b)` computes `b + a`.
#[derive(Clone, Copy)]
pub struct Implementation {
    name: &'static str,
    arity: Arity,
}

impl Implementation {
    const fn new(name: &'static str, arity: Arity) -> Self {
        Self { name, arity }
    }

    /// Number of operands the implementation consumes.
    pub const fn arity(&self) -> usize {
        match self.arity {
            Arity::Unary(_) => 1,
            Arity::Binary(_) | Arity::Reversed(_) => 2,
            Arity::Ternary(_) => 3,
        }
    }

    /// Returns `true` for mirrored numeric hooks.
    pub const fn is_reversed(&self) -> bool {
        matches!(self.arity, Arity::Reversed(_))
    }

    /// Applies the implementation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperand`] when the operand count does not
    /// match the arity or the operand types are not supported.
    pub fn call(&self, operands: &[Value]) -> Result<Value> {
        match (self.arity, operands) {
            (Arity::Unary(function), [operand]) => function(operand),
            (Arity::Binary(function), [left, right]) => function(left, right),
            (Arity::Reversed(function), [left, right]) => function(right, left),
            (Arity::Ternary(function), [first, second, third]) => function(first, second, third),
            _ => Err(Error::UnsupportedOperand {
                operation: self.name,
                operands: operands
                    .iter()
                    .map(Value::type_name)
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}

impl Debug for Implementation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Implementation")
            .field("name", &self.name)
            .field("arity", &self.arity())
            .field("reversed", &self.is_reversed())
            .finish()
    }
}

// =============================================================================
// Operation
// =============================================================================

macro_rules! define_operations {
    (
        numeric {
            $($numeric:ident => $numeric_name:literal => $numeric_impl:path),* $(,)?
        }
        $(
            $category:ident {
                $($variant:ident => $name:literal => $arity:ident($implementation:path)),* $(,)?
            }
        )*
    ) => {
        paste::paste! {
            /// Every interceptable operation.
            #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub enum Operation {
                $(
                    #[doc = concat!("`", $numeric_name, "`")]
                    $numeric,
                )*
                $(
                    #[doc = concat!("`r", $numeric_name, "`, the mirrored form of `", $numeric_name, "`")]
                    [<R $numeric>],
                )*
                $(
                    #[doc = concat!("`i", $numeric_name, "`, the in-place form of `", $numeric_name, "`")]
                    [<I $numeric>],
                )*
                $($(
                    #[doc = concat!("`", $name, "`")]
                    $variant,
                )*)*
            }

            impl Operation {
                /// Every operation in catalog order.
                pub const ALL: &'static [Self] = &[
                    $(Self::$numeric,)*
                    $(Self::[<R $numeric>],)*
                    $(Self::[<I $numeric>],)*
                    $($(Self::$variant,)*)*
                ];

                /// The hook name.
                pub const fn name(self) -> &'static str {
                    match self {
                        $(
                            Self::$numeric => $numeric_name,
                            Self::[<R $numeric>] => concat!("r", $numeric_name),
                            Self::[<I $numeric>] => concat!("i", $numeric_name),
                        )*
                        $($(Self::$variant => $name,)*)*
                    }
                }

                /// The category the hook belongs to.
                pub const fn category(self) -> Category {
                    match self {
                        $(
                            Self::$numeric => Category::NumericLeft,
                            Self::[<R $numeric>] => Category::NumericRight,
                            Self::[<I $numeric>] => Category::NumericAssign,
                        )*
                        $($(Self::$variant => Category::$category,)*)*
                    }
                }

                /// The canonical implementation of the hook.
                pub const fn implementation(self) -> Implementation {
                    match self {
                        $(
                            Self::$numeric | Self::[<I $numeric>] => {
                                Implementation::new(self.name(), Arity::Binary($numeric_impl))
                            }
                            Self::[<R $numeric>] => {
                                Implementation::new(self.name(), Arity::Reversed($numeric_impl))
                            }
                        )*
                        $($(
                            Self::$variant => Implementation::new($name, Arity::$arity($implementation)),
                        )*)*
                    }
                }
            }
        }
    };
}

define_operations! {
    numeric {
        Add => "add" => implementations::add,
        Sub => "sub" => implementations::sub,
        Mul => "mul" => implementations::mul,
        MatMul => "matmul" => implementations::matmul,
        TrueDiv => "truediv" => implementations::truediv,
        FloorDiv => "floordiv" => implementations::floordiv,
        Mod => "mod" => implementations::modulo,
        DivMod => "divmod" => implementations::divmod,
        Pow => "pow" => implementations::pow,
        LShift => "lshift" => implementations::lshift,
        RShift => "rshift" => implementations::rshift,
        And => "and" => implementations::bitand,
        Xor => "xor" => implementations::bitxor,
        Or => "or" => implementations::bitor,
    }
    NumericUnary {
        Neg => "neg" => Unary(implementations::neg),
        Pos => "pos" => Unary(implementations::pos),
        Abs => "abs" => Unary(implementations::abs),
        Invert => "invert" => Unary(implementations::invert),
        Round => "round" => Unary(implementations::round),
        Trunc => "trunc" => Unary(implementations::trunc),
        Floor => "floor" => Unary(implementations::floor),
        Ceil => "ceil" => Unary(implementations::ceil),
    }
    Compare {
        Lt => "lt" => Binary(implementations::lt),
        Le => "le" => Binary(implementations::le),
        Eq => "eq" => Binary(implementations::eq),
        Ne => "ne" => Binary(implementations::ne),
        Gt => "gt" => Binary(implementations::gt),
        Ge => "ge" => Binary(implementations::ge),
    }
    Container {
        Len => "len" => Unary(implementations::len),
        GetItem => "getitem" => Binary(implementations::getitem),
        SetItem => "setitem" => Ternary(implementations::setitem),
        DelItem => "delitem" => Binary(implementations::delitem),
        Contains => "contains" => Binary(implementations::contains),
        Reversed => "reversed" => Unary(implementations::reversed),
        Iter => "iter" => Unary(implementations::iter),
    }
    Attribute {
        GetAttr => "getattr" => Binary(implementations::getattr),
    }
    Format {
        Repr => "repr" => Unary(implementations::repr),
        Str => "str" => Unary(implementations::str),
    }
    Truth {
        Bool => "bool" => Unary(implementations::truth),
    }
}

impl Operation {
    /// Resolves a hook name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|operation| operation.name() == name)
    }

    /// Applies the canonical implementation to `operands`.
    ///
    /// # Errors
    ///
    /// See [`Implementation::call`].
    pub fn apply(self, operands: &[Value]) -> Result<Value> {
        self.implementation().call(operands)
    }
}

// =============================================================================
// HookTable
// =============================================================================

/// A predicate over `(hook name, category)` narrowing a [`HookTable`].
pub type HookFilter = Arc<dyn Fn(&str, Category) -> bool + Send + Sync>;

/// One entry yielded by [`HookTable::iter`].
#[derive(Clone, Copy, Debug)]
pub struct Hook {
    /// The operation.
    pub operation: Operation,
    /// Its hook name.
    pub name: &'static str,
    /// Its category.
    pub category: Category,
    /// Its canonical implementation.
    pub implementation: Implementation,
}

/// A selection of hooks: a set of categories, optionally narrowed by a filter.
///
/// The symbolic recorder installs one such table; every hook it contains can
/// be recorded, everything else is rejected.
#[derive(Clone)]
pub struct HookTable {
    categories: Vec<Category>,
    filter: Option<HookFilter>,
}

impl HookTable {
    /// A table covering every category.
    pub fn new() -> Self {
        Self::with_categories(Category::ALL)
    }

    /// A table restricted to `categories`.
    pub fn with_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            categories: categories.into_iter().collect(),
            filter: None,
        }
    }

    /// Narrows the table with a predicate over `(name, category)`.
    #[must_use]
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str, Category) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Hook names registered under `category`, in catalog order.
    pub fn lookup(category: Category) -> Vec<&'static str> {
        Operation::ALL
            .iter()
            .filter(|operation| operation.category() == category)
            .map(|operation| operation.name())
            .collect()
    }

    /// The canonical implementation registered under `name`.
    pub fn canonical_impl(name: &str) -> Option<Implementation> {
        Operation::from_name(name).map(Operation::implementation)
    }

    fn admits(&self, operation: Operation) -> bool {
        self.categories.contains(&operation.category())
            && self
                .filter
                .as_ref()
                .is_none_or(|filter| filter(operation.name(), operation.category()))
    }

    /// Iterates `(name, category, implementation)` entries admitted by the
    /// table, in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = Hook> + '_ {
        Operation::ALL
            .iter()
            .copied()
            .filter(|operation| self.admits(*operation))
            .map(|operation| Hook {
                operation,
                name: operation.name(),
                category: operation.category(),
                implementation: operation.implementation(),
            })
    }

    /// Returns `true` when the table admits `operation`.
    pub fn contains(&self, operation: Operation) -> bool {
        self.admits(operation)
    }
}

impl Default for HookTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for HookTable {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HookTable")
            .field("categories", &self.categories)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}
