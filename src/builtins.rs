//! A small library of registered functions for building chains.
//!
//! Every builtin is returned as a fresh [`Function`] with an explicit
//! signature, so it can be curried, placed in a chain or called directly.
//!
//! - [`identity`], [`constant`] and [`flip`] are the usual I, K and C
//!   combinators.
//! - [`map`], [`filter`], [`accumulate`], [`sum`], [`sorted`] and friends
//!   work over any iterable value (lists, tuples, strings and maps).
//! - [`operator`] exposes a hook implementation as a function.
//!
//! # Examples
//!
//! ```rust
//! use pipewright::binder::Binder;
//! use pipewright::builtins::{map, range, to_list};
//! use pipewright::function::Function;
//! use pipewright::{args, P, Value};
//!
//! let increment = Function::unary("increment", |value| {
//!     Ok(Value::Int(value.as_int().unwrap_or_default() + 1))
//! });
//! let chain = P | Binder::create(map(), args![increment]).unwrap() | to_list();
//!
//! let input = range().call1(Value::Int(10)).unwrap();
//! assert_eq!(chain.evaluate(input).unwrap(), Value::from_iter(1..=10));
//! ```

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::function::{Arguments, Function, Signature};
use crate::hooks::{Operation, implementations};
use crate::value::Value;

// =============================================================================
// Combinators
// =============================================================================

/// Returns its argument unchanged.
pub fn identity() -> Function {
    Function::unary("identity", Ok)
}

/// Returns a function that ignores every argument and yields `value`.
pub fn constant(value: impl Into<Value>) -> Function {
    let value = value.into();
    Function::new(
        "constant",
        Signature::new()
            .variadic_positional("args")
            .variadic_keyword("kwargs"),
        move |_| Ok(value.clone()),
    )
}

/// Swaps the two arguments of `function`.
///
/// # Examples
///
/// ```rust
/// use pipewright::builtins::{flip, operator};
/// use pipewright::function::Arguments;
/// use pipewright::hooks::Operation;
/// use pipewright::Value;
///
/// let minus = flip(operator(Operation::Sub));
/// let arguments = Arguments::positional(vec![Value::Int(1), Value::Int(10)]);
/// assert_eq!(minus.call(arguments).unwrap(), Value::Int(9));
/// ```
pub fn flip(function: Function) -> Function {
    let name = format!("flip({})", function.name());
    Function::binary(name, move |left, right| {
        function.call(Arguments::positional(vec![right, left]))
    })
}

// =============================================================================
// Iteration
// =============================================================================

/// `map(function, iterable)`: applies `function` to every item.
pub fn map() -> Function {
    Function::new(
        "map",
        Signature::new().required("function").required("iterable"),
        |mut frame| {
            let function = frame.take("function");
            frame
                .take("iterable")
                .to_sequence()?
                .into_iter()
                .map(|item| function.call1(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::List)
        },
    )
}

/// `filter(function, iterable)`: keeps the items for which `function` is
/// truthy. A `nil` function keeps the truthy items themselves.
pub fn filter() -> Function {
    Function::new(
        "filter",
        Signature::new().required("function").required("iterable"),
        |mut frame| {
            let function = frame.take("function");
            let mut kept = Vec::new();
            for item in frame.take("iterable").to_sequence()? {
                let keep = if function == Value::Nil {
                    item.is_truthy()
                } else {
                    function.call1(item.clone())?.is_truthy()
                };
                if keep {
                    kept.push(item);
                }
            }
            Ok(Value::List(kept))
        },
    )
}

/// `accumulate(iterable, function=nil, initial=nil)`: running totals.
///
/// Without a function the items are added. A non-nil `initial` is emitted
/// first and seeds the total.
pub fn accumulate() -> Function {
    Function::new(
        "accumulate",
        Signature::new()
            .required("iterable")
            .with_default("function", Value::Nil)
            .with_default("initial", Value::Nil),
        |mut frame| {
            let function = frame.take("function");
            let mut totals = Vec::new();
            let mut total = match frame.take("initial") {
                Value::Nil => None,
                initial => {
                    totals.push(initial.clone());
                    Some(initial)
                }
            };
            for item in frame.take("iterable").to_sequence()? {
                let next = match total {
                    None => item,
                    Some(previous) if function == Value::Nil => implementations::add(&previous, &item)?,
                    Some(previous) => function.call(Arguments::positional(vec![previous, item]))?,
                };
                totals.push(next.clone());
                total = Some(next);
            }
            Ok(Value::List(totals))
        },
    )
}

/// Materializes any iterable into a list.
pub fn to_list() -> Function {
    Function::unary("to_list", |value| value.to_sequence().map(Value::List))
}

/// `sum(iterable, start=0)`.
pub fn sum() -> Function {
    Function::new(
        "sum",
        Signature::new().required("iterable").with_default("start", 0),
        |mut frame| {
            let start = frame.take("start");
            frame
                .take("iterable")
                .to_sequence()?
                .iter()
                .try_fold(start, |total, item| implementations::add(&total, item))
        },
    )
}

/// Number of items of a container.
pub fn len() -> Function {
    Function::unary("len", |value| implementations::len(&value))
}

/// `range(start, stop=nil, step=1)`; with one argument the range runs from
/// zero to `start`.
pub fn range() -> Function {
    Function::new(
        "range",
        Signature::new()
            .required("start")
            .with_default("stop", Value::Nil)
            .with_default("step", 1),
        |frame| {
            let integer = |name: &str| {
                frame[name].as_int().ok_or_else(|| {
                    Error::failed("range", format!("`{name}` must be an integer"))
                })
            };
            let (start, stop) = if frame["stop"] == Value::Nil {
                (0, integer("start")?)
            } else {
                (integer("start")?, integer("stop")?)
            };
            let step = integer("step")?;
            if step == 0 {
                return Err(Error::failed("range", "`step` must not be zero"));
            }
            let mut items = Vec::new();
            let mut current = start;
            while (step > 0 && current < stop) || (step < 0 && current > stop) {
                items.push(Value::Int(current));
                match current.checked_add(step) {
                    Some(next) => current = next,
                    None => break,
                }
            }
            Ok(Value::List(items))
        },
    )
}

/// The items of a sequence in reverse order.
pub fn reversed() -> Function {
    Function::unary("reversed", |value| implementations::reversed(&value))
}

/// `sorted(iterable, key=nil, reverse=false)`: a stable sort.
pub fn sorted() -> Function {
    Function::new(
        "sorted",
        Signature::new()
            .required("iterable")
            .with_default("key", Value::Nil)
            .with_default("reverse", false),
        |mut frame| {
            let key = frame.take("key");
            let reverse = frame.take("reverse").is_truthy();
            let mut keyed = frame
                .take("iterable")
                .to_sequence()?
                .into_iter()
                .map(|item| {
                    let sort_key = if key == Value::Nil {
                        item.clone()
                    } else {
                        key.call1(item.clone())?
                    };
                    Ok((sort_key, item))
                })
                .collect::<Result<Vec<_>>>()?;

            let mut failure = None;
            keyed.sort_by(|(left, _), (right, _)| {
                let ordering = implementations::ordering(left, right).unwrap_or_else(|error| {
                    failure.get_or_insert(error);
                    Ordering::Equal
                });
                if reverse { ordering.reverse() } else { ordering }
            });
            if let Some(error) = failure {
                return Err(error);
            }
            Ok(Value::List(keyed.into_iter().map(|(_, item)| item).collect()))
        },
    )
}

// =============================================================================
// Operators
// =============================================================================

/// Exposes the canonical implementation of a hook as a function.
///
/// Unary hooks take `value`, binary hooks `left` and `right`, and `setitem`
/// takes `container`, `key` and `value`.
pub fn operator(operation: Operation) -> Function {
    let signature = match operation.implementation().arity() {
        1 => Signature::new().required("value"),
        2 => Signature::new().required("left").required("right"),
        _ => Signature::new()
            .required("container")
            .required("key")
            .required("value"),
    };
    Function::new(operation.name(), signature, move |frame| {
        let operands: Vec<Value> = frame.named().map(|(_, value)| value.clone()).collect();
        operation.apply(&operands)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use rstest::rstest;

    fn call(function: &Function, arguments: Vec<Value>) -> Result<Value> {
        function.call(Arguments::positional(arguments))
    }

    #[rstest]
    fn test_identity_and_constant() {
        assert_eq!(identity().call1(Value::from("x")).unwrap(), Value::from("x"));
        let always = constant(5);
        assert_eq!(call(&always, vec![1.into(), 2.into()]).unwrap(), Value::Int(5));
        assert_eq!(call(&always, vec![]).unwrap(), Value::Int(5));
    }

    #[rstest]
    fn test_flip_swaps_arguments() {
        let flipped = flip(operator(Operation::FloorDiv));
        assert_eq!(call(&flipped, vec![2.into(), 7.into()]).unwrap(), Value::Int(3));
        assert_eq!(flipped.name(), "flip(floordiv)");
    }

    #[rstest]
    fn test_map_and_filter() {
        let double = operator(Operation::Mul);
        let double = Function::unary("double", move |value| {
            call(&double, vec![value, Value::Int(2)])
        });
        let result = call(&map(), vec![double.into(), vec![1, 2, 3].into()]).unwrap();
        assert_eq!(result, Value::from(vec![2, 4, 6]));

        let result = call(&filter(), vec![Value::Nil, vec!["a", "", "b"].into()]).unwrap();
        assert_eq!(result, Value::from(vec!["a", "b"]));
    }

    #[rstest]
    fn test_accumulate() {
        let result = call(&accumulate(), vec![vec![1, 2, 3].into()]).unwrap();
        assert_eq!(result, Value::from(vec![1, 3, 6]));

        let arguments = Arguments::positional(vec![vec![1, 2, 3].into()])
            .with_keyword("function", operator(Operation::Mul))
            .with_keyword("initial", 10);
        let result = accumulate().call(arguments).unwrap();
        assert_eq!(result, Value::from(vec![10, 10, 20, 60]));
    }

    #[rstest]
    #[case(vec![Value::Int(4)], vec![0, 1, 2, 3])]
    #[case(vec![Value::Int(2), Value::Int(5)], vec![2, 3, 4])]
    #[case(vec![Value::Int(5), Value::Int(0), Value::Int(-2)], vec![5, 3, 1])]
    #[case(vec![Value::Int(3), Value::Int(1)], vec![])]
    fn test_range(#[case] arguments: Vec<Value>, #[case] expected: Vec<i64>) {
        assert_eq!(call(&range(), arguments).unwrap(), Value::from(expected));
    }

    #[rstest]
    fn test_range_rejects_zero_step() {
        let error = call(&range(), vec![0.into(), 5.into(), 0.into()]).unwrap_err();
        assert!(matches!(error, Error::Failed { .. }));
    }

    #[rstest]
    fn test_sum_len_reversed() {
        assert_eq!(call(&sum(), vec![vec![1, 2, 3].into()]).unwrap(), Value::Int(6));
        assert_eq!(
            call(&sum(), vec![vec![0.5].into(), Value::Int(1)]).unwrap(),
            Value::Float(1.5)
        );
        assert_eq!(len().call1(Value::from("abc")).unwrap(), Value::Int(3));
        assert_eq!(
            reversed().call1(Value::from(vec![1, 2])).unwrap(),
            Value::from(vec![2, 1])
        );
    }

    #[rstest]
    fn test_sorted_with_key_and_reverse() {
        let people = Value::from(vec![
            record! { "name" => "b", "age" => 30 },
            record! { "name" => "a", "age" => 20 },
        ]);
        let by_age = Function::unary("age", |person| {
            implementations::getattr(&person, &Value::from("age"))
        });
        let arguments = Arguments::positional(vec![people])
            .with_keyword("key", by_age)
            .with_keyword("reverse", true);
        let Value::List(sorted_people) = sorted().call(arguments).unwrap() else {
            panic!("expected a list");
        };
        assert_eq!(sorted_people[0], record! { "name" => "b", "age" => 30 });
    }

    #[rstest]
    fn test_sorted_reports_incomparable_items() {
        let error = sorted()
            .call1(Value::List(vec![Value::Int(1), Value::from("a")]))
            .unwrap_err();
        assert!(matches!(error, Error::UnsupportedOperand { .. }));
    }

    #[rstest]
    fn test_operator_setitem_takes_three_arguments() {
        let setitem = operator(Operation::SetItem);
        let result = call(&setitem, vec![vec![1, 2].into(), 0.into(), 9.into()]).unwrap();
        assert_eq!(result, Value::from(vec![9, 2]));
    }
}
