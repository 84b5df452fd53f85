//! Integration tests for the `#[callable]` attribute.

use std::collections::BTreeMap;

use pipewright::function::{Arguments, ParameterKind};
use pipewright::hooks::implementations::{add, mul};
use pipewright::{Binder, P, Value, args, callable};
use rstest::rstest;

#[callable]
fn scale(value: Value, #[default(2)] factor: Value) -> pipewright::Result<Value> {
    mul(&value, &factor)
}

/// Sums every positional value and counts the keyword options.
#[callable(name = "summary")]
pub fn summarize(
    first: Value,
    #[rest] rest: Vec<Value>,
    #[extra] options: BTreeMap<String, Value>,
) -> pipewright::Result<Value> {
    let total = rest.iter().try_fold(first, |total, value| add(&total, value))?;
    Ok(Value::Tuple(vec![total, Value::from(options.len())]))
}

#[callable]
fn answer() -> pipewright::Result<Value> {
    Ok(Value::Int(42))
}

#[rstest]
fn test_signature_follows_parameter_attributes() {
    let kinds: Vec<(String, ParameterKind)> = summarize()
        .signature()
        .parameters()
        .iter()
        .map(|parameter| (parameter.name().to_string(), parameter.kind()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("first".to_string(), ParameterKind::Required),
            ("rest".to_string(), ParameterKind::VariadicPositional),
            ("options".to_string(), ParameterKind::VariadicKeyword),
        ]
    );
    assert_eq!(summarize().name(), "summary");
}

#[rstest]
fn test_default_is_used_until_overridden() {
    assert_eq!(scale().call1(Value::Int(4)).unwrap(), Value::Int(8));

    let tripled = Binder::create(scale(), args![; factor = 3]).unwrap();
    assert!(!tripled.is_fully_bound());
    assert_eq!(tripled.invoke_with(args![4]).unwrap(), Value::Int(12));
}

#[rstest]
fn test_variadic_parameters_collect_the_rest() {
    let arguments = Arguments::positional(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        .with_keyword("verbose", true);
    let result = summarize().call(arguments).unwrap();
    assert_eq!(result, Value::Tuple(vec![Value::Int(6), Value::Int(1)]));
}

#[rstest]
fn test_zero_parameter_function() {
    assert!(answer().signature().parameters().is_empty());
    assert_eq!(answer().call(Arguments::new()).unwrap(), Value::Int(42));
}

#[rstest]
fn test_generated_functions_are_chain_steps() {
    let chain = P | scale() | Binder::create(scale(), args![; factor = 10]).unwrap();
    assert_eq!(chain.evaluate(1).unwrap(), Value::Int(20));
}
