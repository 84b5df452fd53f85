//! Integration tests for recorded placeholder expressions.

use pipewright::recorder::{Applied, Operand, Recorder, Symbolic};
use pipewright::{Error, Value, X, record};
use rstest::rstest;

#[rstest]
fn test_division_promotes_before_later_steps() {
    let expression = Recorder::new() / 3 * 2 + 1;
    assert_eq!(expression.evaluate(3).unwrap(), Value::Float(3.0));
    assert_eq!(expression.evaluate(6).unwrap(), Value::Float(5.0));
}

#[rstest]
fn test_fluent_builder_matches_operator_sugar() {
    let fluent = X.truediv(3).mul(2).add(1);
    let sugar = X / 3 * 2 + 1;
    assert_eq!(fluent.evaluate(9).unwrap(), sugar.evaluate(9).unwrap());
    assert_eq!(fluent.steps().len(), sugar.steps().len());
}

#[rstest]
fn test_three_placeholders_saturate_in_order() {
    let expression = X + 1 + 2 * X + X;
    let mut applied = Applied::Partial(expression);
    for value in [1, 1, 38] {
        applied = applied.apply(value).unwrap();
    }
    assert_eq!(applied.into_value(), Some(Value::Int(42)));
}

#[rstest]
fn test_single_input_binds_every_placeholder() {
    let expression = X + 1 + 2 * X + X;
    assert_eq!(expression.evaluate(10).unwrap(), Value::Int(41));
}

#[rstest]
fn test_finished_value_is_called_with_the_next_argument() {
    let increment = pipewright::Function::unary("increment", |value| {
        pipewright::hooks::implementations::add(&value, &Value::Int(1))
    });
    let selector = X.get("handler");
    let handlers = record! { "handler" => increment };
    let applied = selector.apply(handlers).unwrap().apply(4).unwrap();
    assert_eq!(applied, Applied::Value(Value::Int(5)));
}

#[rstest]
fn test_records_access_attributes_and_items() {
    let user = record! { "name" => "ada", "tags" => vec!["x", "y"] };
    assert_eq!(X.attr("name").evaluate(user.clone()).unwrap(), Value::from("ada"));
    assert_eq!(X.attr("tags").len().evaluate(user.clone()).unwrap(), Value::Int(2));

    let error = X.attr("email").evaluate(user).unwrap_err();
    assert!(matches!(error, Error::AttributeNotFound { attribute, .. } if attribute == "email"));
}

#[rstest]
fn test_nested_operand_embeds_another_recorder() {
    let squared = Recorder::new();
    let squared = squared.clone() * squared;
    let expression = X.add(Operand::Nested(squared));
    assert_eq!(expression.placeholders().len(), 2);
    assert_eq!(expression.evaluate(3).unwrap(), Value::Int(12));
}

#[rstest]
fn test_unsupported_operands_surface_on_replay() {
    let expression = X + 1;
    let error = expression.evaluate("text").unwrap_err();
    assert!(matches!(error, Error::UnsupportedOperand { operation: "add", .. }));
}

#[rstest]
#[case(Value::from("ab"))]
#[case(Value::from_iter([1, 2]))]
fn test_oversized_repetition_is_an_overflow_error(#[case] sequence: Value) {
    let expression = X * i64::MAX;
    let error = expression.evaluate(sequence).unwrap_err();
    assert!(matches!(error, Error::Overflow { operation: "mul" }));
    assert_eq!(expression.evaluate(2).unwrap_err().to_string(), "integer overflow in `mul`");
}
