//! Integration tests for shell command stages.

use pipewright::builtins::{range, reversed};
use pipewright::function::Arguments;
use pipewright::io::MemorySink;
use pipewright::process::{Command, ProcessInput};
use pipewright::{Binder, Error, P, Symbolic, Value, X, args};
use rstest::rstest;

fn numbered_lines(start: i64, stop: i64) -> Value {
    let numbers = range()
        .call(Arguments::positional(vec![Value::Int(start), Value::Int(stop)]))
        .unwrap();
    let lines: Vec<Value> = numbers
        .as_slice()
        .unwrap_or_default()
        .iter()
        .map(|number| Value::from(format!("{number}\n")))
        .collect();
    Value::List(lines)
}

#[rstest]
fn test_grep_over_descending_lines() {
    let chain = numbered_lines(1, 12) | P | reversed() | Command::new("grep 1");
    let result = chain.end().unwrap();
    assert_eq!(result, Value::from_iter(["11\n", "10\n", "1\n"]));
}

#[rstest]
fn test_composed_commands_run_as_one_pipeline() {
    let command = Command::new("grep 1") | Command::new("grep 2");
    let chain = numbered_lines(1, 100) | P | command;
    assert_eq!(chain.end().unwrap(), Value::from_iter(["12\n", "21\n"]));
}

#[rstest]
fn test_command_without_input() {
    let result = (P | Command::new("printf '123'")).evaluate(Value::Nil).unwrap();
    assert_eq!(result, Value::from_iter(["123"]));
}

#[rstest]
fn test_text_input_and_following_steps() {
    let chain = P | Command::new("tr a-z A-Z") | X.get(0);
    assert_eq!(chain.evaluate("shout\n").unwrap(), Value::from("SHOUT\n"));
}

#[rstest]
fn test_process_output_redirected_to_a_sink() {
    let sink = MemorySink::new("sorted");
    let lines = Value::from_iter(["b\n", "c\n", "a\n"]);
    (lines | P | Command::new("sort")).redirect(sink.clone()).unwrap();
    assert_eq!(sink.records(), vec![Value::from("a\n"), Value::from("b\n"), Value::from("c\n")]);
}

#[rstest]
fn test_invalid_input_is_rejected_before_spawning() {
    let error = (P | Command::new("cat")).evaluate(Value::Int(3)).unwrap_err();
    assert!(matches!(error, Error::InvalidProcessInput { type_name: "int" }));
}

#[rstest]
fn test_failing_command_reports_status() {
    let error = (P | Command::new("exit 2")).evaluate(Value::Nil).unwrap_err();
    assert!(matches!(error, Error::ProcessFailed { ref command, .. } if command == "exit 2"));
}

#[rstest]
fn test_lazy_output_lines() {
    let output = Command::new("cat")
        .invoke(ProcessInput::Lines(vec!["one\n".to_string(), "two\n".to_string()]))
        .unwrap();
    let collected: Vec<String> = output.map(Result::unwrap).collect();
    assert_eq!(collected, vec!["one\n", "two\n"]);
}

#[rstest]
fn test_binder_result_feeds_a_command() {
    let join = pipewright::builtins::map();
    let suffix = pipewright::Function::unary("suffix", |value| {
        Ok(Value::from(format!("{value}\n")))
    });
    let chain = P
        | Binder::create(join, args![suffix]).unwrap()
        | Command::new("wc -l")
        | X.get(0);
    let count = chain.evaluate(Value::from_iter([1, 2, 3])).unwrap();
    assert_eq!(count.as_str().map(str::trim), Some("3"));
}

#[rstest]
fn test_non_utf8_output_reaches_the_chain_lossily() {
    let chain = P | Command::new("printf 'caf\\351\\n'") | X.get(0);
    assert_eq!(chain.evaluate(Value::Nil).unwrap(), Value::from("caf\u{FFFD}\n"));
}
