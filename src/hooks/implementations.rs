//! Canonical implementations behind each hook.
//!
//! The semantics follow the familiar dynamic-language rules: booleans take
//! part in integer arithmetic, mixing an integer with a float promotes to
//! float, `truediv` always produces a float, `floordiv` and `mod` round
//! toward negative infinity, and sequence `mul` repeats.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::value::Value;

#[derive(Clone, Copy, Debug)]
enum Number {
    Int(i64),
    Float(f64),
}

const fn number(value: &Value) -> Option<Number> {
    match value {
        Value::Int(integer) => Some(Number::Int(*integer)),
        Value::Bool(flag) => Some(Number::Int(*flag as i64)),
        Value::Float(float) => Some(Number::Float(*float)),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
const fn widen(number: Number) -> f64 {
    match number {
        Number::Int(integer) => integer as f64,
        Number::Float(float) => float,
    }
}

fn unsupported(operation: &'static str, operands: &[&Value]) -> Error {
    Error::UnsupportedOperand {
        operation,
        operands: operands
            .iter()
            .map(|operand| operand.type_name())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn numeric(
    operation: &'static str,
    left: &Value,
    right: &Value,
    integer: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Result<Value> {
    match (number(left), number(right)) {
        (Some(Number::Int(a)), Some(Number::Int(b))) => integer(a, b)
            .map(Value::Int)
            .ok_or(Error::Overflow { operation }),
        (Some(a), Some(b)) => Ok(Value::Float(float(widen(a), widen(b)))),
        _ => Err(unsupported(operation, &[left, right])),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn float_to_int(operation: &'static str, float: f64) -> Result<i64> {
    if float.is_finite() && float >= i64::MIN as f64 && float < i64::MAX as f64 {
        Ok(float as i64)
    } else {
        Err(Error::Overflow { operation })
    }
}

/// Number of elements `length * count` with a non-positive count clamped to
/// zero, or `None` when the product exceeds `limit`.
fn repeated_length(length: usize, count: i64, limit: usize) -> Option<(usize, usize)> {
    let count = usize::try_from(count.max(0)).ok()?;
    length
        .checked_mul(count)
        .filter(|total| *total <= limit)
        .map(|total| (count, total))
}

fn repeat(operation: &'static str, items: &[Value], count: i64) -> Result<Vec<Value>> {
    let limit = isize::MAX.unsigned_abs() / size_of::<Value>();
    let (count, total) =
        repeated_length(items.len(), count, limit).ok_or(Error::Overflow { operation })?;
    let mut repeated = Vec::new();
    repeated
        .try_reserve_exact(total)
        .map_err(|_| Error::Overflow { operation })?;
    repeated.extend(std::iter::repeat_n(items, count).flatten().cloned());
    Ok(repeated)
}

fn repeat_text(operation: &'static str, text: &str, count: i64) -> Result<String> {
    let (count, total) = repeated_length(text.len(), count, isize::MAX.unsigned_abs())
        .ok_or(Error::Overflow { operation })?;
    let mut repeated = String::new();
    repeated
        .try_reserve_exact(total)
        .map_err(|_| Error::Overflow { operation })?;
    repeated.extend(std::iter::repeat_n(text, count));
    Ok(repeated)
}

fn normalize_index(index: i64, length: usize) -> Result<usize> {
    let signed_length = i64::try_from(length).unwrap_or(i64::MAX);
    let position = if index < 0 { index + signed_length } else { index };
    usize::try_from(position)
        .ok()
        .filter(|position| *position < length)
        .ok_or(Error::IndexOutOfRange { index, length })
}

// =============================================================================
// Binary numeric
// =============================================================================

/// `left + right`; strings and same-kind sequences concatenate.
pub fn add(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (Value::List(a), Value::List(b)) => Ok(Value::List([a.as_slice(), b].concat())),
        (Value::Tuple(a), Value::Tuple(b)) => Ok(Value::Tuple([a.as_slice(), b].concat())),
        _ => numeric("add", left, right, i64::checked_add, |a, b| a + b),
    }
}

/// `left - right`.
pub fn sub(left: &Value, right: &Value) -> Result<Value> {
    numeric("sub", left, right, i64::checked_sub, |a, b| a - b)
}

/// `left * right`; a string or sequence times an integer repeats it.
pub fn mul(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Str(string), count) | (count, Value::Str(string)) if count.as_int().is_some() => {
            Ok(Value::Str(repeat_text("mul", string, count.as_int().unwrap_or(0))?))
        }
        (Value::List(items), count) | (count, Value::List(items)) if count.as_int().is_some() => {
            Ok(Value::List(repeat("mul", items, count.as_int().unwrap_or(0))?))
        }
        (Value::Tuple(items), count) | (count, Value::Tuple(items)) if count.as_int().is_some() => {
            Ok(Value::Tuple(repeat("mul", items, count.as_int().unwrap_or(0))?))
        }
        _ => numeric("mul", left, right, i64::checked_mul, |a, b| a * b),
    }
}

/// Dot product of two equally long numeric sequences.
pub fn matmul(left: &Value, right: &Value) -> Result<Value> {
    match (left.as_slice(), right.as_slice()) {
        (Some(a), Some(b)) if a.len() == b.len() => a
            .iter()
            .zip(b)
            .try_fold(Value::Int(0), |total, (x, y)| add(&total, &mul(x, y)?))
            .map_err(|error| match error {
                Error::UnsupportedOperand { .. } => unsupported("matmul", &[left, right]),
                other => other,
            }),
        _ => Err(unsupported("matmul", &[left, right])),
    }
}

/// `left / right`, always a float.
pub fn truediv(left: &Value, right: &Value) -> Result<Value> {
    match (number(left), number(right)) {
        (Some(_), Some(divisor)) if widen(divisor) == 0.0 => {
            Err(Error::ZeroDivision { operation: "truediv" })
        }
        (Some(a), Some(b)) => Ok(Value::Float(widen(a) / widen(b))),
        _ => Err(unsupported("truediv", &[left, right])),
    }
}

const fn floor_div_int(a: i64, b: i64) -> Option<i64> {
    let Some(quotient) = a.checked_div(b) else {
        return None;
    };
    if a % b != 0 && ((a < 0) != (b < 0)) {
        quotient.checked_sub(1)
    } else {
        Some(quotient)
    }
}

const fn floor_mod_int(a: i64, b: i64) -> Option<i64> {
    let Some(remainder) = a.checked_rem(b) else {
        return None;
    };
    if remainder != 0 && ((remainder < 0) != (b < 0)) {
        Some(remainder + b)
    } else {
        Some(remainder)
    }
}

fn floor_mod_float(a: f64, b: f64) -> f64 {
    let remainder = a % b;
    if remainder != 0.0 && ((remainder < 0.0) != (b < 0.0)) {
        remainder + b
    } else {
        remainder
    }
}

fn is_zero(value: &Value) -> bool {
    number(value).is_some_and(|divisor| widen(divisor) == 0.0)
}

/// `left // right`, rounding toward negative infinity.
pub fn floordiv(left: &Value, right: &Value) -> Result<Value> {
    if number(left).is_some() && is_zero(right) {
        return Err(Error::ZeroDivision { operation: "floordiv" });
    }
    numeric("floordiv", left, right, floor_div_int, |a, b| (a / b).floor())
}

/// `left % right` with the sign of the divisor.
pub fn modulo(left: &Value, right: &Value) -> Result<Value> {
    if number(left).is_some() && is_zero(right) {
        return Err(Error::ZeroDivision { operation: "mod" });
    }
    numeric("mod", left, right, floor_mod_int, floor_mod_float)
}

/// The pair `(left // right, left % right)`.
pub fn divmod(left: &Value, right: &Value) -> Result<Value> {
    Ok(Value::Tuple(vec![floordiv(left, right)?, modulo(left, right)?]))
}

/// `left ** right`; a negative integer exponent yields a float.
pub fn pow(left: &Value, right: &Value) -> Result<Value> {
    match (number(left), number(right)) {
        (Some(Number::Int(base)), Some(Number::Int(exponent))) if exponent >= 0 => {
            let exponent =
                u32::try_from(exponent).map_err(|_| Error::Overflow { operation: "pow" })?;
            base.checked_pow(exponent)
                .map(Value::Int)
                .ok_or(Error::Overflow { operation: "pow" })
        }
        (Some(base), Some(exponent)) => Ok(Value::Float(widen(base).powf(widen(exponent)))),
        _ => Err(unsupported("pow", &[left, right])),
    }
}

fn shift_amount(operation: &'static str, left: &Value, right: &Value) -> Result<(i64, u32)> {
    match (left.as_int(), right.as_int()) {
        (Some(value), Some(amount)) if amount >= 0 => {
            Ok((value, u32::try_from(amount).unwrap_or(u32::MAX)))
        }
        _ => Err(unsupported(operation, &[left, right])),
    }
}

/// `left << right`, reporting overflow instead of discarding bits.
pub fn lshift(left: &Value, right: &Value) -> Result<Value> {
    let (value, amount) = shift_amount("lshift", left, right)?;
    if value == 0 {
        return Ok(Value::Int(0));
    }
    if amount >= 63 {
        return Err(Error::Overflow { operation: "lshift" });
    }
    let shifted = value << amount;
    if shifted >> amount == value {
        Ok(Value::Int(shifted))
    } else {
        Err(Error::Overflow { operation: "lshift" })
    }
}

/// Arithmetic `left >> right`.
pub fn rshift(left: &Value, right: &Value) -> Result<Value> {
    let (value, amount) = shift_amount("rshift", left, right)?;
    Ok(Value::Int(value >> amount.min(63)))
}

fn bitwise(
    operation: &'static str,
    left: &Value,
    right: &Value,
    logical: fn(bool, bool) -> bool,
    integer: fn(i64, i64) -> i64,
) -> Result<Value> {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(logical(*a, *b))),
        _ => match (left.as_int(), right.as_int()) {
            (Some(a), Some(b)) => Ok(Value::Int(integer(a, b))),
            _ => Err(unsupported(operation, &[left, right])),
        },
    }
}

/// `left & right`, logical on two booleans.
pub fn bitand(left: &Value, right: &Value) -> Result<Value> {
    bitwise("and", left, right, |a, b| a & b, |a, b| a & b)
}

/// `left ^ right`, logical on two booleans.
pub fn bitxor(left: &Value, right: &Value) -> Result<Value> {
    bitwise("xor", left, right, |a, b| a ^ b, |a, b| a ^ b)
}

/// `left | right`, logical on two booleans.
pub fn bitor(left: &Value, right: &Value) -> Result<Value> {
    bitwise("or", left, right, |a, b| a | b, |a, b| a | b)
}

// =============================================================================
// Unary numeric
// =============================================================================

/// `-operand`.
pub fn neg(operand: &Value) -> Result<Value> {
    match number(operand) {
        Some(Number::Int(integer)) => integer
            .checked_neg()
            .map(Value::Int)
            .ok_or(Error::Overflow { operation: "neg" }),
        Some(Number::Float(float)) => Ok(Value::Float(-float)),
        None => Err(unsupported("neg", &[operand])),
    }
}

/// `+operand`.
pub fn pos(operand: &Value) -> Result<Value> {
    match number(operand) {
        Some(Number::Int(integer)) => Ok(Value::Int(integer)),
        Some(Number::Float(float)) => Ok(Value::Float(float)),
        None => Err(unsupported("pos", &[operand])),
    }
}

/// Absolute value.
pub fn abs(operand: &Value) -> Result<Value> {
    match number(operand) {
        Some(Number::Int(integer)) => integer
            .checked_abs()
            .map(Value::Int)
            .ok_or(Error::Overflow { operation: "abs" }),
        Some(Number::Float(float)) => Ok(Value::Float(float.abs())),
        None => Err(unsupported("abs", &[operand])),
    }
}

/// Bitwise complement of an integer.
pub fn invert(operand: &Value) -> Result<Value> {
    operand
        .as_int()
        .map(|integer| Value::Int(!integer))
        .ok_or_else(|| unsupported("invert", &[operand]))
}

fn rounding(operation: &'static str, operand: &Value, round: fn(f64) -> f64) -> Result<Value> {
    match number(operand) {
        Some(Number::Int(integer)) => Ok(Value::Int(integer)),
        Some(Number::Float(float)) => float_to_int(operation, round(float)).map(Value::Int),
        None => Err(unsupported(operation, &[operand])),
    }
}

/// Rounds half to even.
pub fn round(operand: &Value) -> Result<Value> {
    rounding("round", operand, f64::round_ties_even)
}

/// Rounds toward zero.
pub fn trunc(operand: &Value) -> Result<Value> {
    rounding("trunc", operand, f64::trunc)
}

/// Rounds toward negative infinity.
pub fn floor(operand: &Value) -> Result<Value> {
    rounding("floor", operand, f64::floor)
}

/// Rounds toward positive infinity.
pub fn ceil(operand: &Value) -> Result<Value> {
    rounding("ceil", operand, f64::ceil)
}

// =============================================================================
// Comparison
// =============================================================================

/// Equality with numeric promotion, applied element-wise inside containers.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|((ka, va), (kb, vb))| ka == kb && values_equal(va, vb))
        }
        _ => match (number(left), number(right)) {
            (Some(Number::Int(a)), Some(Number::Int(b))) => a == b,
            (Some(a), Some(b)) => widen(a) == widen(b),
            _ => left == right,
        },
    }
}

fn compare(operation: &'static str, left: &Value, right: &Value) -> Result<Option<Ordering>> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            for (x, y) in a.iter().zip(b) {
                if !values_equal(x, y) {
                    return compare(operation, x, y);
                }
            }
            Ok(Some(a.len().cmp(&b.len())))
        }
        _ => match (number(left), number(right)) {
            (Some(Number::Int(a)), Some(Number::Int(b))) => Ok(Some(a.cmp(&b))),
            (Some(a), Some(b)) => Ok(widen(a).partial_cmp(&widen(b))),
            _ => Err(unsupported(operation, &[left, right])),
        },
    }
}

/// Total ordering used for sorting; unordered floats compare equal.
///
/// # Errors
///
/// Returns [`Error::UnsupportedOperand`] for values without an ordering.
pub fn ordering(left: &Value, right: &Value) -> Result<Ordering> {
    Ok(compare("lt", left, right)?.unwrap_or(Ordering::Equal))
}

/// `left < right`.
pub fn lt(left: &Value, right: &Value) -> Result<Value> {
    Ok(Value::Bool(compare("lt", left, right)? == Some(Ordering::Less)))
}

/// `left <= right`.
pub fn le(left: &Value, right: &Value) -> Result<Value> {
    Ok(Value::Bool(matches!(
        compare("le", left, right)?,
        Some(Ordering::Less | Ordering::Equal)
    )))
}

/// `left == right` with numeric promotion.
pub fn eq(left: &Value, right: &Value) -> Result<Value> {
    Ok(Value::Bool(values_equal(left, right)))
}

/// `left != right` with numeric promotion.
pub fn ne(left: &Value, right: &Value) -> Result<Value> {
    Ok(Value::Bool(!values_equal(left, right)))
}

/// `left > right`.
pub fn gt(left: &Value, right: &Value) -> Result<Value> {
    Ok(Value::Bool(compare("gt", left, right)? == Some(Ordering::Greater)))
}

/// `left >= right`.
pub fn ge(left: &Value, right: &Value) -> Result<Value> {
    Ok(Value::Bool(matches!(
        compare("ge", left, right)?,
        Some(Ordering::Greater | Ordering::Equal)
    )))
}

// =============================================================================
// Container
// =============================================================================

/// Length in characters, elements or entries.
pub fn len(container: &Value) -> Result<Value> {
    let length = match container {
        Value::Str(string) => string.chars().count(),
        Value::List(items) | Value::Tuple(items) => items.len(),
        Value::Map(entries) => entries.len(),
        other => return Err(unsupported("len", &[other])),
    };
    Ok(Value::from(length))
}

/// `container[key]`; integer indices may be negative.
pub fn getitem(container: &Value, key: &Value) -> Result<Value> {
    match (container, key) {
        (Value::List(items) | Value::Tuple(items), index) if index.as_int().is_some() => {
            let position = normalize_index(index.as_int().unwrap_or(0), items.len())?;
            Ok(items[position].clone())
        }
        (Value::Str(string), index) if index.as_int().is_some() => {
            let characters: Vec<char> = string.chars().collect();
            let position = normalize_index(index.as_int().unwrap_or(0), characters.len())?;
            Ok(Value::Str(characters[position].to_string()))
        }
        (Value::Map(entries), Value::Str(name)) => entries
            .get(name)
            .cloned()
            .ok_or_else(|| Error::KeyNotFound { key: name.clone() }),
        _ => Err(unsupported("getitem", &[container, key])),
    }
}

/// Returns a copy of `container` with `key` set to `value`.
pub fn setitem(container: &Value, key: &Value, value: &Value) -> Result<Value> {
    match (container, key) {
        (Value::List(items), index) if index.as_int().is_some() => {
            let position = normalize_index(index.as_int().unwrap_or(0), items.len())?;
            let mut updated = items.clone();
            updated[position] = value.clone();
            Ok(Value::List(updated))
        }
        (Value::Map(entries), Value::Str(name)) => {
            let mut updated: BTreeMap<String, Value> = entries.clone();
            updated.insert(name.clone(), value.clone());
            Ok(Value::Map(updated))
        }
        _ => Err(unsupported("setitem", &[container, key, value])),
    }
}

/// Returns a copy of `container` without `key`.
pub fn delitem(container: &Value, key: &Value) -> Result<Value> {
    match (container, key) {
        (Value::List(items), index) if index.as_int().is_some() => {
            let position = normalize_index(index.as_int().unwrap_or(0), items.len())?;
            let mut updated = items.clone();
            updated.remove(position);
            Ok(Value::List(updated))
        }
        (Value::Map(entries), Value::Str(name)) => {
            let mut updated = entries.clone();
            updated
                .remove(name)
                .ok_or_else(|| Error::KeyNotFound { key: name.clone() })?;
            Ok(Value::Map(updated))
        }
        _ => Err(unsupported("delitem", &[container, key])),
    }
}

/// `item in container`.
pub fn contains(container: &Value, item: &Value) -> Result<Value> {
    match (container, item) {
        (Value::List(items) | Value::Tuple(items), _) => Ok(Value::Bool(
            items.iter().any(|candidate| values_equal(candidate, item)),
        )),
        (Value::Str(haystack), Value::Str(needle)) => Ok(Value::Bool(haystack.contains(needle.as_str()))),
        (Value::Map(entries), Value::Str(key)) => Ok(Value::Bool(entries.contains_key(key))),
        _ => Err(unsupported("contains", &[container, item])),
    }
}

/// Elements of a string or sequence in reverse order, as a list.
pub fn reversed(container: &Value) -> Result<Value> {
    match container {
        Value::List(_) | Value::Tuple(_) | Value::Str(_) => {
            let mut items = container.to_sequence()?;
            items.reverse();
            Ok(Value::List(items))
        }
        other => Err(unsupported("reversed", &[other])),
    }
}

/// Elements of `container` as a list.
pub fn iter(container: &Value) -> Result<Value> {
    container.to_sequence().map(Value::List)
}

// =============================================================================
// Attribute, format, truth
// =============================================================================

/// Looks up `name` as an entry of a map value.
pub fn getattr(object: &Value, name: &Value) -> Result<Value> {
    match (object, name) {
        (Value::Map(entries), Value::Str(attribute)) => {
            entries
                .get(attribute)
                .cloned()
                .ok_or_else(|| Error::AttributeNotFound {
                    type_name: object.type_name(),
                    attribute: attribute.clone(),
                })
        }
        (_, Value::Str(attribute)) => Err(Error::AttributeNotFound {
            type_name: object.type_name(),
            attribute: attribute.clone(),
        }),
        _ => Err(unsupported("getattr", &[object, name])),
    }
}

/// Display form, with strings quoted.
pub fn repr(operand: &Value) -> Result<Value> {
    Ok(Value::Str(operand.to_string()))
}

/// Display form, with strings left bare.
pub fn str(operand: &Value) -> Result<Value> {
    match operand {
        Value::Str(string) => Ok(Value::Str(string.clone())),
        other => Ok(Value::Str(other.to_string())),
    }
}

/// Truthiness as a boolean.
pub fn truth(operand: &Value) -> Result<Value> {
    Ok(Value::Bool(operand.is_truthy()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(7, 2, 3, 1)]
    #[case(-7, 2, -4, 1)]
    #[case(7, -2, -4, -1)]
    #[case(-7, -2, 3, -1)]
    fn test_floor_division_and_modulo_round_toward_negative_infinity(
        #[case] a: i64,
        #[case] b: i64,
        #[case] quotient: i64,
        #[case] remainder: i64,
    ) {
        let (left, right) = (Value::Int(a), Value::Int(b));
        assert_eq!(floordiv(&left, &right).unwrap(), Value::Int(quotient));
        assert_eq!(modulo(&left, &right).unwrap(), Value::Int(remainder));
    }

    #[rstest]
    fn test_truediv_promotes_to_float() {
        assert_eq!(truediv(&Value::Int(3), &Value::Int(3)).unwrap(), Value::Float(1.0));
    }

    #[rstest]
    #[case("truediv")]
    #[case("floordiv")]
    #[case("mod")]
    fn test_division_by_zero(#[case] operation: &'static str) {
        let function = match operation {
            "truediv" => truediv,
            "floordiv" => floordiv,
            _ => modulo,
        };
        let error = function(&Value::Int(1), &Value::Int(0)).unwrap_err();
        assert!(matches!(error, Error::ZeroDivision { operation: name } if name == operation));
    }

    #[rstest]
    fn test_add_concatenates_sequences_and_strings() {
        assert_eq!(add(&Value::from("ab"), &Value::from("c")).unwrap(), Value::from("abc"));
        assert_eq!(
            add(&Value::from(vec![1]), &Value::from(vec![2])).unwrap(),
            Value::from(vec![1, 2])
        );
    }

    #[rstest]
    fn test_add_overflow_is_reported() {
        let error = add(&Value::Int(i64::MAX), &Value::Int(1)).unwrap_err();
        assert!(matches!(error, Error::Overflow { operation: "add" }));
    }

    #[rstest]
    #[case(Value::from("ab"))]
    #[case(Value::from(vec![1, 2]))]
    #[case(Value::Tuple(vec![Value::Int(1)]))]
    fn test_huge_repetition_is_reported_as_overflow(#[case] sequence: Value) {
        let error = mul(&sequence, &Value::Int(i64::MAX)).unwrap_err();
        assert!(matches!(error, Error::Overflow { operation: "mul" }));
        let error = mul(&Value::Int(1 << 60), &sequence).unwrap_err();
        assert!(matches!(error, Error::Overflow { operation: "mul" }));
    }

    #[rstest]
    fn test_repetition_by_non_positive_count_is_empty() {
        assert_eq!(mul(&Value::from("ab"), &Value::Int(-3)).unwrap(), Value::from(""));
        assert_eq!(
            mul(&Value::from(vec![1]), &Value::Int(0)).unwrap(),
            Value::List(Vec::new())
        );
        assert_eq!(
            mul(&Value::Tuple(vec![Value::Int(1), Value::from("x")]), &Value::Int(2)).unwrap(),
            Value::Tuple(vec![Value::Int(1), Value::from("x"), Value::Int(1), Value::from("x")])
        );
    }

    #[rstest]
    fn test_matmul_keeps_inner_overflow() {
        let left = Value::from(vec![i64::MAX, 1]);
        let right = Value::from(vec![2, 1]);
        let error = matmul(&left, &right).unwrap_err();
        assert!(matches!(error, Error::Overflow { operation: "mul" }));

        let error = matmul(&Value::from(vec![1]), &Value::from_iter(["a"])).unwrap_err();
        assert!(matches!(error, Error::UnsupportedOperand { operation: "matmul", .. }));
        assert_eq!(
            matmul(&Value::from(vec![1, 2]), &Value::from(vec![3, 4])).unwrap(),
            Value::Int(11)
        );
    }

    #[rstest]
    fn test_mul_repeats_sequences_from_either_side() {
        assert_eq!(mul(&Value::from("ab"), &Value::Int(2)).unwrap(), Value::from("abab"));
        assert_eq!(
            mul(&Value::Int(2), &Value::from(vec![0])).unwrap(),
            Value::from(vec![0, 0])
        );
    }

    #[rstest]
    fn test_mixed_arithmetic_promotes() {
        assert_eq!(add(&Value::Int(1), &Value::Float(0.5)).unwrap(), Value::Float(1.5));
        assert_eq!(add(&Value::Bool(true), &Value::Int(1)).unwrap(), Value::Int(2));
    }

    #[rstest]
    fn test_unsupported_operands_name_their_types() {
        let error = sub(&Value::from("a"), &Value::Int(1)).unwrap_err();
        assert!(
            matches!(error, Error::UnsupportedOperand { operation: "sub", ref operands } if operands == "str, int")
        );
    }

    #[rstest]
    fn test_pow_with_negative_exponent_is_float() {
        assert_eq!(pow(&Value::Int(2), &Value::Int(-1)).unwrap(), Value::Float(0.5));
        assert_eq!(pow(&Value::Int(2), &Value::Int(10)).unwrap(), Value::Int(1024));
    }

    #[rstest]
    fn test_shifts() {
        assert_eq!(lshift(&Value::Int(1), &Value::Int(4)).unwrap(), Value::Int(16));
        assert_eq!(rshift(&Value::Int(-16), &Value::Int(2)).unwrap(), Value::Int(-4));
        assert!(lshift(&Value::Int(1), &Value::Int(70)).is_err());
    }

    #[rstest]
    fn test_round_half_to_even() {
        assert_eq!(round(&Value::Float(2.5)).unwrap(), Value::Int(2));
        assert_eq!(round(&Value::Float(3.5)).unwrap(), Value::Int(4));
        assert_eq!(floor(&Value::Float(-0.5)).unwrap(), Value::Int(-1));
    }

    #[rstest]
    fn test_comparisons_across_numeric_types() {
        assert_eq!(eq(&Value::Int(1), &Value::Float(1.0)).unwrap(), Value::Bool(true));
        assert_eq!(lt(&Value::Int(1), &Value::Float(1.5)).unwrap(), Value::Bool(true));
        assert_eq!(
            ge(&Value::from(vec![1, 2]), &Value::from(vec![1])).unwrap(),
            Value::Bool(true)
        );
    }

    #[rstest]
    fn test_nan_compares_false() {
        let nan = Value::Float(f64::NAN);
        assert_eq!(lt(&nan, &Value::Int(0)).unwrap(), Value::Bool(false));
        assert_eq!(ge(&nan, &Value::Int(0)).unwrap(), Value::Bool(false));
    }

    #[rstest]
    fn test_getitem_supports_negative_indices() {
        let list = Value::from(vec![1, 2, 3]);
        assert_eq!(getitem(&list, &Value::Int(-1)).unwrap(), Value::Int(3));
        assert!(matches!(
            getitem(&list, &Value::Int(3)).unwrap_err(),
            Error::IndexOutOfRange { index: 3, length: 3 }
        ));
    }

    #[rstest]
    fn test_setitem_returns_updated_copy() {
        let list = Value::from(vec![1, 2, 3]);
        let updated = setitem(&list, &Value::Int(1), &Value::from("a")).unwrap();
        assert_eq!(
            updated,
            Value::List(vec![Value::Int(1), Value::from("a"), Value::Int(3)])
        );
        assert_eq!(list, Value::from(vec![1, 2, 3]));
    }

    #[rstest]
    fn test_delitem_on_map_requires_key() {
        let map = crate::record! { "a" => 1 };
        assert_eq!(delitem(&map, &Value::from("a")).unwrap(), crate::record! {});
        assert!(matches!(
            delitem(&map, &Value::from("b")).unwrap_err(),
            Error::KeyNotFound { .. }
        ));
    }

    #[rstest]
    fn test_contains_and_reversed() {
        let list = Value::from(vec![1, 2, 3]);
        assert_eq!(contains(&list, &Value::Float(2.0)).unwrap(), Value::Bool(true));
        assert_eq!(reversed(&list).unwrap(), Value::from(vec![3, 2, 1]));
    }

    #[rstest]
    fn test_getattr_reads_map_entries() {
        let record = crate::record! { "a" => 1 };
        assert_eq!(getattr(&record, &Value::from("a")).unwrap(), Value::Int(1));
        assert!(matches!(
            getattr(&Value::Int(1), &Value::from("a")).unwrap_err(),
            Error::AttributeNotFound { type_name: "int", .. }
        ));
    }

    #[rstest]
    fn test_matmul_is_dot_product() {
        let left = Value::from(vec![1, 2, 3]);
        let right = Value::from(vec![4, 5, 6]);
        assert_eq!(matmul(&left, &right).unwrap(), Value::Int(32));
    }
}
