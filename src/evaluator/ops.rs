//! Arithmetic, comparison and ordering between values.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::{
    ast::{ArithOp, CmpOp},
    evaluator::EvalError,
    value::Value,
};

/// Applies a binary arithmetic operator.
///
/// Integer operands stay integers where the result is exact, so `7 / 2` is
/// `3.5` but `6 / 3` is `2`. Mixed integer and float operands go through
/// decimal arithmetic to avoid binary rounding noise. `+` also concatenates
/// strings, lists and tuples.
pub fn arith(op: ArithOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => integer_arith(op, *a, *b),
        (Value::Float(a), Value::Float(b)) => float_arith(op, *a, *b),
        (Value::Integer(_), Value::Float(_)) | (Value::Float(_), Value::Integer(_)) => {
            mixed_arith(op, left, right)
        }
        (Value::String(a), Value::String(b)) if op == ArithOp::Add => {
            Ok(Value::String(format!("{}{}", a, b)))
        }
        (Value::List(a), Value::List(b)) if op == ArithOp::Add => {
            Ok(Value::List(a.iter().chain(b).cloned().collect()))
        }
        (Value::Tuple(a), Value::Tuple(b)) if op == ArithOp::Add => {
            Ok(Value::Tuple(a.iter().chain(b).cloned().collect()))
        }
        (a, b) => Err(EvalError::TypeError(format!(
            "unsupported operand types for {}: {} and {}",
            op,
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn integer_arith(op: ArithOp, a: i64, b: i64) -> Result<Value, EvalError> {
    let exact = match op {
        ArithOp::Add => a.checked_add(b),
        ArithOp::Subtract => a.checked_sub(b),
        ArithOp::Multiply => a.checked_mul(b),
        ArithOp::Divide => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            match a.checked_rem(b) {
                Some(0) => a.checked_div(b),
                _ => return Ok(Value::Float(a as f64 / b as f64)),
            }
        }
    };
    match exact {
        Some(n) => Ok(Value::Integer(n)),
        // Overflowed i64, fall back to floating point
        None => float_arith(op, a as f64, b as f64),
    }
}

fn float_arith(op: ArithOp, a: f64, b: f64) -> Result<Value, EvalError> {
    let result = match op {
        ArithOp::Add => a + b,
        ArithOp::Subtract => a - b,
        ArithOp::Multiply => a * b,
        ArithOp::Divide => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
    };
    Ok(Value::Float(result))
}

fn mixed_arith(op: ArithOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let (Some(a), Some(b)) = (left.as_float(), right.as_float()) else {
        return Err(EvalError::TypeError("expected numeric operands".into()));
    };
    if op == ArithOp::Divide && b == 0.0 {
        return Err(EvalError::DivisionByZero);
    }

    if let (Some(ad), Some(bd)) = (to_decimal(left), to_decimal(right)) {
        let result = match op {
            ArithOp::Add => ad.checked_add(bd),
            ArithOp::Subtract => ad.checked_sub(bd),
            ArithOp::Multiply => ad.checked_mul(bd),
            ArithOp::Divide => ad.checked_div(bd),
        };
        if let Some(result) = result {
            if result.is_integer()
                && let Some(n) = result.to_i64()
            {
                return Ok(Value::Integer(n));
            } else if let Some(f) = result.to_f64() {
                return Ok(Value::Float(f));
            }
        }
    }

    float_arith(op, a, b)
}

fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Integer(n) => Decimal::from_i64(*n),
        Value::Float(f) => Decimal::from_f64(*f),
        _ => None,
    }
}

/// Applies a comparison operator. Equality works between any two values,
/// the ordering operators need comparable operands.
pub fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool, EvalError> {
    Ok(match op {
        CmpOp::Equal => left == right,
        CmpOp::NotEqual => left != right,
        CmpOp::LessThan => order(left, right)? == Ordering::Less,
        CmpOp::LessEqual => order(left, right)? != Ordering::Greater,
        CmpOp::GreaterThan => order(left, right)? == Ordering::Greater,
        CmpOp::GreaterEqual => order(left, right)? != Ordering::Less,
    })
}

/// Total order between two comparable values.
///
/// Numbers order numerically across integer and float, strings and booleans
/// by their natural order, lists and tuples element-wise. Anything else is a
/// type error.
pub fn order(left: &Value, right: &Value) -> Result<Ordering, EvalError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(a.cmp(b)),
        (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
            let (a, b) = (left.as_float(), right.as_float());
            a.partial_cmp(&b)
                .ok_or_else(|| EvalError::TypeError("cannot order NaN".into()))
        }
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Ok(a.cmp(b)),
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            for (x, y) in a.iter().zip(b) {
                if x != y {
                    return order(x, y);
                }
            }
            Ok(a.len().cmp(&b.len()))
        }
        (a, b) => Err(EvalError::TypeError(format!(
            "'<' not supported between {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

/// Stable merge sort with a comparator that may fail. The first comparison
/// error aborts the sort.
pub fn try_sort_by<T, F>(items: Vec<T>, mut compare: F) -> Result<Vec<T>, EvalError>
where
    F: FnMut(&T, &T) -> Result<Ordering, EvalError>,
{
    merge_sort(items, &mut compare)
}

fn merge_sort<T, F>(mut items: Vec<T>, compare: &mut F) -> Result<Vec<T>, EvalError>
where
    F: FnMut(&T, &T) -> Result<Ordering, EvalError>,
{
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, compare)?;
    let right = merge_sort(right, compare)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        // Equal elements keep the left one first
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(r, l)? == Ordering::Less,
            _ => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_division() {
        let exact = arith(ArithOp::Divide, &Value::Integer(6), &Value::Integer(3)).unwrap();
        assert!(matches!(exact, Value::Integer(2)));

        let inexact = arith(ArithOp::Divide, &Value::Integer(7), &Value::Integer(2)).unwrap();
        assert!(matches!(inexact, Value::Float(f) if f == 3.5));

        assert_eq!(
            arith(ArithOp::Divide, &Value::Integer(1), &Value::Integer(0)),
            Err(EvalError::DivisionByZero)
        );
    }

    #[test]
    fn test_mixed_arithmetic_avoids_binary_noise() {
        let sum = arith(ArithOp::Add, &Value::Float(0.1), &Value::Integer(1)).unwrap();
        assert_eq!(sum, Value::Float(1.1));
    }

    #[test]
    fn test_overflow_falls_back_to_float() {
        let result = arith(ArithOp::Multiply, &Value::Integer(i64::MAX), &Value::Integer(2)).unwrap();
        assert!(matches!(result, Value::Float(_)));
    }

    #[test]
    fn test_concatenation() {
        let s = arith(ArithOp::Add, &"ab".into(), &"cd".into()).unwrap();
        assert_eq!(s, Value::from("abcd"));

        let err = arith(ArithOp::Subtract, &"ab".into(), &"cd".into());
        assert!(matches!(err, Err(EvalError::TypeError(_))));
    }

    #[test]
    fn test_order() {
        assert_eq!(order(&Value::Integer(1), &Value::Float(1.5)).unwrap(), Ordering::Less);
        assert_eq!(order(&"b".into(), &"a".into()).unwrap(), Ordering::Greater);

        let a = Value::Tuple(vec![Value::Integer(1), Value::Integer(2)]);
        let b = Value::Tuple(vec![Value::Integer(1), Value::Integer(3)]);
        assert_eq!(order(&a, &b).unwrap(), Ordering::Less);

        assert!(order(&Value::None, &Value::Integer(1)).is_err());
    }

    #[test]
    fn test_try_sort_is_stable() {
        let pairs = vec![(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd'), (0, 'e')];
        let sorted = try_sort_by(pairs, |a, b| Ok(a.0.cmp(&b.0))).unwrap();
        let labels: String = sorted.into_iter().map(|(_, c)| c).collect();
        assert_eq!(labels, "ebdac");
    }

    #[test]
    fn test_try_sort_reports_incomparable_values() {
        let mixed: Vec<Value> = (0..40)
            .map(|i| {
                if i % 3 == 0 {
                    Value::String(format!("s{}", i))
                } else {
                    Value::Integer(40 - i)
                }
            })
            .collect();
        assert!(matches!(
            try_sort_by(mixed, order),
            Err(EvalError::TypeError(_))
        ));
    }
}
