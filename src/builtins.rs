//! The prelude installed by [`Environment::with_builtins`] and the methods
//! reachable through attribute access on built-in values (`s.upper()`).

use std::cmp::Ordering;

use regex::Regex;

use crate::{
    ast::ArithOp,
    environment::Environment,
    evaluator::{EvalError, ops},
    value::{Function, Value},
};

type Method = fn(&Value, &[Value]) -> Result<Value, EvalError>;

/// Defines the prelude names in `env`.
pub fn install(env: &mut Environment) {
    env.define("None", Value::None);
    env.define("true", Value::Boolean(true));
    env.define("false", Value::Boolean(false));
    env.define("True", Value::Boolean(true));
    env.define("False", Value::Boolean(false));

    let functions: [(&str, Option<usize>, fn(&[Value]) -> Result<Value, EvalError>); 15] = [
        ("len", Some(1), builtin_len),
        ("int", Some(1), builtin_int),
        ("float", Some(1), builtin_float),
        ("str", Some(1), |args| Ok(Value::String(args[0].to_string()))),
        ("abs", Some(1), builtin_abs),
        ("sum", Some(1), builtin_sum),
        ("min", None, |args| extreme("min", args, Ordering::Less)),
        ("max", None, |args| extreme("max", args, Ordering::Greater)),
        ("list", Some(1), |args| Ok(Value::List(iterate(&args[0])?))),
        ("tuple", Some(1), |args| Ok(Value::Tuple(iterate(&args[0])?))),
        ("set", Some(1), |args| Ok(Value::Set(args[0].to_set()?))),
        ("sorted", Some(1), builtin_sorted),
        ("type", Some(1), |args| Ok(Value::String(args[0].type_name().to_string()))),
        ("hasattr", Some(2), builtin_hasattr),
        ("is_list", Some(1), |args| Ok(Value::Boolean(matches!(args[0], Value::List(_))))),
    ];
    for (name, arity, func) in functions {
        env.define(name, Function::native(name, arity, func));
    }
}

/// Resolves `receiver.name` for built-in values, returning the method as a
/// function bound to the receiver.
pub fn bound_method(receiver: &Value, name: &str) -> Option<Value> {
    let method: Method = match (receiver, name) {
        (Value::String(_), "upper") => method_upper,
        (Value::String(_), "lower") => method_lower,
        (Value::String(_), "trim" | "strip") => method_trim,
        (Value::String(_), "split") => method_split,
        (Value::String(_), "contains") => method_contains,
        (Value::String(_), "startswith") => method_startswith,
        (Value::String(_), "endswith") => method_endswith,
        (Value::String(_), "matches") => method_matches,
        (Value::List(_) | Value::Tuple(_), "count") => method_count,
        (Value::List(_) | Value::Tuple(_), "index") => method_index,
        (Value::List(_) | Value::Tuple(_), "first") => method_first,
        (Value::List(_) | Value::Tuple(_), "last") => method_last,
        (Value::Dict(_), "keys") => method_keys,
        (Value::Dict(_), "values") => method_values,
        (Value::Dict(_), "items") => method_items,
        (Value::Dict(_), "get") => method_get,
        (
            Value::String(_) | Value::List(_) | Value::Tuple(_) | Value::Dict(_) | Value::Set(_),
            "length",
        ) => method_length,
        (_, "type") => method_type,
        _ => return None,
    };

    let receiver = receiver.clone();
    Some(Value::Function(Function::native(name, None, move |args| {
        method(&receiver, args)
    })))
}

fn expect_args(method: &str, args: &[Value], count: usize) -> Result<(), EvalError> {
    if args.len() != count {
        return Err(EvalError::TypeError(format!(
            ".{}() takes {} argument(s), got {}",
            method,
            count,
            args.len()
        )));
    }
    Ok(())
}

fn string_arg<'a>(method: &str, value: &'a Value) -> Result<&'a str, EvalError> {
    value.as_str().ok_or_else(|| {
        EvalError::TypeError(format!(
            ".{}() argument must be string, got {}",
            method,
            value.type_name()
        ))
    })
}

fn iterate(value: &Value) -> Result<Vec<Value>, EvalError> {
    value
        .iter_items()
        .ok_or_else(|| EvalError::NotIterable(value.type_name().to_string()))
}

fn builtin_len(args: &[Value]) -> Result<Value, EvalError> {
    let len = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::List(items) | Value::Tuple(items) => items.len(),
        Value::Dict(map) => map.len(),
        Value::Set(set) => set.len(),
        Value::Record(record) => record.len(),
        other => iterate(other)
            .map_err(|_| EvalError::TypeError(format!("{} has no len()", other.type_name())))?
            .len(),
    };
    Ok(Value::Integer(len as i64))
}

fn builtin_int(args: &[Value]) -> Result<Value, EvalError> {
    match &args[0] {
        Value::Integer(n) => Ok(Value::Integer(*n)),
        Value::Float(f) => Ok(Value::Integer(f.trunc() as i64)),
        Value::Boolean(b) => Ok(Value::Integer(i64::from(*b))),
        Value::String(s) => s.trim().parse().map(Value::Integer).map_err(|_| {
            EvalError::TypeError(format!("invalid literal for int(): {:?}", s))
        }),
        other => Err(EvalError::TypeError(format!(
            "int() argument must be a string or a number, not {}",
            other.type_name()
        ))),
    }
}

fn builtin_float(args: &[Value]) -> Result<Value, EvalError> {
    match &args[0] {
        Value::Integer(n) => Ok(Value::Float(*n as f64)),
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Boolean(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::String(s) => s.trim().parse().map(Value::Float).map_err(|_| {
            EvalError::TypeError(format!("could not convert string to float: {:?}", s))
        }),
        other => Err(EvalError::TypeError(format!(
            "float() argument must be a string or a number, not {}",
            other.type_name()
        ))),
    }
}

fn builtin_abs(args: &[Value]) -> Result<Value, EvalError> {
    match &args[0] {
        Value::Integer(n) => n
            .checked_abs()
            .map(Value::Integer)
            .ok_or_else(|| EvalError::TypeError("integer overflow in abs()".into())),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => Err(EvalError::TypeError(format!(
            "bad operand type for abs(): {}",
            other.type_name()
        ))),
    }
}

fn builtin_sum(args: &[Value]) -> Result<Value, EvalError> {
    let mut total = Value::Integer(0);
    for item in iterate(&args[0])? {
        total = ops::arith(ArithOp::Add, &total, &item)?;
    }
    Ok(total)
}

/// `min`/`max` over a single iterable argument or over all arguments.
fn extreme(name: &str, args: &[Value], wanted: Ordering) -> Result<Value, EvalError> {
    let items = match args {
        [] => return Err(EvalError::Arity { expected: 1, got: 0 }),
        [single] => iterate(single)?,
        many => many.to_vec(),
    };
    let mut items = items.into_iter();
    let Some(mut best) = items.next() else {
        return Err(EvalError::Host(format!("{}() arg is an empty sequence", name)));
    };
    for item in items {
        if ops::order(&item, &best)? == wanted {
            best = item;
        }
    }
    Ok(best)
}

fn builtin_sorted(args: &[Value]) -> Result<Value, EvalError> {
    let items = iterate(&args[0])?;
    ops::try_sort_by(items, ops::order).map(Value::List)
}

fn builtin_hasattr(args: &[Value]) -> Result<Value, EvalError> {
    let name = string_arg("hasattr", &args[1])?;
    Ok(Value::Boolean(args[0].get_field(name).is_some()))
}

fn receiver_str<'a>(method: &str, receiver: &'a Value) -> Result<&'a str, EvalError> {
    receiver.as_str().ok_or_else(|| {
        EvalError::TypeError(format!(
            ".{}() requires string, got {}",
            method,
            receiver.type_name()
        ))
    })
}

fn method_upper(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    expect_args("upper", args, 0)?;
    Ok(Value::String(receiver_str("upper", receiver)?.to_uppercase()))
}

fn method_lower(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    expect_args("lower", args, 0)?;
    Ok(Value::String(receiver_str("lower", receiver)?.to_lowercase()))
}

fn method_trim(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    expect_args("trim", args, 0)?;
    Ok(Value::String(receiver_str("trim", receiver)?.trim().to_string()))
}

/// Splits on a delimiter, or on whitespace when called without one.
fn method_split(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let s = receiver_str("split", receiver)?;
    let parts: Vec<Value> = match args {
        [] => s.split_whitespace().map(Value::from).collect(),
        [delim] => {
            let d = string_arg("split", delim)?;
            if d.is_empty() {
                s.chars().map(|c| Value::String(c.to_string())).collect()
            } else {
                s.split(d).map(Value::from).collect()
            }
        }
        _ => return Err(EvalError::TypeError(".split() takes at most 1 argument".into())),
    };
    Ok(Value::List(parts))
}

fn method_contains(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    expect_args("contains", args, 1)?;
    let s = receiver_str("contains", receiver)?;
    Ok(Value::Boolean(s.contains(string_arg("contains", &args[0])?)))
}

fn method_startswith(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    expect_args("startswith", args, 1)?;
    let s = receiver_str("startswith", receiver)?;
    Ok(Value::Boolean(s.starts_with(string_arg("startswith", &args[0])?)))
}

fn method_endswith(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    expect_args("endswith", args, 1)?;
    let s = receiver_str("endswith", receiver)?;
    Ok(Value::Boolean(s.ends_with(string_arg("endswith", &args[0])?)))
}

fn method_matches(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    expect_args("matches", args, 1)?;
    let s = receiver_str("matches", receiver)?;
    let re = Regex::new(string_arg("matches", &args[0])?)
        .map_err(|e| EvalError::TypeError(format!("invalid regex: {e}")))?;
    Ok(Value::Boolean(re.is_match(s)))
}

fn method_length(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    expect_args("length", args, 0)?;
    builtin_len(std::slice::from_ref(receiver))
}

fn method_type(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    expect_args("type", args, 0)?;
    Ok(Value::String(receiver.type_name().to_string()))
}

fn sequence(receiver: &Value) -> &[Value] {
    match receiver {
        Value::List(items) | Value::Tuple(items) => items,
        _ => &[],
    }
}

fn method_count(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    expect_args("count", args, 1)?;
    let count = sequence(receiver).iter().filter(|item| **item == args[0]).count();
    Ok(Value::Integer(count as i64))
}

fn method_index(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    expect_args("index", args, 1)?;
    sequence(receiver)
        .iter()
        .position(|item| *item == args[0])
        .map(|i| Value::Integer(i as i64))
        .ok_or_else(|| EvalError::Host(format!("{:#} is not in {}", args[0], receiver.type_name())))
}

fn method_first(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    expect_args("first", args, 0)?;
    Ok(sequence(receiver).first().cloned().unwrap_or(Value::None))
}

fn method_last(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    expect_args("last", args, 0)?;
    Ok(sequence(receiver).last().cloned().unwrap_or(Value::None))
}

fn method_keys(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    expect_args("keys", args, 0)?;
    Ok(Value::List(iterate(receiver)?))
}

fn method_values(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    expect_args("values", args, 0)?;
    match receiver {
        Value::Dict(map) => Ok(Value::List(map.values().cloned().collect())),
        _ => Ok(Value::List(Vec::new())),
    }
}

fn method_items(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    expect_args("items", args, 0)?;
    match receiver {
        Value::Dict(map) => Ok(Value::List(
            map.iter()
                .map(|(k, v)| Value::Tuple(vec![k.clone(), v.clone()]))
                .collect(),
        )),
        _ => Ok(Value::List(Vec::new())),
    }
}

/// `d.get(key)` or `d.get(key, default)`.
fn method_get(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let (key, default) = match args {
        [key] => (key, Value::None),
        [key, default] => (key, default.clone()),
        _ => return Err(EvalError::TypeError(".get() takes 1 or 2 arguments".into())),
    };
    match receiver {
        Value::Dict(map) => Ok(map.get(key).cloned().unwrap_or(default)),
        _ => Ok(default),
    }
}
