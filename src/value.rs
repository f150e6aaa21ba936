use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use indexmap::IndexMap;

use crate::{
    builtins,
    evaluator::{EvalError, Evaluator},
};

pub mod object;
pub mod set;

pub use object::{Closure, Function, HostObject, NativeFunction, Record};
pub use set::ResultSet;

/// A value seen by queries: either supplied by the host through the
/// environment or produced during evaluation.
///
/// # Equality
///
/// Values compare by content. `Integer` and `Float` compare numerically
/// (`1 == 1.0`), lists and tuples are never equal to each other, host
/// objects and functions compare by identity. Hashing agrees with equality,
/// so every value can live in a [`ResultSet`] or be a dictionary key.
///
/// # Examples
///
/// ```
/// use flwor_lang::value::{Record, Value};
///
/// let none = Value::None;
/// let number = Value::Integer(42);
/// let list = Value::List(vec![Value::Integer(1), Value::Float(2.5)]);
/// let person = Value::Record(Record::new().with("name", "Ada"));
///
/// assert_eq!(Value::Integer(1), Value::Float(1.0));
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    /// Absence of a value
    None,

    Boolean(bool),

    Integer(i64),

    Float(f64),

    String(String),

    /// Mutable-sequence flavour, produced by list literals and host data
    List(Vec<Value>),

    /// Immutable sequence, produced by FLWOR results and positional returns
    Tuple(Vec<Value>),

    /// Keyed mapping, iterating yields its keys
    Dict(IndexMap<Value, Value>),

    /// Ordered set of distinct values
    Set(ResultSet),

    /// Object with named fields
    Record(Record),

    /// Application-defined object
    Object(Arc<dyn HostObject>),

    Function(Function),
}

impl Value {
    /// Returns a human-readable type name
    pub fn type_name(&self) -> &str {
        match self {
            Value::None => "None",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Set(_) => "set",
            Value::Record(_) => "record",
            Value::Object(obj) => obj.type_name(),
            Value::Function(_) => "function",
        }
    }

    /// Check if the value is truthy (for conditions)
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Boolean(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(items) | Value::Tuple(items) => !items.is_empty(),
            Value::Dict(map) => !map.is_empty(),
            Value::Set(set) => !set.is_empty(),
            Value::Record(_) | Value::Object(_) | Value::Function(_) => true,
        }
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as integer, only for integral values
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Float(n) if n.fract() == 0.0 => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Looks up a named field.
    ///
    /// Records and host objects expose their own fields. Built-in values
    /// expose their methods, returned as functions bound to the receiver.
    pub fn get_field(&self, name: &str) -> Option<Value> {
        match self {
            Value::Record(record) => record.get(name).cloned(),
            Value::Object(obj) => obj.get_field(name),
            _ => builtins::bound_method(self, name),
        }
    }

    /// Keyed or positional lookup, `value[key]`.
    ///
    /// Sequences accept integer indices (negative ones count from the end),
    /// dictionaries any key, records a field name.
    pub fn index(&self, key: &Value) -> Result<Value, EvalError> {
        match self {
            Value::List(items) | Value::Tuple(items) => {
                let index = key.as_int().ok_or_else(|| {
                    EvalError::TypeError(format!(
                        "{} indices must be integers, not {}",
                        self.type_name(),
                        key.type_name()
                    ))
                })?;
                sequence_get(items, index)
                    .cloned()
                    .ok_or(EvalError::IndexOutOfRange {
                        index,
                        len: items.len(),
                    })
            }
            Value::String(s) => {
                let index = key.as_int().ok_or_else(|| {
                    EvalError::TypeError(format!(
                        "string indices must be integers, not {}",
                        key.type_name()
                    ))
                })?;
                let chars: Vec<char> = s.chars().collect();
                sequence_get(&chars, index)
                    .map(|c| Value::String(c.to_string()))
                    .ok_or(EvalError::IndexOutOfRange {
                        index,
                        len: chars.len(),
                    })
            }
            Value::Dict(map) => map
                .get(key)
                .cloned()
                .ok_or_else(|| EvalError::KeyNotFound(key.to_string())),
            Value::Record(record) => match key {
                Value::String(name) => record
                    .get(name)
                    .cloned()
                    .ok_or_else(|| EvalError::KeyNotFound(key.to_string())),
                _ => Err(EvalError::TypeError(format!(
                    "record keys must be strings, not {}",
                    key.type_name()
                ))),
            },
            Value::Object(obj) => obj.index(key),
            _ => Err(EvalError::NotIndexable(self.type_name().to_string())),
        }
    }

    /// Invokes the value with already evaluated arguments.
    pub fn call(&self, args: Vec<Value>) -> Result<Value, EvalError> {
        Evaluator::new().call_value(self, args)
    }

    /// The elements produced by iterating over the value, or `None` when the
    /// value is not iterable. Dictionaries yield their keys and strings their
    /// characters.
    pub fn iter_items(&self) -> Option<Vec<Value>> {
        match self {
            Value::List(items) | Value::Tuple(items) => Some(items.clone()),
            Value::Set(set) => Some(set.iter().cloned().collect()),
            Value::Dict(map) => Some(map.keys().cloned().collect()),
            Value::String(s) => Some(s.chars().map(|c| Value::String(c.to_string())).collect()),
            Value::Object(obj) => obj.iter(),
            _ => None,
        }
    }

    /// Membership test behind `in` / `not in`.
    pub fn contains(&self, needle: &Value) -> Result<bool, EvalError> {
        match self {
            Value::List(items) | Value::Tuple(items) => Ok(items.contains(needle)),
            Value::Set(set) => Ok(set.contains(needle)),
            Value::Dict(map) => Ok(map.contains_key(needle)),
            Value::String(haystack) => match needle {
                Value::String(s) => Ok(haystack.contains(s.as_str())),
                other => Err(EvalError::TypeError(format!(
                    "'in <string>' requires string as left operand, not {}",
                    other.type_name()
                ))),
            },
            other => match other.iter_items() {
                Some(items) => Ok(items.contains(needle)),
                None => Err(EvalError::NotIterable(other.type_name().to_string())),
            },
        }
    }

    /// Realizes the value as a result set, for set algebra and set comparison.
    pub fn to_set(&self) -> Result<ResultSet, EvalError> {
        match self {
            Value::Set(set) => Ok(set.clone()),
            other => other
                .iter_items()
                .map(|items| items.into_iter().collect())
                .ok_or_else(|| EvalError::NotIterable(other.type_name().to_string())),
        }
    }
}

fn sequence_get<T>(items: &[T], index: i64) -> Option<&T> {
    let position = if index < 0 {
        items.len().checked_sub(index.unsigned_abs() as usize)?
    } else {
        index as usize
    };
    items.get(position)
}

/// The integer a float is exactly equal to, if any.
fn float_as_int(f: f64) -> Option<i64> {
    // i64::MIN is -2^63 and exact as f64, i64::MAX rounds up to 2^63
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f)).then_some(f as i64)
}

fn object_addr(obj: &Arc<dyn HostObject>) -> usize {
    Arc::as_ptr(obj) as *const () as usize
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (None, None) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Integer(a), Float(b)) | (Float(b), Integer(a)) => float_as_int(*b) == Some(*a),
            (String(a), String(b)) => a == b,
            (List(a), List(b)) | (Tuple(a), Tuple(b)) => a == b,
            (Dict(a), Dict(b)) => a == b,
            (Set(a), Set(b)) => a == b,
            (Record(a), Record(b)) => a == b,
            (Object(a), Object(b)) => object_addr(a) == object_addr(b),
            (Function(a), Function(b)) => a.addr() == b.addr(),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::None => 0u8.hash(state),
            Value::Boolean(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            Value::Integer(n) => {
                2u8.hash(state);
                n.hash(state);
            }
            Value::Float(n) => match float_as_int(*n) {
                Some(i) => {
                    2u8.hash(state);
                    i.hash(state);
                }
                None => {
                    3u8.hash(state);
                    n.to_bits().hash(state);
                }
            },
            Value::String(s) => {
                4u8.hash(state);
                s.hash(state);
            }
            Value::List(items) => {
                5u8.hash(state);
                items.hash(state);
            }
            Value::Tuple(items) => {
                6u8.hash(state);
                items.hash(state);
            }
            // Mappings and sets compare regardless of order, so only the
            // size goes into the hash.
            Value::Dict(map) => {
                7u8.hash(state);
                map.len().hash(state);
            }
            Value::Set(set) => {
                8u8.hash(state);
                set.len().hash(state);
            }
            Value::Record(record) => {
                9u8.hash(state);
                record.len().hash(state);
            }
            Value::Object(obj) => {
                10u8.hash(state);
                object_addr(obj).hash(state);
            }
            Value::Function(func) => {
                11u8.hash(state);
                func.addr().hash(state);
            }
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Value], open: &str, close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{:#}", item)?;
    }
    if open == "(" && items.len() == 1 {
        f.write_str(",")?;
    }
    f.write_str(close)
}

/// Renders values the way they are written in queries. The alternate form
/// (`{:#}`) quotes strings and is used for nested values.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{:?}", n),
            Value::String(s) if f.alternate() => write!(f, "{:?}", s),
            Value::String(s) => f.write_str(s),
            Value::List(items) => write_seq(f, items, "[", "]"),
            Value::Tuple(items) => write_seq(f, items, "(", ")"),
            Value::Set(set) => {
                let items: Vec<Value> = set.iter().cloned().collect();
                write_seq(f, &items, "<", ">")
            }
            Value::Dict(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:#}: {:#}", k, v)?;
                }
                f.write_str("}")
            }
            Value::Record(record) => {
                f.write_str("record(")?;
                for (i, (k, v)) in record.fields().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={:#}", k, v)?;
                }
                f.write_str(")")
            }
            Value::Object(obj) => write!(f, "<{}>", obj.type_name()),
            Value::Function(func) => write!(f, "{:?}", func),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl From<ResultSet> for Value {
    fn from(set: ResultSet) -> Self {
        Value::Set(set)
    }
}

impl From<Function> for Value {
    fn from(func: Function) -> Self {
        Value::Function(func)
    }
}

impl<T: HostObject + 'static> From<Arc<T>> for Value {
    fn from(obj: Arc<T>) -> Self {
        Value::Object(obj)
    }
}
