//! JSON input to query values

use crate::{Environment, value::Value};

/// Converts parsed JSON into a query value.
///
/// Objects become records so that both `a.b` and the path `a/b` reach their
/// fields.
pub fn json_to_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::None,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::None),
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::List(arr.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(obj) => Value::Record(
            obj.into_iter()
                .map(|(k, v)| (k, json_to_value(v)))
                .collect(),
        ),
    }
}

/// Builds the query environment for a JSON document.
///
/// The top-level keys of an object become bindings; any other document is
/// bound as `input`.
pub fn bindings_from_json(v: serde_json::Value, builtins: bool) -> Environment {
    let mut env = if builtins {
        Environment::with_builtins()
    } else {
        Environment::new()
    };
    match v {
        serde_json::Value::Object(obj) => {
            for (name, value) in obj {
                env.define(name, json_to_value(value));
            }
        }
        other => env.define("input", json_to_value(other)),
    }
    env
}
