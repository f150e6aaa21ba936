//! JSON rendering of query results.
//!
//! Output is deterministic: dictionary and record keys are sorted. Sets and
//! tuples render as arrays, non-string dictionary keys are stringified, and
//! values with no JSON form (functions, host objects) render as a descriptive
//! string.
//!
//! # Examples
//!
//! ```
//! use flwor_lang::Value;
//! use flwor_lang::output::{to_json, to_json_pretty};
//!
//! let value = Value::Tuple(vec![Value::Integer(1), Value::from("a")]);
//!
//! assert_eq!(to_json(&value), r#"[1,"a"]"#);
//! assert_eq!(to_json_pretty(&value), "[\n  1,\n  \"a\"\n]");
//! ```

use crate::value::Value;

pub struct JsonPrinter {
    pretty: bool,
}

impl JsonPrinter {
    pub fn new(pretty: bool) -> Self {
        JsonPrinter { pretty }
    }

    pub fn print(&self, value: &Value) -> String {
        self.print_value(value, 0)
    }

    fn print_value(&self, value: &Value, indent: usize) -> String {
        match value {
            Value::None => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Float(n) if n.is_finite() => format!("{:?}", n),
            Value::Float(_) => "null".to_string(),
            Value::String(s) => format!("\"{}\"", self.escape_string(s)),
            Value::List(items) | Value::Tuple(items) => self.print_array(items.iter(), indent),
            Value::Set(set) => self.print_array(set.iter(), indent),
            Value::Dict(map) => {
                let entries = map.iter().map(|(k, v)| (key_string(k), v)).collect();
                self.print_object(entries, indent)
            }
            Value::Record(record) => {
                let entries = record.fields().map(|(k, v)| (k.clone(), v)).collect();
                self.print_object(entries, indent)
            }
            Value::Object(obj) => format!("\"<{}>\"", self.escape_string(obj.type_name())),
            Value::Function(_) => "\"<function>\"".to_string(),
        }
    }

    fn print_array<'a>(&self, items: impl ExactSizeIterator<Item = &'a Value>, indent: usize) -> String {
        if items.len() == 0 {
            return "[]".to_string();
        }

        if self.pretty {
            let items: Vec<String> = items
                .map(|v| format!("{}{}", self.indent(indent + 1), self.print_value(v, indent + 1)))
                .collect();
            format!("[\n{}\n{}]", items.join(",\n"), self.indent(indent))
        } else {
            let items: Vec<String> = items.map(|v| self.print_value(v, indent)).collect();
            format!("[{}]", items.join(","))
        }
    }

    fn print_object(&self, mut entries: Vec<(String, &Value)>, indent: usize) -> String {
        if entries.is_empty() {
            return "{}".to_string();
        }

        // Sort keys for deterministic output
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        if self.pretty {
            let items: Vec<String> = entries
                .iter()
                .map(|(k, v)| {
                    format!(
                        "{}\"{}\": {}",
                        self.indent(indent + 1),
                        self.escape_string(k),
                        self.print_value(v, indent + 1)
                    )
                })
                .collect();
            format!("{{\n{}\n{}}}", items.join(",\n"), self.indent(indent))
        } else {
            let items: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("\"{}\":{}", self.escape_string(k), self.print_value(v, indent)))
                .collect();
            format!("{{{}}}", items.join(","))
        }
    }

    fn indent(&self, level: usize) -> String {
        "  ".repeat(level)
    }

    fn escape_string(&self, s: &str) -> String {
        s.chars()
            .flat_map(|c| match c {
                '"' => vec!['\\', '"'],
                '\\' => vec!['\\', '\\'],
                '\n' => vec!['\\', 'n'],
                '\r' => vec!['\\', 'r'],
                '\t' => vec!['\\', 't'],
                c if c.is_control() => format!("\\u{:04x}", c as u32).chars().collect(),
                c => vec![c],
            })
            .collect()
    }
}

/// JSON object keys must be strings.
fn key_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Converts a value to compact JSON.
pub fn to_json(value: &Value) -> String {
    JsonPrinter::new(false).print(value)
}

/// Converts a value to JSON with 2-space indentation.
pub fn to_json_pretty(value: &Value) -> String {
    JsonPrinter::new(true).print(value)
}
