use std::{fmt, sync::Arc};

use indexmap::IndexMap;

use crate::{ast::Expr, environment::Environment, evaluator::EvalError, value::Value};

/// Capability interface for application-defined values.
///
/// Implement this to let queries navigate your own types. Every capability
/// except `type_name` and `get_field` is optional; the defaults report the
/// operation as unsupported.
///
/// # Examples
///
/// ```
/// use flwor_lang::value::{HostObject, Value};
///
/// #[derive(Debug)]
/// struct Point { x: i64, y: i64 }
///
/// impl HostObject for Point {
///     fn type_name(&self) -> &str { "Point" }
///
///     fn get_field(&self, name: &str) -> Option<Value> {
///         match name {
///             "x" => Some(Value::Integer(self.x)),
///             "y" => Some(Value::Integer(self.y)),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait HostObject: fmt::Debug + Send + Sync {
    fn type_name(&self) -> &str;

    /// The value of the named field, or `None` if the object has no such field.
    fn get_field(&self, name: &str) -> Option<Value>;

    /// Keyed or positional lookup (`obj[key]`).
    fn index(&self, _key: &Value) -> Result<Value, EvalError> {
        Err(EvalError::NotIndexable(self.type_name().to_string()))
    }

    /// Invocation (`obj(args)`).
    fn call(&self, _args: &[Value]) -> Result<Value, EvalError> {
        Err(EvalError::NotCallable(self.type_name().to_string()))
    }

    /// The elements of the object when it is a collection.
    fn iter(&self) -> Option<Vec<Value>> {
        None
    }
}

/// A plain object with named, insertion-ordered fields.
///
/// # Examples
///
/// ```
/// use flwor_lang::value::{Record, Value};
///
/// let point = Record::new()
///     .with("x", Value::Integer(1))
///     .with("y", Value::Integer(2));
/// assert_eq!(point.get("x"), Some(&Value::Integer(1)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().collect(),
        }
    }
}

pub type NativeFn = dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync;

/// A callable value.
#[derive(Clone)]
pub enum Function {
    /// Implemented in Rust
    Native(Arc<NativeFunction>),
    /// Created by a `function(..) { .. }` literal
    Closure(Arc<Closure>),
}

pub struct NativeFunction {
    pub name: String,
    /// Required argument count, `None` for variadic functions
    pub arity: Option<usize>,
    pub func: Box<NativeFn>,
}

/// A function literal together with the environment it was created in.
pub struct Closure {
    pub params: Vec<String>,
    pub body: Arc<Expr>,
    pub env: Environment,
    /// The `let` name the closure was bound to, visible inside its own body
    pub name: Option<String>,
}

impl Function {
    /// Wraps a Rust function as a query value.
    ///
    /// # Examples
    ///
    /// ```
    /// use flwor_lang::value::{Function, Value};
    ///
    /// let double = Function::native("double", Some(1), |args| match &args[0] {
    ///     Value::Integer(n) => Ok(Value::Integer(n * 2)),
    ///     other => Ok(other.clone()),
    /// });
    /// ```
    pub fn native<F>(name: impl Into<String>, arity: Option<usize>, func: F) -> Function
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Function::Native(Arc::new(NativeFunction {
            name: name.into(),
            arity,
            func: Box::new(func),
        }))
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Function::Native(native) => Some(&native.name),
            Function::Closure(closure) => closure.name.as_deref(),
        }
    }

    /// Identity of the underlying allocation, used for equality and hashing.
    pub(crate) fn addr(&self) -> usize {
        match self {
            Function::Native(native) => Arc::as_ptr(native) as *const () as usize,
            Function::Closure(closure) => Arc::as_ptr(closure) as *const () as usize,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Native(native) => write!(f, "<builtin {}>", native.name),
            Function::Closure(closure) => match &closure.name {
                Some(name) => write!(f, "<function {}({})>", name, closure.params.join(", ")),
                None => write!(f, "<function({})>", closure.params.join(", ")),
            },
        }
    }
}
