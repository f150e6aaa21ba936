use std::sync::Arc;

use thiserror::Error;
use tracing::trace;

use crate::{
    ast::{Attr, AttributeChain, BoolOp, Call, Expr, MembershipOp, Quantifier, SetCmpOp, SetOp},
    environment::Environment,
    value::{Closure, Function, Value},
};

mod flwor;
pub mod ops;
mod path;

/// Errors that can occur during query evaluation.
///
/// Evaluation never recovers from an error: the first one raised, in
/// left-to-right evaluation order, aborts the whole query.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A named field is absent on the object it was requested from
    #[error("Attribute error: {holder} has no attribute '{name}'")]
    AttributeLookup { holder: String, name: String },

    /// The first name of an attribute chain is not bound
    #[error("Name error: '{0}' is not defined")]
    UnboundName(String),

    /// Function called with the wrong number of arguments
    #[error("Arity error: expected {expected} arguments, got {got}")]
    Arity { expected: usize, got: usize },

    /// Type mismatch or invalid operation for the given type
    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Type error: {0} is not callable")]
    NotCallable(String),

    #[error("Type error: {0} is not indexable")]
    NotIndexable(String),

    #[error("Type error: {0} is not iterable")]
    NotIterable(String),

    #[error("Key error: {0}")]
    KeyNotFound(String),

    #[error("Index error: index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("Division by zero")]
    DivisionByZero,

    /// Query shape problems only detectable while running, such as ordering
    /// by a name when the return values are positional
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Raised by host objects and builtin functions
    #[error("{0}")]
    Host(String),
}

/// Interprets expression trees.
///
/// Evaluation is a pure function of the expression and the environment: the
/// evaluator holds no state, and nested scopes are introduced by binding
/// into a copy of the environment.
///
/// # Examples
///
/// ```
/// use flwor_lang::{Environment, Evaluator, Value};
/// use flwor_lang::parser::Parser;
///
/// let expr = Parser::new("for x in [1, 2, 3] where x > 1 return x")
///     .unwrap()
///     .parse()
///     .unwrap();
///
/// let result = Evaluator::new().eval(&expr, &Environment::new()).unwrap();
/// assert_eq!(result, Value::Tuple(vec![Value::Integer(2), Value::Integer(3)]));
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Evaluator
    }

    /// Evaluates an expression against an environment.
    pub fn eval(&self, expr: &Expr, env: &Environment) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Attribute(chain) => self.eval_attribute(chain, env),
            Expr::Arith { op, left, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                ops::arith(*op, &left, &right)
            }
            Expr::Compare { left, op, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                ops::compare(*op, &left, &right).map(Value::Boolean)
            }
            Expr::Boolean { op, left, right } => {
                let left = self.eval(left, env)?.is_truthy();
                let result = match op {
                    BoolOp::And => left && self.eval(right, env)?.is_truthy(),
                    BoolOp::Or => left || self.eval(right, env)?.is_truthy(),
                };
                Ok(Value::Boolean(result))
            }
            Expr::Not(inner) => Ok(Value::Boolean(!self.eval(inner, env)?.is_truthy())),
            Expr::Quantified {
                mode,
                name,
                source,
                predicate,
            } => self
                .eval_quantified(*mode, name, source, predicate, env)
                .map(Value::Boolean),
            Expr::Membership { value, op, set } => {
                let value = self.eval(value, env)?;
                let found = self.eval(set, env)?.contains(&value)?;
                Ok(Value::Boolean(match op {
                    MembershipOp::In => found,
                    MembershipOp::NotIn => !found,
                }))
            }
            Expr::SetCompare { op, left, right } => {
                let left = self.eval(left, env)?.to_set()?;
                let right = self.eval(right, env)?.to_set()?;
                let result = match op {
                    SetCmpOp::Subset => left.is_subset(&right),
                    SetCmpOp::Superset => left.is_superset(&right),
                    SetCmpOp::ProperSubset => left.is_proper_subset(&right),
                    SetCmpOp::ProperSuperset => left.is_proper_superset(&right),
                    SetCmpOp::Is => left == right,
                    SetCmpOp::IsNot => left != right,
                };
                Ok(Value::Boolean(result))
            }
            Expr::SetAlgebra { op, left, right } => {
                let left = self.eval(left, env)?.to_set()?;
                let right = self.eval(right, env)?.to_set()?;
                let result = match op {
                    SetOp::Union => left.union(&right),
                    SetOp::Intersection => left.intersection(&right),
                    SetOp::Difference => left.difference(&right),
                };
                Ok(Value::Set(result))
            }
            Expr::Path(steps) => self.eval_path(steps, env).map(Value::Set),
            Expr::Collection(inner) => self.eval(inner, env),
            Expr::Dict(pairs) => {
                let mut map = indexmap::IndexMap::new();
                for (key, value) in pairs {
                    let key = self.eval(key, env)?;
                    let value = self.eval(value, env)?;
                    map.insert(key, value);
                }
                Ok(Value::Dict(map))
            }
            Expr::List(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    list.push(self.eval(item, env)?);
                }
                Ok(Value::List(list))
            }
            Expr::If {
                condition,
                then,
                otherwise,
            } => {
                if self.eval(condition, env)?.is_truthy() {
                    self.eval(then, env)
                } else {
                    self.eval(otherwise, env)
                }
            }
            Expr::Function(def) => Ok(Value::Function(Function::Closure(Arc::new(Closure {
                params: def.params.clone(),
                body: Arc::clone(&def.body),
                env: env.clone(),
                name: None,
            })))),
            Expr::Flwor(flwor) => self.eval_flwor(flwor, env),
        }
    }

    /// `some` short-circuits on the first success. `every` evaluates the
    /// predicate for every element. An empty source makes both false.
    fn eval_quantified(
        &self,
        mode: Quantifier,
        name: &str,
        source: &Expr,
        predicate: &Expr,
        env: &Environment,
    ) -> Result<bool, EvalError> {
        let source = self.eval(source, env)?;
        if !source.is_truthy() {
            return Ok(false);
        }
        let items = source
            .iter_items()
            .ok_or_else(|| EvalError::NotIterable(source.type_name().to_string()))?;

        match mode {
            Quantifier::Every => {
                let mut all = true;
                for item in items {
                    if !self.eval(predicate, &env.bind(name, item))?.is_truthy() {
                        all = false;
                    }
                }
                Ok(all)
            }
            Quantifier::Some => {
                for item in items {
                    if self.eval(predicate, &env.bind(name, item))?.is_truthy() {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    fn eval_attribute(&self, chain: &AttributeChain, env: &Environment) -> Result<Value, EvalError> {
        let Some((first, rest)) = chain.attrs.split_first() else {
            return Err(EvalError::TypeError("empty attribute chain".into()));
        };

        let base = env
            .get(&first.name)
            .cloned()
            .ok_or_else(|| EvalError::UnboundName(first.name.clone()))?;
        let mut current = self.apply_calls(base, first, env)?;

        for attr in rest {
            let field = current
                .get_field(&attr.name)
                .ok_or_else(|| EvalError::AttributeLookup {
                    holder: current.type_name().to_string(),
                    name: attr.name.clone(),
                })?;
            current = self.apply_calls(field, attr, env)?;
        }
        Ok(current)
    }

    /// Applies an attribute's calls and index lookups left to right.
    /// Arguments are evaluated in the current environment.
    fn apply_calls(&self, mut value: Value, attr: &Attr, env: &Environment) -> Result<Value, EvalError> {
        for call in &attr.calls {
            value = match call {
                Call::Index(key) => {
                    let key = self.eval(key, env)?;
                    value.index(&key)?
                }
                Call::Invoke(args) => {
                    let mut evaluated = Vec::with_capacity(args.len());
                    for arg in args {
                        evaluated.push(self.eval(arg, env)?);
                    }
                    self.call_value(&value, evaluated)?
                }
            };
        }
        Ok(value)
    }

    /// Invokes a callable value.
    pub fn call_value(&self, callee: &Value, args: Vec<Value>) -> Result<Value, EvalError> {
        match callee {
            Value::Function(Function::Native(native)) => {
                if let Some(expected) = native.arity
                    && expected != args.len()
                {
                    return Err(EvalError::Arity {
                        expected,
                        got: args.len(),
                    });
                }
                (native.func)(&args)
            }
            Value::Function(Function::Closure(closure)) => self.invoke_closure(closure, args),
            Value::Object(obj) => obj.call(&args),
            other => Err(EvalError::NotCallable(other.type_name().to_string())),
        }
    }

    fn invoke_closure(&self, closure: &Arc<Closure>, args: Vec<Value>) -> Result<Value, EvalError> {
        if closure.params.len() != args.len() {
            return Err(EvalError::Arity {
                expected: closure.params.len(),
                got: args.len(),
            });
        }
        trace!(name = ?closure.name, arity = args.len(), "invoking closure");

        let mut env = closure.env.clone();
        if let Some(name) = &closure.name {
            env = env.bind(name.as_str(), Value::Function(Function::Closure(Arc::clone(closure))));
        }
        for (param, arg) in closure.params.iter().zip(args) {
            env = env.bind(param.as_str(), arg);
        }
        self.eval(&closure.body, &env)
    }
}
