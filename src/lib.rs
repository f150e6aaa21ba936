//! A FLWOR query language for navigating and filtering in-memory object
//! graphs.
//!
//! Queries are compiled once into an immutable expression tree and can then
//! be executed against any number of environments.
//!
//! ```
//! use flwor_lang::{Environment, Value, compile};
//! use flwor_lang::value::Record;
//!
//! let people = Value::List(vec![
//!     Record::new().with("name", "Ada").with("age", 36i64).into(),
//!     Record::new().with("name", "Bob").with("age", 12i64).into(),
//! ]);
//! let env = Environment::with_builtins().with("people", people);
//!
//! let query = compile("people[self.age >= 18]/name").unwrap();
//! let names = query.execute(&env).unwrap();
//! assert_eq!(names.to_string(), "<\"Ada\">");
//! ```
use thiserror::Error;
use tracing::debug;

pub mod ast;
pub mod builtins;
#[cfg(feature = "cli")]
pub mod cli;
pub mod environment;
pub mod evaluator;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod value;

pub use ast::{Expr, Token, TokenKind};
pub use environment::Environment;
pub use evaluator::{EvalError, Evaluator};
pub use lexer::{LexError, Lexer, Position, tokenize};
pub use output::{to_json, to_json_pretty};
pub use parser::{ParseError, Parser};
pub use value::Value;

/// Any failure from compiling or running a query.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl From<LexError> for Error {
    fn from(e: LexError) -> Self {
        Error::Syntax(ParseError::Lex(e))
    }
}

/// A compiled query, ready to run against environments.
///
/// The expression tree is immutable, so one compiled query can be executed
/// repeatedly and shared between threads.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    expr: Expr,
}

impl CompiledQuery {
    /// Runs the query. The environment is only read.
    pub fn execute(&self, env: &Environment) -> Result<Value, EvalError> {
        Evaluator::new().eval(&self.expr, env)
    }

    /// The compiled expression tree.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

/// Compiles query text.
pub fn compile(query: &str) -> Result<CompiledQuery, Error> {
    let expr = Parser::new(query)?.parse()?;
    debug!(query, "compiled query");
    Ok(CompiledQuery { expr })
}

/// Compiles and runs a query in one step.
pub fn execute(query: &str, env: &Environment) -> Result<Value, Error> {
    Ok(compile(query)?.execute(env)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_compiled_query_is_shareable() {
        assert_send_sync::<CompiledQuery>();
        assert_send_sync::<Environment>();
    }

    #[test]
    fn test_compile_is_deterministic() {
        let a = compile("for x in l where x > 1 return x * 2").unwrap();
        let b = compile("for x in l where x > 1 return x * 2").unwrap();
        assert_eq!(a.expr(), b.expr());
    }
}
