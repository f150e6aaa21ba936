//! Execute queries against JSON input

use tracing::debug;

use super::{CliError, bindings_from_json};
use crate::{Environment, Parser, Value, compile};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The query to execute
    pub query: String,
    /// JSON input string
    pub input: Option<String>,
    /// Pretty-print the output
    pub pretty: bool,
    /// Only validate syntax, don't execute
    pub syntax_only: bool,
    /// Seed the environment with the prelude
    pub builtins: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Query executed successfully
    Success(Value),
}

/// Execute a check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    if options.syntax_only {
        Parser::new(&options.query)?.parse()?;
        return Ok(CheckResult::SyntaxValid);
    }

    let query = compile(&options.query).map_err(|e| match e {
        crate::Error::Syntax(e) => CliError::Parse(e),
        crate::Error::Eval(e) => CliError::Eval(e),
    })?;

    let env = match &options.input {
        Some(json) => {
            let document: serde_json::Value = serde_json::from_str(json)?;
            bindings_from_json(document, options.builtins)
        }
        None if options.builtins => Environment::with_builtins(),
        None => Environment::new(),
    };
    debug!(input = options.input.is_some(), "executing query");

    Ok(CheckResult::Success(query.execute(&env)?))
}
