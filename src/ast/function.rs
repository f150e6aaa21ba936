use std::sync::Arc;

use crate::ast::Expr;

/// A `function(params) { body }` literal.
///
/// The body is shared so closures created from it at evaluation time do
/// not copy the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub params: Vec<String>,
    pub body: Arc<Expr>,
}
