use crate::ast::Expr;

/// A complete `for / let / where / order by / return` expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Flwor {
    /// Independent iteration sources, combined as a cartesian product
    pub for_bindings: Vec<ForBinding>,

    /// Bound in declaration order for every row of the product
    pub let_bindings: Vec<LetBinding>,

    pub where_clause: Option<Expr>,

    pub order_by: Option<OrderBy>,

    pub output: Output,
}

/// `name in source`
#[derive(Debug, Clone, PartialEq)]
pub struct ForBinding {
    pub name: String,
    pub source: Expr,
}

/// `name = value`
#[derive(Debug, Clone, PartialEq)]
pub struct LetBinding {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub key: OrderKey,
    pub direction: Direction,
}

/// What to sort rows by: a tuple position or a named return key.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderKey {
    Position(i64),
    Name(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// The shaping clause of a FLWOR.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// `return a, b` or `return "k": a`
    Return(ReturnSpec),
    /// `return flatten f(x)`
    Flatten(Expr),
    /// One or more `collect value as key with fold`
    Collect(Vec<Collector>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReturnSpec {
    Positional(Vec<Expr>),
    Named(Vec<(String, Expr)>),
}

impl ReturnSpec {
    pub fn is_named(&self) -> bool {
        matches!(self, ReturnSpec::Named(_))
    }
}

/// `collect value as key with fold`
#[derive(Debug, Clone, PartialEq)]
pub struct Collector {
    pub value: ReturnSpec,
    pub key: Expr,
    pub with: Expr,
}
