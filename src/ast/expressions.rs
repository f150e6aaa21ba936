use crate::{
    ast::{
        ArithOp, BoolOp, CmpOp, Flwor, FunctionDef, MembershipOp, Quantifier, SetCmpOp, SetOp,
    },
    value::Value,
};

/// Compiled expression tree node.
///
/// Built once by the parser and never mutated afterwards; the evaluator
/// interprets it against an environment as many times as needed.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Number or string literal
    ///
    /// # Example
    /// ```text
    /// 42
    /// "hello"
    /// ```
    Literal(Value),

    /// Dotted attribute chain with calls and index lookups
    ///
    /// # Example
    /// ```text
    /// x.y(1, 2)[0].z
    /// ```
    Attribute(AttributeChain),

    /// Arithmetic operation
    Arith {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Comparison
    Compare {
        left: Box<Expr>,
        op: CmpOp,
        right: Box<Expr>,
    },

    /// `and` / `or`, right operand evaluated only when needed
    Boolean {
        op: BoolOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `not`
    Not(Box<Expr>),

    /// Quantified predicate
    ///
    /// # Example
    /// ```text
    /// every x in <a/b> satisfies (x > 1)
    /// ```
    Quantified {
        mode: Quantifier,
        name: String,
        source: Box<Expr>,
        predicate: Box<Expr>,
    },

    /// `value in set` / `value not in set`
    Membership {
        value: Box<Expr>,
        op: MembershipOp,
        set: Box<Expr>,
    },

    /// `<a> subset <b>` and friends
    SetCompare {
        op: SetCmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Union, intersection, difference
    SetAlgebra {
        op: SetOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Path query
    ///
    /// # Example
    /// ```text
    /// o/x[self.q == 5]/y
    /// ```
    Path(Vec<Step>),

    /// Parenthesized set expression
    Collection(Box<Expr>),

    /// Dictionary literal, keys and values are both expressions
    Dict(Vec<(Expr, Expr)>),

    /// List literal
    List(Vec<Expr>),

    /// Conditional; only the chosen branch is evaluated
    If {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },

    /// Function literal
    Function(FunctionDef),

    /// FLWOR sequence
    Flwor(Box<Flwor>),
}

/// One step of a path query: an entity name and an optional predicate
/// evaluated with `self` bound to each candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub name: String,
    pub predicate: Option<Expr>,
}

/// A dotted sequence of attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeChain {
    pub attrs: Vec<Attr>,
}

/// A name followed by zero or more calls, e.g. `f(1)[0]()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub name: String,
    pub calls: Vec<Call>,
}

/// An operation applied to the value of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// `( args )`
    Invoke(Vec<Expr>),
    /// `[ key ]`
    Index(Box<Expr>),
}

impl Expr {
    pub fn arith(op: ArithOp, left: Expr, right: Expr) -> Expr {
        Expr::Arith {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// A bare name, the simplest attribute chain.
    pub fn name(name: impl Into<String>) -> Expr {
        Expr::Attribute(AttributeChain {
            attrs: vec![Attr {
                name: name.into(),
                calls: Vec::new(),
            }],
        })
    }
}
