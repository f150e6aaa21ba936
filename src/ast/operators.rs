use std::fmt;

use crate::ast::TokenKind;

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    /// Addition or concatenation (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,
    /// Multiplication (`*`)
    Multiply,
    /// True division (`/`)
    Divide,
}

impl ArithOp {
    pub fn from_token(kind: &TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Plus => Some(ArithOp::Add),
            TokenKind::Minus => Some(ArithOp::Subtract),
            TokenKind::Star => Some(ArithOp::Multiply),
            TokenKind::Slash => Some(ArithOp::Divide),
            _ => None,
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterEqual,
}

impl CmpOp {
    pub fn from_token(kind: &TokenKind) -> Option<Self> {
        match kind {
            TokenKind::EqEq => Some(CmpOp::Equal),
            TokenKind::NotEq => Some(CmpOp::NotEqual),
            TokenKind::LAngle => Some(CmpOp::LessThan),
            TokenKind::LtEq => Some(CmpOp::LessEqual),
            TokenKind::RAngle => Some(CmpOp::GreaterThan),
            TokenKind::GtEq => Some(CmpOp::GreaterEqual),
            _ => None,
        }
    }
}

/// Short-circuiting boolean connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

/// `some` / `every`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Every,
    Some,
}

/// Scalar-in-set tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipOp {
    In,
    NotIn,
}

/// Set-to-set comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetCmpOp {
    Subset,
    Superset,
    ProperSubset,
    ProperSuperset,
    Is,
    IsNot,
}

/// Set algebra over realized result sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    /// `|`
    Union,
    /// `&`
    Intersection,
    /// `-`
    Difference,
}

impl SetOp {
    pub fn from_token(kind: &TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Pipe => Some(SetOp::Union),
            TokenKind::Ampersand => Some(SetOp::Intersection),
            TokenKind::Minus => Some(SetOp::Difference),
            _ => None,
        }
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArithOp::Add => "+",
            ArithOp::Subtract => "-",
            ArithOp::Multiply => "*",
            ArithOp::Divide => "/",
        })
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CmpOp::Equal => "==",
            CmpOp::NotEqual => "!=",
            CmpOp::LessThan => "<",
            CmpOp::LessEqual => "<=",
            CmpOp::GreaterThan => ">",
            CmpOp::GreaterEqual => ">=",
        })
    }
}
