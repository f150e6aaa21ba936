//! # FLWOR Query Language - Expression Tree
//!
//! This module defines the compiled form of a query: an immutable tree of
//! [`Expr`] nodes that the evaluator walks against an environment.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, attribute chains, operators, paths)
//! - **[operators]** - Arithmetic, comparison, boolean and set operators
//! - **[flwor]** - The `for / let / where / order by / return` structure
//! - **[function]** - Function literals
//!
//! ## Quick Start
//!
//! ```text
//! for p in <people[self.age >= 18]>
//! let name = p.name
//! order by "name" ascd
//! return "name": name, "age": p.age
//! ```
//!
//! ## Core Concepts
//!
//! ### Path Queries
//!
//! A path is a `/`-separated list of attribute names. Each step can carry a
//! predicate in brackets, evaluated with `self` bound to the candidate:
//!
//! ```text
//! o/x[self.q > 5]/y
//! ```
//!
//! Collections met along the way are expanded element by element, and the
//! final result is an ordered set without duplicates.
//!
//! ### Set Algebra
//!
//! ```text
//! a/b | a/c        // union
//! a/b & a/c        // intersection
//! a/b - a/c        // difference
//! ```
//!
//! ### FLWOR
//!
//! `for` clauses are independent of each other and combined as a cartesian
//! product. `let` clauses see every `for` variable and all earlier lets.
//!
//! ```text
//! for n in [1, 2, 3, 2, 3, 3]
//! collect n as n with function(prev, next) {
//!     if prev == None then 1 else prev + 1
//! }
//! ```
pub mod expressions;
pub mod flwor;
pub mod function;
pub mod operators;
pub mod tokens;

pub use expressions::{Attr, AttributeChain, Call, Expr, Step};
pub use flwor::{
    Collector, Direction, Flwor, ForBinding, LetBinding, OrderBy, OrderKey, Output, ReturnSpec,
};
pub use function::FunctionDef;
pub use operators::{ArithOp, BoolOp, CmpOp, MembershipOp, Quantifier, SetCmpOp, SetOp};
pub use tokens::{Token, TokenKind};
