// tests/parser_tests.rs

use flwor_lang::ast::{
    ArithOp, Attr, AttributeChain, BoolOp, Call, CmpOp, Direction, Expr, Flwor, MembershipOp,
    OrderKey, Output, Quantifier, ReturnSpec, SetCmpOp, SetOp,
};
use flwor_lang::parser::{ParseError, Parser};
use flwor_lang::value::Value;
use rstest::rstest;

fn parse(input: &str) -> Result<Expr, ParseError> {
    Parser::new(input)?.parse()
}

fn parse_ok(input: &str) -> Expr {
    parse(input).unwrap_or_else(|e| panic!("failed to parse {:?}: {}", input, e))
}

fn flwor(input: &str) -> Flwor {
    match parse_ok(input) {
        Expr::Flwor(flwor) => *flwor,
        other => panic!("expected a FLWOR, got {:?}", other),
    }
}

/// Parses `return <expr>` and hands back the single returned expression.
fn expr(input: &str) -> Expr {
    match flwor(&format!("return {}", input)).output {
        Output::Return(ReturnSpec::Positional(mut values)) if values.len() == 1 => values.remove(0),
        other => panic!("expected a single positional return, got {:?}", other),
    }
}

fn int(n: i64) -> Expr {
    Expr::Literal(Value::Integer(n))
}

fn name(n: &str) -> Expr {
    Expr::name(n)
}

fn path(names: &[&str]) -> Expr {
    Expr::Path(
        names
            .iter()
            .map(|n| flwor_lang::ast::Step {
                name: n.to_string(),
                predicate: None,
            })
            .collect(),
    )
}

fn set_op(op: SetOp, left: Expr, right: Expr) -> Expr {
    Expr::SetAlgebra {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_multiplication_binds_tighter() {
    assert_eq!(
        expr("2 + 3 * 4"),
        Expr::arith(ArithOp::Add, int(2), Expr::arith(ArithOp::Multiply, int(3), int(4)))
    );
}

#[test]
fn test_parentheses_override_precedence() {
    assert_eq!(
        expr("(2 + 3) * 4"),
        Expr::arith(ArithOp::Multiply, Expr::arith(ArithOp::Add, int(2), int(3)), int(4))
    );
}

#[rstest]
#[case("10 - 4 - 3", ArithOp::Subtract)]
#[case("8 / 4 / 2", ArithOp::Divide)]
fn test_left_associative(#[case] input: &str, #[case] op: ArithOp) {
    let Expr::Arith { op: outer, left, .. } = expr(input) else {
        panic!("expected arithmetic");
    };
    assert_eq!(outer, op);
    assert!(matches!(*left, Expr::Arith { op: inner, .. } if inner == op));
}

#[test]
fn test_unary_minus() {
    assert_eq!(expr("-5"), int(-5));
    assert_eq!(expr("-2.5"), Expr::Literal(Value::Float(-2.5)));
    assert_eq!(expr("-x"), Expr::arith(ArithOp::Subtract, int(0), name("x")));
    assert_eq!(
        expr("3 * -2"),
        Expr::arith(ArithOp::Multiply, int(3), int(-2))
    );
}

// ============================================================================
// Predicates
// ============================================================================

#[rstest]
#[case("a == b", CmpOp::Equal)]
#[case("a != b", CmpOp::NotEqual)]
#[case("a < b", CmpOp::LessThan)]
#[case("a <= b", CmpOp::LessEqual)]
#[case("a > b", CmpOp::GreaterThan)]
#[case("a >= b", CmpOp::GreaterEqual)]
fn test_comparisons(#[case] input: &str, #[case] op: CmpOp) {
    assert_eq!(
        expr(input),
        Expr::Compare {
            left: Box::new(name("a")),
            op,
            right: Box::new(name("b")),
        }
    );
}

#[test]
fn test_and_binds_tighter_than_or() {
    let Expr::Boolean { op, right, .. } = expr("a or b and c") else {
        panic!("expected a boolean expression");
    };
    assert_eq!(op, BoolOp::Or);
    assert!(matches!(*right, Expr::Boolean { op: BoolOp::And, .. }));
}

#[test]
fn test_not() {
    assert_eq!(
        expr("not a == 1"),
        Expr::Not(Box::new(Expr::Compare {
            left: Box::new(name("a")),
            op: CmpOp::Equal,
            right: Box::new(int(1)),
        }))
    );
}

#[rstest]
#[case("x in l", MembershipOp::In)]
#[case("x not in l", MembershipOp::NotIn)]
fn test_membership(#[case] input: &str, #[case] op: MembershipOp) {
    assert_eq!(
        expr(input),
        Expr::Membership {
            value: Box::new(name("x")),
            op,
            set: Box::new(name("l")),
        }
    );
}

#[rstest]
#[case("<a> subset <b>", SetCmpOp::Subset)]
#[case("<a> superset <b>", SetCmpOp::Superset)]
#[case("<a> proper subset <b>", SetCmpOp::ProperSubset)]
#[case("<a> proper superset <b>", SetCmpOp::ProperSuperset)]
#[case("<a> is <b>", SetCmpOp::Is)]
#[case("<a> is not <b>", SetCmpOp::IsNot)]
fn test_set_comparisons(#[case] input: &str, #[case] op: SetCmpOp) {
    assert_eq!(
        expr(input),
        Expr::SetCompare {
            op,
            left: Box::new(Expr::Collection(Box::new(path(&["a"])))),
            right: Box::new(Expr::Collection(Box::new(path(&["b"])))),
        }
    );
}

#[test]
fn test_quantified() {
    let parsed = expr("every x in <a/b> satisfies (x > 1)");
    let Expr::Quantified {
        mode,
        name: binder,
        source,
        predicate,
    } = parsed
    else {
        panic!("expected a quantified expression");
    };
    assert_eq!(mode, Quantifier::Every);
    assert_eq!(binder, "x");
    assert_eq!(*source, Expr::Collection(Box::new(path(&["a", "b"]))));
    assert!(matches!(*predicate, Expr::Compare { op: CmpOp::GreaterThan, .. }));

    assert!(matches!(
        expr("some y in {for z in l return z} satisfies (y)"),
        Expr::Quantified { mode: Quantifier::Some, .. }
    ));
}

#[test]
fn test_attribute_chain_with_calls() {
    assert_eq!(
        expr("f(1)(2)[0].x"),
        Expr::Attribute(AttributeChain {
            attrs: vec![
                Attr {
                    name: "f".into(),
                    calls: vec![
                        Call::Invoke(vec![int(1)]),
                        Call::Invoke(vec![int(2)]),
                        Call::Index(Box::new(int(0))),
                    ],
                },
                Attr {
                    name: "x".into(),
                    calls: vec![],
                },
            ],
        })
    );
}

#[test]
fn test_literals() {
    assert_eq!(expr("[]"), Expr::List(vec![]));
    assert_eq!(expr("[1, a]"), Expr::List(vec![int(1), name("a")]));
    assert_eq!(
        expr("{\"k\": 1, 2: b}"),
        Expr::Dict(vec![
            (Expr::Literal(Value::from("k")), int(1)),
            (int(2), name("b")),
        ])
    );
    assert_eq!(expr("{}"), Expr::Dict(vec![]));
}

#[test]
fn test_brace_followed_by_flwor_keyword_is_nested_query() {
    assert!(matches!(expr("{for x in l return x}"), Expr::Flwor(_)));
    assert!(matches!(expr("{return 1}"), Expr::Flwor(_)));
    assert!(matches!(expr("{x: 1}"), Expr::Dict(_)));
}

#[test]
fn test_if_and_function() {
    assert!(matches!(expr("if a then 1 else 2"), Expr::If { .. }));

    let Expr::Function(def) = expr("function(a, b) { a + b }") else {
        panic!("expected a function literal");
    };
    assert_eq!(def.params, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(*def.body, Expr::arith(ArithOp::Add, name("a"), name("b")));

    let Expr::Function(def) = expr("function() { for x in l return x }") else {
        panic!("expected a function literal");
    };
    assert!(def.params.is_empty());
    assert!(matches!(*def.body, Expr::Flwor(_)));
}

// ============================================================================
// Set Expressions
// ============================================================================

#[test]
fn test_path() {
    assert_eq!(parse_ok("a/b/c"), path(&["a", "b", "c"]));

    let Expr::Path(steps) = parse_ok("o/x[self.q > 5]/y") else {
        panic!("expected a path");
    };
    assert_eq!(steps.len(), 3);
    assert!(steps[0].predicate.is_none());
    assert!(matches!(steps[1].predicate, Some(Expr::Compare { .. })));
}

#[test]
fn test_set_operator_precedence() {
    // & binds tighter than |, which binds tighter than -
    assert_eq!(
        parse_ok("a | b & c"),
        set_op(
            SetOp::Union,
            path(&["a"]),
            set_op(SetOp::Intersection, path(&["b"]), path(&["c"]))
        )
    );
    assert_eq!(
        parse_ok("a - b | c"),
        set_op(
            SetOp::Difference,
            path(&["a"]),
            set_op(SetOp::Union, path(&["b"]), path(&["c"]))
        )
    );
    assert_eq!(
        parse_ok("(a | b) & c"),
        set_op(
            SetOp::Intersection,
            Expr::Collection(Box::new(set_op(SetOp::Union, path(&["a"]), path(&["b"])))),
            path(&["c"])
        )
    );
}

// ============================================================================
// FLWOR
// ============================================================================

#[test]
fn test_flwor_clauses() {
    let f = flwor(
        "for x in l, y in <a/b> let z = x + 1 let w = z where z > 1 order by \"n\" desc return \"n\": z, \"m\": w",
    );
    assert_eq!(f.for_bindings.len(), 2);
    assert_eq!(f.for_bindings[1].name, "y");
    assert_eq!(f.let_bindings.len(), 2);
    assert_eq!(f.let_bindings[1].name, "w");
    assert!(f.where_clause.is_some());

    let order = f.order_by.unwrap();
    assert_eq!(order.key, OrderKey::Name("n".into()));
    assert_eq!(order.direction, Direction::Descending);

    let Output::Return(ReturnSpec::Named(pairs)) = f.output else {
        panic!("expected named return");
    };
    assert_eq!(pairs[0].0, "n");
    assert_eq!(pairs[1].0, "m");
}

#[test]
fn test_let_list_with_commas() {
    let f = flwor("let a = 1, b = a return b");
    assert_eq!(f.let_bindings.len(), 2);
    assert!(f.for_bindings.is_empty());
}

#[test]
fn test_positional_return() {
    let f = flwor("for x in l order by 1 ascd return x, \"label\"");
    assert_eq!(f.order_by.unwrap().key, OrderKey::Position(1));
    let Output::Return(ReturnSpec::Positional(values)) = f.output else {
        panic!("expected positional return");
    };
    assert_eq!(values, vec![name("x"), Expr::Literal(Value::from("label"))]);
}

#[test]
fn test_flatten_and_collect() {
    assert!(matches!(
        flwor("for x in l return flatten f(x)").output,
        Output::Flatten(_)
    ));

    let f = flwor("for x in l collect x as x with f collect x, 1 as 0 with g");
    let Output::Collect(collectors) = f.output else {
        panic!("expected collect");
    };
    assert_eq!(collectors.len(), 2);
    assert_eq!(collectors[0].with, name("f"));
    assert!(matches!(&collectors[1].value, ReturnSpec::Positional(v) if v.len() == 2));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_trailing_input_is_rejected() {
    assert!(parse("hello/hello").is_ok());
    match parse("hello hello") {
        Err(ParseError::UnexpectedToken { found, position, .. }) => {
            assert_eq!(found, "'hello'");
            assert_eq!(position.column, 7);
        }
        other => panic!("expected a syntax error, got {:?}", other),
    }
}

#[rstest]
#[case("for x in l")]
#[case("a/")]
#[case("return 1 +")]
#[case("return f(1")]
#[case("for x in l return \"k\":")]
fn test_unexpected_end_of_input(#[case] input: &str) {
    assert!(
        matches!(parse(input), Err(ParseError::UnexpectedEof { .. })),
        "{:?} should hit end of input",
        input
    );
}

#[rstest]
#[case("for x in l order by 1.5 ascd return x")]
#[case("for x in l order by 0 ascd return flatten x")]
#[case("for x in l order by 0 desc collect x as x with f")]
fn test_invalid_order_by(#[case] input: &str) {
    assert!(matches!(parse(input), Err(ParseError::Invalid { .. })));
}

#[rstest]
#[case("return 1 < 2 < 3")]
#[case("for in l return x")]
#[case("let x == 1 return x")]
#[case("for x in l order by 0 return x")]
#[case("return [1, 2")]
fn test_malformed_queries(#[case] input: &str) {
    assert!(parse(input).is_err(), "{:?} should not parse", input);
}

#[test]
fn test_lex_errors_surface_through_parser() {
    assert!(matches!(parse("a # b"), Err(ParseError::Lex(_))));
}

#[test]
fn test_error_message_mentions_location() {
    let err = parse("for x in l\nreturn )").unwrap_err();
    assert_eq!(err.position().line, 2);
    assert!(err.to_string().contains("line 2"));
}
