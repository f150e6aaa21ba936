#![cfg(feature = "cli")]

use flwor_lang::cli::{CheckOptions, CheckResult, CliError, bindings_from_json, execute_check};
use flwor_lang::{Value, to_json, to_json_pretty};
use rstest::rstest;
use serde_json::json;

fn check(query: &str, input: Option<&str>) -> Result<CheckResult, CliError> {
    execute_check(&CheckOptions {
        query: query.to_string(),
        input: input.map(str::to_string),
        builtins: true,
        ..Default::default()
    })
}

fn json_output(query: &str, input: &str) -> String {
    match check(query, Some(input)) {
        Ok(CheckResult::Success(value)) => to_json(&value),
        other => panic!("query {:?} failed: {:?}", query, other),
    }
}

const STAFF: &str = r#"{
    "staff": [
        {"name": "Ada", "team": "core", "years": 7},
        {"name": "Bob", "team": "web", "years": 2},
        {"name": "Cy", "team": "core", "years": 4}
    ]
}"#;

#[rstest]
#[case("staff[self.team == \"core\"]/name", r#"["Ada","Cy"]"#)]
#[case("for s in staff where s.years > 3 return s.name", r#"["Ada","Cy"]"#)]
#[case(
    "for s in staff order by \"y\" desc return \"n\": s.name, \"y\": s.years",
    r#"[{"n":"Ada","y":7},{"n":"Cy","y":4},{"n":"Bob","y":2}]"#
)]
#[case(
    "for s in staff collect s.years as s.team with function(prev, next) { if prev == None then next else prev + next }",
    r#"{"core":11,"web":2}"#
)]
#[case("return len(staff), staff[0].name.upper()", r#"[[3,"ADA"]]"#)]
fn test_queries_over_json(#[case] query: &str, #[case] expected: &str) {
    assert_eq!(json_output(query, STAFF), expected);
}

#[test]
fn test_non_object_input_is_bound_as_input() {
    assert_eq!(
        json_output("for x in input where x != 2 return x", "[1, 2, 3]"),
        "[1,3]"
    );
}

#[test]
fn test_runs_without_input() {
    let Ok(CheckResult::Success(value)) = check("return 1 + 1", None) else {
        panic!("query should run against the prelude alone");
    };
    assert_eq!(value, Value::Tuple(vec![Value::Integer(2)]));
}

#[test]
fn test_no_builtins() {
    let result = execute_check(&CheckOptions {
        query: "return None".to_string(),
        builtins: false,
        ..Default::default()
    });
    assert!(matches!(result, Err(CliError::Eval(_))));
}

#[test]
fn test_syntax_only_skips_evaluation() {
    let result = execute_check(&CheckOptions {
        query: "return undefined_name".to_string(),
        syntax_only: true,
        ..Default::default()
    });
    assert!(matches!(result, Ok(CheckResult::SyntaxValid)));
}

#[test]
fn test_error_kinds() {
    assert!(matches!(check("for x in", None), Err(CliError::Parse(_))));
    assert!(matches!(check("return missing", None), Err(CliError::Eval(_))));
    assert!(matches!(check("x", Some("not json")), Err(CliError::Json(_))));
}

#[test]
fn test_error_messages() {
    let Err(err) = check("return 1 / 0", None) else {
        panic!("division by zero should fail");
    };
    assert_eq!(err.to_string(), "Evaluation error: Division by zero");
}

#[test]
fn test_bindings_from_json_nests_records() {
    let env = bindings_from_json(json!({"a": {"b": {"c": 5}}}), false);
    let result = flwor_lang::execute("return a.b.c", &env).unwrap();
    assert_eq!(result, Value::Tuple(vec![Value::Integer(5)]));
}

#[test]
fn test_pretty_output() {
    let Ok(CheckResult::Success(value)) = check("return \"k\": 1", None) else {
        panic!("query should succeed");
    };
    assert_eq!(to_json_pretty(&value), "[\n  {\n    \"k\": 1\n  }\n]");
}
