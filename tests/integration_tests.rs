// tests/integration_tests.rs

use drl_lang::{Error, ErrorKind, SyntaxConfig, Value, interpret};
use serde_json::json;

fn context() -> Value {
    Value::from(json!({
        "user": {"name": "Alice", "age": 30, "tags": ["a", "b"]},
        "users": [{"name": "A"}, {"name": "B"}],
        "codes": {"1": "one"},
        "idx": 1,
        "qty": 3,
        "price": 19.99,
        "keys": {"k1": "item1"},
        "data": {"item1": {"value": "x"}},
    }))
}

fn eval_expr(expr: &str) -> Result<Value, Error> {
    interpret(expr, &context(), &SyntaxConfig::default())
}

fn eval_ok(expr: &str) -> Value {
    match eval_expr(expr) {
        Ok(value) => value,
        Err(err) => panic!("{:?} failed: {}", expr, err.render()),
    }
}

fn eval_kind(expr: &str) -> ErrorKind {
    match eval_expr(expr) {
        Ok(value) => panic!("{:?} should fail, got {:?}", expr, value),
        Err(err) => err.kind,
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_arithmetic() {
    let test_cases = vec![
        ("2 + 3 * 4", Value::Integer(14)),
        ("2 ^ 3 ^ 2", Value::Integer(512)),
        ("(2 + 3) * 4", Value::Integer(20)),
        ("8 - 3 - 2", Value::Integer(3)),
        ("10 / 2", Value::Integer(5)),
        ("10 / 4", Value::Float(2.5)),
        ("7 % 3", Value::Integer(1)),
        ("-7 % 3", Value::Integer(2)),
        ("2 * -3", Value::Integer(-6)),
        ("-$qty ^ 2", Value::Integer(-9)),
        ("$qty * 0.5", Value::Float(1.5)),
        ("4 * 0.5", Value::Integer(2)),
        ("2 ^ -1", Value::Float(0.5)),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_ok(input), expected, "input {:?}", input);
    }
}

#[test]
fn test_string_operands() {
    assert_eq!(eval_ok("'a' + 'b'"), Value::from("ab"));
    assert_eq!(eval_ok("'1' + '2'"), Value::from("12"));
    assert_eq!(eval_ok("'3' * 2"), Value::Integer(6));
    assert_eq!(eval_ok("$user>name + '!'"), Value::from("Alice!"));
}

#[test]
fn test_arithmetic_type_errors() {
    for input in ["true + 1", "'a' + 1", "null * 2", "$user - 1", "-'x'"] {
        assert_eq!(eval_kind(input), ErrorKind::Type, "input {:?}", input);
    }
}

#[test]
fn test_division_by_zero() {
    for input in ["1 / 0", "5 % 0", "1.5 / 0", "1 / 0.0"] {
        let err = eval_expr(input).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type, "input {:?}", input);
        assert!(err.message.contains("by zero"));
    }
}

#[test]
fn test_integer_overflow_becomes_float() {
    assert_eq!(
        eval_ok("9223372036854775807 + 1"),
        Value::Float(9223372036854775808.0)
    );
}

// ============================================================================
// Comparison and logic
// ============================================================================

#[test]
fn test_comparisons() {
    let test_cases = vec![
        ("$user>age >= 18", true),
        ("$user>age > 30", false),
        ("1 == 1.0", true),
        ("'1' == 1", false),
        ("'abc' < 'abd'", true),
        ("$user>name != 'Bob'", true),
        ("pending == 'pending'", true),
        ("null == None", true),
        ("(1 < 2) == true", true),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_ok(input), Value::Boolean(expected), "input {:?}", input);
    }
}

#[test]
fn test_incomparable_types() {
    for input in ["1 < 'a'", "null > 0", "$user <= $user"] {
        assert_eq!(eval_kind(input), ErrorKind::Type, "input {:?}", input);
    }
}

#[test]
fn test_logical_operators() {
    assert_eq!(eval_ok("true and false"), Value::Boolean(false));
    assert_eq!(eval_ok("0 or 'x'"), Value::Boolean(true));
    assert_eq!(eval_ok("not ''"), Value::Boolean(true));
    assert_eq!(eval_ok("not $user>age == 30"), Value::Boolean(false));
    assert_eq!(eval_ok("$[user>email] or $user>name"), Value::Boolean(true));
}

#[test]
fn test_logical_operands_are_both_evaluated() {
    assert_eq!(eval_kind("false and $(user>email)"), ErrorKind::Reference);
    assert_eq!(eval_kind("true or nope()"), ErrorKind::Name);
}

// ============================================================================
// References
// ============================================================================

#[test]
fn test_reference_modes() {
    assert_eq!(eval_ok("$(user>name)"), Value::from("Alice"));
    assert_eq!(eval_ok("$user>name"), Value::from("Alice"));
    assert_eq!(eval_ok("$[user>email]"), Value::Null);
    assert_eq!(eval_ok("${user>email}"), Value::from("$user>email"));
    assert_eq!(eval_kind("$(user>email)"), ErrorKind::Reference);
    assert_eq!(eval_kind("$user>email"), ErrorKind::Reference);
}

#[test]
fn test_missing_key_diagnostic() {
    let err = eval_expr("1 + $(user>email)").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Reference);
    assert_eq!(err.offset, Some(4));
    assert_eq!(err.source_text, "1 + $(user>email)");

    let hint = err.hint.clone().unwrap();
    assert_eq!(hint.available_keys, vec!["age", "name", "tags"]);
    assert_eq!(hint.suggestion.as_deref(), Some("Failed at: user>email"));

    let rendered = err.render();
    assert!(rendered.starts_with("Reference key 'email' not found in context"));
    assert!(rendered.contains("Available keys: age, name, tags"));
}

#[test]
fn test_sequence_indexing() {
    assert_eq!(eval_ok("$users>1>name"), Value::from("B"));
    assert_eq!(eval_ok("$user>tags>0"), Value::from("a"));
    assert_eq!(eval_kind("$(users>5>name)"), ErrorKind::Reference);
    assert_eq!(eval_ok("$[users>5>name]"), Value::Null);
}

#[test]
fn test_negative_index_is_not_clamped() {
    let err = eval_expr("$(users>-1>name)").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
    assert!(err.message.contains("non-negative"));
    assert_eq!(eval_ok("$[users>-1]"), Value::Null);
    assert_eq!(eval_ok("$[users>-1>name]"), Value::Null);
}

#[test]
fn test_numeric_key_on_mapping() {
    assert_eq!(eval_ok("$codes>1"), Value::from("one"));
}

#[test]
fn test_navigation_type_errors() {
    assert_eq!(eval_kind("$(user>name>first)"), ErrorKind::Type);
    assert_eq!(eval_kind("$(user>tags>first)"), ErrorKind::Type);
    assert_eq!(eval_ok("$[user>name>first]"), Value::Null);
}

#[test]
fn test_whole_collections() {
    assert_eq!(
        eval_ok("$user>tags"),
        Value::Array(vec![Value::from("a"), Value::from("b")])
    );
    assert!(matches!(eval_ok("$(user)"), Value::Object(map) if map.len() == 3));
}

#[test]
fn test_nested_references() {
    assert_eq!(eval_ok("$(data>$(keys>k1)>value)"), Value::from("x"));
    assert_eq!(eval_ok("$(users>$(idx)>name)"), Value::from("B"));
    assert_eq!(eval_ok("$[data>$[missing]]"), Value::Null);
    assert_eq!(eval_kind("$(data>$[missing])"), ErrorKind::Reference);
    assert_eq!(eval_kind("$(data>$(keys))"), ErrorKind::Type);
}

#[test]
fn test_nested_reference_inside_call() {
    assert_eq!(eval_ok("upper($(data>$(keys>k1)>value))"), Value::from("X"));
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_function_calls() {
    assert_eq!(eval_ok("upper($user>name) + '!'"), Value::from("ALICE!"));
    assert_eq!(eval_ok("upper ('x')"), Value::from("X"));
    assert_eq!(eval_ok("len($user>tags)"), Value::Integer(2));
    assert_eq!(eval_ok("max(3, 7, 2)"), Value::Integer(7));
    assert_eq!(
        eval_ok("if($user>age >= 18, 'adult', 'minor')"),
        Value::from("adult")
    );
}

#[test]
fn test_unknown_function() {
    let err = eval_expr("1 + nope(1)").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Name);
    assert_eq!(err.offset, Some(4));
    assert!(err.message.contains("nope"));
}

#[test]
fn test_wrong_arity() {
    let err = eval_expr("upper()").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
    assert_eq!(
        err.message,
        "upper() takes exactly 1 argument(s) but 0 were given"
    );
}

// ============================================================================
// Misc
// ============================================================================

#[test]
fn test_empty_expression_is_null() {
    assert_eq!(eval_ok(""), Value::Null);
}

#[test]
fn test_syntax_errors_reach_caller() {
    let err = eval_expr("upper('x'").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert_eq!(err.source_text, "upper('x'");
}

#[test]
fn test_custom_syntax() {
    let config = SyntaxConfig::new("@", ".").unwrap();
    let context = Value::from(json!({"a": {"b": {"c": 42}}}));
    assert_eq!(interpret("@a.b.c", &context, &config).unwrap(), Value::Integer(42));
    assert_eq!(interpret("@(a.b.c) * 2", &context, &config).unwrap(), Value::Integer(84));
    assert_eq!(interpret("@[a.x]", &context, &config).unwrap(), Value::Null);
}
