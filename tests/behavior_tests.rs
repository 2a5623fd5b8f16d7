// tests/behavior_tests.rs
//
// End-to-end guarantees of the language: precedence, reference modes,
// nesting, templates and configuration.

use std::sync::Arc;
use std::thread;

use drl_lang::{
    ConfigError, ErrorKind, MAX_EXPRESSION_DEPTH, MAX_REFERENCE_DEPTH, SyntaxConfig, Value,
    interpolate, interpolate_dict, interpret, parse,
};
use serde_json::json;

fn eval(expr: &str, context: serde_json::Value) -> Result<Value, drl_lang::Error> {
    interpret(expr, &Value::from(context), &SyntaxConfig::default())
}

/// `levels` references nested inside each other, each resolving to "k".
fn nested_chain(levels: usize) -> String {
    let mut expr = "$(k)".to_string();
    for _ in 1..levels {
        expr = format!("$({})", expr);
    }
    expr
}

// ============================================================================
// Precedence
// ============================================================================

#[test]
fn test_precedence() {
    assert_eq!(eval("2 + 3 * 4", json!(null)).unwrap(), Value::Integer(14));
    assert_eq!(eval("2 ^ 3 ^ 2", json!(null)).unwrap(), Value::Integer(512));
    assert_eq!(eval("(2 + 3) * 4", json!(null)).unwrap(), Value::Integer(20));
}

// ============================================================================
// Reference modes
// ============================================================================

#[test]
fn test_reference_modes() {
    let context = json!({"user": {"name": "Alice"}});
    assert_eq!(eval("$[user>age]", context.clone()).unwrap(), Value::Null);
    assert_eq!(
        eval("$(user>age)", context.clone()).unwrap_err().kind,
        ErrorKind::Reference
    );
    assert_eq!(
        eval("${user>age}", context.clone()).unwrap(),
        Value::from("$user>age")
    );
    assert_eq!(eval("$(user>name)", context).unwrap(), Value::from("Alice"));
}

// ============================================================================
// Nesting
// ============================================================================

#[test]
fn test_three_level_nesting() {
    let context = json!({
        "keys": {"k1": "k2", "k2": "item1"},
        "data": {"item1": {"value": "x"}},
    });
    assert_eq!(
        eval("$(data>$(keys>$(keys>k1))>value)", context).unwrap(),
        Value::from("x")
    );
}

#[test]
fn test_nesting_depth_is_bounded() {
    let context = json!({"k": "k"});

    let deepest_allowed = nested_chain(MAX_REFERENCE_DEPTH);
    assert_eq!(eval(&deepest_allowed, context.clone()).unwrap(), Value::from("k"));

    let too_deep = nested_chain(MAX_REFERENCE_DEPTH + 1);
    let err = eval(&too_deep, context).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
    assert!(err.message.contains("too deep"));
}

#[test]
fn test_depth_error_ignores_optional_mode() {
    let context = json!({"k": "k"});
    let too_deep = format!("$[{}]", nested_chain(MAX_REFERENCE_DEPTH));
    assert_eq!(eval(&too_deep, context).unwrap_err().kind, ErrorKind::Type);
}

#[test]
fn test_very_deep_reference_chain_is_rejected() {
    let config = SyntaxConfig::default();
    let chain = nested_chain(10_000);

    let err = parse(&chain, &config).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
    assert!(err.message.starts_with("Reference nesting too deep"));

    let context = Value::from(json!({"k": "k"}));
    for levels in [150, 1_000, 10_000] {
        let err = interpret(&nested_chain(levels), &context, &config).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type, "{} levels", levels);
    }
    assert_eq!(
        interpolate(&format!("x {}", chain), &context, &config).unwrap_err().kind,
        ErrorKind::Type
    );
}

#[test]
fn test_very_deep_expressions_are_rejected() {
    let deep = 10_000;
    let inputs = [
        format!("{}1{}", "(".repeat(deep), ")".repeat(deep)),
        format!("{}true", "not ".repeat(deep)),
        format!("{}1", "- ".repeat(deep)),
        format!("{}2", "2 ^ ".repeat(deep)),
        format!("{}1{}", "upper(".repeat(deep), ")".repeat(deep)),
    ];
    for input in &inputs {
        let err = eval(input, json!({})).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
        assert!(err.message.starts_with("Expression nesting too deep"));
    }
}

#[test]
fn test_moderate_grouping_is_accepted() {
    let levels = MAX_EXPRESSION_DEPTH / 2;
    let input = format!("{}1 + 1{}", "(".repeat(levels), ")".repeat(levels));
    assert_eq!(eval(&input, json!({})).unwrap(), Value::Integer(2));
}

// ============================================================================
// Sequences
// ============================================================================

#[test]
fn test_sequence_paths() {
    let context = json!({"users": [{"name": "A"}, {"name": "B"}]});
    assert_eq!(eval("$users>1>name", context.clone()).unwrap(), Value::from("B"));
    assert_eq!(
        eval("$(users>2>name)", context).unwrap_err().kind,
        ErrorKind::Reference
    );
}

// ============================================================================
// Templates
// ============================================================================

#[test]
fn test_template_type_preservation() {
    let context = Value::from(json!({"count": 5}));
    let config = SyntaxConfig::default();
    assert_eq!(interpolate("$count", &context, &config).unwrap(), Value::Integer(5));
    assert_eq!(
        interpolate("Count: $count", &context, &config).unwrap(),
        Value::from("Count: 5")
    );
}

#[test]
fn test_drop_empty() {
    let templates = Value::from(json!({"a": "$x", "b": "$[y]"}));
    let context = Value::from(json!({"x": 0}));
    let config = SyntaxConfig::default().with_drop_empty(true);
    assert_eq!(
        interpolate_dict(&templates, &context, &config).unwrap(),
        Value::from(json!({"a": 0}))
    );
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_custom_syntax() {
    let config = SyntaxConfig::new("@", ".").unwrap();
    let context = Value::from(json!({"a": {"b": {"c": 42}}}));
    assert_eq!(interpret("@a.b.c", &context, &config).unwrap(), Value::Integer(42));
}

#[test]
fn test_reserved_symbols_rejected() {
    assert!(matches!(
        SyntaxConfig::new("(", ">"),
        Err(ConfigError::ReservedCharacter { reserved: '(', .. })
    ));
    assert!(matches!(
        SyntaxConfig::new("$", ","),
        Err(ConfigError::ReservedCharacter { .. })
    ));
    assert!(matches!(SyntaxConfig::new("$", "$"), Err(ConfigError::SameSymbol(_))));
}

#[test]
fn test_delimiter_collision_is_reported() {
    let config = SyntaxConfig::new("$", "+").unwrap();
    assert_eq!(config.delimiter_warnings(), vec!['+']);
    assert_eq!(SyntaxConfig::new("$", "/").unwrap().delimiter_warnings(), vec!['/']);
}

// ============================================================================
// Failure safety
// ============================================================================

#[test]
fn test_failures_are_errors_not_panics() {
    for expr in ["1 / 0", "1 % 0", "1 < 'a'", "'a' >= null", "[1] + 1"] {
        let result = eval(expr, json!({}));
        assert!(result.is_err(), "{:?} should fail", expr);
    }
    assert_eq!(eval("1 / 0", json!({})).unwrap_err().kind, ErrorKind::Type);
    assert_eq!(eval("1 < 'a'", json!({})).unwrap_err().kind, ErrorKind::Type);
}

#[test]
fn test_shared_context_across_threads() {
    let context = Arc::new(Value::from(json!({"n": 7})));
    let config = Arc::new(SyntaxConfig::default());

    let handles: Vec<_> = (0..4i64)
        .map(|i| {
            let context = Arc::clone(&context);
            let config = Arc::clone(&config);
            thread::spawn(move || interpret(&format!("$n * {}", i), &context, &config))
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let value = handle.join().unwrap().unwrap();
        assert_eq!(value, Value::Integer(7 * i as i64));
    }
}
