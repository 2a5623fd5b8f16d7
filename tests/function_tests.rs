// tests/function_tests.rs

use drl_lang::functions::{self, builtins};
use drl_lang::{
    ErrorKind, Function, FunctionError, FunctionRegistry, FunctionSignature, ParamKind,
    SyntaxConfig, Value, interpret, register_default_function,
};
use serde_json::json;

fn context() -> Value {
    Value::from(json!({
        "nums": [3, 1, 2],
        "dups": [1, 2, 1, 3, 2],
        "nested": [[1, 2], [3], 4],
        "mixed": [1, "a"],
        "flags": [false, 0, "x"],
        "empty": [],
        "settings": {"factor": 10},
        "name": "Alice",
    }))
}

fn call(expr: &str) -> Value {
    match interpret(expr, &context(), &SyntaxConfig::default()) {
        Ok(value) => value,
        Err(err) => panic!("{:?} failed: {}", expr, err.render()),
    }
}

fn call_err(expr: &str) -> drl_lang::Error {
    interpret(expr, &context(), &SyntaxConfig::default()).unwrap_err()
}

fn ints(values: &[i64]) -> Value {
    Value::Array(values.iter().map(|n| Value::Integer(*n)).collect())
}

fn strs(values: &[&str]) -> Value {
    Value::Array(values.iter().map(|s| Value::from(*s)).collect())
}

// ============================================================================
// Core
// ============================================================================

#[test]
fn test_core_functions() {
    let test_cases = vec![
        ("if(1 > 2, 'yes', 'no')", Value::from("no")),
        ("if(0, 'yes')", Value::Null),
        ("len('héllo')", Value::Integer(5)),
        ("len($settings)", Value::Integer(1)),
        ("max($nums)", Value::Integer(3)),
        ("min(4, 2.5, 3)", Value::Float(2.5)),
        ("add($nums)", Value::Integer(6)),
        ("add(1, 2.5)", Value::Float(3.5)),
        ("int('42')", Value::Integer(42)),
        ("int(3.9)", Value::Integer(3)),
        ("float(2)", Value::Float(2.0)),
        ("str(3.0)", Value::from("3.0")),
        ("str(null)", Value::from("")),
        ("bool('')", Value::Boolean(false)),
        ("bool($nums)", Value::Boolean(true)),
    ];

    for (input, expected) in test_cases {
        assert_eq!(call(input), expected, "input {:?}", input);
    }
}

#[test]
fn test_core_function_errors() {
    for input in ["max(3, 'a')", "max($empty)", "add('a')", "len(5)", "int('x')"] {
        assert_eq!(call_err(input).kind, ErrorKind::Type, "input {:?}", input);
    }
}

#[test]
fn test_coercion_error_message() {
    let err = call_err("int('x')");
    assert_eq!(err.message, "int(): argument 'value' cannot convert x to integer");
    assert_eq!(err.offset, Some(0));
}

// ============================================================================
// Strings
// ============================================================================

#[test]
fn test_string_functions() {
    let test_cases = vec![
        ("lower($name)", Value::from("alice")),
        ("capitalize('hELLO')", Value::from("Hello")),
        ("strip('  x ')", Value::from("x")),
        ("strip('xxhixx', 'x')", Value::from("hi")),
        ("replace('a-b-c', '-', '+')", Value::from("a+b+c")),
        ("replace('a-b-c', '-', '+', 1)", Value::from("a+b-c")),
        ("find('hello', 'l')", Value::Integer(2)),
        ("find('hello', 'z')", Value::Integer(-1)),
        ("join(', ', $nums)", Value::from("3, 1, 2")),
        ("upper(42)", Value::from("42")),
    ];

    for (input, expected) in test_cases {
        assert_eq!(call(input), expected, "input {:?}", input);
    }
}

#[test]
fn test_split() {
    assert_eq!(call("split('a,b,c', ',')"), strs(&["a", "b", "c"]));
    assert_eq!(call("split('a b  c')"), strs(&["a", "b", "c"]));
    assert_eq!(call("split('a,b,c', ',', 1)"), strs(&["a", "b,c"]));
    assert_eq!(call_err("split('abc', '')").kind, ErrorKind::Type);
}

#[test]
fn test_all_and_any() {
    assert_eq!(call("all($nums)"), Value::Boolean(true));
    assert_eq!(call("all($flags)"), Value::Boolean(false));
    assert_eq!(call("any($flags)"), Value::Boolean(true));
    assert_eq!(call("any($empty)"), Value::Boolean(false));
}

// ============================================================================
// Regular expressions
// ============================================================================

#[test]
fn test_regex_functions() {
    assert_eq!(call("regex_search('[0-9]+', 'abc123')"), Value::Boolean(true));
    assert_eq!(call("regex_match('[a-z]+', 'abc1')"), Value::Boolean(true));
    assert_eq!(call("regex_match('[0-9]', 'a1')"), Value::Boolean(false));
    assert_eq!(call("regex_split('[,;]', 'a,b;c')"), strs(&["a", "b", "c"]));
    assert_eq!(call("regex_extract('([0-9]+)', 'ab12cd', 1)"), Value::from("12"));
    assert_eq!(call("regex_extract('[0-9]+', 'abc')"), Value::from(""));
}

#[test]
fn test_regex_findall_shapes() {
    assert_eq!(call("regex_findall('[0-9]+', 'a1b22')"), strs(&["1", "22"]));
    assert_eq!(call("regex_findall('([a-z])[0-9]', 'a1b2')"), strs(&["a", "b"]));
    assert_eq!(
        call("regex_findall('([a-z])([0-9])', 'a1b2')"),
        Value::Array(vec![strs(&["a", "1"]), strs(&["b", "2"])])
    );
}

#[test]
fn test_regex_sub_group_references() {
    assert_eq!(
        call(r"regex_sub('([a-z]+)-([a-z]+)', '\\2-\\1', 'ab-cd')"),
        Value::from("cd-ab")
    );
    assert_eq!(call("regex_sub('[0-9]', '$', 'a1b2')"), Value::from("a$b$"));
}

#[test]
fn test_regex_errors() {
    assert_eq!(call_err("regex_search('(', 'x')").kind, ErrorKind::Type);
    assert_eq!(call_err("regex_extract('x', 'y', 3)").kind, ErrorKind::Type);
}

// ============================================================================
// Lists
// ============================================================================

#[test]
fn test_list_functions() {
    let test_cases = vec![
        ("list_get($nums, -1)", Value::Integer(2)),
        ("list_get($nums, 10, 'none')", Value::from("none")),
        ("list_get($nums, 10)", Value::Null),
        ("list_slice($nums, 1)", ints(&[1, 2])),
        ("list_slice($nums, null, null, -1)", ints(&[2, 1, 3])),
        ("list_slice($nums, 1, 3, 9223372036854775807)", ints(&[1])),
        ("list_slice($nums, null, null, -9223372036854775807)", ints(&[2])),
        ("list_append($nums, 4)", ints(&[3, 1, 2, 4])),
        ("list_concat($nums, $nums)", ints(&[3, 1, 2, 3, 1, 2])),
        ("list_contains($nums, 2.0)", Value::Boolean(true)),
        ("list_index($nums, 2)", Value::Integer(2)),
        ("list_index($nums, 9)", Value::Integer(-1)),
        ("list_reverse($nums)", ints(&[2, 1, 3])),
        ("reversed($nums)", ints(&[2, 1, 3])),
        ("list_unique($dups)", ints(&[1, 2, 3])),
        ("list_flatten($nested)", ints(&[1, 2, 3, 4])),
        ("sorted($nums)", ints(&[1, 2, 3])),
        ("sorted($nums, true)", ints(&[3, 2, 1])),
    ];

    for (input, expected) in test_cases {
        assert_eq!(call(input), expected, "input {:?}", input);
    }
}

#[test]
fn test_list_function_errors() {
    assert_eq!(call_err("sorted($mixed)").kind, ErrorKind::Type);
    assert_eq!(call_err("list_slice($nums, 0, 3, 0)").kind, ErrorKind::Type);
    assert_eq!(call_err("list_get('abc', 0)").kind, ErrorKind::Type);
}

// ============================================================================
// Higher order
// ============================================================================

#[test]
fn test_map() {
    assert_eq!(call("map('$item * 2', $nums)"), ints(&[6, 2, 4]));
    assert_eq!(call("map('$item + $index', $nums)"), ints(&[3, 2, 4]));
    assert_eq!(
        call("map('$item * $factor', $nums, $settings)"),
        ints(&[30, 10, 20])
    );
    assert_eq!(call("map('$value + $item', $nums, 1)"), ints(&[4, 2, 3]));
}

#[test]
fn test_filter() {
    assert_eq!(call("filter('$item > 1', $nums)"), ints(&[3, 2]));
    assert_eq!(call("filter('$item', $flags)"), strs(&["x"]));
}

#[test]
fn test_reduce() {
    assert_eq!(call("reduce('$acc + $item', $nums)"), Value::Integer(6));
    assert_eq!(call("reduce('$acc + $item', $nums, 10)"), Value::Integer(16));
    assert_eq!(call("reduce('$acc + $item', $empty, 0)"), Value::Integer(0));
    assert_eq!(call("reduce('$acc + $item', $empty)"), Value::Null);
}

#[test]
fn test_element_expression_errors() {
    let err = call_err("map('$(missing)', $nums)");
    assert_eq!(err.kind, ErrorKind::Type);
    assert!(err.message.starts_with("map(): Reference error"));
}

// ============================================================================
// Registries
// ============================================================================

#[test]
fn test_builtin_registry() {
    let registry = FunctionRegistry::with_builtins();
    assert_eq!(registry.len(), builtins::all().len());
    assert!(registry.contains("regex_sub"));
    assert!(!registry.contains("random"));

    let names: Vec<String> = registry.functions().iter().map(|f| f.name().to_string()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[test]
fn test_config_function_shadows_default() {
    let shout = Function::new("upper", FunctionSignature::new().param("text", ParamKind::String), |args, _| {
        Ok(Value::from(format!("{}!!", args[0])))
    });
    let config = SyntaxConfig::default().with_function(shout);
    assert_eq!(
        interpret("upper('hi')", &Value::Null, &config).unwrap(),
        Value::from("hi!!")
    );
    assert_eq!(
        interpret("upper('hi')", &Value::Null, &SyntaxConfig::default()).unwrap(),
        Value::from("HI")
    );
}

#[test]
fn test_register_function_on_config() {
    let mut config = SyntaxConfig::default();
    config.register_function(Function::new(
        "indicator",
        FunctionSignature::new(),
        |_, config| Ok(Value::from(config.ref_indicator())),
    ));
    assert_eq!(interpret("indicator()", &Value::Null, &config).unwrap(), Value::from("$"));
    assert!(functions::lookup("indicator", &SyntaxConfig::default()).is_none());
}

#[test]
fn test_register_default_function() {
    register_default_function(
        Function::new(
            "triple_for_test",
            FunctionSignature::new().param("n", ParamKind::Integer),
            |args, _| match &args[0] {
                Value::Integer(n) => Ok(Value::Integer(n * 3)),
                _ => Err(FunctionError::failed("expected an integer")),
            },
        )
        .with_summary("triple a number"),
    );

    let config = SyntaxConfig::new("@", ".").unwrap();
    assert_eq!(
        interpret("triple_for_test('7')", &Value::Null, &config).unwrap(),
        Value::Integer(21)
    );
    assert!(
        functions::default_functions()
            .iter()
            .any(|f| f.name() == "triple_for_test" && f.summary() == "triple a number")
    );
}

#[test]
fn test_optional_null_and_variadic_coercion() {
    let describe = Function::new(
        "describe",
        FunctionSignature::new()
            .optional("limit", ParamKind::Integer)
            .variadic(ParamKind::Number),
        |args, _| {
            let limit = if args.first().is_some_and(Value::is_null) { "none" } else { "some" };
            let total: f64 = args.iter().skip(1).filter_map(Value::as_float).sum();
            Ok(Value::from(format!("{} {}", limit, total)))
        },
    );
    let config = SyntaxConfig::default().with_function(describe);

    assert_eq!(
        interpret("describe(null, '1', 2.5)", &Value::Null, &config).unwrap(),
        Value::from("none 3.5")
    );
    let err = interpret("describe(1, 'x')", &Value::Null, &config).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
    assert!(err.message.contains("'arg2'"));
}

#[test]
fn test_signature_binding_errors() {
    let signature = FunctionSignature::new()
        .param("text", ParamKind::String)
        .optional("count", ParamKind::Integer);
    assert_eq!(
        signature.bind("f", vec![]).unwrap_err(),
        FunctionError::Arity {
            function: "f".to_string(),
            expected: "1 to 2".to_string(),
            given: 0,
        }
    );
    assert!(matches!(
        signature.bind("f", vec![Value::Null]),
        Err(FunctionError::Coercion { .. })
    ));
}
