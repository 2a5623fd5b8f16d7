//! Functions available to every configuration unless shadowed.

use std::{cmp::Ordering, collections::HashMap};

use regex::Regex;

use crate::{
    ast::BinOp,
    config::SyntaxConfig,
    evaluator::apply_binary,
    functions::{Function, FunctionError, FunctionSignature, ParamKind},
    value::Value,
};

use ParamKind::{Any, Array, Boolean, Integer, String as Str};

type Result<T> = std::result::Result<T, FunctionError>;

static NULL: Value = Value::Null;

fn sig() -> FunctionSignature {
    FunctionSignature::new()
}

fn arg(args: &[Value], i: usize) -> &Value {
    args.get(i).unwrap_or(&NULL)
}

fn text<'v>(function: &str, value: &'v Value) -> Result<&'v str> {
    value.as_str().ok_or_else(|| {
        FunctionError::failed(format!(
            "{}() expected a string, got {}",
            function,
            value.type_name()
        ))
    })
}

fn list<'v>(function: &str, value: &'v Value) -> Result<&'v [Value]> {
    match value {
        Value::Array(items) => Ok(items.as_slice()),
        other => Err(FunctionError::failed(format!(
            "{}() expected an array, got {}",
            function,
            other.type_name()
        ))),
    }
}

fn optional_int(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(n) => Some(*n),
        _ => None,
    }
}

/// Every built-in function.
pub fn all() -> Vec<Function> {
    vec![
        // Core
        Function::new(
            "if",
            sig().param("condition", Any).param("then", Any).optional("otherwise", Any),
            if_function,
        )
        .with_summary("then when condition is truthy, otherwise otherwise"),
        Function::new("len", sig().param("value", Any), len).with_summary("length of a string, array or object"),
        Function::new("max", sig().param("first", Any).variadic(Any), |args, _| extreme("max", args, Ordering::Greater))
            .with_summary("largest argument, or largest element of a single array"),
        Function::new("min", sig().param("first", Any).variadic(Any), |args, _| extreme("min", args, Ordering::Less))
            .with_summary("smallest argument, or smallest element of a single array"),
        Function::new("add", sig().param("first", Any).variadic(Any), add)
            .with_summary("sum of the arguments, or of a single array"),
        Function::new("int", sig().param("value", Integer), int).with_summary("convert to integer"),
        Function::new("float", sig().param("value", ParamKind::Float), float).with_summary("convert to float"),
        Function::new("str", sig().param("value", Any), |args, _| Ok(Value::String(arg(args, 0).to_text())))
            .with_summary("display text of a value"),
        Function::new("bool", sig().param("value", Any), |args, _| Ok(Value::Boolean(arg(args, 0).is_truthy())))
            .with_summary("truthiness of a value"),
        Function::new("print", sig().variadic(Any), print).with_summary("write the arguments to stdout"),
        // Strings
        Function::new("upper", sig().param("text", Str), |args, _| {
            Ok(Value::from(text("upper", arg(args, 0))?.to_uppercase()))
        })
        .with_summary("uppercase copy"),
        Function::new("lower", sig().param("text", Str), |args, _| {
            Ok(Value::from(text("lower", arg(args, 0))?.to_lowercase()))
        })
        .with_summary("lowercase copy"),
        Function::new("capitalize", sig().param("text", Str), capitalize)
            .with_summary("first character uppercase, the rest lowercase"),
        Function::new("strip", sig().param("text", Str).optional("chars", Str), strip)
            .with_summary("trim whitespace or the given characters from both ends"),
        Function::new(
            "replace",
            sig().param("text", Str).param("old", Str).param("new", Str).optional("count", Integer),
            replace,
        )
        .with_summary("replace occurrences of old with new"),
        Function::new("find", sig().param("text", Str).param("sub", Str), find)
            .with_summary("character index of sub, or -1"),
        Function::new("join", sig().param("separator", Str).param("items", Array), join)
            .with_summary("join item texts with separator"),
        Function::new(
            "split",
            sig().param("text", Str).optional("separator", Str).optional("maxsplit", Integer),
            split,
        )
        .with_summary("split on separator, or on whitespace runs"),
        Function::new("all", sig().param("items", Array), |args, _| {
            Ok(Value::Boolean(list("all", arg(args, 0))?.iter().all(Value::is_truthy)))
        })
        .with_summary("true when every item is truthy"),
        Function::new("any", sig().param("items", Array), |args, _| {
            Ok(Value::Boolean(list("any", arg(args, 0))?.iter().any(Value::is_truthy)))
        })
        .with_summary("true when some item is truthy"),
        // Regular expressions
        Function::new("regex_search", sig().param("pattern", Str).param("text", Str), regex_search)
            .with_summary("true when pattern matches anywhere in text"),
        Function::new("regex_match", sig().param("pattern", Str).param("text", Str), regex_match)
            .with_summary("true when pattern matches at the start of text"),
        Function::new("regex_findall", sig().param("pattern", Str).param("text", Str), regex_findall)
            .with_summary("all matches, or captured groups when the pattern has any"),
        Function::new(
            "regex_sub",
            sig().param("pattern", Str).param("replacement", Str).param("text", Str),
            regex_sub,
        )
        .with_summary("replace every match; \\1 refers to a group"),
        Function::new("regex_split", sig().param("pattern", Str).param("text", Str), regex_split)
            .with_summary("split text on pattern"),
        Function::new(
            "regex_extract",
            sig().param("pattern", Str).param("text", Str).optional("group", Integer),
            regex_extract,
        )
        .with_summary("first match or group, or the empty string"),
        // Lists
        Function::new(
            "list_get",
            sig().param("items", Array).param("index", Integer).optional("default", Any),
            list_get,
        )
        .with_summary("item at index (negative counts from the end), or default"),
        Function::new(
            "list_slice",
            sig()
                .param("items", Array)
                .optional("start", Integer)
                .optional("end", Integer)
                .optional("step", Integer),
            list_slice,
        )
        .with_summary("items[start:end:step]"),
        Function::new("list_append", sig().param("items", Array).param("item", Any), |args, _| {
            let mut items = list("list_append", arg(args, 0))?.to_vec();
            items.push(arg(args, 1).clone());
            Ok(Value::Array(items))
        })
        .with_summary("copy with item appended"),
        Function::new("list_concat", sig().param("first", Array).param("second", Array), |args, _| {
            let mut items = list("list_concat", arg(args, 0))?.to_vec();
            items.extend_from_slice(list("list_concat", arg(args, 1))?);
            Ok(Value::Array(items))
        })
        .with_summary("concatenation of two arrays"),
        Function::new("list_contains", sig().param("items", Array).param("item", Any), |args, _| {
            let item = arg(args, 1);
            Ok(Value::Boolean(list("list_contains", arg(args, 0))?.iter().any(|v| v.loose_eq(item))))
        })
        .with_summary("true when item is present"),
        Function::new(
            "list_index",
            sig().param("items", Array).param("item", Any).optional("default", Integer),
            list_index,
        )
        .with_summary("index of item, or default (-1)"),
        Function::new("list_reverse", sig().param("items", Array), reverse).with_summary("reversed copy"),
        Function::new("reversed", sig().param("items", Array), reverse).with_summary("reversed copy"),
        Function::new("list_unique", sig().param("items", Array), list_unique)
            .with_summary("first occurrence of each item, order kept"),
        Function::new("list_flatten", sig().param("items", Array), list_flatten)
            .with_summary("flatten nested arrays one level"),
        Function::new("sorted", sig().param("items", Array).optional("reverse", Boolean), sorted)
            .with_summary("sorted copy"),
        // Higher order
        Function::new(
            "map",
            sig().param("expression", Str).param("items", Array).optional("context", Any),
            map,
        )
        .with_summary("evaluate expression per item with $item and $index bound"),
        Function::new(
            "filter",
            sig().param("expression", Str).param("items", Array).optional("context", Any),
            filter,
        )
        .with_summary("items for which expression is truthy"),
        Function::new(
            "reduce",
            sig()
                .param("expression", Str)
                .param("items", Array)
                .optional("initial", Any)
                .optional("context", Any),
            reduce,
        )
        .with_summary("fold items with $acc and $item bound"),
    ]
}

fn if_function(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    Ok(if arg(args, 0).is_truthy() {
        arg(args, 1).clone()
    } else {
        arg(args, 2).clone()
    })
}

fn len(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    match arg(args, 0) {
        Value::String(s) => Ok(Value::from(s.chars().count())),
        Value::Array(items) => Ok(Value::from(items.len())),
        Value::Object(map) => Ok(Value::from(map.len())),
        other => Err(FunctionError::failed(format!(
            "object of type {} has no len()",
            other.type_name()
        ))),
    }
}

/// A single array argument spreads into its elements.
fn spread(args: &[Value]) -> &[Value] {
    match args {
        [Value::Array(items)] => items.as_slice(),
        _ => args,
    }
}

fn extreme(function: &str, args: &[Value], wanted: Ordering) -> Result<Value> {
    let mut items = spread(args).iter();
    let Some(mut best) = items.next() else {
        return Err(FunctionError::failed(format!("{}() arg is an empty sequence", function)));
    };
    for item in items {
        match item.compare(best) {
            Some(ordering) if ordering == wanted => best = item,
            Some(_) => {}
            None => {
                return Err(FunctionError::failed(format!(
                    "{}() cannot compare {} and {}",
                    function,
                    item.type_name(),
                    best.type_name()
                )));
            }
        }
    }
    Ok(best.clone())
}

fn add(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    spread(args).iter().try_fold(Value::Integer(0), |total, item| {
        if matches!(item, Value::String(_) | Value::Boolean(_) | Value::Null) {
            return Err(FunctionError::failed(format!(
                "add() cannot sum {}",
                item.type_name()
            )));
        }
        apply_binary(BinOp::Add, &total, item).map_err(|err| FunctionError::failed(err.message))
    })
}

fn int(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    match arg(args, 0) {
        v @ Value::Integer(_) => Ok(v.clone()),
        other => Err(FunctionError::failed(format!(
            "int() argument must be a string or a number, not {}",
            other.type_name()
        ))),
    }
}

fn float(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    match arg(args, 0) {
        v @ Value::Float(_) => Ok(v.clone()),
        other => Err(FunctionError::failed(format!(
            "float() argument must be a string or a number, not {}",
            other.type_name()
        ))),
    }
}

fn print(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    let line: Vec<String> = args.iter().map(Value::to_text).collect();
    println!("{}", line.join(" "));
    Ok(Value::Null)
}

fn capitalize(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    let s = text("capitalize", arg(args, 0))?;
    let mut chars = s.chars();
    let result = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    };
    Ok(Value::String(result))
}

fn strip(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    let s = text("strip", arg(args, 0))?;
    let stripped = match arg(args, 1) {
        Value::String(chars) => s.trim_matches(|c: char| chars.contains(c)),
        _ => s.trim(),
    };
    Ok(Value::from(stripped))
}

fn replace(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    let s = text("replace", arg(args, 0))?;
    let old = text("replace", arg(args, 1))?;
    let new = text("replace", arg(args, 2))?;
    let replaced = match optional_int(arg(args, 3)) {
        Some(count) if count >= 0 => s.replacen(old, new, count as usize),
        _ => s.replace(old, new),
    };
    Ok(Value::String(replaced))
}

fn find(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    let s = text("find", arg(args, 0))?;
    let sub = text("find", arg(args, 1))?;
    Ok(match s.find(sub) {
        Some(byte) => Value::from(s[..byte].chars().count()),
        None => Value::Integer(-1),
    })
}

fn join(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    let separator = text("join", arg(args, 0))?;
    let items: Vec<String> = list("join", arg(args, 1))?.iter().map(Value::to_text).collect();
    Ok(Value::String(items.join(separator)))
}

fn split(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    let s = text("split", arg(args, 0))?;
    let limit = optional_int(arg(args, 2)).filter(|n| *n >= 0).map(|n| n as usize + 1);
    let parts: Vec<Value> = match (arg(args, 1), limit) {
        (Value::String(sep), _) if sep.is_empty() => {
            return Err(FunctionError::failed("split() separator must not be empty"));
        }
        (Value::String(sep), Some(n)) => s.splitn(n, sep.as_str()).map(Value::from).collect(),
        (Value::String(sep), None) => s.split(sep.as_str()).map(Value::from).collect(),
        (_, _) => s.split_whitespace().map(Value::from).collect(),
    };
    Ok(Value::Array(parts))
}

fn regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|err| FunctionError::failed(format!("invalid regular expression: {}", err)))
}

fn regex_search(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    let re = regex(text("regex_search", arg(args, 0))?)?;
    Ok(Value::Boolean(re.is_match(text("regex_search", arg(args, 1))?)))
}

fn regex_match(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    let re = regex(&format!("^(?:{})", text("regex_match", arg(args, 0))?))?;
    Ok(Value::Boolean(re.is_match(text("regex_match", arg(args, 1))?)))
}

fn regex_findall(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    let re = regex(text("regex_findall", arg(args, 0))?)?;
    let haystack = text("regex_findall", arg(args, 1))?;
    fn group(caps: &regex::Captures<'_>, i: usize) -> Value {
        Value::from(caps.get(i).map(|m| m.as_str()).unwrap_or_default())
    }

    let found = re
        .captures_iter(haystack)
        .map(|caps| match re.captures_len() {
            1 => group(&caps, 0),
            2 => group(&caps, 1),
            n => Value::Array((1..n).map(|i| group(&caps, i)).collect()),
        })
        .collect();
    Ok(Value::Array(found))
}

/// `\1`-style group references become `${1}`; a literal `$` is escaped.
fn replacement_template(replacement: &str) -> String {
    let mut out = String::new();
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' => out.push_str("$$"),
            '\\' => match chars.peek() {
                Some(d) if d.is_ascii_digit() => {
                    let mut group = String::new();
                    while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                        group.push(*d);
                        chars.next();
                    }
                    out.push_str(&format!("${{{}}}", group));
                }
                Some(_) => {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                }
                None => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    out
}

fn regex_sub(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    let re = regex(text("regex_sub", arg(args, 0))?)?;
    let replacement = replacement_template(text("regex_sub", arg(args, 1))?);
    let haystack = text("regex_sub", arg(args, 2))?;
    Ok(Value::String(re.replace_all(haystack, replacement.as_str()).into_owned()))
}

fn regex_split(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    let re = regex(text("regex_split", arg(args, 0))?)?;
    let haystack = text("regex_split", arg(args, 1))?;
    Ok(Value::Array(re.split(haystack).map(Value::from).collect()))
}

fn regex_extract(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    let re = regex(text("regex_extract", arg(args, 0))?)?;
    let haystack = text("regex_extract", arg(args, 1))?;
    let group = optional_int(arg(args, 2)).unwrap_or(0);
    let Ok(group) = usize::try_from(group) else {
        return Err(FunctionError::failed("regex_extract() group must not be negative"));
    };
    if group >= re.captures_len() {
        return Err(FunctionError::failed(format!("regex_extract(): no such group {}", group)));
    }
    let extracted = re
        .captures(haystack)
        .and_then(|caps| caps.get(group))
        .map(|m| m.as_str())
        .unwrap_or_default();
    Ok(Value::from(extracted))
}

fn list_get(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    let items = list("list_get", arg(args, 0))?;
    let index = optional_int(arg(args, 1)).unwrap_or(0);
    let len = items.len() as i64;
    let position = if index < 0 { index + len } else { index };
    Ok(usize::try_from(position)
        .ok()
        .and_then(|i| items.get(i))
        .unwrap_or(arg(args, 2))
        .clone())
}

/// Positions selected by `items[start:end:step]` with negative indices
/// counting from the end.
fn slice_positions(len: i64, start: Option<i64>, end: Option<i64>, step: i64) -> Vec<usize> {
    let normalize = |i: i64, low: i64, high: i64| {
        let i = if i < 0 { i + len } else { i };
        i.clamp(low, high)
    };
    let mut positions = vec![];
    if step > 0 {
        let mut i = start.map_or(0, |s| normalize(s, 0, len));
        let stop = end.map_or(len, |e| normalize(e, 0, len));
        while i < stop {
            positions.push(i as usize);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
    } else {
        let mut i = start.map_or(len - 1, |s| normalize(s, -1, len - 1));
        let stop = end.map_or(-1, |e| normalize(e, -1, len - 1));
        while i > stop {
            positions.push(i as usize);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
    }
    positions
}

fn list_slice(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    let items = list("list_slice", arg(args, 0))?;
    let step = optional_int(arg(args, 3)).unwrap_or(1);
    if step == 0 {
        return Err(FunctionError::failed("list_slice() step must not be zero"));
    }
    let positions = slice_positions(
        items.len() as i64,
        optional_int(arg(args, 1)),
        optional_int(arg(args, 2)),
        step,
    );
    Ok(Value::Array(positions.into_iter().map(|i| items[i].clone()).collect()))
}

fn list_index(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    let items = list("list_index", arg(args, 0))?;
    let item = arg(args, 1);
    Ok(match items.iter().position(|v| v.loose_eq(item)) {
        Some(i) => Value::from(i),
        None => Value::Integer(optional_int(arg(args, 2)).unwrap_or(-1)),
    })
}

fn reverse(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    let mut items = list("reversed", arg(args, 0))?.to_vec();
    items.reverse();
    Ok(Value::Array(items))
}

fn list_unique(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    let mut unique: Vec<Value> = vec![];
    for item in list("list_unique", arg(args, 0))? {
        if !unique.iter().any(|seen| seen.loose_eq(item)) {
            unique.push(item.clone());
        }
    }
    Ok(Value::Array(unique))
}

fn list_flatten(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    let mut flat = vec![];
    for item in list("list_flatten", arg(args, 0))? {
        match item {
            Value::Array(inner) => flat.extend(inner.iter().cloned()),
            other => flat.push(other.clone()),
        }
    }
    Ok(Value::Array(flat))
}

fn sorted(args: &[Value], _: &SyntaxConfig) -> Result<Value> {
    let mut items = list("sorted", arg(args, 0))?.to_vec();
    if let Some(pair) = items.windows(2).find(|w| w[0].compare(&w[1]).is_none()) {
        return Err(FunctionError::failed(format!(
            "sorted() cannot compare {} and {}",
            pair[0].type_name(),
            pair[1].type_name()
        )));
    }
    items.sort_by(|a, b| a.compare(b).unwrap_or(Ordering::Equal));
    if arg(args, 1).is_truthy() {
        items.reverse();
    }
    Ok(Value::Array(items))
}

/// Context for one element: the caller's mapping plus the bound names.
fn element_context(base: &Value, bindings: [(&str, Value); 2]) -> Value {
    let mut map = match base {
        Value::Object(map) => map.clone(),
        Value::Null => HashMap::new(),
        other => HashMap::from([("value".to_string(), other.clone())]),
    };
    for (name, value) in bindings {
        map.insert(name.to_string(), value);
    }
    Value::Object(map)
}

fn evaluate(function: &str, expression: &str, context: &Value, config: &SyntaxConfig) -> Result<Value> {
    crate::interpret(expression, context, config)
        .map_err(|err| FunctionError::failed(format!("{}(): {}", function, err)))
}

fn map(args: &[Value], config: &SyntaxConfig) -> Result<Value> {
    let expression = text("map", arg(args, 0))?;
    list("map", arg(args, 1))?
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let context = element_context(
                arg(args, 2),
                [("item", item.clone()), ("index", Value::from(index))],
            );
            evaluate("map", expression, &context, config)
        })
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

fn filter(args: &[Value], config: &SyntaxConfig) -> Result<Value> {
    let expression = text("filter", arg(args, 0))?;
    let mut kept = vec![];
    for (index, item) in list("filter", arg(args, 1))?.iter().enumerate() {
        let context = element_context(
            arg(args, 2),
            [("item", item.clone()), ("index", Value::from(index))],
        );
        if evaluate("filter", expression, &context, config)?.is_truthy() {
            kept.push(item.clone());
        }
    }
    Ok(Value::Array(kept))
}

fn reduce(args: &[Value], config: &SyntaxConfig) -> Result<Value> {
    let expression = text("reduce", arg(args, 0))?;
    let items = list("reduce", arg(args, 1))?;
    let initial = arg(args, 2);

    let (mut acc, rest) = match (initial, items) {
        (_, []) => return Ok(initial.clone()),
        (Value::Null, [first, rest @ ..]) => (first.clone(), rest),
        (initial, all) => (initial.clone(), all),
    };
    for item in rest {
        let context = element_context(arg(args, 3), [("acc", acc), ("item", item.clone())]);
        acc = evaluate("reduce", expression, &context, config)?;
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replacement_template() {
        assert_eq!(replacement_template(r"\2-\1"), "${2}-${1}");
        assert_eq!(replacement_template("$5"), "$$5");
        assert_eq!(replacement_template(r"a\.b"), "a.b");
    }

    #[test]
    fn test_slice_positions() {
        assert_eq!(slice_positions(5, Some(1), Some(4), 1), vec![1, 2, 3]);
        assert_eq!(slice_positions(5, None, None, 2), vec![0, 2, 4]);
        assert_eq!(slice_positions(5, Some(-2), None, 1), vec![3, 4]);
        assert_eq!(slice_positions(3, None, None, -1), vec![2, 1, 0]);
        assert_eq!(slice_positions(3, Some(10), None, 1), Vec::<usize>::new());
        assert_eq!(slice_positions(3, Some(1), Some(3), i64::MAX), vec![1]);
        assert_eq!(slice_positions(3, None, None, i64::MIN), vec![2]);
        assert_eq!(slice_positions(3, Some(-1), None, i64::MIN + 1), vec![2]);
    }
}
