//! Template interpolation.
//!
//! Template text is literal except for references and `{% ... %}` expression
//! blocks:
//!
//! ```text
//! Hello $user>name, you are {% $user>age + 1 %} next year
//! ```
//!
//! A template that is nothing but one reference (or one `{%= ... %}` block),
//! give or take surrounding whitespace, evaluates to that value unchanged.
//! Anything else renders to a string.

use std::collections::HashMap;

use crate::{
    ast::Expr,
    config::SyntaxConfig,
    error::Error,
    evaluator::Evaluator,
    lexer::Lexer,
    parser::{self, Parser},
    value::Value,
};

const BLOCK_OPEN: [char; 2] = ['{', '%'];
const BLOCK_CLOSE: [char; 2] = ['%', '}'];

enum Fragment {
    Literal(String),
    /// `preserving` fragments may hand back their native value
    Dynamic { value: Value, preserving: bool },
}

fn starts_with_at(chars: &[char], position: usize, pattern: &[char]) -> bool {
    chars
        .get(position..position + pattern.len())
        .is_some_and(|window| window == pattern)
}

fn find_from(chars: &[char], from: usize, pattern: &[char]) -> Option<usize> {
    (from..chars.len()).find(|&i| starts_with_at(chars, i, pattern))
}

/// Render `template` against `context`.
///
/// # Examples
///
/// ```
/// use drl_lang::{interpolate, SyntaxConfig, Value};
/// use serde_json::json;
///
/// let context = Value::from(json!({"count": 5}));
/// let config = SyntaxConfig::default();
/// assert_eq!(interpolate("$count", &context, &config).unwrap(), Value::Integer(5));
/// assert_eq!(
///     interpolate("Count: $count", &context, &config).unwrap(),
///     Value::from("Count: 5")
/// );
/// ```
pub fn interpolate(template: &str, context: &Value, config: &SyntaxConfig) -> Result<Value, Error> {
    tracing::debug!(template, "interpolate");
    render(template, context, config).map_err(|err| err.in_source(template))
}

fn render(template: &str, context: &Value, config: &SyntaxConfig) -> Result<Value, Error> {
    let chars: Vec<char> = template.chars().collect();
    let mut scanner = Lexer::new(template, config).template_mode(true);
    let indicator = config.ref_indicator();
    let mut fragments = vec![];
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        if starts_with_at(&chars, i, &BLOCK_OPEN) {
            let Some(end) = find_from(&chars, i + BLOCK_OPEN.len(), &BLOCK_CLOSE) else {
                return Err(Error::syntax("Unterminated expression block")
                    .at(i)
                    .with_suggestion("Close the block with '%}'"));
            };

            let mut body_start = i + BLOCK_OPEN.len();
            let preserving = chars.get(body_start) == Some(&'=');
            if preserving {
                body_start += 1;
            }
            let body: String = chars[body_start..end].iter().collect();
            let expr = parse_block(&body, config, body_start)?;
            let value = Evaluator::new(context, config).evaluate(&expr)?;

            if !literal.is_empty() {
                fragments.push(Fragment::Literal(std::mem::take(&mut literal)));
            }
            fragments.push(Fragment::Dynamic { value, preserving });
            i = end + BLOCK_CLOSE.len();
            continue;
        }

        if scanner.at_indicator(i) {
            scanner.seek(i);
            match scanner.scan_reference()? {
                Some(token) => {
                    let reference = parser::parse_reference(token, config, Default::default())?;
                    let value = Evaluator::new(context, config)
                        .template_mode(true)
                        .evaluate(&Expr::Reference(reference))?;
                    if !literal.is_empty() {
                        fragments.push(Fragment::Literal(std::mem::take(&mut literal)));
                    }
                    fragments.push(Fragment::Dynamic {
                        value,
                        preserving: true,
                    });
                    i = scanner.position();
                }
                // No path after the indicator: it is plain text
                None => {
                    literal.push_str(indicator);
                    i += indicator.chars().count();
                }
            }
            continue;
        }

        literal.push(chars[i]);
        i += 1;
    }

    if !literal.is_empty() {
        fragments.push(Fragment::Literal(literal));
    }

    Ok(compose(fragments))
}

fn parse_block(body: &str, config: &SyntaxConfig, offset: usize) -> Result<Expr, Error> {
    let lexer = Lexer::new(body, config).with_base_offset(offset);
    Parser::new(lexer, config)?.parse()
}

fn compose(fragments: Vec<Fragment>) -> Value {
    let dynamic = fragments
        .iter()
        .filter(|f| matches!(f, Fragment::Dynamic { .. }))
        .count();
    let blank_literals = fragments.iter().all(|f| match f {
        Fragment::Literal(text) => text.trim().is_empty(),
        Fragment::Dynamic { .. } => true,
    });

    if dynamic == 1 && blank_literals {
        for fragment in &fragments {
            if let Fragment::Dynamic {
                value,
                preserving: true,
            } = fragment
            {
                return value.clone();
            }
        }
    }

    let mut rendered = String::new();
    for fragment in fragments {
        match fragment {
            Fragment::Literal(text) => rendered.push_str(&text),
            Fragment::Dynamic { value, .. } => rendered.push_str(&value.to_text()),
        }
    }
    Value::String(rendered)
}

/// Interpolate every string leaf of `templates`, keeping its shape.
///
/// With `drop_empty` set on the configuration, mapping entries that render
/// to null or the empty string are omitted. Any failing leaf fails the
/// whole call.
pub fn interpolate_dict(
    templates: &Value,
    context: &Value,
    config: &SyntaxConfig,
) -> Result<Value, Error> {
    walk(
        templates,
        config,
        &|template: &str| interpolate(template, context, config),
        &|value: &Value| value.is_null() || value.as_str() == Some(""),
    )
}

/// Evaluate every string leaf of `expressions` as an expression.
///
/// With `drop_empty` set on the configuration, mapping entries that evaluate
/// to null are omitted.
pub fn interpret_dict(
    expressions: &Value,
    context: &Value,
    config: &SyntaxConfig,
) -> Result<Value, Error> {
    walk(
        expressions,
        config,
        &|expression: &str| crate::interpret(expression, context, config),
        &Value::is_null,
    )
}

fn walk(
    node: &Value,
    config: &SyntaxConfig,
    leaf: &dyn Fn(&str) -> Result<Value, Error>,
    is_empty: &dyn Fn(&Value) -> bool,
) -> Result<Value, Error> {
    match node {
        Value::String(text) => leaf(text),
        Value::Array(items) => items
            .iter()
            .map(|item| walk(item, config, leaf, is_empty))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            // Sorted so the first failure reported is deterministic
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            let mut result = HashMap::with_capacity(map.len());
            for key in keys {
                let value = walk(&map[key], config, leaf, is_empty)?;
                if config.drop_empty() && is_empty(&value) {
                    continue;
                }
                result.insert(key.clone(), value);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}
