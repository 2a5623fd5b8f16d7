use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::{
    ast::{BinOp, Expr, RefMode, Reference, Segment, UnaryOp},
    config::SyntaxConfig,
    error::Error,
    functions,
    value::Value,
};

/// Deepest reference nesting accepted before evaluation gives up.
pub const MAX_REFERENCE_DEPTH: usize = 100;

/// Number of sibling keys listed in a missing-key diagnostic.
const MAX_LISTED_KEYS: usize = 5;

/// Walks an expression tree against a context.
///
/// The context and configuration are only ever read; one evaluator can be
/// reused for any number of expressions.
pub struct Evaluator<'a> {
    context: &'a Value,
    config: &'a SyntaxConfig,
    /// References written in template text rather than an expression
    template: bool,
}

/// One resolved path step.
struct PathKey {
    name: String,
    index: Option<usize>,
}

impl PathKey {
    fn from_segment(name: &str, index: Option<usize>) -> Self {
        PathKey {
            name: name.to_string(),
            index,
        }
    }
}

impl<'a> Evaluator<'a> {
    pub fn new(context: &'a Value, config: &'a SyntaxConfig) -> Self {
        Evaluator {
            context,
            config,
            template: false,
        }
    }

    /// Evaluate references found in template text.
    ///
    /// An unresolved bare reference renders as the empty string and a
    /// literal-fallback reference keeps its brackets.
    pub fn template_mode(mut self, template: bool) -> Self {
        self.template = template;
        self
    }

    pub fn evaluate(&self, expr: &Expr) -> Result<Value, Error> {
        self.eval_expr(expr, 0)
    }

    fn eval_expr(&self, expr: &Expr, depth: usize) -> Result<Value, Error> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Reference(reference) => self.resolve_reference(reference, depth),
            Expr::Unary {
                op,
                operand,
                offset,
            } => {
                let value = self.eval_expr(operand, depth)?;
                apply_unary(*op, &value).map_err(|err| err.at(*offset))
            }
            Expr::Binary {
                op,
                left,
                right,
                offset,
            } => {
                // Both sides are always evaluated, left first
                let left = self.eval_expr(left, depth)?;
                let right = self.eval_expr(right, depth)?;
                apply_binary(*op, &left, &right).map_err(|err| err.at(*offset))
            }
            Expr::Call { name, args, offset } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval_expr(arg, depth))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call_function(name, args, *offset)
            }
        }
    }

    fn call_function(&self, name: &str, args: Vec<Value>, offset: usize) -> Result<Value, Error> {
        let Some(function) = functions::lookup(name, self.config) else {
            return Err(Error::name(format!("Function '{}' not found", name))
                .at(offset)
                .with_suggestion("Register it on the SyntaxConfig or the default registry"));
        };

        tracing::trace!(function = name, args = args.len(), "calling function");
        function
            .call(args, self.config)
            .map_err(|err| Error::type_error(err.to_string()).at(offset))
    }

    fn resolve_reference(&self, reference: &Reference, depth: usize) -> Result<Value, Error> {
        if depth >= MAX_REFERENCE_DEPTH {
            return Err(Error::type_error(format!(
                "Reference nesting too deep (more than {} levels)",
                MAX_REFERENCE_DEPTH
            ))
            .at(reference.offset));
        }

        let mut keys = Vec::with_capacity(reference.path.segments.len());
        for segment in &reference.path.segments {
            match segment {
                Segment::Key { name, index } => keys.push(PathKey::from_segment(name, *index)),
                Segment::Nested(expr) => {
                    let value = self.eval_expr(expr, depth + 1)?;
                    match self.key_from_value(value, reference)? {
                        Some(key) => keys.push(key),
                        None => {
                            return self.unresolved(
                                reference,
                                Error::reference("Nested reference resolved to null")
                                    .at(reference.offset),
                            );
                        }
                    }
                }
            }
        }

        let value = self.navigate(reference, &keys)?;
        tracing::trace!(reference = %reference.raw, "resolved reference");
        Ok(value)
    }

    /// Key text for a nested segment's value; `None` for null.
    fn key_from_value(&self, value: Value, reference: &Reference) -> Result<Option<PathKey>, Error> {
        let key = match value {
            Value::Null => return Ok(None),
            Value::String(s) => match Segment::key(&s) {
                Segment::Key { name, index } => PathKey { name, index },
                Segment::Nested(_) => PathKey { name: s, index: None },
            },
            Value::Integer(n) => PathKey {
                name: n.to_string(),
                index: usize::try_from(n).ok(),
            },
            scalar @ (Value::Float(_) | Value::Boolean(_)) => PathKey {
                name: scalar.to_text(),
                index: None,
            },
            collection => {
                return Err(Error::type_error(format!(
                    "Nested reference resolved to {}, which cannot be used as a key",
                    collection.type_name()
                ))
                .at(reference.offset));
            }
        };
        Ok(Some(key))
    }

    fn navigate(&self, reference: &Reference, keys: &[PathKey]) -> Result<Value, Error> {
        let delimiter = self.config.key_delimiter();
        let mut current = self.context;

        for (i, key) in keys.iter().enumerate() {
            let failed_at = || {
                keys[..=i]
                    .iter()
                    .map(|k| k.name.as_str())
                    .collect::<Vec<_>>()
                    .join(delimiter)
            };

            current = match current {
                Value::Object(map) => match map.get(&key.name) {
                    Some(next) => next,
                    None => {
                        let mut available: Vec<String> = map.keys().cloned().collect();
                        available.sort();
                        available.truncate(MAX_LISTED_KEYS);
                        let err = Error::reference(format!(
                            "Reference key '{}' not found in context",
                            key.name
                        ))
                        .at(reference.offset)
                        .with_suggestion(format!("Failed at: {}", failed_at()))
                        .with_available_keys(available);
                        return self.unresolved(reference, err);
                    }
                },
                Value::Array(items) => match key.index {
                    Some(index) if index < items.len() => &items[index],
                    Some(index) => {
                        let err = Error::reference(format!(
                            "Index {} out of range for sequence of length {}",
                            index,
                            items.len()
                        ))
                        .at(reference.offset)
                        .with_suggestion(format!("Failed at: {}", failed_at()));
                        return self.unresolved(reference, err);
                    }
                    None => {
                        let err = Error::type_error(format!(
                            "Sequence index must be a non-negative integer, got '{}'",
                            key.name
                        ))
                        .at(reference.offset)
                        .with_suggestion(format!("Failed at: {}", failed_at()));
                        return self.unresolved(reference, err);
                    }
                },
                scalar => {
                    let err = Error::type_error(format!(
                        "Cannot navigate into {} with key '{}'",
                        scalar.type_name(),
                        key.name
                    ))
                    .at(reference.offset)
                    .with_suggestion(format!("Failed at: {}", failed_at()));
                    return self.unresolved(reference, err);
                }
            };
        }

        Ok(current.clone())
    }

    /// Apply the reference mode to a navigation failure.
    fn unresolved(&self, reference: &Reference, err: Error) -> Result<Value, Error> {
        match reference.mode {
            RefMode::Optional => Ok(Value::Null),
            RefMode::LiteralFallback if self.template => Ok(Value::String(reference.raw.clone())),
            RefMode::LiteralFallback => Ok(Value::String(self.unbracketed(reference))),
            RefMode::Bare if self.template => Ok(Value::String(String::new())),
            RefMode::Bare | RefMode::Required => Err(err),
        }
    }

    /// `${a>b}` without its brackets: `$a>b`.
    fn unbracketed(&self, reference: &Reference) -> String {
        let indicator = self.config.ref_indicator();
        let inner: String = reference
            .raw
            .chars()
            .skip(indicator.chars().count() + 1)
            .collect();
        let inner = inner.strip_suffix('}').unwrap_or(&inner);
        format!("{}{}", indicator, inner.trim())
    }
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Numeric view of a value; numeric strings are parsed.
    fn of(value: &Value) -> Option<Number> {
        match value {
            Value::Integer(n) => Some(Number::Int(*n)),
            Value::Float(n) => Some(Number::Float(*n)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .map(Number::Int)
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(Number::Float))
            }
            _ => None,
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(n) => n,
        }
    }

    fn to_decimal(self) -> Option<Decimal> {
        match self {
            Number::Int(n) => Decimal::from_i64(n),
            Number::Float(n) => Decimal::from_f64(n),
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Number::Int(n) => n == 0,
            Number::Float(n) => n == 0.0,
        }
    }
}

fn operator_name(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "add",
        BinOp::Subtract => "subtract",
        BinOp::Multiply => "multiply",
        BinOp::Divide => "divide",
        BinOp::Modulo => "take the modulo of",
        BinOp::Power => "raise",
        _ => "combine",
    }
}

pub(crate) fn apply_unary(op: UnaryOp, value: &Value) -> Result<Value, Error> {
    match op {
        UnaryOp::Not => Ok(Value::Boolean(!value.is_truthy())),
        UnaryOp::Negate => match Number::of(value) {
            Some(Number::Int(n)) => Ok(n
                .checked_neg()
                .map(Value::Integer)
                .unwrap_or(Value::Float(-(n as f64)))),
            Some(Number::Float(n)) => Ok(Value::Float(-n)),
            None => Err(Error::type_error(format!("Cannot negate {}", value.type_name()))),
        },
    }
}

/// Apply a binary operator to two evaluated operands.
pub(crate) fn apply_binary(op: BinOp, left: &Value, right: &Value) -> Result<Value, Error> {
    match op {
        BinOp::And => Ok(Value::Boolean(left.is_truthy() && right.is_truthy())),
        BinOp::Or => Ok(Value::Boolean(left.is_truthy() || right.is_truthy())),
        BinOp::Equal => Ok(Value::Boolean(left.loose_eq(right))),
        BinOp::NotEqual => Ok(Value::Boolean(!left.loose_eq(right))),
        BinOp::LessThan | BinOp::GreaterThan | BinOp::LessEqual | BinOp::GreaterEqual => {
            let Some(ordering) = left.compare(right) else {
                return Err(Error::type_error(format!(
                    "Cannot compare {} and {} with '{}'",
                    left.type_name(),
                    right.type_name(),
                    op.symbol()
                )));
            };
            Ok(Value::Boolean(match op {
                BinOp::LessThan => ordering.is_lt(),
                BinOp::GreaterThan => ordering.is_gt(),
                BinOp::LessEqual => ordering.is_le(),
                _ => ordering.is_ge(),
            }))
        }
        BinOp::Add => match (left, right) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
            (Value::Array(a), Value::Array(b)) => {
                Ok(Value::Array(a.iter().chain(b.iter()).cloned().collect()))
            }
            _ => numeric(op, left, right),
        },
        _ => numeric(op, left, right),
    }
}

fn numeric(op: BinOp, left: &Value, right: &Value) -> Result<Value, Error> {
    let (Some(a), Some(b)) = (Number::of(left), Number::of(right)) else {
        return Err(Error::type_error(format!(
            "Cannot {} {} and {}",
            operator_name(op),
            left.type_name(),
            right.type_name()
        )));
    };

    if matches!(op, BinOp::Divide | BinOp::Modulo) && b.is_zero() {
        let what = if op == BinOp::Divide { "Division" } else { "Modulo" };
        return Err(Error::type_error(format!("{} by zero", what)));
    }

    Ok(match (a, b) {
        (Number::Int(a), Number::Int(b)) => integer_arithmetic(op, a, b),
        (Number::Float(a), Number::Float(b)) => Value::Float(float_arithmetic(op, a, b)),
        (a, b) => mixed_arithmetic(op, a, b),
    })
}

fn integer_arithmetic(op: BinOp, a: i64, b: i64) -> Value {
    let exact = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Subtract => a.checked_sub(b),
        BinOp::Multiply => a.checked_mul(b),
        BinOp::Divide => match a.checked_rem(b) {
            Some(0) => a.checked_div(b),
            _ => None,
        },
        BinOp::Modulo => a
            .checked_rem(b)
            .map(|r| if r != 0 && (r < 0) != (b < 0) { r + b } else { r }),
        BinOp::Power => u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp)),
        _ => None,
    };
    match exact {
        Some(n) => Value::Integer(n),
        // Inexact division, negative exponent or overflow
        None => Value::Float(float_arithmetic(op, a as f64, b as f64)),
    }
}

fn float_arithmetic(op: BinOp, a: f64, b: f64) -> f64 {
    match op {
        BinOp::Add => a + b,
        BinOp::Subtract => a - b,
        BinOp::Multiply => a * b,
        BinOp::Divide => a / b,
        BinOp::Modulo => a - b * (a / b).floor(),
        BinOp::Power => a.powf(b),
        _ => f64::NAN,
    }
}

/// Integer with float: exact decimal arithmetic, whole results become integers.
fn mixed_arithmetic(op: BinOp, a: Number, b: Number) -> Value {
    if op != BinOp::Power
        && let Some(ad) = a.to_decimal()
        && let Some(bd) = b.to_decimal()
    {
        let rd = match op {
            BinOp::Add => ad.checked_add(bd),
            BinOp::Subtract => ad.checked_sub(bd),
            BinOp::Multiply => ad.checked_mul(bd),
            BinOp::Divide => ad.checked_div(bd),
            BinOp::Modulo => ad.checked_rem(bd).map(|r| {
                if !r.is_zero() && r.is_sign_negative() != bd.is_sign_negative() {
                    r + bd
                } else {
                    r
                }
            }),
            _ => None,
        };
        if let Some(rd) = rd {
            if rd.is_integer()
                && let Some(r) = rd.to_i64()
            {
                return Value::Integer(r);
            } else if let Some(r) = rd.to_f64() {
                return Value::Float(r);
            }
        }
    }
    Value::Float(float_arithmetic(op, a.to_f64(), b.to_f64()))
}
