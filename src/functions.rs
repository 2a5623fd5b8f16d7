//! Named functions callable from expressions.
//!
//! Every function carries a declared [`FunctionSignature`]; arguments are
//! checked for arity and coerced to the declared [`ParamKind`] before the body
//! runs, so bodies can rely on the shapes they asked for.
//!
//! Lookup consults the active [`SyntaxConfig`]'s registry first, then the
//! process-wide default registry seeded with the [`builtins`].
//!
//! # Examples
//!
//! ```
//! use drl_lang::{interpret, Function, FunctionSignature, ParamKind, SyntaxConfig, Value};
//!
//! let double = Function::new(
//!     "double",
//!     FunctionSignature::new().param("n", ParamKind::Number),
//!     |args, _config| match &args[0] {
//!         Value::Integer(n) => Ok(Value::Integer(n * 2)),
//!         other => Ok(Value::Float(other.as_float().unwrap_or_default() * 2.0)),
//!     },
//! );
//! let config = SyntaxConfig::default().with_function(double);
//! assert_eq!(interpret("double('21')", &Value::Null, &config).unwrap(), Value::Integer(42));
//! ```

pub mod builtins;

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, LazyLock, PoisonError, RwLock},
};

use crate::{config::SyntaxConfig, value::Value};

/// Expected kind of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Any,
    Integer,
    Float,
    /// Integer or float, whichever the argument already is
    Number,
    String,
    Boolean,
    Array,
    Object,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamKind::Any => "any",
            ParamKind::Integer => "integer",
            ParamKind::Float => "float",
            ParamKind::Number => "number",
            ParamKind::String => "string",
            ParamKind::Boolean => "boolean",
            ParamKind::Array => "array",
            ParamKind::Object => "object",
        };
        f.write_str(name)
    }
}

impl ParamKind {
    /// Convert `value` to this kind, or `None` when it cannot be.
    ///
    /// Numeric strings become numbers, boolean-like strings become booleans
    /// and collections pass through untouched.
    pub fn coerce(&self, value: Value) -> Option<Value> {
        use ParamKind as K;
        match (self, value) {
            (K::Any, v) => Some(v),
            (_, v @ (Value::Array(_) | Value::Object(_))) if !matches!(self, K::Array | K::Object) => {
                Some(v)
            }

            (K::Integer, Value::Integer(n)) => Some(Value::Integer(n)),
            (K::Integer, Value::Float(n)) if n.is_finite() => Some(Value::Integer(n.trunc() as i64)),
            (K::Integer, Value::Boolean(b)) => Some(Value::Integer(i64::from(b))),
            (K::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::Integer),

            (K::Float, Value::Float(n)) => Some(Value::Float(n)),
            (K::Float, Value::Integer(n)) => Some(Value::Float(n as f64)),
            (K::Float, Value::Boolean(b)) => Some(Value::Float(if b { 1.0 } else { 0.0 })),
            (K::Float, Value::String(s)) => s.trim().parse::<f64>().ok().map(Value::Float),

            (K::Number, v @ (Value::Integer(_) | Value::Float(_))) => Some(v),
            (K::Number, Value::Boolean(b)) => Some(Value::Integer(i64::from(b))),
            (K::Number, Value::String(s)) => {
                let s = s.trim();
                s.parse::<i64>()
                    .map(Value::Integer)
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(Value::Float))
            }

            (K::String, Value::Null) => None,
            (K::String, v) => Some(Value::String(v.to_text())),

            (K::Boolean, Value::Boolean(b)) => Some(Value::Boolean(b)),
            (K::Boolean, Value::Null) => Some(Value::Boolean(false)),
            (K::Boolean, v @ (Value::Integer(_) | Value::Float(_))) => {
                Some(Value::Boolean(v.is_truthy()))
            }
            (K::Boolean, Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(Value::Boolean(true)),
                "false" | "no" | "0" => Some(Value::Boolean(false)),
                _ => None,
            },

            (K::Array, v @ Value::Array(_)) => Some(v),
            (K::Object, v @ Value::Object(_)) => Some(v),
            _ => None,
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    /// May be omitted; an explicit null is passed through uncoerced
    pub optional: bool,
}

/// Declared parameter list of a function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionSignature {
    pub params: Vec<Param>,
    /// Kind of any arguments beyond `params`
    pub variadic: Option<ParamKind>,
}

impl FunctionSignature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: &str, kind: ParamKind) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            kind,
            optional: false,
        });
        self
    }

    pub fn optional(mut self, name: &str, kind: ParamKind) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            kind,
            optional: true,
        });
        self
    }

    pub fn variadic(mut self, kind: ParamKind) -> Self {
        self.variadic = Some(kind);
        self
    }

    fn required_count(&self) -> usize {
        self.params.iter().filter(|p| !p.optional).count()
    }

    fn arity_text(&self) -> String {
        let required = self.required_count();
        match (self.variadic, self.params.len()) {
            (Some(_), _) => format!("at least {}", required),
            (None, total) if total == required => format!("exactly {}", required),
            (None, total) => format!("{} to {}", required, total),
        }
    }

    /// Check arity and coerce each argument to its declared kind.
    pub fn bind(&self, function: &str, args: Vec<Value>) -> Result<Vec<Value>, FunctionError> {
        let too_many = self.variadic.is_none() && args.len() > self.params.len();
        if args.len() < self.required_count() || too_many {
            return Err(FunctionError::Arity {
                function: function.to_string(),
                expected: self.arity_text(),
                given: args.len(),
            });
        }

        args.into_iter()
            .enumerate()
            .map(|(i, arg)| {
                let (name, kind, optional) = match self.params.get(i) {
                    Some(param) => (param.name.clone(), param.kind, param.optional),
                    None => (format!("arg{}", i + 1), self.variadic.unwrap_or(ParamKind::Any), false),
                };
                if optional && arg.is_null() {
                    return Ok(arg);
                }
                let shown = arg.to_string();
                kind.coerce(arg).ok_or(FunctionError::Coercion {
                    function: function.to_string(),
                    param: name,
                    value: shown,
                    kind,
                })
            })
            .collect()
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self
            .params
            .iter()
            .map(|p| format!("{}{}: {}", p.name, if p.optional { "?" } else { "" }, p.kind))
            .collect();
        if let Some(kind) = self.variadic {
            parts.push(format!("...{}", kind));
        }
        write!(f, "({})", parts.join(", "))
    }
}

/// Failure raised while binding arguments or running a function body.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FunctionError {
    #[error("{function}() takes {expected} argument(s) but {given} were given")]
    Arity {
        function: String,
        expected: String,
        given: usize,
    },

    #[error("{function}(): argument '{param}' cannot convert {value} to {kind}")]
    Coercion {
        function: String,
        param: String,
        value: String,
        kind: ParamKind,
    },

    #[error("{0}")]
    Failed(String),
}

impl FunctionError {
    pub fn failed(message: impl Into<String>) -> Self {
        FunctionError::Failed(message.into())
    }
}

type Body = dyn Fn(&[Value], &SyntaxConfig) -> Result<Value, FunctionError> + Send + Sync;

/// A callable registered under a name.
#[derive(Clone)]
pub struct Function {
    name: String,
    signature: FunctionSignature,
    summary: String,
    body: Arc<Body>,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl Function {
    /// The body receives coerced arguments and the active configuration.
    pub fn new<F>(name: &str, signature: FunctionSignature, body: F) -> Self
    where
        F: Fn(&[Value], &SyntaxConfig) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        Function {
            name: name.to_string(),
            signature,
            summary: String::new(),
            body: Arc::new(body),
        }
    }

    /// One-line description shown by `drl functions`.
    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = summary.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn call(&self, args: Vec<Value>, config: &SyntaxConfig) -> Result<Value, FunctionError> {
        let args = self.signature.bind(&self.name, args)?;
        (self.body)(&args, config)
    }
}

/// Functions by name.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<Function>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in function.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for function in builtins::all() {
            registry.register(function);
        }
        registry
    }

    /// Add a function, replacing any previous one of the same name.
    pub fn register(&mut self, function: Function) {
        self.functions
            .insert(function.name.clone(), Arc::new(function));
    }

    pub fn get(&self, name: &str) -> Option<Arc<Function>> {
        self.functions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Functions sorted by name.
    pub fn functions(&self) -> Vec<Arc<Function>> {
        let mut all: Vec<_> = self.functions.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }
}

static DEFAULT_REGISTRY: LazyLock<RwLock<FunctionRegistry>> =
    LazyLock::new(|| RwLock::new(FunctionRegistry::with_builtins()));

/// Make a function visible to every configuration.
pub fn register_default_function(function: Function) {
    tracing::debug!(function = function.name(), "registering default function");
    DEFAULT_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(function);
}

/// Snapshot of the default registry, sorted by name.
pub fn default_functions() -> Vec<Arc<Function>> {
    DEFAULT_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .functions()
}

/// Resolve `name` against `config` first, then the default registry.
///
/// The lock is released before the function is returned, so bodies may
/// themselves evaluate expressions or register functions.
pub fn lookup(name: &str, config: &SyntaxConfig) -> Option<Arc<Function>> {
    config.functions().get(name).or_else(|| {
        DEFAULT_REGISTRY
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
    })
}
