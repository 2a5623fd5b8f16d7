//! # DRL - a small expression and template language over JSON-like data
//!
//! Expressions reference values in a context by path, combine them with
//! arithmetic, comparison and logical operators, and call named functions:
//!
//! ```
//! use drl_lang::{interpret, SyntaxConfig, Value};
//! use serde_json::json;
//!
//! let context = Value::from(json!({"user": {"name": "Alice", "age": 30}}));
//! let config = SyntaxConfig::default();
//!
//! let greeting = interpret("upper($user>name) + '!'", &context, &config).unwrap();
//! assert_eq!(greeting, Value::from("ALICE!"));
//!
//! let missing = interpret("$[user>email]", &context, &config).unwrap();
//! assert_eq!(missing, Value::Null);
//! ```
//!
//! Templates embed references and `{% ... %}` blocks in literal text; see
//! [`interpolate`].

pub mod ast;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod template;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{Expr, RefMode, Token, TokenKind};
pub use config::SyntaxConfig;
pub use error::{ConfigError, Error, ErrorKind, Hint};
pub use evaluator::{Evaluator, MAX_REFERENCE_DEPTH};
pub use functions::{
    Function, FunctionError, FunctionRegistry, FunctionSignature, ParamKind,
    register_default_function,
};
pub use lexer::Lexer;
pub use output::{to_json, to_json_pretty};
pub use parser::{MAX_EXPRESSION_DEPTH, Parser};
pub use template::{interpolate, interpolate_dict, interpret_dict};
pub use value::Value;

/// Split an expression into tokens, ending with [`TokenKind::Eof`].
pub fn tokenize(expression: &str, config: &SyntaxConfig) -> Result<Vec<Token>, Error> {
    Lexer::new(expression, config)
        .tokenize()
        .map_err(|err| err.in_source(expression))
}

/// Parse an expression into its tree. An empty expression is a null literal.
pub fn parse(expression: &str, config: &SyntaxConfig) -> Result<Expr, Error> {
    Parser::new(Lexer::new(expression, config), config)
        .and_then(|mut parser| parser.parse())
        .map_err(|err| err.in_source(expression))
}

/// Evaluate an expression against `context`.
pub fn interpret(expression: &str, context: &Value, config: &SyntaxConfig) -> Result<Value, Error> {
    tracing::debug!(expression, "interpret");
    let expr = parse(expression, config)?;
    Evaluator::new(context, config)
        .evaluate(&expr)
        .map_err(|err| err.in_source(expression))
}
