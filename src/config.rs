//! Syntax configuration: the symbols references are written with, functions
//! scoped to one configuration, and template filtering.

use crate::{
    error::ConfigError,
    functions::{Function, FunctionRegistry},
};

/// Characters that may never appear in either configurable symbol.
const RESERVED: &[char] = &['(', ')', ',', '\'', '"'];

/// Characters the tokenizer reads as operators.
pub(crate) const OPERATOR_CHARS: &[char] = &['+', '-', '*', '/', '%', '^', '<', '>', '=', '!'];

/// Symbols and options governing one evaluation.
///
/// # Examples
///
/// ```
/// use drl_lang::{interpret, SyntaxConfig, Value};
/// use serde_json::json;
///
/// let config = SyntaxConfig::new("@", ".").unwrap();
/// let context = Value::from(json!({"a": {"b": {"c": 42}}}));
/// assert_eq!(interpret("@a.b.c", &context, &config).unwrap(), Value::Integer(42));
///
/// assert!(SyntaxConfig::new("(", ">").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct SyntaxConfig {
    ref_indicator: String,
    key_delimiter: String,
    functions: FunctionRegistry,
    drop_empty: bool,
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        SyntaxConfig {
            ref_indicator: "$".to_string(),
            key_delimiter: ">".to_string(),
            functions: FunctionRegistry::new(),
            drop_empty: false,
        }
    }
}

impl SyntaxConfig {
    /// Build a configuration with custom symbols.
    ///
    /// Fails when a symbol is empty, contains `( ) , ' "` or whitespace, or
    /// when both symbols are identical.
    pub fn new(ref_indicator: &str, key_delimiter: &str) -> Result<Self, ConfigError> {
        validate_symbol("reference indicator", ref_indicator)?;
        validate_symbol("key delimiter", key_delimiter)?;
        if ref_indicator == key_delimiter {
            return Err(ConfigError::SameSymbol(ref_indicator.to_string()));
        }

        let config = SyntaxConfig {
            ref_indicator: ref_indicator.to_string(),
            key_delimiter: key_delimiter.to_string(),
            ..SyntaxConfig::default()
        };

        // `<`, `>` and `=` are disambiguated by the tokenizer
        let collisions = config.delimiter_warnings();
        if !collisions.is_empty() && !config.delimiter_is_comparison() {
            tracing::warn!(
                key_delimiter,
                ?collisions,
                "key delimiter contains operator characters; bare references may be ambiguous"
            );
        }

        Ok(config)
    }

    /// Omit null/empty entries from `interpolate_dict` results.
    pub fn with_drop_empty(mut self, drop_empty: bool) -> Self {
        self.drop_empty = drop_empty;
        self
    }

    /// Scope a function to this configuration.
    pub fn with_function(mut self, function: Function) -> Self {
        self.functions.register(function);
        self
    }

    /// Register a function visible only to evaluations using this config.
    ///
    /// Shadows a default-registry function of the same name.
    pub fn register_function(&mut self, function: Function) -> &mut Self {
        self.functions.register(function);
        self
    }

    pub fn ref_indicator(&self) -> &str {
        &self.ref_indicator
    }

    pub fn key_delimiter(&self) -> &str {
        &self.key_delimiter
    }

    pub fn drop_empty(&self) -> bool {
        self.drop_empty
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Operator characters contained in the key delimiter.
    pub fn delimiter_warnings(&self) -> Vec<char> {
        let mut found: Vec<char> = self
            .key_delimiter
            .chars()
            .filter(|c| OPERATOR_CHARS.contains(c))
            .collect();
        found.dedup();
        found
    }

    /// Whether the delimiter doubles as a comparison operator (`<`, `>`, `=`).
    pub(crate) fn delimiter_is_comparison(&self) -> bool {
        self.key_delimiter.chars().count() == 1
            && self.key_delimiter.chars().all(|c| matches!(c, '<' | '>' | '='))
    }
}

fn validate_symbol(role: &'static str, symbol: &str) -> Result<(), ConfigError> {
    if symbol.is_empty() {
        return Err(ConfigError::EmptySymbol { role });
    }
    if let Some(reserved) = symbol
        .chars()
        .find(|c| RESERVED.contains(c) || c.is_whitespace())
    {
        return Err(ConfigError::ReservedCharacter {
            role,
            symbol: symbol.to_string(),
            reserved,
        });
    }
    Ok(())
}
