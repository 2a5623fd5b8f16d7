//! Diagnostics shared by every stage of the pipeline.
//!
//! All failures surface as a single [`Error`] carrying its [`ErrorKind`], the
//! text being processed and, where known, the character offset of the
//! offending input. [`Error::render`] turns that into a caret diagnostic:
//!
//! ```text
//! Reference key 'age' not found in context
//!   Expression: $(user>age) + 1
//!   Position 0:
//!     $(user>age) + 1
//!     ^
//!   Failed at: user>age
//!   Available keys: name
//! ```

use std::fmt;

/// The four failure categories of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed token stream or grammar
    Syntax,
    /// A required reference path did not resolve
    Reference,
    /// Unknown function name
    Name,
    /// Illegal operation for the operand types
    Type,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Syntax => write!(f, "Syntax"),
            ErrorKind::Reference => write!(f, "Reference"),
            ErrorKind::Name => write!(f, "Name"),
            ErrorKind::Type => write!(f, "Type"),
        }
    }
}

/// Structured context attached to an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hint {
    /// Keys present in the mapping where navigation stopped
    pub available_keys: Vec<String>,
    /// Free-form advice (path prefix reached, expected syntax, ...)
    pub suggestion: Option<String>,
}

/// An error raised while tokenizing, parsing or evaluating.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    /// The expression or template being processed
    pub source_text: String,
    /// Character offset into `source_text`
    pub offset: Option<usize>,
    pub hint: Option<Hint>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
            source_text: String::new(),
            offset: None,
            hint: None,
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    pub fn reference(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Reference, message)
    }

    pub fn name(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Name, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    pub fn at(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Attach the source text unless an inner stage already did.
    pub fn in_source(mut self, source: &str) -> Self {
        if self.source_text.is_empty() {
            self.source_text = source.to_string();
        }
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.hint.get_or_insert_with(Hint::default).suggestion = Some(suggestion.into());
        self
    }

    pub fn with_available_keys(mut self, keys: Vec<String>) -> Self {
        self.hint.get_or_insert_with(Hint::default).available_keys = keys;
        self
    }

    /// Multi-line diagnostic with a caret under the offending offset.
    pub fn render(&self) -> String {
        let mut parts = vec![self.message.clone()];

        if !self.source_text.is_empty() {
            parts.push(format!("  Expression: {}", self.source_text));

            let chars: Vec<char> = self.source_text.chars().collect();
            if let Some(offset) = self.offset
                && offset < chars.len()
            {
                let start = offset.saturating_sub(40);
                let end = (offset + 40).min(chars.len());
                let snippet: String = chars[start..end].iter().collect();
                parts.push(format!("  Position {}:", offset));
                parts.push(format!("    {}", snippet));
                parts.push(format!("    {}^", " ".repeat(offset - start)));
            }
        }

        if let Some(hint) = &self.hint {
            if let Some(suggestion) = &hint.suggestion {
                parts.push(format!("  {}", suggestion));
            }
            if !hint.available_keys.is_empty() {
                parts.push(format!("  Available keys: {}", hint.available_keys.join(", ")));
            }
        }

        parts.join("\n")
    }
}

/// Rejected `SyntaxConfig` symbols.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{role} must not be empty")]
    EmptySymbol { role: &'static str },

    #[error("{role} '{symbol}' conflicts with reserved syntax character {reserved:?}")]
    ReservedCharacter {
        role: &'static str,
        symbol: String,
        reserved: char,
    },

    #[error("reference indicator and key delimiter must differ (both are '{0}')")]
    SameSymbol(String),
}
