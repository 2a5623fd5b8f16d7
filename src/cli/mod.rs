//! CLI support for drl-lang
//!
//! Provides programmatic access to the `drl` commands so other tools can
//! embed them.

mod check;

pub use check::{CheckOptions, Mode, describe_functions, execute_check};

use std::io;

/// Errors that can occur during CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Tokenizing, parsing or evaluation failed
    #[error("{}", .0.render())]
    Eval(#[from] crate::Error),

    /// Rejected reference indicator or key delimiter
    #[error("Invalid syntax configuration: {0}")]
    Config(#[from] crate::ConfigError),

    /// Context or template tree is not valid JSON
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
