//! Evaluate expressions and render templates against JSON input

use super::CliError;
use crate::{
    SyntaxConfig, Value, functions, interpolate, interpolate_dict, interpret,
};

/// What the input text is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// A single expression
    #[default]
    Expression,
    /// Template text
    Template,
    /// A JSON tree whose string leaves are templates
    TemplateTree,
}

/// Options shared by `drl eval` and `drl render`
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Expression, template, or JSON template tree
    pub input: String,
    /// JSON context (null when absent)
    pub context: Option<String>,
    pub ref_indicator: String,
    pub key_delimiter: String,
    /// Omit empty entries from a rendered template tree
    pub drop_empty: bool,
    pub mode: Mode,
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckOptions {
            input: String::new(),
            context: None,
            ref_indicator: "$".to_string(),
            key_delimiter: ">".to_string(),
            drop_empty: false,
            mode: Mode::default(),
        }
    }
}

/// Run one evaluation; render the result with [`crate::to_json`].
pub fn execute_check(options: &CheckOptions) -> Result<Value, CliError> {
    let config = SyntaxConfig::new(&options.ref_indicator, &options.key_delimiter)?
        .with_drop_empty(options.drop_empty);

    let context = match &options.context {
        Some(json) => Value::from(serde_json::from_str::<serde_json::Value>(json)?),
        None => Value::Null,
    };

    let result = match options.mode {
        Mode::Expression => interpret(&options.input, &context, &config)?,
        Mode::Template => interpolate(&options.input, &context, &config)?,
        Mode::TemplateTree => {
            let templates = Value::from(serde_json::from_str::<serde_json::Value>(&options.input)?);
            interpolate_dict(&templates, &context, &config)?
        }
    };

    Ok(result)
}

/// One line per default function: name, signature and summary.
pub fn describe_functions() -> Vec<String> {
    functions::default_functions()
        .iter()
        .map(|f| format!("{}{}  {}", f.name(), f.signature(), f.summary()))
        .collect()
}
