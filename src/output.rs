//! Text rendering for DRL values.
//!
//! Three styles share one printer:
//!
//! - **Compact** via [`to_json()`] - minified JSON
//! - **Display** via [`to_display()`] - JSON with `", "` / `": "` separators,
//!   the form collections take when spliced into a template
//! - **Pretty** via [`to_json_pretty()`] - 2-space indentation for the CLI
//!
//! Object keys are always sorted so rendered templates are deterministic.
//! Whole floats keep a trailing `.0` to stay distinguishable from integers.
//!
//! ```
//! use drl_lang::Value;
//! use drl_lang::output::{to_display, to_json};
//!
//! let list = Value::Array(vec![Value::Integer(1), Value::Float(2.0)]);
//! assert_eq!(to_json(&list), "[1,2.0]");
//! assert_eq!(to_display(&list), "[1, 2.0]");
//! ```

use std::collections::HashMap;

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Compact,
    Display,
    Pretty,
}

struct Printer {
    style: Style,
}

impl Printer {
    fn print_value(&self, value: &Value, indent: usize) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Float(n) => self.print_float(*n),
            Value::String(s) => format!("\"{}\"", escape_string(s)),
            Value::Array(arr) => self.print_array(arr, indent),
            Value::Object(obj) => self.print_object(obj, indent),
        }
    }

    /// Non-finite floats have no JSON form; only display text shows them.
    fn print_float(&self, n: f64) -> String {
        match self.style {
            Style::Display if !n.is_finite() => n.to_string(),
            _ if !n.is_finite() => "null".to_string(),
            // Debug keeps `.0` on whole values and switches to exponents at the extremes
            _ => format!("{:?}", n),
        }
    }

    fn print_array(&self, arr: &[Value], indent: usize) -> String {
        if arr.is_empty() {
            return "[]".to_string();
        }

        let items: Vec<String> = arr
            .iter()
            .map(|v| match self.style {
                Style::Pretty => format!("{}{}", pad(indent + 1), self.print_value(v, indent + 1)),
                _ => self.print_value(v, indent),
            })
            .collect();

        match self.style {
            Style::Compact => format!("[{}]", items.join(",")),
            Style::Display => format!("[{}]", items.join(", ")),
            Style::Pretty => format!("[\n{}\n{}]", items.join(",\n"), pad(indent)),
        }
    }

    fn print_object(&self, obj: &HashMap<String, Value>, indent: usize) -> String {
        if obj.is_empty() {
            return "{}".to_string();
        }

        let mut entries: Vec<_> = obj.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let items: Vec<String> = entries
            .into_iter()
            .map(|(k, v)| match self.style {
                Style::Compact => format!("\"{}\":{}", escape_string(k), self.print_value(v, indent)),
                Style::Display => format!("\"{}\": {}", escape_string(k), self.print_value(v, indent)),
                Style::Pretty => format!(
                    "{}\"{}\": {}",
                    pad(indent + 1),
                    escape_string(k),
                    self.print_value(v, indent + 1)
                ),
            })
            .collect();

        match self.style {
            Style::Compact => format!("{{{}}}", items.join(",")),
            Style::Display => format!("{{{}}}", items.join(", ")),
            Style::Pretty => format!("{{\n{}\n{}}}", items.join(",\n"), pad(indent)),
        }
    }
}

fn pad(level: usize) -> String {
    "  ".repeat(level)
}

fn escape_string(s: &str) -> String {
    s.chars()
        .flat_map(|c| match c {
            '"' => vec!['\\', '"'],
            '\\' => vec!['\\', '\\'],
            '\n' => vec!['\\', 'n'],
            '\r' => vec!['\\', 'r'],
            '\t' => vec!['\\', 't'],
            c if c.is_control() => format!("\\u{:04x}", c as u32).chars().collect(),
            c => vec![c],
        })
        .collect()
}

/// Minified JSON with sorted keys.
pub fn to_json(value: &Value) -> String {
    Printer { style: Style::Compact }.print_value(value, 0)
}

/// Single-line rendering used when a collection is spliced into template text.
pub fn to_display(value: &Value) -> String {
    Printer { style: Style::Display }.print_value(value, 0)
}

/// Indented JSON with sorted keys.
pub fn to_json_pretty(value: &Value) -> String {
    Printer { style: Style::Pretty }.print_value(value, 0)
}
