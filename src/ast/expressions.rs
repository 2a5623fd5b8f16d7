use crate::{
    ast::{BinOp, UnaryOp},
    value::Value,
};

/// Abstract Syntax Tree node representing a parsed expression.
///
/// Trees are built once per evaluation and never shared or mutated.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Number, string, boolean, null or bare-word constant
    ///
    /// # Example
    /// ```text
    /// 42
    /// 'hello'
    /// True
    /// ```
    Literal(Value),

    /// Path into the context
    ///
    /// # Examples
    /// ```text
    /// $user>name
    /// $(data>$(keys>k1)>value)
    /// ```
    Reference(Reference),

    /// Prefix operation
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        offset: usize,
    },

    /// Binary operation (arithmetic, comparison, logical)
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        offset: usize,
    },

    /// Function call
    ///
    /// # Examples
    /// ```text
    /// upper($name)
    /// if($age >= 18, 'adult', 'minor')
    /// random()
    /// ```
    Call {
        name: String,
        args: Vec<Expr>,
        offset: usize,
    },
}

/// How a reference reacts when its path does not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefMode {
    /// `$path`: required in expressions, tolerant in template text
    Bare,
    /// `$(path)`: raise an error
    Required,
    /// `$[path]`: produce null
    Optional,
    /// `${path}`: produce the reference source text unchanged
    LiteralFallback,
}

impl RefMode {
    /// Mode selected by the bracket following the reference indicator.
    pub fn from_opener(c: char) -> Option<RefMode> {
        match c {
            '(' => Some(RefMode::Required),
            '[' => Some(RefMode::Optional),
            '{' => Some(RefMode::LiteralFallback),
            _ => None,
        }
    }

    pub fn closer(&self) -> Option<char> {
        match self {
            RefMode::Bare => None,
            RefMode::Required => Some(')'),
            RefMode::Optional => Some(']'),
            RefMode::LiteralFallback => Some('}'),
        }
    }
}

/// A parsed reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub path: PathSpec,
    pub mode: RefMode,
    /// Source text of the whole reference, indicator and brackets included
    pub raw: String,
    pub offset: usize,
}

/// Ordered path segments of a reference.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathSpec {
    pub segments: Vec<Segment>,
}

/// One step of a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal key text
    ///
    /// `index` is set when the text is all digits; whether it indexes a
    /// sequence or names a mapping key depends on the node reached.
    Key { name: String, index: Option<usize> },

    /// Nested reference resolved before navigation
    ///
    /// # Example
    /// ```text
    /// $(rocks>$(records>best)>color)
    ///         ^^^^^^^^^^^^^^^
    /// ```
    Nested(Box<Expr>),
}

impl Segment {
    pub fn key(name: &str) -> Segment {
        let index = if !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()) {
            name.parse::<usize>().ok()
        } else {
            None
        };
        Segment::Key {
            name: name.to_string(),
            index,
        }
    }
}
