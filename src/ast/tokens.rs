use crate::ast::RefMode;

/// A lexical token with the character offset it started at.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Token text: the path for references, the decoded body for strings,
    /// the digits for numbers, the word for identifiers.
    pub text: String,
    /// Character offset of the first character of the token
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, offset: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Context reference
    ///
    /// `raw` is the full source slice, indicator and brackets included.
    ///
    /// # Examples
    /// ```text
    /// $user>name          Bare
    /// $(user>name)        Required
    /// $[user>age]         Optional
    /// ${user>age}         LiteralFallback
    /// ```
    Reference { mode: RefMode, raw: String },

    /// Arithmetic, comparison or logical operator
    ///
    /// # Examples
    /// ```text
    /// + - * / % ^ == != < > <= >= and or not
    /// ```
    Operator(Op),

    /// Bare word not followed by `(`
    ///
    /// Evaluates to its own text.
    Identifier,

    /// Word followed by `(`: a function call
    Function,

    /// Integer or decimal literal, sign included
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -3.5
    /// .25
    /// ```
    Number,

    /// Quoted literal, single or double quotes
    String,

    /// `true`/`True`/`false`/`False`
    Boolean(bool),

    /// `null`/`None`
    Null,

    LParen,
    RParen,
    Comma,

    /// End of input
    Eof,
}

/// Operator tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
    Not,
}

impl Op {
    pub fn symbol(&self) -> &'static str {
        match self {
            Op::Plus => "+",
            Op::Minus => "-",
            Op::Star => "*",
            Op::Slash => "/",
            Op::Percent => "%",
            Op::Caret => "^",
            Op::EqEq => "==",
            Op::NotEq => "!=",
            Op::Lt => "<",
            Op::Gt => ">",
            Op::LtEq => "<=",
            Op::GtEq => ">=",
            Op::And => "and",
            Op::Or => "or",
            Op::Not => "not",
        }
    }
}
