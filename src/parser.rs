use crate::{
    ast::{BinOp, Expr, NOT_BINDING, Op, PathSpec, Reference, Segment, Token, TokenKind, UnaryOp},
    config::SyntaxConfig,
    error::Error,
    evaluator::MAX_REFERENCE_DEPTH,
    lexer::Lexer,
    value::Value,
};
use std::mem;

/// Deepest grouping accepted by the parser, counting parentheses, operands,
/// argument lists and nested reference expressions together.
pub const MAX_EXPRESSION_DEPTH: usize = 128;

/// How far inside other constructs the parser currently is. Nested
/// reference segments get their own parser, which inherits this.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Nesting {
    references: usize,
    expressions: usize,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    config: &'a SyntaxConfig,
    current_token: Token,
    nesting: Nesting,
}

impl<'a> Parser<'a> {
    pub fn new(mut lexer: Lexer<'a>, config: &'a SyntaxConfig) -> Result<Self, Error> {
        let current_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            config,
            current_token,
            nesting: Nesting::default(),
        })
    }

    pub(crate) fn with_nesting(mut self, nesting: Nesting) -> Self {
        self.nesting = nesting;
        self
    }

    fn advance(&mut self) -> Result<Token, Error> {
        let next = self.lexer.next_token()?;
        Ok(mem::replace(&mut self.current_token, next))
    }

    fn check(&self, kind: &TokenKind) -> bool {
        mem::discriminant(&self.current_token.kind) == mem::discriminant(kind)
    }

    fn describe(token: &Token) -> String {
        match token.kind {
            TokenKind::Eof => "end of expression".to_string(),
            TokenKind::String => format!("string '{}'", token.text),
            _ => format!("'{}'", token.text),
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        Error::syntax(format!(
            "Expected {}, found {}",
            expected,
            Self::describe(&self.current_token)
        ))
        .at(self.current_token.offset)
    }

    /// Parse primary expressions: literals, references, calls, groups and unary minus
    fn parse_primary(&mut self) -> Result<Expr, Error> {
        let offset = self.current_token.offset;
        match &self.current_token.kind {
            TokenKind::Number => {
                let token = self.advance()?;
                Self::parse_number(&token).map(Expr::Literal)
            }
            TokenKind::String => {
                let token = self.advance()?;
                Ok(Expr::Literal(Value::String(token.text)))
            }
            TokenKind::Boolean(b) => {
                let b = *b;
                self.advance()?;
                Ok(Expr::Literal(Value::Boolean(b)))
            }
            TokenKind::Null => {
                self.advance()?;
                Ok(Expr::Literal(Value::Null))
            }
            // Bare words evaluate to their own text
            TokenKind::Identifier => {
                let token = self.advance()?;
                Ok(Expr::Literal(Value::String(token.text)))
            }
            TokenKind::Reference { .. } => {
                let token = self.advance()?;
                parse_reference(token, self.config, self.nesting).map(Expr::Reference)
            }
            TokenKind::Function => {
                let token = self.advance()?;
                self.parse_call(token)
            }
            TokenKind::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                if !self.check(&TokenKind::RParen) {
                    return Err(Error::syntax("Unmatched '('")
                        .at(offset)
                        .with_suggestion("Add a closing ')'"));
                }
                self.advance()?;
                Ok(expr)
            }
            TokenKind::Operator(Op::Minus) => {
                self.advance()?;
                let operand = self.parse_power_operand()?;
                Ok(Expr::Unary {
                    op: UnaryOp::Negate,
                    operand: Box::new(operand),
                    offset,
                })
            }
            TokenKind::RParen => Err(Error::syntax("Unmatched ')'").at(offset)),
            TokenKind::Eof => Err(Error::syntax("Missing operand at end of expression")
                .at(offset)),
            _ => Err(self.unexpected("an operand")),
        }
    }

    /// The operand of unary minus may be a power: `-$x^2` is `-($x^2)`.
    fn parse_power_operand(&mut self) -> Result<Expr, Error> {
        let (_, right_bp) = BinOp::Power.binding_power();
        self.parse_binary(right_bp)
    }

    fn parse_number(token: &Token) -> Result<Value, Error> {
        if token.text.contains('.') {
            token
                .text
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| Error::syntax(format!("Invalid number '{}'", token.text)).at(token.offset))
        } else {
            match token.text.parse::<i64>() {
                Ok(n) => Ok(Value::Integer(n)),
                // Out of i64 range: keep the magnitude as a float
                Err(_) => token
                    .text
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| {
                        Error::syntax(format!("Invalid number '{}'", token.text)).at(token.offset)
                    }),
            }
        }
    }

    /// `name '(' (expr (',' expr)*)? ')'`
    fn parse_call(&mut self, name: Token) -> Result<Expr, Error> {
        if !self.check(&TokenKind::LParen) {
            return Err(self.unexpected("'(' after function name"));
        }
        self.advance()?;

        let mut args = vec![];
        if !self.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if self.check(&TokenKind::Comma) {
                    let comma = self.advance()?;
                    if self.check(&TokenKind::RParen) {
                        return Err(Error::syntax("Trailing comma in argument list")
                            .at(comma.offset)
                            .with_suggestion("Remove the ',' or add another argument"));
                    }
                } else {
                    break;
                }
            }
        }

        if !self.check(&TokenKind::RParen) {
            return Err(match self.current_token.kind {
                TokenKind::Eof => Error::syntax(format!("Unclosed call to '{}'", name.text))
                    .at(name.offset)
                    .with_suggestion("Add a closing ')'"),
                _ => self.unexpected("',' or ')' in argument list"),
            });
        }
        self.advance()?;

        Ok(Expr::Call {
            name: name.text,
            args,
            offset: name.offset,
        })
    }

    fn parse_binary(&mut self, min_bp: u8) -> Result<Expr, Error> {
        if self.nesting.expressions >= MAX_EXPRESSION_DEPTH {
            return Err(Error::type_error(format!(
                "Expression nesting too deep (more than {} levels)",
                MAX_EXPRESSION_DEPTH
            ))
            .at(self.current_token.offset));
        }
        self.nesting.expressions += 1;
        let expr = self.parse_operators(min_bp);
        self.nesting.expressions -= 1;
        expr
    }

    /// Precedence climbing over binary operators and prefix `not`
    fn parse_operators(&mut self, min_bp: u8) -> Result<Expr, Error> {
        let mut left = if self.check(&TokenKind::Operator(Op::Not)) {
            let offset = self.current_token.offset;
            self.advance()?;
            let operand = self.parse_binary(NOT_BINDING)?;
            Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                offset,
            }
        } else {
            self.parse_primary()?
        };

        loop {
            let TokenKind::Operator(op) = self.current_token.kind else {
                break;
            };
            let Some(bin_op) = BinOp::from_op(op) else {
                break;
            };
            let (left_bp, right_bp) = bin_op.binding_power();
            if left_bp < min_bp {
                break;
            }

            let offset = self.current_token.offset;
            self.advance()?;
            let right = self.parse_binary(right_bp)?;

            left = Expr::Binary {
                op: bin_op,
                left: Box::new(left),
                right: Box::new(right),
                offset,
            };
        }

        Ok(left)
    }

    pub fn parse_expression(&mut self) -> Result<Expr, Error> {
        self.parse_binary(0)
    }

    /// Parse a complete expression; an empty one is null.
    pub fn parse(&mut self) -> Result<Expr, Error> {
        if self.check(&TokenKind::Eof) {
            return Ok(Expr::Literal(Value::Null));
        }
        let expr = self.parse_expression()?;
        match self.current_token.kind {
            TokenKind::Eof => Ok(expr),
            TokenKind::RParen => Err(Error::syntax("Unmatched ')'").at(self.current_token.offset)),
            _ => Err(Error::syntax(format!(
                "Unexpected {} after end of expression",
                Self::describe(&self.current_token)
            ))
            .at(self.current_token.offset)
            .with_suggestion("Join expressions with an operator")),
        }
    }
}

/// Split a reference token's path into segments and parse any nested references.
pub(crate) fn parse_reference(
    token: Token,
    config: &SyntaxConfig,
    nesting: Nesting,
) -> Result<Reference, Error> {
    let TokenKind::Reference { mode, raw } = token.kind else {
        return Err(Error::syntax("Expected a reference").at(token.offset));
    };

    if nesting.references >= MAX_REFERENCE_DEPTH {
        return Err(Error::type_error(format!(
            "Reference nesting too deep (more than {} levels)",
            MAX_REFERENCE_DEPTH
        ))
        .at(token.offset));
    }

    if token.text.is_empty() {
        return Err(Error::syntax("Empty reference path").at(token.offset));
    }

    // Untrimmed path text sits between the indicator plus opener and the closer
    let bracket = usize::from(mode.closer().is_some());
    let skip = config.ref_indicator().chars().count() + bracket;
    let take = raw.chars().count().saturating_sub(skip + bracket);
    let inner: String = raw.chars().skip(skip).take(take).collect();
    let inside = Nesting {
        references: nesting.references + 1,
        ..nesting
    };
    let path = parse_path(&inner, config, token.offset + skip, inside)?;

    Ok(Reference {
        path,
        mode,
        raw,
        offset: token.offset,
    })
}

/// Split `path` on top-level key delimiters; segments that start with the
/// reference indicator are parsed as nested expressions.
fn parse_path(
    path: &str,
    config: &SyntaxConfig,
    base: usize,
    nesting: Nesting,
) -> Result<PathSpec, Error> {
    let mut segments = vec![];
    for (start, text) in split_segments(path, config) {
        let trimmed = text.trim();
        let leading = text.chars().count() - text.trim_start().chars().count();
        if trimmed.starts_with(config.ref_indicator()) {
            let offset = base + start + leading;
            let lexer = Lexer::new(trimmed, config).with_base_offset(offset);
            let mut parser = Parser::new(lexer, config)?.with_nesting(nesting);
            segments.push(Segment::Nested(Box::new(parser.parse()?)));
        } else {
            segments.push(Segment::key(trimmed));
        }
    }
    Ok(PathSpec { segments })
}

/// Segments as (character offset, text), ignoring delimiters inside brackets or quotes.
fn split_segments<'p>(path: &'p str, config: &SyntaxConfig) -> Vec<(usize, &'p str)> {
    let delimiter = config.key_delimiter();
    let mut segments = vec![];
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut segment_start = 0;
    let mut segment_chars = 0;
    let mut chars = 0;
    let mut rest = path.char_indices().peekable();

    while let Some((byte, ch)) = rest.next() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
        } else if depth == 0 && path[byte..].starts_with(delimiter) {
            segments.push((segment_chars, &path[segment_start..byte]));
            let width = delimiter.chars().count();
            for _ in 1..width {
                rest.next();
            }
            chars += width;
            segment_start = byte + delimiter.len();
            segment_chars = chars;
            continue;
        } else {
            match ch {
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                '\'' | '"' => quote = Some(ch),
                _ => {}
            }
        }
        chars += 1;
    }

    segments.push((segment_chars, &path[segment_start..]));
    segments
}
