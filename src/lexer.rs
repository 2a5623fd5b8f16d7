use crate::{
    ast::{Op, RefMode, Token, TokenKind},
    config::SyntaxConfig,
    error::Error,
};

/// Characters that end a bare reference (unless they spell the key delimiter).
const STOP_CHARS: &[char] = &[
    '(', ')', ',', '\'', '"', '+', '-', '*', '/', '%', '^', '<', '>', '=', '!', '[', ']', '{', '}',
];

/// Characters after a comparison-like delimiter that make it an operator.
const OPERATOR_FOLLOWERS: &[char] = &[
    '=', '!', '<', '>', '(', ')', ',', '\'', '"', '+', '-', '*', '/', '%', '^',
];

pub struct Lexer<'a> {
    input: Vec<char>,
    position: usize,
    /// Added to every reported offset, for input embedded in a larger text
    base: usize,
    config: &'a SyntaxConfig,
    indicator: Vec<char>,
    delimiter: Vec<char>,
    /// Template bare scans also stop at whitespace and `;`
    template: bool,
    previous: Option<TokenKind>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &str, config: &'a SyntaxConfig) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            base: 0,
            config,
            indicator: config.ref_indicator().chars().collect(),
            delimiter: config.key_delimiter().chars().collect(),
            template: false,
            previous: None,
        }
    }

    /// Report offsets relative to an enclosing text starting `base` characters earlier.
    pub fn with_base_offset(mut self, base: usize) -> Self {
        self.base = base;
        self
    }

    pub fn template_mode(mut self, template: bool) -> Self {
        self.template = template;
        self
    }

    pub(crate) fn seek(&mut self, position: usize) {
        self.position = position;
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn offset(&self, position: usize) -> usize {
        self.base + position
    }

    fn starts_with_at(&self, position: usize, pattern: &[char]) -> bool {
        self.input
            .get(position..position + pattern.len())
            .is_some_and(|window| window == pattern)
    }

    pub(crate) fn at_indicator(&self, position: usize) -> bool {
        self.starts_with_at(position, &self.indicator)
    }

    fn at_delimiter(&self, position: usize) -> bool {
        self.starts_with_at(position, &self.delimiter)
    }

    /// A `<`/`>`/`=` delimiter followed by whitespace, end of input or another
    /// operator character is a comparison, not a path separator.
    fn delimiter_reads_as_operator(&self, position: usize) -> bool {
        if !self.config.delimiter_is_comparison() {
            return false;
        }
        match self.input.get(position + 1) {
            None => true,
            Some(c) => c.is_whitespace() || OPERATOR_FOLLOWERS.contains(c),
        }
    }

    fn keyword_at(&self, position: usize) -> bool {
        ["and", "or", "not"].iter().any(|word| {
            let word: Vec<char> = word.chars().collect();
            self.starts_with_at(position, &word)
                && self
                    .input
                    .get(position + word.len())
                    .is_none_or(|c| !(c.is_alphanumeric() || *c == '_'))
        })
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn slice(&self, from: usize, to: usize) -> String {
        self.input[from..to].iter().collect()
    }

    fn read_string(&mut self, quote: char) -> Result<Token, Error> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(Token::new(TokenKind::String, result, self.offset(start)));
                }
                '\\' => {
                    self.advance();
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some(other) => result.push(other),
                        None => break,
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(Error::syntax(format!("Unterminated string literal starting with {}", quote))
            .at(self.offset(start))
            .with_suggestion(format!(
                "String started at position {} but never closed",
                self.offset(start)
            )))
    }

    fn read_number(&mut self) -> Token {
        let start = self.position;
        let mut number = String::new();
        let mut seen_dot = false;

        if self.current_char() == Some('-') {
            number.push('-');
            self.advance();
        }

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !seen_dot
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                seen_dot = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::new(TokenKind::Number, number, self.offset(start))
    }

    fn read_word(&mut self) -> Token {
        let start = self.position;
        let mut word = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let kind = match word.as_str() {
            "and" => TokenKind::Operator(Op::And),
            "or" => TokenKind::Operator(Op::Or),
            "not" => TokenKind::Operator(Op::Not),
            "true" | "True" => TokenKind::Boolean(true),
            "false" | "False" => TokenKind::Boolean(false),
            "null" | "None" => TokenKind::Null,
            _ => {
                let mut lookahead = self.position;
                while self.input.get(lookahead).is_some_and(|c| c.is_whitespace()) {
                    lookahead += 1;
                }
                if self.input.get(lookahead) == Some(&'(') {
                    TokenKind::Function
                } else {
                    TokenKind::Identifier
                }
            }
        };

        Token::new(kind, word, self.offset(start))
    }

    /// A `-` directly before a digit is a sign when no operand precedes it.
    fn minus_starts_number(&self) -> bool {
        let digit_follows = match self.peek_char(1) {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => self.peek_char(2).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        };
        digit_follows
            && matches!(
                self.previous,
                None | Some(TokenKind::Operator(_))
                    | Some(TokenKind::LParen)
                    | Some(TokenKind::Comma)
            )
    }

    /// Scan a reference starting at the reference indicator.
    ///
    /// Returns `None` for a bare indicator with no path after it.
    pub(crate) fn scan_reference(&mut self) -> Result<Option<Token>, Error> {
        let start = self.position;
        self.position += self.indicator.len();

        let Some(mode) = self.current_char().and_then(RefMode::from_opener) else {
            return Ok(self.scan_bare_reference(start));
        };

        let opener = self.current_char().unwrap_or_default();
        let closer = mode.closer().unwrap_or_default();
        self.advance();
        let path_start = self.position;
        let mut depth = 1;

        loop {
            match self.current_char() {
                None => {
                    return Err(Error::syntax(format!(
                        "Unterminated reference: expected closing '{}'",
                        closer
                    ))
                    .at(self.offset(start))
                    .with_suggestion(format!(
                        "Reference started at position {} but never closed",
                        self.offset(start)
                    )));
                }
                Some(c) if c == opener => depth += 1,
                Some(c) if c == closer => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                Some(_) => {}
            }
            self.advance();
        }

        let path = self.slice(path_start, self.position);
        self.advance(); // closer
        let raw = self.slice(start, self.position);

        Ok(Some(Token::new(
            TokenKind::Reference { mode, raw },
            path.trim(),
            self.offset(start),
        )))
    }

    fn scan_bare_reference(&mut self, start: usize) -> Option<Token> {
        let mut path = String::new();

        while let Some(ch) = self.current_char() {
            if self.at_delimiter(self.position) {
                if self.delimiter_reads_as_operator(self.position) {
                    break;
                }
                path.extend(self.delimiter.iter());
                self.position += self.delimiter.len();
                continue;
            }

            if self.at_indicator(self.position) || STOP_CHARS.contains(&ch) {
                break;
            }

            if self.template && ch == ';' {
                break;
            }

            if ch.is_whitespace() {
                if self.template {
                    break;
                }

                let mut next = self.position;
                while self.input.get(next).is_some_and(|c| c.is_whitespace()) {
                    next += 1;
                }
                let Some(&following) = self.input.get(next) else {
                    break;
                };
                let ends_reference = if self.at_delimiter(next) {
                    self.delimiter_reads_as_operator(next)
                } else {
                    self.at_indicator(next) || STOP_CHARS.contains(&following) || self.keyword_at(next)
                };
                if ends_reference {
                    break;
                }
            }

            path.push(ch);
            self.advance();
        }

        let path = path.trim().to_string();
        if path.is_empty() {
            return None;
        }

        let raw = format!("{}{}", self.config.ref_indicator(), path);
        Some(Token::new(
            TokenKind::Reference {
                mode: RefMode::Bare,
                raw,
            },
            path,
            self.offset(start),
        ))
    }

    fn operator(&mut self, op: Op) -> Token {
        let start = self.position;
        self.position += op.symbol().chars().count();
        Token::new(TokenKind::Operator(op), op.symbol(), self.offset(start))
    }

    pub fn next_token(&mut self) -> Result<Token, Error> {
        self.skip_whitespace();
        let token = self.read_token()?;
        self.previous = Some(token.kind.clone());
        Ok(token)
    }

    fn read_token(&mut self) -> Result<Token, Error> {
        let start = self.position;

        if self.at_indicator(start) {
            return match self.scan_reference()? {
                Some(token) => Ok(token),
                None => Err(Error::syntax(format!(
                    "Expected a reference path after '{}'",
                    self.config.ref_indicator()
                ))
                .at(self.offset(start))),
            };
        }

        let token = match self.current_char() {
            None => Token::new(TokenKind::Eof, "", self.offset(start)),
            Some(quote @ ('"' | '\'')) => self.read_string(quote)?,
            Some('(') => {
                self.advance();
                Token::new(TokenKind::LParen, "(", self.offset(start))
            }
            Some(')') => {
                self.advance();
                Token::new(TokenKind::RParen, ")", self.offset(start))
            }
            Some(',') => {
                self.advance();
                Token::new(TokenKind::Comma, ",", self.offset(start))
            }
            Some('+') => self.operator(Op::Plus),
            Some('*') => self.operator(Op::Star),
            Some('/') => self.operator(Op::Slash),
            Some('%') => self.operator(Op::Percent),
            Some('^') => self.operator(Op::Caret),
            Some('-') if self.minus_starts_number() => self.read_number(),
            Some('-') => self.operator(Op::Minus),
            Some('=') => {
                if self.peek_char(1) == Some('=') {
                    self.operator(Op::EqEq)
                } else {
                    return Err(Error::syntax("Unexpected '=' character")
                        .at(self.offset(start))
                        .with_suggestion("Did you mean '==' for an equality comparison?"));
                }
            }
            Some('!') => {
                if self.peek_char(1) == Some('=') {
                    self.operator(Op::NotEq)
                } else {
                    return Err(Error::syntax("Unexpected '!' character")
                        .at(self.offset(start))
                        .with_suggestion("Did you mean '!=' or 'not'?"));
                }
            }
            Some('<') => {
                if self.peek_char(1) == Some('=') {
                    self.operator(Op::LtEq)
                } else {
                    self.operator(Op::Lt)
                }
            }
            Some('>') => {
                if self.peek_char(1) == Some('=') {
                    self.operator(Op::GtEq)
                } else {
                    self.operator(Op::Gt)
                }
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number(),
            Some('.') if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => self.read_number(),
            Some(ch) if ch.is_alphabetic() || ch == '_' => self.read_word(),
            Some(ch) => {
                return Err(Error::syntax(format!("Unexpected character '{}'", ch))
                    .at(self.offset(start))
                    .with_suggestion("This character is not valid expression syntax"));
            }
        };

        Ok(token)
    }

    /// Consume the whole input; the last token is always `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Error> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[cfg(test)]
fn kinds(input: &str, config: &SyntaxConfig) -> Vec<TokenKind> {
    Lexer::new(input, config)
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn test_keywords() {
    let config = SyntaxConfig::default();
    assert_eq!(
        kinds("and or not True false None null", &config),
        vec![
            TokenKind::Operator(Op::And),
            TokenKind::Operator(Op::Or),
            TokenKind::Operator(Op::Not),
            TokenKind::Boolean(true),
            TokenKind::Boolean(false),
            TokenKind::Null,
            TokenKind::Null,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_keyword_needs_word_boundary() {
    let config = SyntaxConfig::default();
    let mut lexer = Lexer::new("android", &config);
    let token = lexer.next_token().unwrap();
    assert_eq!(token.kind, TokenKind::Identifier);
    assert_eq!(token.text, "android");
}

#[test]
fn test_reference_stops_before_comparison() {
    let config = SyntaxConfig::default();
    let mut lexer = Lexer::new("$user>age > 5", &config);
    let token = lexer.next_token().unwrap();
    assert_eq!(token.text, "user>age");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Operator(Op::Gt));
    let five = lexer.next_token().unwrap();
    assert_eq!((five.kind, five.text), (TokenKind::Number, "5".to_string()));
}
