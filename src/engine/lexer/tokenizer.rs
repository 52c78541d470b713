//! Tokenizer implementation
//! Character scanning, indentation tracking and implicit line joining

use std::iter::Peekable;
use std::str::Chars;

use super::tokens::{keyword_from_str, Token, TokenKind};
use crate::engine::error::{LexError, SyntaxError};
use crate::util::span::{Position, Span};

/// What the token stream will be parsed as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexMode {
    /// Statements: emits INDENT/DEDENT from leading whitespace
    Statements,
    /// A single expression: leading whitespace is insignificant
    Expression,
}

/// Main lexer structure
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    mode: LexMode,
    offset: usize,
    line: usize,
    column: usize,
    start: Position,
    indents: Vec<usize>,
    brackets: Vec<char>,
    at_line_start: bool,
    line_has_tokens: bool,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source
    pub fn new(
        source: &'a str,
        mode: LexMode,
    ) -> Self {
        Self {
            chars: source.chars().peekable(),
            mode,
            offset: 0,
            line: 1,
            column: 1,
            start: Position::start(),
            indents: vec![0],
            brackets: Vec::new(),
            at_line_start: true,
            line_has_tokens: false,
            tokens: Vec::new(),
        }
    }

    /// Get current position
    pub fn position(&self) -> Position {
        Position::with_offset(self.line, self.column, self.offset)
    }

    /// Consume the whole input
    pub fn tokenize(mut self) -> Result<Vec<Token>, SyntaxError> {
        loop {
            if self.at_line_start {
                self.at_line_start = false;
                if self.mode == LexMode::Statements {
                    self.handle_indentation()?;
                }
            }

            self.skip_inline_whitespace();
            let c = match self.peek() {
                Some(&c) => c,
                None => break,
            };

            match c {
                '#' => self.skip_comment(),
                '\n' => {
                    self.mark_start();
                    self.advance();
                    if self.brackets.is_empty() && self.line_has_tokens {
                        self.push(TokenKind::Newline);
                        self.line_has_tokens = false;
                    }
                    self.at_line_start = self.brackets.is_empty();
                }
                '\\' if self.peek_next() == Some('\n') => {
                    // Explicit line joining
                    self.advance();
                    self.advance();
                }
                _ => {
                    self.mark_start();
                    let kind = self.scan_token()?;
                    self.push(kind);
                    self.line_has_tokens = true;
                }
            }
        }

        self.mark_start();
        if self.line_has_tokens {
            self.push(TokenKind::Newline);
        }
        if self.mode == LexMode::Statements {
            while self.indents.len() > 1 {
                self.indents.pop();
                self.push(TokenKind::Dedent);
            }
        }
        self.push(TokenKind::Eof);
        Ok(self.tokens)
    }

    fn advance(&mut self) -> Option<char> {
        match self.chars.next() {
            Some('\n') => {
                self.offset += 1;
                self.line += 1;
                self.column = 1;
                Some('\n')
            }
            Some(c) => {
                self.offset += c.len_utf8();
                self.column += 1;
                Some(c)
            }
            None => None,
        }
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.clone().nth(1)
    }

    fn mark_start(&mut self) {
        self.start = self.position();
    }

    fn push(
        &mut self,
        kind: TokenKind,
    ) {
        let span = Span::new(self.start, self.position());
        self.tokens.push(Token::new(kind, span));
    }

    fn error(
        &self,
        err: LexError,
    ) -> SyntaxError {
        SyntaxError::from_lex(err, self.start)
    }

    fn skip_inline_whitespace(&mut self) {
        while let Some(&c) = self.peek() {
            if c == ' ' || c == '\t' || c == '\r' || c == '\x0c' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(&c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Measure leading whitespace and emit INDENT/DEDENT tokens
    fn handle_indentation(&mut self) -> Result<(), SyntaxError> {
        let mut width = 0usize;
        while let Some(&c) = self.peek() {
            match c {
                ' ' => width += 1,
                '\t' => width = (width / 8 + 1) * 8,
                '\x0c' => width = 0,
                _ => break,
            }
            self.advance();
        }

        // Blank and comment-only lines do not affect indentation
        match self.peek() {
            None | Some('\n') | Some('\r') | Some('#') => return Ok(()),
            _ => {}
        }

        self.mark_start();
        let current = self.indents.last().copied().unwrap_or(0);
        if width > current {
            self.indents.push(width);
            self.push(TokenKind::Indent);
        } else if width < current {
            while self.indents.last().copied().unwrap_or(0) > width {
                self.indents.pop();
                self.push(TokenKind::Dedent);
            }
            if self.indents.last().copied().unwrap_or(0) != width {
                return Err(self.error(LexError::InconsistentDedent));
            }
        }
        Ok(())
    }

    fn scan_token(&mut self) -> Result<TokenKind, SyntaxError> {
        let c = match self.advance() {
            Some(c) => c,
            None => return Ok(TokenKind::Eof),
        };

        let kind = match c {
            c if is_identifier_start(c) => self.scan_identifier(c),
            c if c.is_ascii_digit() => self.scan_number(c)?,
            '.' => {
                if self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                    self.scan_number('.')?
                } else {
                    TokenKind::Dot
                }
            }
            '"' | '\'' => self.scan_string(c)?,
            '+' => self.with_assign(TokenKind::Plus, TokenKind::PlusAssign),
            '-' => self.with_assign(TokenKind::Minus, TokenKind::MinusAssign),
            '*' => {
                if self.peek() == Some(&'*') {
                    self.advance();
                    TokenKind::StarStar
                } else {
                    self.with_assign(TokenKind::Star, TokenKind::StarAssign)
                }
            }
            '/' => {
                if self.peek() == Some(&'/') {
                    self.advance();
                    self.with_assign(TokenKind::SlashSlash, TokenKind::SlashSlashAssign)
                } else {
                    self.with_assign(TokenKind::Slash, TokenKind::SlashAssign)
                }
            }
            '%' => self.with_assign(TokenKind::Percent, TokenKind::PercentAssign),
            '=' => self.with_assign(TokenKind::Assign, TokenKind::EqEq),
            '!' => {
                if self.peek() == Some(&'=') {
                    self.advance();
                    TokenKind::Neq
                } else {
                    return Err(self.error(LexError::UnexpectedChar { ch: '!' }));
                }
            }
            '<' => self.with_assign(TokenKind::Lt, TokenKind::Le),
            '>' => self.with_assign(TokenKind::Gt, TokenKind::Ge),
            '(' | '[' | '{' => {
                self.brackets.push(c);
                match c {
                    '(' => TokenKind::LParen,
                    '[' => TokenKind::LBracket,
                    _ => TokenKind::LBrace,
                }
            }
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if self.brackets.pop() != Some(expected) {
                    return Err(self.error(LexError::UnmatchedBracket { ch: c }));
                }
                match c {
                    ')' => TokenKind::RParen,
                    ']' => TokenKind::RBracket,
                    _ => TokenKind::RBrace,
                }
            }
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            other => return Err(self.error(LexError::UnexpectedChar { ch: other })),
        };
        Ok(kind)
    }

    /// `plain` unless the next character is `=`
    fn with_assign(
        &mut self,
        plain: TokenKind,
        assign: TokenKind,
    ) -> TokenKind {
        if self.peek() == Some(&'=') {
            self.advance();
            assign
        } else {
            plain
        }
    }

    fn scan_identifier(
        &mut self,
        first: char,
    ) -> TokenKind {
        let mut name = String::from(first);
        while let Some(&c) = self.peek() {
            if !is_identifier_char(c) {
                break;
            }
            name.push(c);
            self.advance();
        }
        keyword_from_str(&name).unwrap_or(TokenKind::Name(name))
    }

    fn scan_digits(
        &mut self,
        text: &mut String,
    ) {
        while let Some(&c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c != '_' {
                break;
            }
            self.advance();
        }
    }

    fn scan_number(
        &mut self,
        first: char,
    ) -> Result<TokenKind, SyntaxError> {
        let mut text = String::from(first);
        let mut is_float = first == '.';
        self.scan_digits(&mut text);

        if !is_float && self.peek() == Some(&'.') {
            // `1.` is a float; `1.name` and `1..` leave the dot alone
            let next = self.peek_next();
            if !next.map(|n| is_identifier_start(n) || n == '.').unwrap_or(false) {
                self.advance();
                text.push('.');
                is_float = true;
                self.scan_digits(&mut text);
            }
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            let sign_or_digit = lookahead.next();
            let exponent_follows = match sign_or_digit {
                Some(d) if d.is_ascii_digit() => true,
                Some('+') | Some('-') => lookahead.next().map(|d| d.is_ascii_digit()).unwrap_or(false),
                _ => false,
            };
            if exponent_follows {
                text.push('e');
                self.advance();
                if let Some(&sign) = self.peek() {
                    if sign == '+' || sign == '-' {
                        text.push(sign);
                        self.advance();
                    }
                }
                is_float = true;
                self.scan_digits(&mut text);
            }
        }

        if is_float {
            text.parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| self.error(LexError::InvalidNumber(text.clone())))
        } else {
            // Only digits reach here, so a failed parse means the value is out of range
            Ok(text
                .parse::<i64>()
                .map(TokenKind::Int)
                .unwrap_or(TokenKind::BigInt(text)))
        }
    }

    fn scan_string(
        &mut self,
        quote: char,
    ) -> Result<TokenKind, SyntaxError> {
        let mut value = String::new();
        loop {
            match self.advance() {
                None | Some('\n') => return Err(self.error(LexError::UnterminatedString)),
                Some(c) if c == quote => break,
                Some('\\') => match self.advance() {
                    None => return Err(self.error(LexError::UnterminatedString)),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    Some('\\') => value.push('\\'),
                    Some('\'') => value.push('\''),
                    Some('"') => value.push('"'),
                    Some('\n') => {}
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                },
                Some(c) => value.push(c),
            }
        }
        Ok(TokenKind::Str(value))
    }
}

/// Check if character can start an identifier
pub fn is_identifier_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

/// Check if character is valid identifier continuation
pub fn is_identifier_char(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}
