//! Parser state and token cursor

use crate::engine::error::SyntaxError;
use crate::engine::lexer::{Token, TokenKind};
use crate::engine::stack;
use crate::util::span::{Position, Span};

/// Parse result
pub type PResult<T> = Result<T, SyntaxError>;

/// Deepest syntax tree the parser builds, counting brackets, prefix and
/// infix operators, postfix chains and indented blocks
pub const MAX_NESTING: usize = 1000;

/// Cursor over a token slice plus the context needed to reject
/// `return`/`break`/`continue` in the wrong place
pub struct ParserState<'a> {
    tokens: &'a [Token],
    pos: usize,
    pub(crate) loop_depth: usize,
    pub(crate) function_depth: usize,
    /// Depth of the tree under construction
    depth: usize,
}

impl<'a> ParserState<'a> {
    /// `tokens` must end with an `Eof` token
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            loop_depth: 0,
            function_depth: 0,
            depth: 0,
        }
    }

    /// Run a recursive parse one level deeper
    ///
    /// Levels added with [`deepen`](Self::deepen) inside `parse` are released
    /// when it returns.
    pub(crate) fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> PResult<T>,
    ) -> PResult<T> {
        let base = self.depth;
        self.deepen()?;
        let result = stack::guarded(|| parse(self));
        self.depth = base;
        result
    }

    /// Account for one more level of tree depth
    pub(crate) fn deepen(&mut self) -> PResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(SyntaxError::too_deep(self.span().start));
        }
        self.depth += 1;
        Ok(())
    }

    pub fn current(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1)
    }

    pub fn kind(&self) -> &TokenKind {
        &self.current().kind
    }

    pub fn span(&self) -> Span {
        self.current().span
    }

    /// End of the most recently consumed token
    pub fn previous_end(&self) -> Option<Position> {
        let index = self.pos.checked_sub(1)?;
        self.tokens.get(index).map(|t| t.span.end)
    }

    pub fn bump(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub fn at(
        &self,
        kind: &TokenKind,
    ) -> bool {
        self.kind() == kind
    }

    pub fn skip(
        &mut self,
        kind: &TokenKind,
    ) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn expect(
        &mut self,
        kind: &TokenKind,
    ) -> PResult<Token> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.unexpected())
        }
    }

    pub fn expect_name(&mut self) -> PResult<String> {
        match self.kind().clone() {
            TokenKind::Name(name) => {
                self.bump();
                Ok(name)
            }
            _ => Err(self.unexpected()),
        }
    }

    pub fn skip_newlines(&mut self) {
        while self.skip(&TokenKind::Newline) {}
    }

    pub fn error_here(
        &self,
        message: impl Into<String>,
    ) -> SyntaxError {
        SyntaxError::new(message, self.span().start)
    }

    pub fn unexpected(&self) -> SyntaxError {
        match self.kind() {
            TokenKind::Eof => self.error_here("unexpected end of input"),
            TokenKind::Indent => self.error_here("unexpected indent"),
            other => self.error_here(format!("invalid syntax: unexpected {}", other.describe())),
        }
    }
}
