//! Parser module
//!
//! Two entry points mirror the two ways the session hands source to the
//! engine: [`parse_expression`] accepts exactly one expression (or a bare
//! tuple), [`parse_program`] accepts a sequence of statements.

pub mod ast;
pub mod expr;
pub mod precedence;
pub mod state;
pub mod stmt;

pub use ast::*;
pub use state::{PResult, ParserState};

use crate::engine::error::SyntaxError;
use crate::engine::lexer::{tokenize, LexMode, TokenKind};

/// Parse source that must be a single expression
pub fn parse_expression(source: &str) -> Result<Expr, SyntaxError> {
    let tokens = tokenize(source, LexMode::Expression)?;
    let mut state = ParserState::new(&tokens);
    state.skip_newlines();
    if state.at(&TokenKind::Eof) {
        return Err(state.unexpected());
    }
    let expr = state.parse_testlist()?;
    state.skip_newlines();
    if !state.at(&TokenKind::Eof) {
        return Err(state.unexpected());
    }
    Ok(expr)
}

/// Parse source as a sequence of statements
pub fn parse_program(source: &str) -> Result<Vec<Stmt>, SyntaxError> {
    let tokens = tokenize(source, LexMode::Statements)?;
    let mut state = ParserState::new(&tokens);
    let program = state.parse_statements()?;
    tracing::trace!("parsed {} statement(s)", program.len());
    Ok(program)
}

/// True when `source` is one or more complete simple statements
pub fn is_complete_statement(source: &str) -> bool {
    match parse_program(source) {
        Ok(program) => !program.is_empty() && program.iter().all(Stmt::is_simple),
        Err(_) => false,
    }
}
