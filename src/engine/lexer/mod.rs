//! Lexer module
//! Turns source text into tokens for either statement or expression parsing

pub mod tokenizer;
pub mod tokens;

pub use tokenizer::{LexMode, Lexer};
pub use tokens::{Token, TokenKind};

use crate::engine::error::SyntaxError;

/// Tokenize source code
pub fn tokenize(
    source: &str,
    mode: LexMode,
) -> Result<Vec<Token>, SyntaxError> {
    let tokens = Lexer::new(source, mode).tokenize()?;
    tracing::trace!("lexed {} token(s) in {:?} mode", tokens.len(), mode);
    Ok(tokens)
}
