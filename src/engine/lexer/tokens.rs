//! Token types

use crate::util::span::Span;

/// Token kind
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    KwDef,
    KwReturn,
    KwIf,
    KwElif,
    KwElse,
    KwWhile,
    KwFor,
    KwIn,
    KwPass,
    KwBreak,
    KwContinue,
    KwAnd,
    KwOr,
    KwNot,
    KwNone,
    KwTrue,
    KwFalse,

    // Identifiers and literals
    Name(String),
    Int(i64),
    /// Integer literal beyond the 64-bit range, kept as its digits
    BigInt(String),
    Float(f64),
    Str(String),

    // Operators
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    EqEq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    SlashSlashAssign,
    PercentAssign,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,

    // Line structure
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl TokenKind {
    /// Text used in "invalid syntax" messages
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Name(name) => format!("name '{}'", name),
            TokenKind::Int(n) => n.to_string(),
            TokenKind::BigInt(digits) => digits.clone(),
            TokenKind::Float(f) => f.to_string(),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Indent => "indent".to_string(),
            TokenKind::Dedent => "dedent".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            TokenKind::KwDef => "def",
            TokenKind::KwReturn => "return",
            TokenKind::KwIf => "if",
            TokenKind::KwElif => "elif",
            TokenKind::KwElse => "else",
            TokenKind::KwWhile => "while",
            TokenKind::KwFor => "for",
            TokenKind::KwIn => "in",
            TokenKind::KwPass => "pass",
            TokenKind::KwBreak => "break",
            TokenKind::KwContinue => "continue",
            TokenKind::KwAnd => "and",
            TokenKind::KwOr => "or",
            TokenKind::KwNot => "not",
            TokenKind::KwNone => "None",
            TokenKind::KwTrue => "True",
            TokenKind::KwFalse => "False",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::StarStar => "**",
            TokenKind::Slash => "/",
            TokenKind::SlashSlash => "//",
            TokenKind::Percent => "%",
            TokenKind::EqEq => "==",
            TokenKind::Neq => "!=",
            TokenKind::Lt => "<",
            TokenKind::Le => "<=",
            TokenKind::Gt => ">",
            TokenKind::Ge => ">=",
            TokenKind::Assign => "=",
            TokenKind::PlusAssign => "+=",
            TokenKind::MinusAssign => "-=",
            TokenKind::StarAssign => "*=",
            TokenKind::SlashAssign => "/=",
            TokenKind::SlashSlashAssign => "//=",
            TokenKind::PercentAssign => "%=",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            _ => "?",
        }
    }
}

/// Token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        span: Span,
    ) -> Self {
        Self { kind, span }
    }
}

/// Convert identifier text to keyword token
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    match s {
        "def" => Some(TokenKind::KwDef),
        "return" => Some(TokenKind::KwReturn),
        "if" => Some(TokenKind::KwIf),
        "elif" => Some(TokenKind::KwElif),
        "else" => Some(TokenKind::KwElse),
        "while" => Some(TokenKind::KwWhile),
        "for" => Some(TokenKind::KwFor),
        "in" => Some(TokenKind::KwIn),
        "pass" => Some(TokenKind::KwPass),
        "break" => Some(TokenKind::KwBreak),
        "continue" => Some(TokenKind::KwContinue),
        "and" => Some(TokenKind::KwAnd),
        "or" => Some(TokenKind::KwOr),
        "not" => Some(TokenKind::KwNot),
        "None" => Some(TokenKind::KwNone),
        "True" => Some(TokenKind::KwTrue),
        "False" => Some(TokenKind::KwFalse),
        _ => None,
    }
}
