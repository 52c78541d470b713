//! Binding powers for the Pratt expression parser
//!
//! Pairs are `(left, right)`: a left-associative operator binds its right
//! operand one step tighter, `**` is right-associative.

use super::ast::{BinOp, LogicOp};
use crate::engine::lexer::TokenKind;

pub const BP_LOWEST: u8 = 0;
pub const BP_OR: (u8, u8) = (2, 3);
pub const BP_AND: (u8, u8) = (4, 5);
pub const BP_NOT: u8 = 6;
pub const BP_CMP: (u8, u8) = (8, 9);
pub const BP_ADD: (u8, u8) = (10, 11);
pub const BP_MUL: (u8, u8) = (12, 13);
pub const BP_UNARY: u8 = 14;
pub const BP_POW: (u8, u8) = (16, 15);

/// Infix operator kinds handled by the binding-power loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Infix {
    Arith(BinOp),
    Logic(LogicOp),
}

/// Binding power of an arithmetic or logical infix token
pub fn infix_binding_power(kind: &TokenKind) -> Option<(Infix, u8, u8)> {
    let (op, (l, r)) = match kind {
        TokenKind::KwOr => (Infix::Logic(LogicOp::Or), BP_OR),
        TokenKind::KwAnd => (Infix::Logic(LogicOp::And), BP_AND),
        TokenKind::Plus => (Infix::Arith(BinOp::Add), BP_ADD),
        TokenKind::Minus => (Infix::Arith(BinOp::Sub), BP_ADD),
        TokenKind::Star => (Infix::Arith(BinOp::Mul), BP_MUL),
        TokenKind::Slash => (Infix::Arith(BinOp::Div), BP_MUL),
        TokenKind::SlashSlash => (Infix::Arith(BinOp::FloorDiv), BP_MUL),
        TokenKind::Percent => (Infix::Arith(BinOp::Mod), BP_MUL),
        TokenKind::StarStar => (Infix::Arith(BinOp::Pow), BP_POW),
        _ => return None,
    };
    Some((op, l, r))
}

/// Operator of an augmented assignment token
pub fn augmented_op(kind: &TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::PlusAssign => Some(BinOp::Add),
        TokenKind::MinusAssign => Some(BinOp::Sub),
        TokenKind::StarAssign => Some(BinOp::Mul),
        TokenKind::SlashAssign => Some(BinOp::Div),
        TokenKind::SlashSlashAssign => Some(BinOp::FloorDiv),
        TokenKind::PercentAssign => Some(BinOp::Mod),
        _ => None,
    }
}
