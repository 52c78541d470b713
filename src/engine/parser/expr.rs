//! Expression parsing
//!
//! Prefix and postfix forms are parsed directly, infix operators go through
//! the binding-power loop in [`ParserState::parse_bp`].

use super::ast::{CmpOp, Expr, Literal, UnOp};
use super::precedence::{infix_binding_power, Infix, BP_CMP, BP_LOWEST, BP_NOT, BP_UNARY};
use super::state::{PResult, ParserState};
use crate::engine::lexer::TokenKind;
use crate::util::span::Span;

/// Magnitude of `i64::MIN`, one past `i64::MAX`
const I64_MIN_DIGITS: &str = "9223372036854775808";

impl ParserState<'_> {
    /// Comma-separated expressions; more than one (or a trailing comma)
    /// makes a tuple
    pub fn parse_testlist(&mut self) -> PResult<Expr> {
        let first = self.parse_expression()?;
        if !self.at(&TokenKind::Comma) {
            return Ok(first);
        }
        let start = first.span();
        let mut items = vec![first];
        while self.skip(&TokenKind::Comma) {
            if self.at_testlist_end() {
                break;
            }
            items.push(self.parse_expression()?);
        }
        let span = self.span_from(start);
        Ok(Expr::Tuple(items, span))
    }

    fn at_testlist_end(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Newline
                | TokenKind::Eof
                | TokenKind::Assign
                | TokenKind::PlusAssign
                | TokenKind::MinusAssign
                | TokenKind::StarAssign
                | TokenKind::SlashAssign
                | TokenKind::SlashSlashAssign
                | TokenKind::PercentAssign
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
        )
    }

    /// A single expression, including the `a if cond else b` form
    pub fn parse_expression(&mut self) -> PResult<Expr> {
        let then = self.parse_bp(BP_LOWEST)?;
        if !self.skip(&TokenKind::KwIf) {
            return Ok(then);
        }
        let condition = self.parse_bp(BP_LOWEST)?;
        self.expect(&TokenKind::KwElse)?;
        let otherwise = self.parse_expression()?;
        let span = self.span_from(then.span());
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
            span,
        })
    }

    /// Pratt loop: keep folding infix operators whose left binding power
    /// is at least `min_bp`
    pub fn parse_bp(
        &mut self,
        min_bp: u8,
    ) -> PResult<Expr> {
        self.nested(|p| p.parse_infix(min_bp))
    }

    fn parse_infix(
        &mut self,
        min_bp: u8,
    ) -> PResult<Expr> {
        let mut left = self.parse_prefix()?;

        loop {
            if self.comparison_op().is_some() {
                let (lbp, rbp) = BP_CMP;
                if lbp < min_bp {
                    break;
                }
                self.deepen()?;
                let start = left.span();
                let mut ops = Vec::new();
                while let Some(op) = self.comparison_op() {
                    self.bump();
                    if op == CmpOp::NotIn {
                        self.bump();
                    }
                    let right = self.parse_bp(rbp)?;
                    ops.push((op, right));
                }
                left = Expr::Compare {
                    left: Box::new(left),
                    ops,
                    span: self.span_from(start),
                };
                continue;
            }

            let Some((op, lbp, rbp)) = infix_binding_power(self.kind()) else {
                break;
            };
            if lbp < min_bp {
                break;
            }
            // Each fold puts `left` one level further down
            self.deepen()?;
            self.bump();
            let right = self.parse_bp(rbp)?;
            let span = self.span_from(left.span());
            left = match op {
                Infix::Arith(op) => Expr::BinOp {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                    span,
                },
                Infix::Logic(op) => Expr::Logic {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                    span,
                },
            };
        }

        Ok(left)
    }

    fn comparison_op(&self) -> Option<CmpOp> {
        let op = match self.kind() {
            TokenKind::EqEq => CmpOp::Eq,
            TokenKind::Neq => CmpOp::Ne,
            TokenKind::Lt => CmpOp::Lt,
            TokenKind::Le => CmpOp::Le,
            TokenKind::Gt => CmpOp::Gt,
            TokenKind::Ge => CmpOp::Ge,
            TokenKind::KwIn => CmpOp::In,
            TokenKind::KwNot if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::KwIn)) => {
                CmpOp::NotIn
            }
            _ => return None,
        };
        Some(op)
    }

    fn parse_prefix(&mut self) -> PResult<Expr> {
        let start = self.span();
        let (op, bp) = match self.kind() {
            TokenKind::KwNot => (UnOp::Not, BP_NOT),
            TokenKind::Minus => (UnOp::Neg, BP_UNARY),
            TokenKind::Plus => (UnOp::Pos, BP_UNARY),
            _ => {
                let atom = self.parse_atom()?;
                return self.parse_postfix(atom);
            }
        };
        self.bump();
        let operand = self.parse_bp(bp)?;
        if let (UnOp::Neg, Expr::Lit(Literal::BigInt(digits), _)) = (op, &operand) {
            // i64::MIN only exists as a negated literal
            if digits.as_str() == I64_MIN_DIGITS {
                return Ok(Expr::Lit(Literal::Int(i64::MIN), self.span_from(start)));
            }
        }
        Ok(Expr::UnOp {
            op,
            operand: Box::new(operand),
            span: self.span_from(start),
        })
    }

    fn parse_atom(&mut self) -> PResult<Expr> {
        let start = self.span();
        let literal = match self.kind().clone() {
            TokenKind::Int(n) => Literal::Int(n),
            TokenKind::BigInt(digits) => Literal::BigInt(digits),
            TokenKind::Float(f) => Literal::Float(f),
            TokenKind::Str(s) => {
                self.bump();
                // Adjacent string literals concatenate
                let mut text = s;
                while let TokenKind::Str(next) = self.kind().clone() {
                    self.bump();
                    text.push_str(&next);
                }
                return Ok(Expr::Lit(Literal::Str(text), self.span_from(start)));
            }
            TokenKind::KwNone => Literal::None,
            TokenKind::KwTrue => Literal::Bool(true),
            TokenKind::KwFalse => Literal::Bool(false),
            TokenKind::Name(name) => {
                self.bump();
                return Ok(Expr::Name(name, start));
            }
            TokenKind::LParen => return self.parse_paren(),
            TokenKind::LBracket => {
                self.bump();
                let items = self.parse_sequence(&TokenKind::RBracket)?;
                return Ok(Expr::List(items, self.span_from(start)));
            }
            TokenKind::LBrace => return self.parse_dict(),
            _ => return Err(self.unexpected()),
        };
        self.bump();
        Ok(Expr::Lit(literal, start))
    }

    /// Parenthesised expression or tuple display
    fn parse_paren(&mut self) -> PResult<Expr> {
        let start = self.span();
        self.bump();
        if self.skip(&TokenKind::RParen) {
            return Ok(Expr::Tuple(Vec::new(), self.span_from(start)));
        }
        let first = self.parse_expression()?;
        if self.skip(&TokenKind::RParen) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.skip(&TokenKind::Comma) {
            if self.at(&TokenKind::RParen) {
                break;
            }
            items.push(self.parse_expression()?);
        }
        self.expect(&TokenKind::RParen)?;
        Ok(Expr::Tuple(items, self.span_from(start)))
    }

    /// Items up to `close`, which is consumed; trailing comma allowed
    fn parse_sequence(
        &mut self,
        close: &TokenKind,
    ) -> PResult<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.at(close) {
            items.push(self.parse_expression()?);
            if !self.skip(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(close)?;
        Ok(items)
    }

    fn parse_dict(&mut self) -> PResult<Expr> {
        let start = self.span();
        self.bump();
        let mut entries = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            let key = self.parse_expression()?;
            self.expect(&TokenKind::Colon)?;
            let value = self.parse_expression()?;
            entries.push((key, value));
            if !self.skip(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(Expr::Dict(entries, self.span_from(start)))
    }

    /// Calls, attribute access, indexing and slicing
    fn parse_postfix(
        &mut self,
        mut expr: Expr,
    ) -> PResult<Expr> {
        loop {
            let start = expr.span();
            if matches!(self.kind(), TokenKind::LParen | TokenKind::Dot | TokenKind::LBracket) {
                self.deepen()?;
            }
            match self.kind() {
                TokenKind::LParen => {
                    self.bump();
                    let (args, kwargs) = self.parse_arguments()?;
                    expr = Expr::Call {
                        func: Box::new(expr),
                        args,
                        kwargs,
                        span: self.span_from(start),
                    };
                }
                TokenKind::Dot => {
                    self.bump();
                    let name = self.expect_name()?;
                    expr = Expr::Attribute {
                        object: Box::new(expr),
                        name,
                        span: self.span_from(start),
                    };
                }
                TokenKind::LBracket => {
                    self.bump();
                    expr = self.parse_subscript(expr)?;
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_arguments(&mut self) -> PResult<(Vec<Expr>, Vec<(String, Expr)>)> {
        let mut args = Vec::new();
        let mut kwargs: Vec<(String, Expr)> = Vec::new();
        while !self.at(&TokenKind::RParen) {
            let keyword = match (self.kind(), self.peek().map(|t| &t.kind)) {
                (TokenKind::Name(name), Some(TokenKind::Assign)) => Some(name.clone()),
                _ => None,
            };
            match keyword {
                Some(name) => {
                    if kwargs.iter().any(|(k, _)| *k == name) {
                        return Err(self.error_here(format!("keyword argument repeated: {}", name)));
                    }
                    self.bump();
                    self.bump();
                    kwargs.push((name, self.parse_expression()?));
                }
                None => {
                    if !kwargs.is_empty() {
                        return Err(self.error_here("positional argument follows keyword argument"));
                    }
                    args.push(self.parse_expression()?);
                }
            }
            if !self.skip(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok((args, kwargs))
    }

    /// After `[`: either `obj[index]` or `obj[start:stop]`
    fn parse_subscript(
        &mut self,
        object: Expr,
    ) -> PResult<Expr> {
        let start = object.span();
        let lower = if self.at(&TokenKind::Colon) {
            None
        } else {
            Some(self.parse_testlist()?)
        };

        if self.skip(&TokenKind::Colon) {
            let upper = if self.at(&TokenKind::RBracket) {
                None
            } else {
                Some(self.parse_expression()?)
            };
            self.expect(&TokenKind::RBracket)?;
            return Ok(Expr::Slice {
                object: Box::new(object),
                start: lower.map(Box::new),
                stop: upper.map(Box::new),
                span: self.span_from(start),
            });
        }

        let index = match lower {
            Some(index) => index,
            None => return Err(self.unexpected()),
        };
        self.expect(&TokenKind::RBracket)?;
        Ok(Expr::Index {
            object: Box::new(object),
            index: Box::new(index),
            span: self.span_from(start),
        })
    }

    /// Span from `start` to the end of the last consumed token
    pub(crate) fn span_from(
        &self,
        start: Span,
    ) -> Span {
        Span::new(start.start, self.previous_end().unwrap_or(start.end))
    }
}
