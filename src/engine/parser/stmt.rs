//! Statement parsing

use std::rc::Rc;

use super::ast::{Expr, FunctionDef, Param, Stmt, StmtKind, Target};
use super::precedence::{augmented_op, BP_CMP};
use super::state::{PResult, ParserState};
use crate::engine::error::SyntaxError;
use crate::engine::lexer::TokenKind;

impl ParserState<'_> {
    /// Statements until end of input
    pub fn parse_statements(&mut self) -> PResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        self.skip_newlines();
        while !self.at(&TokenKind::Eof) {
            stmts.push(self.parse_statement()?);
            self.skip_newlines();
        }
        Ok(stmts)
    }

    fn parse_statement(&mut self) -> PResult<Stmt> {
        match self.kind() {
            TokenKind::KwDef => self.parse_def(),
            TokenKind::KwIf => self.parse_if(),
            TokenKind::KwWhile => self.parse_while(),
            TokenKind::KwFor => self.parse_for(),
            _ => {
                let stmt = self.parse_simple_statement()?;
                self.expect_line_end()?;
                Ok(stmt)
            }
        }
    }

    fn expect_line_end(&mut self) -> PResult<()> {
        if self.skip(&TokenKind::Newline) || self.at(&TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn parse_simple_statement(&mut self) -> PResult<Stmt> {
        let line = self.span().line();
        let kind = match self.kind() {
            TokenKind::KwPass => {
                self.bump();
                StmtKind::Pass
            }
            TokenKind::KwBreak => {
                if self.loop_depth == 0 {
                    return Err(self.error_here("'break' outside loop"));
                }
                self.bump();
                StmtKind::Break
            }
            TokenKind::KwContinue => {
                if self.loop_depth == 0 {
                    return Err(self.error_here("'continue' not properly in loop"));
                }
                self.bump();
                StmtKind::Continue
            }
            TokenKind::KwReturn => {
                if self.function_depth == 0 {
                    return Err(self.error_here("'return' outside function"));
                }
                self.bump();
                if matches!(self.kind(), TokenKind::Newline | TokenKind::Eof) {
                    StmtKind::Return(None)
                } else {
                    StmtKind::Return(Some(self.parse_testlist()?))
                }
            }
            _ => self.parse_expression_statement()?,
        };
        Ok(Stmt { kind, line })
    }

    fn parse_expression_statement(&mut self) -> PResult<StmtKind> {
        let expr = self.parse_testlist()?;

        if self.skip(&TokenKind::Assign) {
            // One target per statement; `a = b = 1` is rejected
            let target = self.to_target(expr)?;
            let value = self.parse_testlist()?;
            return Ok(StmtKind::Assign { target, value });
        }

        if let Some(op) = augmented_op(self.kind()) {
            if matches!(expr, Expr::Tuple(..) | Expr::List(..)) {
                return Err(self.error_here(format!(
                    "'{}' is an illegal expression for augmented assignment",
                    if matches!(expr, Expr::Tuple(..)) { "tuple" } else { "list" }
                )));
            }
            self.bump();
            let target = self.to_target(expr)?;
            let value = self.parse_testlist()?;
            return Ok(StmtKind::AugAssign { target, op, value });
        }

        Ok(StmtKind::Expr(expr))
    }

    /// Reinterpret a parsed expression as something assignable
    fn to_target(
        &self,
        expr: Expr,
    ) -> PResult<Target> {
        match expr {
            Expr::Name(name, _) => Ok(Target::Name(name)),
            Expr::Attribute { object, name, .. } => Ok(Target::Attribute {
                object: *object,
                name,
            }),
            Expr::Index { object, index, .. } => Ok(Target::Index {
                object: *object,
                index: *index,
            }),
            Expr::Tuple(items, _) | Expr::List(items, _) => items
                .into_iter()
                .map(|item| self.to_target(item))
                .collect::<PResult<Vec<_>>>()
                .map(Target::Unpack),
            other => Err(SyntaxError::new(
                format!("cannot assign to {}", other.describe()),
                other.span().start,
            )),
        }
    }

    /// `:` followed by either an inline simple statement or an indented block
    fn parse_block(&mut self) -> PResult<Vec<Stmt>> {
        self.nested(Self::parse_block_body)
    }

    fn parse_block_body(&mut self) -> PResult<Vec<Stmt>> {
        self.expect(&TokenKind::Colon)?;

        if !self.skip(&TokenKind::Newline) {
            let stmt = self.parse_simple_statement()?;
            self.expect_line_end()?;
            return Ok(vec![stmt]);
        }

        if !self.skip(&TokenKind::Indent) {
            return Err(self.error_here("expected an indented block"));
        }
        let mut body = Vec::new();
        loop {
            self.skip_newlines();
            if self.skip(&TokenKind::Dedent) || self.at(&TokenKind::Eof) {
                break;
            }
            body.push(self.parse_statement()?);
        }
        Ok(body)
    }

    fn parse_def(&mut self) -> PResult<Stmt> {
        let line = self.span().line();
        self.bump();
        let name = self.expect_name()?;
        self.expect(&TokenKind::LParen)?;

        let mut params: Vec<Param> = Vec::new();
        while !self.at(&TokenKind::RParen) {
            let param_name = self.expect_name()?;
            if params.iter().any(|p| p.name == param_name) {
                return Err(self.error_here(format!(
                    "duplicate argument '{}' in function definition",
                    param_name
                )));
            }
            let default = if self.skip(&TokenKind::Assign) {
                Some(self.parse_expression()?)
            } else {
                if params.iter().any(|p| p.default.is_some()) {
                    return Err(self.error_here("non-default argument follows default argument"));
                }
                None
            };
            params.push(Param {
                name: param_name,
                default,
            });
            if !self.skip(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;

        let saved_loops = std::mem::replace(&mut self.loop_depth, 0);
        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;
        self.loop_depth = saved_loops;

        let def = FunctionDef {
            name,
            params,
            body: body?,
            line,
        };
        Ok(Stmt {
            kind: StmtKind::FunctionDef(Rc::new(def)),
            line,
        })
    }

    fn parse_if(&mut self) -> PResult<Stmt> {
        let line = self.span().line();
        self.bump();
        let mut branches = Vec::new();
        let condition = self.parse_expression()?;
        branches.push((condition, self.parse_block()?));

        let mut orelse = None;
        loop {
            if self.skip(&TokenKind::KwElif) {
                let condition = self.parse_expression()?;
                branches.push((condition, self.parse_block()?));
            } else if self.skip(&TokenKind::KwElse) {
                orelse = Some(self.parse_block()?);
                break;
            } else {
                break;
            }
        }

        Ok(Stmt {
            kind: StmtKind::If { branches, orelse },
            line,
        })
    }

    fn parse_loop_body(&mut self) -> PResult<Vec<Stmt>> {
        self.loop_depth += 1;
        let body = self.parse_block();
        self.loop_depth -= 1;
        body
    }

    fn parse_while(&mut self) -> PResult<Stmt> {
        let line = self.span().line();
        self.bump();
        let condition = self.parse_expression()?;
        let body = self.parse_loop_body()?;
        Ok(Stmt {
            kind: StmtKind::While { condition, body },
            line,
        })
    }

    fn parse_for(&mut self) -> PResult<Stmt> {
        let line = self.span().line();
        self.bump();

        // Targets stop short of comparisons so `in` is left for the loop
        let first = self.parse_bp(BP_CMP.1)?;
        let target_expr = if self.at(&TokenKind::Comma) {
            let start = first.span();
            let mut items = vec![first];
            while self.skip(&TokenKind::Comma) {
                if self.at(&TokenKind::KwIn) {
                    break;
                }
                items.push(self.parse_bp(BP_CMP.1)?);
            }
            Expr::Tuple(items, self.span_from(start))
        } else {
            first
        };
        let target = self.to_target(target_expr)?;

        self.expect(&TokenKind::KwIn)?;
        let iterable = self.parse_testlist()?;
        let body = self.parse_loop_body()?;
        Ok(Stmt {
            kind: StmtKind::For {
                target,
                iterable,
                body,
            },
            line,
        })
    }
}
