//! Abstract Syntax Tree types

use std::rc::Rc;

use crate::util::span::Span;

/// Literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    /// Digits of an integer that does not fit in an `i64`
    BigInt(String),
    Float(f64),
    Str(String),
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Pos,
    Not,
}

/// Short-circuit operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

/// Expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Lit(Literal, Span),
    Name(String, Span),
    List(Vec<Expr>, Span),
    Tuple(Vec<Expr>, Span),
    Dict(Vec<(Expr, Expr)>, Span),
    UnOp {
        op: UnOp,
        operand: Box<Expr>,
        span: Span,
    },
    BinOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    /// `a < b <= c` keeps every operand for chained evaluation
    Compare {
        left: Box<Expr>,
        ops: Vec<(CmpOp, Expr)>,
        span: Span,
    },
    Logic {
        op: LogicOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
        span: Span,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
        span: Span,
    },
    Attribute {
        object: Box<Expr>,
        name: String,
        span: Span,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    Slice {
        object: Box<Expr>,
        start: Option<Box<Expr>>,
        stop: Option<Box<Expr>>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Lit(_, span)
            | Expr::Name(_, span)
            | Expr::List(_, span)
            | Expr::Tuple(_, span)
            | Expr::Dict(_, span) => *span,
            Expr::UnOp { span, .. }
            | Expr::BinOp { span, .. }
            | Expr::Compare { span, .. }
            | Expr::Logic { span, .. }
            | Expr::Conditional { span, .. }
            | Expr::Call { span, .. }
            | Expr::Attribute { span, .. }
            | Expr::Index { span, .. }
            | Expr::Slice { span, .. } => *span,
        }
    }

    /// Name used in "cannot assign to ..." messages
    pub fn describe(&self) -> &'static str {
        match self {
            Expr::Lit(..) => "literal",
            Expr::Call { .. } => "function call",
            Expr::BinOp { .. } | Expr::UnOp { .. } => "expression",
            Expr::Compare { .. } => "comparison",
            Expr::Logic { .. } => "expression",
            Expr::Conditional { .. } => "conditional expression",
            Expr::Dict(..) => "dict literal",
            Expr::Slice { .. } => "slice",
            _ => "expression",
        }
    }
}

/// Assignment target
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Name(String),
    Attribute { object: Expr, name: String },
    Index { object: Expr, index: Expr },
    Unpack(Vec<Target>),
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
}

/// `def` statement body, shared with the function values created from it
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

/// Statement
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expr(Expr),
    Assign {
        target: Target,
        value: Expr,
    },
    AugAssign {
        target: Target,
        op: BinOp,
        value: Expr,
    },
    Pass,
    Break,
    Continue,
    Return(Option<Expr>),
    FunctionDef(Rc<FunctionDef>),
    If {
        branches: Vec<(Expr, Vec<Stmt>)>,
        orelse: Option<Vec<Stmt>>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    For {
        target: Target,
        iterable: Expr,
        body: Vec<Stmt>,
    },
}

impl Stmt {
    /// Simple statements fit on one line and open no block
    pub fn is_simple(&self) -> bool {
        !matches!(
            self.kind,
            StmtKind::FunctionDef(_)
                | StmtKind::If { .. }
                | StmtKind::While { .. }
                | StmtKind::For { .. }
        )
    }
}
