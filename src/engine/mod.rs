//! Script engine
//!
//! The [`Engine`] trait is the evaluation seam the session loop drives. The
//! bundled [`Interpreter`] implements it for a small indentation-based
//! language with Python-like syntax.

pub mod builtins;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod members;
pub mod ops;
pub mod parser;
pub mod scope;
mod stack;
pub mod value;

#[cfg(test)]
mod tests;

pub use error::{
    EngineError, EngineResult, ErrorKind, RunResult, RuntimeError, SyntaxError, SyntaxErrorKind,
};
pub use interpreter::Interpreter;
pub use scope::{Scope, ScopePair};
pub use value::{CallArgs, Dict, Object, TypeKind, Value};

/// Dynamic evaluation against a pair of scopes
pub trait Engine {
    /// Evaluate `source` as a single expression
    ///
    /// Text that is not exactly one expression must fail with
    /// [`EngineError::Syntax`]; the session relies on that to tell
    /// expressions from statements and unfinished blocks.
    fn eval(
        &mut self,
        source: &str,
        scopes: &ScopePair,
    ) -> EngineResult<Value>;

    /// Execute `source` as a sequence of statements
    fn exec(
        &mut self,
        source: &str,
        scopes: &ScopePair,
    ) -> EngineResult<()>;

    /// Sorted member names of `value`
    fn members(
        &mut self,
        value: &Value,
    ) -> Vec<String>;

    /// True when `source` alone is one or more complete simple statements
    fn is_complete_statement(
        &self,
        source: &str,
    ) -> bool;
}

impl Engine for Interpreter {
    fn eval(
        &mut self,
        source: &str,
        scopes: &ScopePair,
    ) -> EngineResult<Value> {
        tracing::debug!("eval: {:?}", source);
        self.eval_source(source, scopes)
    }

    fn exec(
        &mut self,
        source: &str,
        scopes: &ScopePair,
    ) -> EngineResult<()> {
        tracing::debug!("exec: {:?}", source);
        self.exec_source(source, scopes)
    }

    fn members(
        &mut self,
        value: &Value,
    ) -> Vec<String> {
        members::members_of(value)
    }

    fn is_complete_statement(
        &self,
        source: &str,
    ) -> bool {
        parser::is_complete_statement(source)
    }
}
