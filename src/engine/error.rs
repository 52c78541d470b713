//! Engine errors
//!
//! Two tiers: [`SyntaxError`] means "this text is not valid in the requested
//! mode" and is what the session uses to steer between evaluation, completion
//! and block buffering; [`RuntimeError`] is anything raised while running
//! code and always carries a traceback.

use std::fmt;

use thiserror::Error;

use super::interpreter::MODULE_FRAME;
use crate::util::span::Position;

/// File name shown in tracebacks
pub const CONSOLE_FILE: &str = "<console>";

/// Engine result
pub type EngineResult<T> = Result<T, EngineError>;

/// Runtime result
pub type RunResult<T> = Result<T, RuntimeError>;

/// Lexer error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("invalid number literal: {0}")]
    InvalidNumber(String),
    #[error("invalid character '{ch}'")]
    UnexpectedChar { ch: char },
    #[error("unindent does not match any outer indentation level")]
    InconsistentDedent,
    #[error("unmatched '{ch}'")]
    UnmatchedBracket { ch: char },
}

/// Why the parser gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyntaxErrorKind {
    #[default]
    Invalid,
    /// Brackets, operators or blocks nested past the parser's limit
    TooDeep,
}

/// Source text that cannot be parsed in the requested mode
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} ({position})")]
pub struct SyntaxError {
    /// Human readable reason
    pub message: String,
    /// Where parsing stopped
    pub position: Position,
    pub kind: SyntaxErrorKind,
}

impl SyntaxError {
    pub fn new(
        message: impl Into<String>,
        position: Position,
    ) -> Self {
        Self {
            message: message.into(),
            position,
            kind: SyntaxErrorKind::Invalid,
        }
    }

    pub fn too_deep(position: Position) -> Self {
        Self {
            message: "maximum nesting depth exceeded while parsing".to_string(),
            position,
            kind: SyntaxErrorKind::TooDeep,
        }
    }

    pub fn from_lex(
        err: LexError,
        position: Position,
    ) -> Self {
        Self::new(err.to_string(), position)
    }
}

/// Runtime error categories, named after the exception classes users expect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NameError,
    TypeError,
    ValueError,
    ZeroDivisionError,
    IndexError,
    KeyError,
    AttributeError,
    OverflowError,
    RecursionError,
    OSError,
    SystemExit,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::NameError => "NameError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ValueError => "ValueError",
            ErrorKind::ZeroDivisionError => "ZeroDivisionError",
            ErrorKind::IndexError => "IndexError",
            ErrorKind::KeyError => "KeyError",
            ErrorKind::AttributeError => "AttributeError",
            ErrorKind::OverflowError => "OverflowError",
            ErrorKind::RecursionError => "RecursionError",
            ErrorKind::OSError => "OSError",
            ErrorKind::SystemExit => "SystemExit",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One traceback entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceFrame {
    /// Function name, `<module>` for top-level code
    pub function: String,
    /// Line being executed in that function
    pub line: usize,
}

/// Error raised while running code
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    /// Innermost frame first
    pub traceback: Vec<TraceFrame>,
}

impl RuntimeError {
    pub fn new(
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            traceback: Vec::new(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValueError, message)
    }

    /// Record the frame the error is unwinding through
    pub fn with_frame(
        mut self,
        function: impl Into<String>,
        line: usize,
    ) -> Self {
        self.traceback.push(TraceFrame {
            function: function.into(),
            line,
        });
        self
    }

    /// Process exit status requested by a `SystemExit`
    pub fn exit_code(&self) -> Option<i32> {
        if self.kind != ErrorKind::SystemExit {
            return None;
        }
        if self.message.is_empty() {
            return Some(0);
        }
        Some(self.message.parse().unwrap_or(1))
    }

    /// Full traceback text, most recent call last
    pub fn render_trace(&self) -> String {
        let mut out = String::from("Traceback (most recent call last):\n");
        let mut frames = self.traceback.iter().rev().peekable();
        while let Some(frame) = frames.next() {
            // Runs of identical frames (deep recursion) are folded after three
            let mut run = 1;
            while frames.peek() == Some(&frame) {
                frames.next();
                run += 1;
            }
            for _ in 0..run.min(3) {
                out.push_str(&format!(
                    "  File \"{}\", line {}, in {}\n",
                    CONSOLE_FILE, frame.line, frame.function
                ));
            }
            if run > 3 {
                let more = run - 3;
                out.push_str(&format!(
                    "  [Previous line repeated {} more time{}]\n",
                    more,
                    if more == 1 { "" } else { "s" }
                ));
            }
        }
        out.push_str(&self.to_string());
        out.push('\n');
        out
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Any failure reported by an [`Engine`](super::Engine)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("SyntaxError: {0}")]
    Syntax(SyntaxError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl From<SyntaxError> for EngineError {
    /// Valid text that is merely nested too deeply is not a syntax problem:
    /// it surfaces as a `RecursionError` so the session reports it instead
    /// of buffering more lines
    fn from(err: SyntaxError) -> Self {
        match err.kind {
            SyntaxErrorKind::Invalid => EngineError::Syntax(err),
            SyntaxErrorKind::TooDeep => EngineError::Runtime(
                RuntimeError::new(ErrorKind::RecursionError, err.message)
                    .with_frame(MODULE_FRAME, err.position.line),
            ),
        }
    }
}

impl EngineError {
    /// True when the source text itself was rejected
    pub fn is_syntax(&self) -> bool {
        matches!(self, EngineError::Syntax(_))
    }

    /// Diagnostic trace printed to the user
    pub fn render_trace(&self) -> String {
        match self {
            EngineError::Syntax(err) => format!(
                "Traceback (most recent call last):\n  File \"{}\", line {}\nSyntaxError: {}\n",
                CONSOLE_FILE, err.position.line, err.message
            ),
            EngineError::Runtime(err) => err.render_trace(),
        }
    }
}
