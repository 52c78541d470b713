//! Interactive session loop
//!
//! A [`Session`] reads one line at a time and decides what it is by asking
//! the [`Engine`]: a line that evaluates as an expression is printed; a line
//! ending in `.` lists the members of what precedes the period; anything
//! else is either run right away (a complete simple statement) or buffered
//! until a blank line closes the block.
//!
//! ```rust
//! use ptty::engine::{Interpreter, Scope, ScopePair};
//! use ptty::session::{CapturedOutput, ScriptedInput, Session};
//!
//! let out = CapturedOutput::new();
//! let interp = Interpreter::with_output(Box::new(out.clone()));
//! let mut session = Session::new(interp, ScopePair::shared(Scope::new()), out.clone());
//! let mut input = ScriptedInput::new(["x = 5", "x + 1", "quit()"]);
//! let scope = session.run(&mut input).unwrap();
//! assert!(out.contents().contains("\n6\n"));
//! assert!(scope.contains("x"));
//! ```

mod line;
mod printer;
mod stop;

#[cfg(test)]
mod tests;

use std::io::{self, Write};

use tracing::{debug, info};

use crate::engine::{Engine, EngineError, Scope, ScopePair};
use crate::util::config::ReplConfig;

pub use line::{CapturedOutput, EditorConfig, LineEditor, LineSource, ReadOutcome, ScriptedInput};
pub use printer::{format_columns, print_columns, ColumnLayout};
pub use stop::{RunningFlag, StopGuard, STOP_NAMES};

/// First banner line
pub fn banner_title() -> String {
    format!("PTTY v{}", crate::VERSION)
}

pub const BANNER_TAGLINE: &str = "Portable mini-interpreter for convenience and debugging";
pub const BANNER_HELP: &str = "Type quit() or exit() to stop interpreting";
pub const NOTE_SHARED: &str = "Note: Variables defined here will persist and be returned at exit";
pub const NOTE_SEPARATE: &str = "Note: Variables defined here will be returned at exit";
pub const INTERRUPT_MESSAGE: &str = "KeyboardInterrupt";

/// Which prompt the next read shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// A new statement is expected
    Primary,
    /// Inside an unfinished block
    Continuation,
}

/// What a line did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Blank line with nothing buffered
    Skipped,
    /// Evaluated as an expression
    Evaluated,
    /// Members listed for a trailing-period line
    Listed,
    /// Statements executed
    Executed,
    /// Appended to the buffer
    Buffered,
    /// An error was reported and the buffer cleared
    Failed,
}

/// Session settings
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub prompt: String,
    pub continuation_prompt: String,
    pub layout: ColumnLayout,
    /// Run a complete single-line statement without waiting for a blank line
    pub eager_statements: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&ReplConfig::default())
    }
}

impl From<&ReplConfig> for SessionConfig {
    fn from(config: &ReplConfig) -> Self {
        Self {
            prompt: config.prompt.clone(),
            continuation_prompt: config.continuation_prompt.clone(),
            layout: ColumnLayout::new(config.columns, config.pad),
            eager_statements: config.eager_statements,
        }
    }
}

/// One interactive session over a pair of scopes
pub struct Session<E: Engine, W: Write> {
    engine: E,
    scopes: ScopePair,
    config: SessionConfig,
    out: W,
    buffer: String,
    running: RunningFlag,
}

impl<E: Engine, W: Write> Session<E, W> {
    pub fn new(
        engine: E,
        scopes: ScopePair,
        out: W,
    ) -> Self {
        Self {
            engine,
            scopes,
            config: SessionConfig::default(),
            out,
            buffer: String::new(),
            running: RunningFlag::new(),
        }
    }

    pub fn with_config(
        mut self,
        config: SessionConfig,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn prompt(&self) -> Prompt {
        if self.buffer.is_empty() {
            Prompt::Primary
        } else {
            Prompt::Continuation
        }
    }

    pub fn prompt_text(&self) -> &str {
        match self.prompt() {
            Prompt::Primary => &self.config.prompt,
            Prompt::Continuation => &self.config.continuation_prompt,
        }
    }

    /// Lines waiting for the blank line that ends their block
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn scopes(&self) -> &ScopePair {
        &self.scopes
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub fn is_running(&self) -> bool {
        self.running.is_running()
    }

    /// Flag cleared by the stop handlers
    pub fn running_flag(&self) -> &RunningFlag {
        &self.running
    }

    /// Banner and the note about where variables end up
    pub fn write_banner(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", banner_title())?;
        writeln!(self.out, "{}", BANNER_TAGLINE)?;
        writeln!(self.out, "{}", BANNER_HELP)?;
        let note = if self.scopes.is_shared() {
            NOTE_SHARED
        } else {
            NOTE_SEPARATE
        };
        writeln!(self.out, "{}", note)
    }

    /// Run until a stop handler is called or input ends
    ///
    /// Returns the inner scope. Only errors writing to the terminal or
    /// reading from `input` are returned; everything the engine reports is
    /// printed.
    pub fn run(
        &mut self,
        input: &mut dyn LineSource,
    ) -> io::Result<Scope> {
        self.write_banner()?;
        self.running.reset();
        let _guard = StopGuard::install(&self.scopes.outer, &self.running);
        info!("session started");

        while self.running.is_running() {
            let prompt = self.prompt_text().to_string();
            match input.read_line(&prompt)? {
                ReadOutcome::Line(line) => {
                    self.handle_line(&line)?;
                }
                ReadOutcome::Interrupted => self.interrupt()?,
                ReadOutcome::Eof => {
                    writeln!(self.out)?;
                    break;
                }
            }
            self.out.flush()?;
        }

        info!("session ended");
        self.out.flush()?;
        Ok(self.scopes.inner.clone())
    }

    /// Process one line of input
    pub fn handle_line(
        &mut self,
        line: &str,
    ) -> io::Result<Action> {
        if line.is_empty() && self.buffer.is_empty() {
            return Ok(Action::Skipped);
        }

        let source = format!("{}{}", self.buffer, line);
        match self.engine.eval(&source, &self.scopes) {
            Ok(value) => {
                debug!("line evaluated as expression");
                self.buffer.clear();
                if !value.is_none() {
                    writeln!(self.out, "{}", value)?;
                }
                return Ok(Action::Evaluated);
            }
            Err(err) if !err.is_syntax() => return self.fail(&err),
            Err(_) => {}
        }

        if let Some(target) = line.strip_suffix('.') {
            debug!("listing members of {:?}", target);
            return match self.engine.eval(target, &self.scopes) {
                Ok(value) => {
                    let names = self.engine.members(&value);
                    print_columns(&mut self.out, &names, self.config.layout)?;
                    Ok(Action::Listed)
                }
                Err(err) => self.fail(&err),
            };
        }

        if line.is_empty() {
            debug!("blank line, executing {} buffered bytes", self.buffer.len());
            let result = self.engine.exec(&source, &self.scopes);
            self.buffer.clear();
            return match result {
                Ok(()) => Ok(Action::Executed),
                Err(err) => self.fail(&err),
            };
        }

        if self.config.eager_statements
            && self.buffer.is_empty()
            && self.engine.is_complete_statement(line)
        {
            debug!("executing complete statement");
            return match self.engine.exec(line, &self.scopes) {
                Ok(()) => Ok(Action::Executed),
                Err(err) => self.fail(&err),
            };
        }

        debug!("buffering line");
        self.buffer.push('\n');
        self.buffer.push_str(line);
        Ok(Action::Buffered)
    }

    /// Ctrl-C at the prompt: drop the unfinished block
    pub fn interrupt(&mut self) -> io::Result<()> {
        debug!("interrupted, discarding {} buffered bytes", self.buffer.len());
        self.buffer.clear();
        writeln!(self.out, "{}", INTERRUPT_MESSAGE)
    }

    fn fail(
        &mut self,
        err: &EngineError,
    ) -> io::Result<Action> {
        debug!("reporting error: {}", err);
        self.buffer.clear();
        writeln!(self.out, "{}", err.render_trace())?;
        Ok(Action::Failed)
    }
}

impl<E: Engine + std::fmt::Debug, W: Write> std::fmt::Debug for Session<E, W> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("engine", &self.engine)
            .field("scopes", &self.scopes)
            .field("config", &self.config)
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}
