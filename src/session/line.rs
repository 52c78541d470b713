//! Line sources and output capture
//!
//! [`LineEditor`] is the interactive source, built on rustyline with history
//! and emacs/vi editing. [`ScriptedInput`] replays a fixed list of lines for
//! hosts that drive a session programmatically, and [`CapturedOutput`] is a
//! cloneable in-memory writer for reading back what a session printed.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

use rustyline::config::Config;
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::{EditMode, Editor};

use crate::util::config::ReplConfig;

/// Result of asking a source for one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A line without its terminator
    Line(String),
    /// The user pressed Ctrl-C at the prompt
    Interrupted,
    /// No more input
    Eof,
}

/// Where the session reads its lines from
pub trait LineSource {
    /// Show `prompt` and read one line
    fn read_line(
        &mut self,
        prompt: &str,
    ) -> io::Result<ReadOutcome>;
}

/// Line editor settings
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Enable VI mode
    pub vi_mode: bool,
    /// History file path
    pub history_file: Option<PathBuf>,
    /// Maximum history size
    pub history_size: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            vi_mode: false,
            history_file: None,
            history_size: 1000,
        }
    }
}

impl From<&ReplConfig> for EditorConfig {
    fn from(config: &ReplConfig) -> Self {
        Self {
            vi_mode: config.vi_mode,
            history_file: config.history_file.clone(),
            history_size: config.history_size,
        }
    }
}

/// Interactive terminal source
pub struct LineEditor {
    config: EditorConfig,
    editor: Editor<(), FileHistory>,
}

impl LineEditor {
    pub fn new() -> io::Result<Self> {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> io::Result<Self> {
        let rl_config = Config::builder()
            .history_ignore_space(true)
            .auto_add_history(false)
            .max_history_size(config.history_size)
            .map_err(readline_error)?
            .edit_mode(if config.vi_mode {
                EditMode::Vi
            } else {
                EditMode::Emacs
            })
            .build();

        let mut editor = Editor::with_config(rl_config).map_err(readline_error)?;

        // Load history if file exists
        if let Some(ref history_file) = config.history_file {
            if history_file.exists() {
                if let Err(e) = editor.load_history(history_file) {
                    tracing::warn!("could not load history {}: {}", history_file.display(), e);
                }
            }
        }

        Ok(Self { config, editor })
    }

    /// Write history back to the configured file
    pub fn save_history(&mut self) -> io::Result<()> {
        if let Some(ref history_file) = self.config.history_file {
            if let Some(parent) = history_file.parent() {
                std::fs::create_dir_all(parent)?;
            }
            self.editor.save_history(history_file).map_err(readline_error)?;
            tracing::debug!("history saved to {}", history_file.display());
        }
        Ok(())
    }
}

impl std::fmt::Debug for LineEditor {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("LineEditor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LineSource for LineEditor {
    fn read_line(
        &mut self,
        prompt: &str,
    ) -> io::Result<ReadOutcome> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(ReadOutcome::Line(line))
            }
            // Ctrl-D pressed
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            // Ctrl-C pressed
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(e) => Err(readline_error(e)),
        }
    }
}

impl Drop for LineEditor {
    fn drop(&mut self) {
        if let Err(e) = self.save_history() {
            tracing::warn!("could not save history: {}", e);
        }
    }
}

fn readline_error(err: ReadlineError) -> io::Error {
    match err {
        ReadlineError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::Other, format!("Readline error: {}", other)),
    }
}

/// Replays a fixed list of lines, then reports end of input
#[derive(Debug, Default)]
pub struct ScriptedInput {
    lines: VecDeque<ReadOutcome>,
    prompts: Vec<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines
                .into_iter()
                .map(|l| ReadOutcome::Line(l.into()))
                .collect(),
            prompts: Vec::new(),
        }
    }

    /// Queue a Ctrl-C after the lines already queued
    pub fn push_interrupt(&mut self) {
        self.lines.push_back(ReadOutcome::Interrupted);
    }

    pub fn push_line(
        &mut self,
        line: impl Into<String>,
    ) {
        self.lines.push_back(ReadOutcome::Line(line.into()));
    }

    /// Prompts shown so far, in order
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Lines not consumed yet
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl LineSource for ScriptedInput {
    fn read_line(
        &mut self,
        prompt: &str,
    ) -> io::Result<ReadOutcome> {
        self.prompts.push(prompt.to_string());
        Ok(self.lines.pop_front().unwrap_or(ReadOutcome::Eof))
    }
}

/// Cloneable in-memory writer; clones share one buffer
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput(Rc<RefCell<Vec<u8>>>);

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    /// Take the contents, leaving the buffer empty
    pub fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.0.borrow_mut());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
