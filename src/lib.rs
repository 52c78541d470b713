//! PTTY - a portable mini-interpreter for convenience and debugging
//!
//! Drop an interactive prompt into a running program, poke at the values it
//! holds, and get every name you defined back when you quit.
//!
//! # Example
//!
//! ```no_run
//! use ptty::engine::Scope;
//!
//! let scope = Scope::new();
//! scope.insert("answer", 42i64);
//! let scope = ptty::term_with(&scope, &scope)?;
//! println!("{:?}", scope.get("answer"));
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! Host data can be exposed as values through `serde`:
//!
//! ```
//! use ptty::engine::{Scope, Value};
//!
//! #[derive(serde::Serialize)]
//! struct Job {
//!     id: u32,
//!     name: String,
//! }
//!
//! let scope = Scope::new();
//! let job = Job { id: 7, name: "backup".into() };
//! scope.insert("job", Value::from_serialize(&job).unwrap());
//! assert!(scope.contains("job"));
//! ```

#![doc(html_root_url = "https://docs.rs/ptty")]
#![warn(rust_2018_idioms)]

pub mod engine;
pub mod session;
pub mod util;

// Re-exports
pub use anyhow::{Context, Result};
pub use engine::{Engine, EngineError, Interpreter, Scope, ScopePair, Value};
pub use session::{Action, LineSource, Session, SessionConfig};

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::session::{EditorConfig, LineEditor};
use crate::util::config::{load_user_config, UserConfig};

/// Crate version, shown in the banner
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Program name
pub const NAME: &str = "PTTY";

/// Start a session on a fresh scope serving as both outer and inner
///
/// Returns the scope with everything defined during the session.
pub fn term() -> io::Result<Scope> {
    let scope = Scope::new();
    term_with(&scope, &scope)
}

/// Start a session against the caller's scopes
///
/// Reads stdin through the line editor and prints to stdout, using the
/// user configuration when one exists. Returns the inner scope.
pub fn term_with(
    outer: &Scope,
    inner: &Scope,
) -> io::Result<Scope> {
    let config = load_user_config().unwrap_or_else(|e| {
        tracing::warn!("ignoring configuration: {}", e);
        UserConfig::default()
    });
    let scopes = ScopePair::new(outer.clone(), inner.clone());
    run_session(Interpreter::new(), scopes, &config, true)
}

/// Run an interactive session on stdin/stdout with `config`
pub fn run_session<E: Engine>(
    engine: E,
    scopes: ScopePair,
    config: &UserConfig,
    history: bool,
) -> io::Result<Scope> {
    let mut editor_config = EditorConfig::from(&config.repl);
    if !history {
        editor_config.history_file = None;
    }
    let mut editor = LineEditor::with_config(editor_config)?;
    let mut session = Session::new(engine, scopes, io::stdout())
        .with_config(SessionConfig::from(&config.repl));
    session.run(&mut editor)
}

/// Execute a script file against `scopes`
///
/// Engine failures are returned as [`EngineError`] wrapped with the file
/// name, so callers can still inspect them with `downcast_ref`.
pub fn run_file<E: Engine>(
    engine: &mut E,
    path: &Path,
    scopes: &ScopePair,
) -> Result<()> {
    debug!("running {}", path.display());
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    engine
        .exec(&source, scopes)
        .with_context(|| format!("Failed to run: {}", path.display()))?;
    Ok(())
}
