//! Stop handlers
//!
//! While a session runs, `exit` and `quit` in the outer scope are bound to a
//! native function that only clears the session's [`RunningFlag`]. The
//! [`StopGuard`] puts the outer scope's own bindings back when it is dropped,
//! whichever way the session ends.

use std::cell::Cell;
use std::rc::Rc;

use crate::engine::{CallArgs, Scope, Value};

/// Names bound to the stop handler
pub const STOP_NAMES: [&str; 2] = ["exit", "quit"];

/// Shared "keep looping" flag
#[derive(Debug, Clone)]
pub struct RunningFlag(Rc<Cell<bool>>);

impl Default for RunningFlag {
    fn default() -> Self {
        Self(Rc::new(Cell::new(true)))
    }
}

impl RunningFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.0.get()
    }

    pub fn stop(&self) {
        self.0.set(false);
    }

    pub fn reset(&self) {
        self.0.set(true);
    }

    /// Native function that stops the session when called
    pub fn handler(
        &self,
        name: &str,
    ) -> Value {
        let flag = self.clone();
        let label = name.to_string();
        Value::native(name, move |_, args: CallArgs| {
            // Accepts and ignores an exit status like the builtin it replaces
            args.expect(&label, 0, 1)?;
            tracing::debug!("{}() called, stopping session", label);
            flag.stop();
            Ok(Value::None)
        })
    }
}

/// Restores the outer scope's `exit`/`quit` bindings on drop
#[derive(Debug)]
pub struct StopGuard {
    scope: Scope,
    saved: Vec<(&'static str, Option<Value>)>,
}

impl StopGuard {
    /// Bind the stop names in `scope` to `flag`'s handler
    pub fn install(
        scope: &Scope,
        flag: &RunningFlag,
    ) -> Self {
        let saved = STOP_NAMES
            .iter()
            .map(|&name| (name, scope.insert(name, flag.handler(name))))
            .collect();
        Self {
            scope: scope.clone(),
            saved,
        }
    }
}

impl Drop for StopGuard {
    fn drop(&mut self) {
        for (name, previous) in self.saved.drain(..) {
            match previous {
                Some(value) => {
                    self.scope.insert(name, value);
                }
                None => {
                    self.scope.remove(name);
                }
            }
        }
        tracing::debug!("stop handlers restored");
    }
}
