//! Tests for the script engine

mod interpreter;
mod parser;

use crate::engine::{Engine, Interpreter, ScopePair, Scope, Value};
use crate::session::CapturedOutput;

/// Interpreter whose `print` output is captured, plus a fresh shared scope
pub(crate) fn setup() -> (Interpreter, ScopePair, CapturedOutput) {
    let output = CapturedOutput::new();
    let interp = Interpreter::with_output(Box::new(output.clone()));
    (interp, ScopePair::shared(Scope::new()), output)
}

pub(crate) fn eval(
    interp: &mut Interpreter,
    scopes: &ScopePair,
    source: &str,
) -> Value {
    match interp.eval(source, scopes) {
        Ok(value) => value,
        Err(err) => panic!("eval {:?} failed:\n{}", source, err.render_trace()),
    }
}

pub(crate) fn exec(
    interp: &mut Interpreter,
    scopes: &ScopePair,
    source: &str,
) {
    if let Err(err) = interp.exec(source, scopes) {
        panic!("exec {:?} failed:\n{}", source, err.render_trace());
    }
}

/// Evaluate in a fresh interpreter and return the repr
pub(crate) fn repr_of(source: &str) -> String {
    let (mut interp, scopes, _) = setup();
    eval(&mut interp, &scopes, source).repr()
}
