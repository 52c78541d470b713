//! Session tests


use crate::engine::{Interpreter, Scope, ScopePair};
use crate::session::{CapturedOutput, Session};

pub(crate) type TestSession = Session<Interpreter, CapturedOutput>;

/// Session over a fresh shared scope; the interpreter prints into the same
/// buffer as the session
pub(crate) fn session() -> (TestSession, CapturedOutput) {
    session_with(ScopePair::shared(Scope::new()))
}

pub(crate) fn session_with(scopes: ScopePair) -> (TestSession, CapturedOutput) {
    let out = CapturedOutput::new();
    let interp = Interpreter::with_output(Box::new(out.clone()));
    (Session::new(interp, scopes, out.clone()), out)
}

/// Feed `lines` through `handle_line`, returning what each did
pub(crate) fn feed(
    session: &mut TestSession,
    lines: &[&str],
) -> Vec<crate::session::Action> {
    lines
        .iter()
        .map(|line| session.handle_line(line).unwrap())
        .collect()
}
