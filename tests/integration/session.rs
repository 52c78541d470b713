//! Session integration tests
//!
//! Drives whole sessions through the public API with scripted input.

use ptty::engine::{Interpreter, Scope, ScopePair, Value};
use ptty::session::{Action, CapturedOutput, ColumnLayout, ScriptedInput, Session, SessionConfig};
use ptty::util::config::parse_config;

fn run_lines(
    scopes: ScopePair,
    lines: &[&str],
) -> (Scope, String) {
    let out = CapturedOutput::new();
    let interp = Interpreter::with_output(Box::new(out.clone()));
    let mut session = Session::new(interp, scopes, out.clone());
    let scope = session
        .run(&mut ScriptedInput::new(lines.iter().copied()))
        .unwrap();
    (scope, out.contents())
}

#[test]
fn test_debugging_walkthrough() {
    let (scope, text) = run_lines(
        ScopePair::shared(Scope::new()),
        &[
            "1 + 1",
            "x = 5",
            "x",
            "def f():",
            "    return 1",
            "",
            "f()",
            "[].",
            "quit()",
        ],
    );
    assert!(text.starts_with("PTTY v"));
    assert!(text.contains("Note: Variables defined here will persist and be returned at exit\n2\n5\n1\n"));
    assert!(text.contains("append"));
    assert!(scope.contains("x"));
    assert!(scope.contains("f"));
    assert!(!scope.contains("quit"));
}

#[test]
fn test_host_values_are_visible_and_changes_come_back() {
    let outer = Scope::new();
    outer.insert("config", Value::from_serialize(&[("retries", 3)]).unwrap());
    outer.insert("limit", 10i64);
    let inner = Scope::new();
    inner.insert("count", 0i64);

    let (scope, text) = run_lines(
        ScopePair::new(outer.clone(), inner.clone()),
        &[
            "count = count + limit",
            "while count > 7:",
            "    count -= 2",
            "",
            "count",
            "exit()",
        ],
    );

    assert!(text.contains("Note: Variables defined here will be returned at exit\n"));
    assert!(text.ends_with("6\n"));
    assert_eq!(scope.get("count"), Some(Value::Int(6)));
    assert_eq!(inner.get("count"), Some(Value::Int(6)));
    assert!(!outer.contains("exit"));
    assert_eq!(outer.get("limit"), Some(Value::Int(10)));
}

#[test]
fn test_errors_do_not_end_the_session() {
    let (scope, text) = run_lines(
        ScopePair::shared(Scope::new()),
        &["[1, 2][5]", "{}['k']", "len(1)", "ok = True", "quit()"],
    );
    assert!(text.contains("IndexError: list index out of range"));
    assert!(text.contains("KeyError: 'k'"));
    assert!(text.contains("TypeError"));
    assert_eq!(scope.get("ok"), Some(Value::Bool(true)));
}

#[test]
fn test_configured_session() {
    let config = parse_config("[repl]\nprompt = \"py> \"\ncolumns = 1\npad = 0\n").unwrap();
    let session_config = SessionConfig::from(&config.repl);
    assert_eq!(session_config.layout, ColumnLayout::new(1, 0));

    let out = CapturedOutput::new();
    let interp = Interpreter::with_output(Box::new(out.clone()));
    let mut session =
        Session::new(interp, ScopePair::shared(Scope::new()), out.clone()).with_config(session_config);
    assert_eq!(session.prompt_text(), "py> ");
    assert_eq!(session.handle_line("(1).").unwrap(), Action::Listed);
    assert_eq!(out.contents(), "bit_length\n\n");
}
