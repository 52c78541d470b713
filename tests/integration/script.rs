//! Script file execution tests

use std::io::Write;

use ptty::engine::{EngineError, Interpreter, Scope, ScopePair, Value};
use ptty::run_file;
use tempfile::NamedTempFile;

fn script(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(source.as_bytes()).unwrap();
    file
}

fn interpreter() -> Interpreter {
    Interpreter::with_output(Box::new(std::io::sink()))
}

#[test]
fn test_script_defines_names() {
    let file = script("def double(n):\n    return n * 2\n\nvalue = double(21)\n");
    let scopes = ScopePair::shared(Scope::new());
    run_file(&mut interpreter(), file.path(), &scopes).unwrap();
    assert_eq!(scopes.inner.get("value"), Some(Value::Int(42)));
    assert!(scopes.inner.contains("double"));
}

#[test]
fn test_script_error_keeps_engine_error() {
    let file = script("x = 1\ny = x / 0\n");
    let scopes = ScopePair::shared(Scope::new());
    let err = run_file(&mut interpreter(), file.path(), &scopes).unwrap_err();
    assert!(err.to_string().starts_with("Failed to run"));
    let engine_err = err.downcast_ref::<EngineError>().unwrap();
    let trace = engine_err.render_trace();
    assert!(trace.contains("line 2"));
    assert!(trace.ends_with("ZeroDivisionError: division by zero\n"));
    assert_eq!(scopes.inner.get("x"), Some(Value::Int(1)));
}

#[test]
fn test_script_exit_status() {
    let file = script("exit(4)\n");
    let scopes = ScopePair::shared(Scope::new());
    let err = run_file(&mut interpreter(), file.path(), &scopes).unwrap_err();
    match err.downcast_ref::<EngineError>() {
        Some(EngineError::Runtime(runtime)) => assert_eq!(runtime.exit_code(), Some(4)),
        other => panic!("expected runtime error, got {:?}", other),
    }
}

#[test]
fn test_missing_script() {
    let dir = tempfile::tempdir().unwrap();
    let scopes = ScopePair::shared(Scope::new());
    let err = run_file(&mut interpreter(), &dir.path().join("absent.py"), &scopes).unwrap_err();
    assert!(err.to_string().contains("Failed to read file"));
    assert!(err.downcast_ref::<EngineError>().is_none());
}
