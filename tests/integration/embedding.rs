//! Embedding tests: host objects, serde values, custom engines

use serde::Serialize;

use ptty::engine::{
    Engine, EngineResult, Interpreter, Object, Scope, ScopePair, SyntaxError, Value,
};
use ptty::session::{Action, CapturedOutput, ScriptedInput, Session};
use ptty::util::span::Position;

#[derive(Serialize)]
struct Request {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
}

#[test]
fn test_serialized_host_value() {
    let request = Request {
        method: "GET".into(),
        path: "/health".into(),
        headers: vec![("accept".into(), "*/*".into())],
    };
    let scope = Scope::new();
    scope.insert("req", Value::from_serialize(&request).unwrap());

    let out = CapturedOutput::new();
    let interp = Interpreter::with_output(Box::new(out.clone()));
    let mut session = Session::new(interp, ScopePair::shared(scope), out.clone());
    for line in ["req['path']", "len(req['headers'])", "req['headers'][0][1]"] {
        assert_eq!(session.handle_line(line).unwrap(), Action::Evaluated);
    }
    assert_eq!(out.contents(), "/health\n1\n*/*\n");
}

#[test]
fn test_host_object_attributes() {
    let scope = Scope::new();
    let conn = Object::new("Connection")
        .with_attr("host", "db.local")
        .with_attr("port", 5432i64);
    scope.insert("conn", Value::object(conn));

    let out = CapturedOutput::new();
    let interp = Interpreter::with_output(Box::new(out.clone()));
    let mut session = Session::new(interp, ScopePair::shared(scope.clone()), out.clone());
    let mut input = ScriptedInput::new([
        "conn.",
        "conn.port = conn.port + 1",
        "conn.host + ':' + str(conn.port)",
        "quit()",
    ]);
    session.run(&mut input).unwrap();

    let text = out.contents();
    assert!(text.contains(&format!("{:<24}{:<24}\n", "host", "port")));
    assert!(text.contains("db.local:5433\n"));
    match scope.get("conn") {
        Some(Value::Object(obj)) => assert_eq!(obj.get("port"), Some(Value::Int(5433))),
        other => panic!("expected object, got {:?}", other),
    }
}

/// Engine that understands integer literals and `name = int`
#[derive(Default)]
struct Numbers;

impl Engine for Numbers {
    fn eval(
        &mut self,
        source: &str,
        scopes: &ScopePair,
    ) -> EngineResult<Value> {
        let text = source.trim();
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Value::Int(n));
        }
        scopes
            .inner
            .get(text)
            .ok_or_else(|| SyntaxError::new("not a number", Position::default()).into())
    }

    fn exec(
        &mut self,
        source: &str,
        scopes: &ScopePair,
    ) -> EngineResult<()> {
        for line in source.lines().filter(|l| !l.trim().is_empty()) {
            let (name, value) = line
                .split_once('=')
                .ok_or_else(|| SyntaxError::new("expected assignment", Position::default()))?;
            let value: i64 = value
                .trim()
                .parse()
                .map_err(|_| SyntaxError::new("expected a number", Position::default()))?;
            scopes.inner.insert(name.trim(), value);
        }
        Ok(())
    }

    fn members(
        &mut self,
        _value: &Value,
    ) -> Vec<String> {
        vec!["real".to_string(), "imag".to_string()]
    }

    fn is_complete_statement(
        &self,
        source: &str,
    ) -> bool {
        source.contains('=')
    }
}

#[test]
fn test_custom_engine() {
    let out = CapturedOutput::new();
    let mut session = Session::new(Numbers, ScopePair::shared(Scope::new()), out.clone());
    let actions: Vec<Action> = ["a = 3", "a", "7", "a.", "junk", "", "b = x"]
        .iter()
        .map(|line| session.handle_line(line).unwrap())
        .collect();
    assert_eq!(
        actions,
        vec![
            Action::Executed,
            Action::Evaluated,
            Action::Evaluated,
            Action::Listed,
            Action::Buffered,
            Action::Failed,
            Action::Failed,
        ]
    );
    let text = out.contents();
    assert!(text.starts_with("3\n7\nreal"));
    assert!(text.contains("SyntaxError: expected assignment"));
    assert!(session.buffer().is_empty());
}
