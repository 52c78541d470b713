//! Interpreter tests: evaluation, statements, functions, errors

use super::{eval, exec, repr_of, setup};
use crate::engine::interpreter::DEFAULT_RECURSION_LIMIT;
use crate::engine::{Engine, EngineError, ErrorKind, Object, Scope, ScopePair, Value};

fn runtime_error(
    source: &str,
    setup_source: &str,
) -> crate::engine::RuntimeError {
    let (mut interp, scopes, _) = setup();
    exec(&mut interp, &scopes, setup_source);
    match interp.eval(source, &scopes) {
        Err(EngineError::Runtime(err)) => err,
        other => panic!("expected runtime error from {:?}, got {:?}", source, other),
    }
}

fn runtime_error_in(
    interp: &mut crate::engine::Interpreter,
    scopes: &ScopePair,
    source: &str,
) -> crate::engine::RuntimeError {
    match interp.eval(source, scopes) {
        Err(EngineError::Runtime(err)) => err,
        other => panic!("expected runtime error from {:?}, got {:?}", source.get(..40), other),
    }
}

#[test]
fn test_arithmetic() {
    assert_eq!(repr_of("1 + 1"), "2");
    assert_eq!(repr_of("7 // 2"), "3");
    assert_eq!(repr_of("-7 // 2"), "-4");
    assert_eq!(repr_of("-7 % 3"), "2");
    assert_eq!(repr_of("7 / 2"), "3.5");
    assert_eq!(repr_of("2 ** 10"), "1024");
    assert_eq!(repr_of("2 ** -1"), "0.5");
    assert_eq!(repr_of("-2 ** 2"), "-4");
    assert_eq!(repr_of("1 + 2.5"), "3.5");
    assert_eq!(repr_of("True + True"), "2");
}

#[test]
fn test_arithmetic_errors() {
    let err = runtime_error("1 / 0", "");
    assert_eq!(err.kind, ErrorKind::ZeroDivisionError);
    assert_eq!(err.to_string(), "ZeroDivisionError: division by zero");

    let err = runtime_error("9223372036854775807 + 1", "");
    assert_eq!(err.kind, ErrorKind::OverflowError);

    let err = runtime_error("1 + 'a'", "");
    assert_eq!(
        err.to_string(),
        "TypeError: unsupported operand type(s) for +: 'int' and 'str'"
    );
}

#[test]
fn test_sequences() {
    assert_eq!(repr_of("'ab' * 3"), "'ababab'");
    assert_eq!(repr_of("3 * [0]"), "[0, 0, 0]");
    assert_eq!(repr_of("[1] + [2]"), "[1, 2]");
    assert_eq!(repr_of("(1, 2) + (3,)"), "(1, 2, 3)");
    assert_eq!(repr_of("'hello'[1:3]"), "'el'");
    assert_eq!(repr_of("[1, 2, 3][-1]"), "3");
    assert_eq!(repr_of("[1, 2, 3][5:]"), "[]");
    assert_eq!(runtime_error("[1][3]", "").kind, ErrorKind::IndexError);
    assert_eq!(runtime_error("{'a': 1}['b']", "").to_string(), "KeyError: 'b'");
}

#[test]
fn test_comparisons_and_logic() {
    assert_eq!(repr_of("1 < 2 < 3"), "True");
    assert_eq!(repr_of("1 < 3 < 2"), "False");
    assert_eq!(repr_of("'x' in {'x': 1}"), "True");
    assert_eq!(repr_of("3 not in [1, 2]"), "True");
    assert_eq!(repr_of("'ell' in 'hello'"), "True");
    assert_eq!(repr_of("0 or 'default'"), "'default'");
    assert_eq!(repr_of("1 and 2"), "2");
    assert_eq!(repr_of("'yes' if [] else 'no'"), "'no'");
    assert_eq!(repr_of("(1, 2) < (1, 3)"), "True");
    assert_eq!(runtime_error("1 < 'a'", "").kind, ErrorKind::TypeError);
}

#[test]
fn test_assignment_persists_in_scope() {
    let (mut interp, scopes, _) = setup();
    exec(&mut interp, &scopes, "x = 5");
    assert_eq!(eval(&mut interp, &scopes, "x"), Value::Int(5));
    assert_eq!(scopes.inner.get("x"), Some(Value::Int(5)));
}

#[test]
fn test_separate_outer_and_inner() {
    let outer: Scope = [("g", 1i64)].into_iter().collect();
    let inner = Scope::new();
    let scopes = ScopePair::new(outer.clone(), inner.clone());
    let (mut interp, _, _) = setup();
    exec(&mut interp, &scopes, "x = g + 1");
    assert_eq!(inner.get("x"), Some(Value::Int(2)));
    assert!(!outer.contains("x"));
    assert_eq!(eval(&mut interp, &scopes, "x"), Value::Int(2));
}

#[test]
fn test_unpacking() {
    let (mut interp, scopes, _) = setup();
    exec(&mut interp, &scopes, "a, b = 1, 2\na, b = b, a");
    assert_eq!(eval(&mut interp, &scopes, "(a, b)").repr(), "(2, 1)");

    let (mut interp, scopes, _) = setup();
    let err = interp.exec("a, b = [1, 2, 3]", &scopes).unwrap_err();
    assert!(err.to_string().contains("too many values to unpack"));
}

#[test]
fn test_loops() {
    let (mut interp, scopes, _) = setup();
    exec(
        &mut interp,
        &scopes,
        "total = 0\nfor i in range(10):\n    if i % 2:\n        continue\n    if i > 6:\n        break\n    total += i\n",
    );
    assert_eq!(eval(&mut interp, &scopes, "total"), Value::Int(12));

    exec(&mut interp, &scopes, "n = 0\nwhile n < 5:\n    n += 1\n");
    assert_eq!(eval(&mut interp, &scopes, "n"), Value::Int(5));
}

#[test]
fn test_functions_and_defaults() {
    let (mut interp, scopes, _) = setup();
    exec(&mut interp, &scopes, "def f(a, b=2):\n    return a + b\n");
    assert_eq!(eval(&mut interp, &scopes, "f(1)"), Value::Int(3));
    assert_eq!(eval(&mut interp, &scopes, "f(1, b=5)"), Value::Int(6));
    assert_eq!(eval(&mut interp, &scopes, "f.__name__"), Value::str("f"));

    let err = interp.eval("f()", &scopes).unwrap_err();
    assert_eq!(
        err.to_string(),
        "TypeError: f() missing 1 required positional argument: 'a'"
    );
    let err = interp.eval("f(1, 2, 3)", &scopes).unwrap_err();
    assert_eq!(
        err.to_string(),
        "TypeError: f() takes 2 positional arguments but 3 were given"
    );
    let err = interp.eval("f(1, c=3)", &scopes).unwrap_err();
    assert!(err.to_string().contains("unexpected keyword argument 'c'"));
}

#[test]
fn test_function_without_return_gives_none() {
    let (mut interp, scopes, _) = setup();
    exec(&mut interp, &scopes, "def g():\n    pass\n");
    assert!(eval(&mut interp, &scopes, "g()").is_none());
}

#[test]
fn test_closures() {
    let (mut interp, scopes, _) = setup();
    exec(
        &mut interp,
        &scopes,
        "def make(n):\n    def add(x):\n        return x + n\n    return add\n",
    );
    assert_eq!(eval(&mut interp, &scopes, "make(3)(4)"), Value::Int(7));
}

#[test]
fn test_function_locals_do_not_leak() {
    let (mut interp, scopes, _) = setup();
    exec(&mut interp, &scopes, "def f():\n    tmp = 1\n    return tmp\nf()\n");
    assert!(!scopes.inner.contains("tmp"));
}

#[test]
fn test_recursion() {
    let (mut interp, scopes, _) = setup();
    exec(
        &mut interp,
        &scopes,
        "def fact(n):\n    if n <= 1:\n        return 1\n    return n * fact(n - 1)\n",
    );
    assert_eq!(eval(&mut interp, &scopes, "fact(10)"), Value::Int(3628800));
}

#[test]
fn test_recursion_limit() {
    let (mut interp, scopes, _) = setup();
    interp.set_recursion_limit(20);
    exec(&mut interp, &scopes, "def r(n):\n    return r(n + 1)\n");
    let err = interp.eval("r(0)", &scopes).unwrap_err();
    let trace = err.render_trace();
    assert!(trace.ends_with("RecursionError: maximum recursion depth exceeded\n"));
    assert!(trace.contains("[Previous line repeated 17 more times]"));

    // The interpreter stays usable afterwards
    assert_eq!(eval(&mut interp, &scopes, "1"), Value::Int(1));
}

#[test]
fn test_traceback_lists_frames() {
    let (mut interp, scopes, _) = setup();
    exec(&mut interp, &scopes, "def f():\n    return 1 / 0\n");
    let err = interp.eval("f()", &scopes).unwrap_err();
    assert_eq!(
        err.render_trace(),
        "Traceback (most recent call last):\n  File \"<console>\", line 1, in <module>\n  File \"<console>\", line 2, in f\nZeroDivisionError: division by zero\n"
    );
}

#[test]
fn test_name_error() {
    let err = runtime_error("y", "");
    assert_eq!(err.to_string(), "NameError: name 'y' is not defined");
}

#[test]
fn test_syntax_errors_are_classified() {
    let (mut interp, scopes, _) = setup();
    assert!(interp.eval("x = 1", &scopes).unwrap_err().is_syntax());
    let err = interp.exec("1 +", &scopes).unwrap_err();
    assert!(err.is_syntax());
    assert!(err
        .render_trace()
        .starts_with("Traceback (most recent call last):\n  File \"<console>\", line 1\nSyntaxError: "));
}

#[test]
fn test_list_aliasing() {
    let (mut interp, scopes, _) = setup();
    exec(&mut interp, &scopes, "a = []\nb = a\nb.append(1)\nc = a\nc += [2]");
    assert_eq!(eval(&mut interp, &scopes, "a").repr(), "[1, 2]");
}

#[test]
fn test_recursive_list_repr() {
    let (mut interp, scopes, _) = setup();
    exec(&mut interp, &scopes, "a = [1]\na.append(a)");
    assert_eq!(eval(&mut interp, &scopes, "repr(a)"), Value::str("[1, [...]]"));
}

#[test]
fn test_print_goes_to_output() {
    let (mut interp, scopes, output) = setup();
    exec(&mut interp, &scopes, "print('hi', 1, sep='-')\nprint([1], end='!')");
    assert_eq!(output.contents(), "hi-1\n[1]!");
}

#[test]
fn test_string_methods() {
    assert_eq!(repr_of("'Hello'.upper()"), "'HELLO'");
    assert_eq!(repr_of("' x '.strip()"), "'x'");
    assert_eq!(repr_of("'xxaxx'.strip('x')"), "'a'");
    assert_eq!(repr_of("'hello world'.title()"), "'Hello World'");
    assert_eq!(repr_of("','.join(['a', 'b'])"), "'a,b'");
    assert_eq!(repr_of("'a,b,c'.split(',', 1)"), "['a', 'b,c']");
    assert_eq!(repr_of("'  a  b '.split()"), "['a', 'b']");
    assert_eq!(repr_of("'banana'.count('a')"), "3");
    assert_eq!(repr_of("'banana'.find('n')"), "2");
    assert_eq!(repr_of("'banana'.replace('a', 'o', 2)"), "'bonona'");
    assert_eq!(repr_of("'file.rs'.endswith(('.rs', '.toml'))"), "True");
    assert_eq!(repr_of("'123'.isdigit()"), "True");
}

#[test]
fn test_list_methods() {
    let (mut interp, scopes, _) = setup();
    exec(
        &mut interp,
        &scopes,
        "a = [3, 1, 2]\na.sort()\na.insert(0, 9)\nlast = a.pop()\na.remove(1)\na.extend((7, 8))\na.reverse()",
    );
    assert_eq!(eval(&mut interp, &scopes, "a").repr(), "[8, 7, 2, 9]");
    assert_eq!(eval(&mut interp, &scopes, "last"), Value::Int(3));
    assert_eq!(eval(&mut interp, &scopes, "a.index(2)"), Value::Int(2));
    assert_eq!(runtime_error("[].pop()", "").to_string(), "IndexError: pop from empty list");
}

#[test]
fn test_dict_methods() {
    let (mut interp, scopes, _) = setup();
    exec(&mut interp, &scopes, "d = {'a': 1}\nd.update({'b': 2})\nd['c'] = 3");
    assert_eq!(eval(&mut interp, &scopes, "d.keys()").repr(), "['a', 'b', 'c']");
    assert_eq!(eval(&mut interp, &scopes, "d.get('z', 0)"), Value::Int(0));
    assert_eq!(eval(&mut interp, &scopes, "d.pop('a')"), Value::Int(1));
    assert_eq!(eval(&mut interp, &scopes, "d.items()").repr(), "[('b', 2), ('c', 3)]");
}

#[test]
fn test_builtins() {
    assert_eq!(repr_of("len('héllo')"), "5");
    assert_eq!(repr_of("range(5)"), "[0, 1, 2, 3, 4]");
    assert_eq!(repr_of("range(10, 0, -3)"), "[10, 7, 4, 1]");
    assert_eq!(repr_of("sum([1, 2, 3])"), "6");
    assert_eq!(repr_of("min(3, 1, 2)"), "1");
    assert_eq!(repr_of("max([1, 5, 2])"), "5");
    assert_eq!(repr_of("abs(-3)"), "3");
    assert_eq!(repr_of("sorted([3, 1, 2])"), "[1, 2, 3]");
    assert_eq!(repr_of("sorted(['bb', 'a', 'ccc'], key=len, reverse=True)"), "['ccc', 'bb', 'a']");
    assert_eq!(repr_of("type(1)"), "<class 'int'>");
    assert_eq!(repr_of("int('42')"), "42");
    assert_eq!(repr_of("int(3.9)"), "3");
    assert_eq!(repr_of("float('2.5')"), "2.5");
    assert_eq!(repr_of("str(12)"), "'12'");
    assert_eq!(repr_of("list('ab')"), "['a', 'b']");
    assert_eq!(repr_of("dict([('a', 1)], b=2)"), "{'a': 1, 'b': 2}");
    assert_eq!(repr_of("bool([])"), "False");
    assert_eq!(repr_of("hasattr([], 'append')"), "True");
    assert_eq!(repr_of("getattr(1, 'nope', 'fallback')"), "'fallback'");
    assert_eq!(repr_of("dir([])[:2]"), "['append', 'clear']");

    assert_eq!(runtime_error("int('x')", "").kind, ErrorKind::ValueError);
    assert_eq!(runtime_error("range(1, 2, 0)", "").kind, ErrorKind::ValueError);
    assert_eq!(runtime_error("sorted([1, 'a'])", "").kind, ErrorKind::TypeError);
    assert_eq!(runtime_error("min([])", "").kind, ErrorKind::ValueError);
    assert_eq!(runtime_error("len(1)", "").kind, ErrorKind::TypeError);
    assert_eq!(runtime_error("5()", "").to_string(), "TypeError: 'int' object is not callable");
}

#[test]
fn test_dir_without_arguments_lists_locals() {
    let (mut interp, scopes, _) = setup();
    exec(&mut interp, &scopes, "def f():\n    b = 2\n    a = 1\n    return dir()\n");
    assert_eq!(eval(&mut interp, &scopes, "f()").repr(), "['a', 'b']");
}

#[test]
fn test_default_exit_raises_system_exit() {
    let err = runtime_error("exit(3)", "");
    assert_eq!(err.kind, ErrorKind::SystemExit);
    assert_eq!(err.exit_code(), Some(3));
    assert_eq!(runtime_error("quit()", "").exit_code(), Some(0));
    assert_eq!(runtime_error("exit('bye')", "").exit_code(), Some(1));
}

#[test]
fn test_host_objects() {
    let (mut interp, scopes, _) = setup();
    let point = Object::new("Point").with_attr("x", 1i64);
    scopes.inner.insert("p", Value::object(point));
    assert_eq!(eval(&mut interp, &scopes, "p.x + 1"), Value::Int(2));
    exec(&mut interp, &scopes, "p.y = 5\nsetattr(p, 'z', 6)");
    assert_eq!(eval(&mut interp, &scopes, "p.y + p.z"), Value::Int(11));
    assert_eq!(
        runtime_error("q.w", "q = 1").to_string(),
        "AttributeError: 'int' object has no attribute 'w'"
    );
}

#[test]
fn test_host_native_function() {
    let (mut interp, scopes, _) = setup();
    scopes.inner.insert(
        "double",
        Value::native("double", |_, args| {
            args.expect("double", 1, 1)?;
            crate::engine::ops::binary_op(
                crate::engine::parser::BinOp::Mul,
                &args.arg(0),
                &Value::Int(2),
            )
        }),
    );
    assert_eq!(eval(&mut interp, &scopes, "double(21)"), Value::Int(42));
    assert_eq!(eval(&mut interp, &scopes, "double('ab')"), Value::str("abab"));
}

#[test]
fn test_default_recursion_limit_on_test_thread() {
    let (mut interp, scopes, _) = setup();
    exec(&mut interp, &scopes, "def g(n):\n    return g(n + 1)\n");
    let err = runtime_error_in(&mut interp, &scopes, "g(0)");
    assert_eq!(err.kind, ErrorKind::RecursionError);
    let calls = err.traceback.iter().filter(|f| f.function == "g").count();
    assert_eq!(calls, DEFAULT_RECURSION_LIMIT);
    assert_eq!(eval(&mut interp, &scopes, "1"), Value::Int(1));
}

#[test]
fn test_default_recursion_limit_on_small_stack() {
    let trace = std::thread::Builder::new()
        .stack_size(512 * 1024)
        .spawn(|| {
            let (mut interp, scopes, _) = setup();
            exec(&mut interp, &scopes, "def g(n):\n    if n >= 0:\n        return [g(n + 1)]\n");
            interp.eval("g(0)", &scopes).unwrap_err().render_trace()
        })
        .unwrap()
        .join()
        .unwrap();
    assert!(trace.ends_with("RecursionError: maximum recursion depth exceeded\n"));
}

#[test]
fn test_deep_nesting_is_a_recursion_error() {
    let (mut interp, scopes, _) = setup();
    let parens = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
    let err = runtime_error_in(&mut interp, &scopes, &parens);
    assert_eq!(err.kind, ErrorKind::RecursionError);

    let negations = format!("{}1", "-".repeat(5_000));
    assert_eq!(runtime_error_in(&mut interp, &scopes, &negations).kind, ErrorKind::RecursionError);

    let program = format!("x = {}1{}\n", "[".repeat(5_000), "]".repeat(5_000));
    match interp.exec(&program, &scopes) {
        Err(EngineError::Runtime(err)) => assert_eq!(err.kind, ErrorKind::RecursionError),
        other => panic!("expected recursion error, got {:?}", other),
    }

    let nested = format!("{}1{}", "[".repeat(900), "]".repeat(900));
    let value = eval(&mut interp, &scopes, &nested);
    assert!(value.repr().starts_with("[[[[1"));
    assert!(value.equals(&eval(&mut interp, &scopes, &nested)));
    assert_eq!(eval(&mut interp, &scopes, &format!("{}7", "-".repeat(998))), Value::Int(7));
}

#[test]
fn test_range_with_extreme_bounds() {
    assert_eq!(
        repr_of("range(-9223372036854775807, 9223372036854775807, 4611686018427387904)"),
        "[-9223372036854775807, -4611686018427387903, 1, 4611686018427387905]"
    );
    assert_eq!(
        repr_of("range(9223372036854775807, -9223372036854775807, -9223372036854775807)"),
        "[9223372036854775807, 0]"
    );
    assert_eq!(repr_of("len(range(-9223372036854775807, 9223372036854775807, 4611686018427387904))"), "4");
}

#[test]
fn test_sequence_repetition() {
    assert_eq!(repr_of("[0] * 3"), "[0, 0, 0]");
    assert_eq!(repr_of("[1, [2]] * 2"), "[1, [2], 1, [2]]");
    assert_eq!(repr_of("(1,) * 2"), "(1, 1)");
    assert_eq!(repr_of("(1, 'a') * 0"), "()");
    assert_eq!(repr_of("[1] * -2"), "[]");

    let (mut interp, scopes, _) = setup();
    exec(&mut interp, &scopes, "inner = []\nouter = [inner] * 2\nouter[0].append(5)\n");
    assert_eq!(eval(&mut interp, &scopes, "outer").repr(), "[[5], [5]]");
}

#[test]
fn test_int_literal_bounds() {
    assert_eq!(repr_of("-9223372036854775808"), "-9223372036854775808");
    assert_eq!(repr_of("-9223372036854775808 + 1"), "-9223372036854775807");

    let err = runtime_error("9223372036854775808", "");
    assert_eq!(err.kind, ErrorKind::OverflowError);
    assert_eq!(
        err.to_string(),
        "OverflowError: int too large to convert to a 64-bit integer"
    );
    assert_eq!(runtime_error("-9223372036854775809", "").kind, ErrorKind::OverflowError);
}
