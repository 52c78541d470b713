//! Builtin functions and type constructors

use super::error::{ErrorKind, RunResult, RuntimeError};
use super::interpreter::Interpreter;
use super::members;
use super::ops::{self, MAX_SEQUENCE_LEN};
use super::parser::BinOp;
use super::scope::Scope;
use super::value::{quote_str, CallArgs, Dict, TypeKind, Value};

const CONVERSION_TYPES: &[TypeKind] = &[
    TypeKind::Bool,
    TypeKind::Dict,
    TypeKind::Float,
    TypeKind::Int,
    TypeKind::List,
    TypeKind::Str,
    TypeKind::Tuple,
    TypeKind::Type,
];

/// Table consulted after every user scope
pub fn builtin_scope() -> Scope {
    let scope = Scope::new();
    for kind in CONVERSION_TYPES {
        scope.insert(kind.name(), Value::Type(*kind));
    }
    scope.insert("print", Value::native("print", builtin_print));
    scope.insert("len", Value::native("len", builtin_len));
    scope.insert("dir", Value::native("dir", builtin_dir));
    scope.insert("repr", Value::native("repr", builtin_repr));
    scope.insert("range", Value::native("range", builtin_range));
    scope.insert("abs", Value::native("abs", builtin_abs));
    scope.insert("min", Value::native("min", |interp, args| extreme(interp, "min", args, true)));
    scope.insert("max", Value::native("max", |interp, args| extreme(interp, "max", args, false)));
    scope.insert("sum", Value::native("sum", builtin_sum));
    scope.insert("sorted", Value::native("sorted", builtin_sorted));
    scope.insert("getattr", Value::native("getattr", builtin_getattr));
    scope.insert("hasattr", Value::native("hasattr", builtin_hasattr));
    scope.insert("setattr", Value::native("setattr", builtin_setattr));
    scope.insert("exit", Value::native("exit", |_, args| system_exit("exit", args)));
    scope.insert("quit", Value::native("quit", |_, args| system_exit("quit", args)));
    scope
}

fn builtin_print(
    interp: &mut Interpreter,
    args: CallArgs,
) -> RunResult<Value> {
    args.expect_keywords("print", &["sep", "end"])?;
    let text_of = |value: Option<&Value>, default: &str| match value {
        None | Some(Value::None) => default.to_string(),
        Some(other) => other.to_string(),
    };
    let sep = text_of(args.keyword("sep"), " ");
    let end = text_of(args.keyword("end"), "\n");
    let mut line = args
        .positional
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(&sep);
    line.push_str(&end);
    interp.write_output(&line)?;
    Ok(Value::None)
}

fn builtin_len(
    _: &mut Interpreter,
    args: CallArgs,
) -> RunResult<Value> {
    args.expect("len", 1, 1)?;
    let n = match &args.positional[0] {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.borrow().len(),
        Value::Tuple(items) => items.len(),
        Value::Dict(dict) => dict.borrow().len(),
        other => {
            return Err(RuntimeError::type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )))
        }
    };
    Ok(Value::Int(n as i64))
}

fn names_value(names: Vec<String>) -> Value {
    Value::list(names.into_iter().map(Value::str).collect())
}

fn builtin_dir(
    interp: &mut Interpreter,
    args: CallArgs,
) -> RunResult<Value> {
    args.expect("dir", 0, 1)?;
    if args.positional.is_empty() {
        let mut names = interp.locals().map(|scope| scope.names()).unwrap_or_default();
        names.sort();
        return Ok(names_value(names));
    }
    Ok(names_value(members::members_of(&args.positional[0])))
}

fn builtin_repr(
    _: &mut Interpreter,
    args: CallArgs,
) -> RunResult<Value> {
    args.expect("repr", 1, 1)?;
    Ok(Value::str(args.positional[0].repr()))
}

fn int_arg(
    value: &Value,
    func: &str,
) -> RunResult<i64> {
    value.as_int().ok_or_else(|| {
        RuntimeError::type_error(format!(
            "'{}' object cannot be interpreted as an integer in {}()",
            value.type_name(),
            func
        ))
    })
}

fn builtin_range(
    _: &mut Interpreter,
    args: CallArgs,
) -> RunResult<Value> {
    args.expect("range", 1, 3)?;
    let ints = args
        .positional
        .iter()
        .map(|v| int_arg(v, "range"))
        .collect::<RunResult<Vec<_>>>()?;
    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => (0, 0, 1),
    };
    if step == 0 {
        return Err(RuntimeError::value_error("range() arg 3 must not be zero"));
    }

    let span = if step > 0 {
        (stop as i128 - start as i128).max(0)
    } else {
        (start as i128 - stop as i128).max(0)
    };
    let step_abs = (step as i128).abs();
    let count = (span + step_abs - 1) / step_abs;
    if count > MAX_SEQUENCE_LEN as i128 {
        return Err(RuntimeError::new(
            ErrorKind::OverflowError,
            "range() result has too many items",
        ));
    }

    // Every item lies between start and stop, so only the arithmetic needs i128
    let items = (0..count)
        .map(|i| Value::Int((start as i128 + i * step as i128) as i64))
        .collect();
    Ok(Value::list(items))
}

fn builtin_abs(
    _: &mut Interpreter,
    args: CallArgs,
) -> RunResult<Value> {
    args.expect("abs", 1, 1)?;
    match &args.positional[0] {
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => match other.as_int() {
            Some(n) => n.checked_abs().map(Value::Int).ok_or_else(|| {
                RuntimeError::new(ErrorKind::OverflowError, "integer overflow")
            }),
            None => Err(RuntimeError::type_error(format!(
                "bad operand type for abs(): '{}'",
                other.type_name()
            ))),
        },
    }
}

/// `min`/`max` over one iterable or several arguments
fn extreme(
    _: &mut Interpreter,
    name: &str,
    args: CallArgs,
    want_min: bool,
) -> RunResult<Value> {
    args.expect(name, 1, usize::MAX)?;
    let items = if args.positional.len() == 1 {
        args.positional[0].iterate()?
    } else {
        args.positional
    };
    let mut iter = items.into_iter();
    let mut best = iter.next().ok_or_else(|| {
        RuntimeError::value_error(format!("{}() arg is an empty sequence", name))
    })?;
    for item in iter {
        let ordering = item.compare(&best, if want_min { "<" } else { ">" })?;
        let better = match ordering {
            Some(std::cmp::Ordering::Less) => want_min,
            Some(std::cmp::Ordering::Greater) => !want_min,
            _ => false,
        };
        if better {
            best = item;
        }
    }
    Ok(best)
}

fn builtin_sum(
    _: &mut Interpreter,
    args: CallArgs,
) -> RunResult<Value> {
    args.expect("sum", 1, 2)?;
    let mut total = match args.positional.get(1) {
        Some(Value::Str(_)) => {
            return Err(RuntimeError::type_error(
                "sum() can't sum strings [use ''.join(seq) instead]",
            ))
        }
        Some(start) => start.clone(),
        None => Value::Int(0),
    };
    for item in args.positional[0].iterate()? {
        total = ops::binary_op(BinOp::Add, &total, &item)?;
    }
    Ok(total)
}

fn builtin_sorted(
    interp: &mut Interpreter,
    args: CallArgs,
) -> RunResult<Value> {
    args.expect_keywords("sorted", &["key", "reverse"])?;
    if args.positional.len() != 1 {
        return Err(RuntimeError::type_error(format!(
            "sorted expected 1 argument, got {}",
            args.positional.len()
        )));
    }
    let items = args.positional[0].iterate()?;
    let sorted = interp.sorted(items, args.keyword("key"), args.keyword("reverse"))?;
    Ok(Value::list(sorted))
}

fn attr_name(value: &Value) -> RunResult<&str> {
    match value {
        Value::Str(s) => Ok(&**s),
        other => Err(RuntimeError::type_error(format!(
            "attribute name must be string, not '{}'",
            other.type_name()
        ))),
    }
}

fn builtin_getattr(
    _: &mut Interpreter,
    args: CallArgs,
) -> RunResult<Value> {
    args.expect("getattr", 2, 3)?;
    let name = attr_name(&args.positional[1])?;
    match members::get_attribute(&args.positional[0], name) {
        Err(err) if err.kind == ErrorKind::AttributeError && args.positional.len() == 3 => {
            Ok(args.positional[2].clone())
        }
        result => result,
    }
}

fn builtin_hasattr(
    _: &mut Interpreter,
    args: CallArgs,
) -> RunResult<Value> {
    args.expect("hasattr", 2, 2)?;
    let name = attr_name(&args.positional[1])?;
    Ok(Value::Bool(
        members::get_attribute(&args.positional[0], name).is_ok(),
    ))
}

fn builtin_setattr(
    _: &mut Interpreter,
    args: CallArgs,
) -> RunResult<Value> {
    args.expect("setattr", 3, 3)?;
    let name = attr_name(&args.positional[1])?;
    members::set_attribute(&args.positional[0], name, args.positional[2].clone())?;
    Ok(Value::None)
}

/// Default `exit`/`quit`: raise `SystemExit` carrying the exit status
fn system_exit(
    name: &str,
    args: CallArgs,
) -> RunResult<Value> {
    args.expect(name, 0, 1)?;
    let message = match args.arg(0) {
        Value::None => String::new(),
        other => other.to_string(),
    };
    Err(RuntimeError::new(ErrorKind::SystemExit, message))
}

/// Call a type object: `int("3")`, `list("ab")`, `type(x)`
pub fn construct(
    _: &mut Interpreter,
    kind: TypeKind,
    args: CallArgs,
) -> RunResult<Value> {
    let name = kind.name();
    // dict() also takes keyword entries
    if kind != TypeKind::Dict {
        args.expect(name, 0, 1)?;
    }

    match kind {
        TypeKind::Int => to_int(args.positional.first()),
        TypeKind::Float => to_float(args.positional.first()),
        TypeKind::Str => Ok(Value::str(
            args.positional.first().map(Value::to_string).unwrap_or_default(),
        )),
        TypeKind::Bool => Ok(Value::Bool(args.arg(0).truthy())),
        TypeKind::List => match args.positional.first() {
            Some(source) => Ok(Value::list(source.iterate()?)),
            None => Ok(Value::list(Vec::new())),
        },
        TypeKind::Tuple => match args.positional.first() {
            Some(source) => Ok(Value::tuple(source.iterate()?)),
            None => Ok(Value::tuple(Vec::new())),
        },
        TypeKind::Dict => {
            if args.positional.len() > 1 {
                return Err(RuntimeError::type_error(format!(
                    "dict expected at most 1 argument, got {}",
                    args.positional.len()
                )));
            }
            let mut dict = Dict::new();
            if let Some(source) = args.positional.first() {
                for (key, value) in members::mapping_pairs(source)? {
                    dict.insert(key, value)?;
                }
            }
            for (key, value) in args.keywords {
                dict.insert_str(&key, value);
            }
            Ok(Value::dict(dict))
        }
        TypeKind::Type => match args.positional.first() {
            Some(value) => Ok(Value::Type(value.type_kind())),
            None => Err(RuntimeError::type_error("type() takes 1 argument")),
        },
        other => Err(RuntimeError::type_error(format!(
            "cannot create '{}' instances",
            other.name()
        ))),
    }
}

fn to_int(value: Option<&Value>) -> RunResult<Value> {
    match value {
        None => Ok(Value::Int(0)),
        Some(Value::Float(f)) => {
            if f.is_nan() {
                Err(RuntimeError::value_error("cannot convert float NaN to integer"))
            } else if f.is_infinite() || *f >= i64::MAX as f64 || *f < i64::MIN as f64 {
                Err(RuntimeError::new(
                    ErrorKind::OverflowError,
                    "cannot convert float to integer",
                ))
            } else {
                Ok(Value::Int(f.trunc() as i64))
            }
        }
        Some(Value::Str(s)) => s
            .trim()
            .replace('_', "")
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| {
                RuntimeError::value_error(format!(
                    "invalid literal for int() with base 10: {}",
                    quote_str(s)
                ))
            }),
        Some(other) => other.as_int().map(Value::Int).ok_or_else(|| {
            RuntimeError::type_error(format!(
                "int() argument must be a string or a number, not '{}'",
                other.type_name()
            ))
        }),
    }
}

fn to_float(value: Option<&Value>) -> RunResult<Value> {
    match value {
        None => Ok(Value::Float(0.0)),
        Some(Value::Str(s)) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            RuntimeError::value_error(format!(
                "could not convert string to float: {}",
                quote_str(s)
            ))
        }),
        Some(other) => other.as_float().map(Value::Float).ok_or_else(|| {
            RuntimeError::type_error(format!(
                "float() argument must be a string or a number, not '{}'",
                other.type_name()
            ))
        }),
    }
}
