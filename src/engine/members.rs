//! Member tables and builtin methods
//!
//! Every type has a sorted table of method names. The table drives both
//! attribute lookup (a bound method is only produced for listed names) and
//! the member listing shown for `value.` completion.

use std::cell::RefCell;
use std::rc::Rc;

use super::error::{ErrorKind, RunResult, RuntimeError};
use super::interpreter::Interpreter;
use super::ops;
use super::value::{BoundMethod, CallArgs, Dict, TypeKind, Value};

const STR_METHODS: &[&str] = &[
    "count",
    "endswith",
    "find",
    "isdigit",
    "join",
    "lower",
    "lstrip",
    "replace",
    "rstrip",
    "split",
    "startswith",
    "strip",
    "title",
    "upper",
];

const LIST_METHODS: &[&str] = &[
    "append", "clear", "copy", "count", "extend", "index", "insert", "pop", "remove", "reverse",
    "sort",
];

const DICT_METHODS: &[&str] = &[
    "clear", "copy", "get", "items", "keys", "pop", "update", "values",
];

const TUPLE_METHODS: &[&str] = &["count", "index"];
const INT_METHODS: &[&str] = &["bit_length"];
const FLOAT_METHODS: &[&str] = &["is_integer"];
const NAMED_MEMBERS: &[&str] = &["__name__"];

fn method_table(kind: TypeKind) -> &'static [&'static str] {
    match kind {
        TypeKind::Str => STR_METHODS,
        TypeKind::List => LIST_METHODS,
        TypeKind::Dict => DICT_METHODS,
        TypeKind::Tuple => TUPLE_METHODS,
        TypeKind::Int | TypeKind::Bool => INT_METHODS,
        TypeKind::Float => FLOAT_METHODS,
        _ => &[],
    }
}

/// Sorted member names of a value
pub fn members_of(value: &Value) -> Vec<String> {
    let mut names: Vec<String> = match value {
        Value::Object(obj) => obj.attr_names(),
        Value::Function(_) | Value::Native(_) | Value::Method(_) => {
            NAMED_MEMBERS.iter().map(|s| s.to_string()).collect()
        }
        Value::Type(kind) => NAMED_MEMBERS
            .iter()
            .chain(method_table(*kind))
            .map(|s| s.to_string())
            .collect(),
        other => method_table(other.type_kind())
            .iter()
            .map(|s| s.to_string())
            .collect(),
    };
    names.sort();
    names
}

fn no_attribute(
    value: &Value,
    name: &str,
) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::AttributeError,
        format!("'{}' object has no attribute '{}'", value.type_name(), name),
    )
}

/// `value.name`
pub fn get_attribute(
    value: &Value,
    name: &str,
) -> RunResult<Value> {
    match value {
        Value::Object(obj) => return obj.get(name).ok_or_else(|| no_attribute(value, name)),
        Value::Function(func) if name == "__name__" => return Ok(Value::str(func.name())),
        Value::Native(native) if name == "__name__" => return Ok(Value::str(&native.name)),
        Value::Method(method) if name == "__name__" => return Ok(Value::str(&method.name)),
        Value::Type(kind) if name == "__name__" => return Ok(Value::str(kind.name())),
        _ => {}
    }
    if method_table(value.type_kind()).contains(&name) {
        return Ok(Value::Method(Rc::new(BoundMethod {
            receiver: value.clone(),
            name: name.to_string(),
        })));
    }
    Err(no_attribute(value, name))
}

/// `value.name = new`
pub fn set_attribute(
    value: &Value,
    name: &str,
    new: Value,
) -> RunResult<()> {
    match value {
        Value::Object(obj) => {
            obj.set(name, new);
            Ok(())
        }
        other => Err(RuntimeError::new(
            ErrorKind::AttributeError,
            format!(
                "'{}' object attribute '{}' is read-only",
                other.type_name(),
                name
            ),
        )),
    }
}

/// Invoke a bound builtin method
pub fn call_method(
    interp: &mut Interpreter,
    receiver: &Value,
    name: &str,
    args: CallArgs,
) -> RunResult<Value> {
    match receiver {
        Value::Str(s) => str_method(s, name, args),
        Value::List(items) => list_method(interp, items, name, args),
        Value::Dict(dict) => dict_method(dict, name, args),
        Value::Tuple(items) => tuple_method(items, name, args),
        Value::Bool(_) | Value::Int(_) if name == "bit_length" => {
            args.expect(name, 0, 0)?;
            let n = receiver.as_int().unwrap_or(0);
            Ok(Value::Int(64 - n.unsigned_abs().leading_zeros() as i64))
        }
        Value::Float(f) if name == "is_integer" => {
            args.expect(name, 0, 0)?;
            Ok(Value::Bool(f.is_finite() && f.fract() == 0.0))
        }
        other => Err(no_attribute(other, name)),
    }
}

fn expect_str(
    value: &Value,
    what: &str,
) -> RunResult<Rc<str>> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        other => Err(RuntimeError::type_error(format!(
            "{} must be str, not {}",
            what,
            other.type_name()
        ))),
    }
}

/// Optional `chars` argument of the strip family
fn strip_set(args: &CallArgs) -> RunResult<Option<Vec<char>>> {
    match args.arg(0) {
        Value::None => Ok(None),
        other => Ok(Some(expect_str(&other, "strip arg")?.chars().collect())),
    }
}

fn char_index(
    s: &str,
    byte: usize,
) -> i64 {
    s[..byte].chars().count() as i64
}

fn affix_matches(
    s: &str,
    affix: &Value,
    method: &str,
    test: fn(&str, &str) -> bool,
) -> RunResult<bool> {
    match affix {
        Value::Str(a) => Ok(test(s, a)),
        Value::Tuple(options) => {
            for option in options.iter() {
                if test(s, &expect_str(option, method)?) {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        other => Err(RuntimeError::type_error(format!(
            "{} first arg must be str or a tuple of str, not {}",
            method,
            other.type_name()
        ))),
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous_cased = false;
    for c in s.chars() {
        if previous_cased {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        previous_cased = c.is_alphabetic();
    }
    out
}

fn split_whitespace(
    s: &str,
    maxsplit: i64,
) -> Vec<Value> {
    let mut parts = Vec::new();
    let mut rest = s.trim_start();
    while !rest.is_empty() {
        if maxsplit >= 0 && parts.len() as i64 == maxsplit {
            parts.push(Value::str(rest.trim_end()));
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                parts.push(Value::str(&rest[..end]));
                rest = rest[end..].trim_start();
            }
            None => {
                parts.push(Value::str(rest));
                break;
            }
        }
    }
    parts
}

fn str_method(
    s: &Rc<str>,
    name: &str,
    args: CallArgs,
) -> RunResult<Value> {
    let s: &str = s;
    match name {
        "count" => {
            args.expect(name, 1, 1)?;
            let sub = expect_str(&args.arg(0), "substring")?;
            let n = if sub.is_empty() {
                s.chars().count() + 1
            } else {
                s.matches(sub.as_ref()).count()
            };
            Ok(Value::Int(n as i64))
        }
        "endswith" => {
            args.expect(name, 1, 1)?;
            affix_matches(s, &args.arg(0), name, |s, a| s.ends_with(a)).map(Value::Bool)
        }
        "startswith" => {
            args.expect(name, 1, 1)?;
            affix_matches(s, &args.arg(0), name, |s, a| s.starts_with(a)).map(Value::Bool)
        }
        "find" => {
            args.expect(name, 1, 1)?;
            let sub = expect_str(&args.arg(0), "substring")?;
            Ok(Value::Int(
                s.find(sub.as_ref()).map(|b| char_index(s, b)).unwrap_or(-1),
            ))
        }
        "isdigit" => {
            args.expect(name, 0, 0)?;
            Ok(Value::Bool(!s.is_empty() && s.chars().all(|c| c.is_numeric())))
        }
        "join" => {
            args.expect(name, 1, 1)?;
            let mut parts = Vec::new();
            for (i, item) in args.arg(0).iterate()?.iter().enumerate() {
                match item {
                    Value::Str(part) => parts.push(part.to_string()),
                    other => {
                        return Err(RuntimeError::type_error(format!(
                            "sequence item {}: expected str instance, {} found",
                            i,
                            other.type_name()
                        )))
                    }
                }
            }
            Ok(Value::str(parts.join(s)))
        }
        "lower" => {
            args.expect(name, 0, 0)?;
            Ok(Value::str(s.to_lowercase()))
        }
        "upper" => {
            args.expect(name, 0, 0)?;
            Ok(Value::str(s.to_uppercase()))
        }
        "title" => {
            args.expect(name, 0, 0)?;
            Ok(Value::str(title_case(s)))
        }
        "strip" | "lstrip" | "rstrip" => {
            args.expect(name, 0, 1)?;
            let set = strip_set(&args)?;
            let matches = |c: char| match &set {
                Some(set) => set.contains(&c),
                None => c.is_whitespace(),
            };
            let out = match name {
                "strip" => s.trim_matches(matches),
                "lstrip" => s.trim_start_matches(matches),
                _ => s.trim_end_matches(matches),
            };
            Ok(Value::str(out))
        }
        "replace" => {
            args.expect(name, 2, 3)?;
            let old = expect_str(&args.arg(0), "replace() argument 1")?;
            let new = expect_str(&args.arg(1), "replace() argument 2")?;
            let out = match args.arg(2).as_int() {
                Some(count) if count >= 0 => s.replacen(old.as_ref(), &new, count as usize),
                _ => s.replace(old.as_ref(), &new),
            };
            Ok(Value::str(out))
        }
        "split" => {
            args.expect_keywords(name, &["sep", "maxsplit"])?;
            if args.positional.len() > 2 {
                return args.expect(name, 0, 2).map(|_| Value::None);
            }
            let sep = args.keyword("sep").cloned().unwrap_or_else(|| args.arg(0));
            let maxsplit = args
                .keyword("maxsplit")
                .cloned()
                .unwrap_or_else(|| args.arg(1))
                .as_int()
                .unwrap_or(-1);
            let parts = match sep {
                Value::None => split_whitespace(s, maxsplit),
                other => {
                    let sep = expect_str(&other, "separator")?;
                    if sep.is_empty() {
                        return Err(RuntimeError::value_error("empty separator"));
                    }
                    if maxsplit >= 0 {
                        s.splitn(maxsplit as usize + 1, sep.as_ref())
                            .map(Value::str)
                            .collect()
                    } else {
                        s.split(sep.as_ref()).map(Value::str).collect()
                    }
                }
            };
            Ok(Value::list(parts))
        }
        _ => Err(no_attribute(&Value::str(s), name)),
    }
}

fn position_of(
    items: &[Value],
    needle: &Value,
) -> Option<usize> {
    items.iter().position(|v| v.equals(needle))
}

fn list_method(
    interp: &mut Interpreter,
    list: &Rc<RefCell<Vec<Value>>>,
    name: &str,
    args: CallArgs,
) -> RunResult<Value> {
    match name {
        "append" => {
            args.expect(name, 1, 1)?;
            list.borrow_mut().push(args.arg(0));
            Ok(Value::None)
        }
        "clear" => {
            args.expect(name, 0, 0)?;
            list.borrow_mut().clear();
            Ok(Value::None)
        }
        "copy" => {
            args.expect(name, 0, 0)?;
            Ok(Value::list(list.borrow().clone()))
        }
        "count" => {
            args.expect(name, 1, 1)?;
            let needle = args.arg(0);
            let n = list.borrow().iter().filter(|v| v.equals(&needle)).count();
            Ok(Value::Int(n as i64))
        }
        "extend" => {
            args.expect(name, 1, 1)?;
            ops::extend_in_place(list, &args.arg(0))?;
            Ok(Value::None)
        }
        "index" => {
            args.expect(name, 1, 1)?;
            let needle = args.arg(0);
            let found = position_of(&list.borrow(), &needle);
            found
                .map(|i| Value::Int(i as i64))
                .ok_or_else(|| RuntimeError::value_error(format!("{} is not in list", needle.repr())))
        }
        "insert" => {
            args.expect(name, 2, 2)?;
            let index = args.arg(0).as_int().ok_or_else(|| {
                RuntimeError::type_error("list indices must be integers")
            })?;
            let mut items = list.borrow_mut();
            let len = items.len() as i64;
            let at = if index < 0 { (index + len).max(0) } else { index.min(len) };
            items.insert(at as usize, args.arg(1));
            Ok(Value::None)
        }
        "pop" => {
            args.expect(name, 0, 1)?;
            let mut items = list.borrow_mut();
            if items.is_empty() {
                return Err(RuntimeError::new(ErrorKind::IndexError, "pop from empty list"));
            }
            let len = items.len() as i64;
            let index = match args.arg(0) {
                Value::None => len - 1,
                other => other.as_int().ok_or_else(|| {
                    RuntimeError::type_error("list indices must be integers")
                })?,
            };
            let resolved = if index < 0 { index + len } else { index };
            if resolved < 0 || resolved >= len {
                return Err(RuntimeError::new(ErrorKind::IndexError, "pop index out of range"));
            }
            Ok(items.remove(resolved as usize))
        }
        "remove" => {
            args.expect(name, 1, 1)?;
            let needle = args.arg(0);
            let found = position_of(&list.borrow(), &needle);
            match found {
                Some(i) => {
                    list.borrow_mut().remove(i);
                    Ok(Value::None)
                }
                None => Err(RuntimeError::value_error("list.remove(x): x not in list")),
            }
        }
        "reverse" => {
            args.expect(name, 0, 0)?;
            list.borrow_mut().reverse();
            Ok(Value::None)
        }
        "sort" => {
            args.expect_keywords(name, &["key", "reverse"])?;
            if !args.positional.is_empty() {
                return Err(RuntimeError::type_error("sort() takes no positional arguments"));
            }
            let items = list.borrow().clone();
            let sorted = interp.sorted(items, args.keyword("key"), args.keyword("reverse"))?;
            *list.borrow_mut() = sorted;
            Ok(Value::None)
        }
        _ => Err(no_attribute(&Value::List(list.clone()), name)),
    }
}

fn dict_method(
    dict: &Rc<RefCell<Dict>>,
    name: &str,
    args: CallArgs,
) -> RunResult<Value> {
    match name {
        "clear" => {
            args.expect(name, 0, 0)?;
            dict.borrow_mut().clear();
            Ok(Value::None)
        }
        "copy" => {
            args.expect(name, 0, 0)?;
            Ok(Value::dict(dict.borrow().clone()))
        }
        "get" => {
            args.expect(name, 1, 2)?;
            Ok(dict.borrow().get(&args.arg(0))?.unwrap_or_else(|| args.arg(1)))
        }
        "items" => {
            args.expect(name, 0, 0)?;
            let items = dict
                .borrow()
                .items()
                .into_iter()
                .map(|(k, v)| Value::tuple(vec![k, v]))
                .collect();
            Ok(Value::list(items))
        }
        "keys" => {
            args.expect(name, 0, 0)?;
            Ok(Value::list(dict.borrow().keys()))
        }
        "values" => {
            args.expect(name, 0, 0)?;
            Ok(Value::list(dict.borrow().values()))
        }
        "pop" => {
            args.expect(name, 1, 2)?;
            let key = args.arg(0);
            let removed = dict.borrow_mut().remove(&key)?;
            match removed {
                Some(value) => Ok(value),
                None if args.positional.len() == 2 => Ok(args.arg(1)),
                None => Err(RuntimeError::new(ErrorKind::KeyError, key.repr())),
            }
        }
        "update" => {
            args.expect_keywords(name, &[])?;
            if args.positional.len() > 1 {
                return args.expect(name, 0, 1).map(|_| Value::None);
            }
            let pairs = match args.arg(0) {
                Value::None => Vec::new(),
                other => mapping_pairs(&other)?,
            };
            let mut target = dict.borrow_mut();
            for (key, value) in pairs {
                target.insert(key, value)?;
            }
            Ok(Value::None)
        }
        _ => Err(no_attribute(&Value::Dict(dict.clone()), name)),
    }
}

/// Key/value pairs from a dict or an iterable of pairs
pub fn mapping_pairs(source: &Value) -> RunResult<Vec<(Value, Value)>> {
    if let Value::Dict(dict) = source {
        return Ok(dict.borrow().items());
    }
    let mut pairs = Vec::new();
    for (i, item) in source.iterate()?.into_iter().enumerate() {
        let pair = item.iterate()?;
        if pair.len() != 2 {
            return Err(RuntimeError::value_error(format!(
                "dictionary update sequence element #{} has length {}; 2 is required",
                i,
                pair.len()
            )));
        }
        let mut pair = pair.into_iter();
        if let (Some(key), Some(value)) = (pair.next(), pair.next()) {
            pairs.push((key, value));
        }
    }
    Ok(pairs)
}

fn tuple_method(
    items: &Rc<[Value]>,
    name: &str,
    args: CallArgs,
) -> RunResult<Value> {
    args.expect(name, 1, 1)?;
    let needle = args.arg(0);
    match name {
        "count" => Ok(Value::Int(
            items.iter().filter(|v| v.equals(&needle)).count() as i64,
        )),
        "index" => position_of(items, &needle)
            .map(|i| Value::Int(i as i64))
            .ok_or_else(|| RuntimeError::value_error("tuple.index(x): x not in tuple")),
        _ => Err(no_attribute(&Value::Tuple(items.clone()), name)),
    }
}
