//! Operator semantics: arithmetic, comparison, membership, subscripts

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use super::error::{ErrorKind, RunResult, RuntimeError};
use super::parser::{BinOp, CmpOp, UnOp};
use super::value::Value;

/// Longest sequence repetition or range we are willing to materialise
pub const MAX_SEQUENCE_LEN: usize = 10_000_000;

fn overflow() -> RuntimeError {
    RuntimeError::new(ErrorKind::OverflowError, "integer overflow")
}

fn zero_division(message: &str) -> RuntimeError {
    RuntimeError::new(ErrorKind::ZeroDivisionError, message)
}

fn unsupported_operands(
    op: BinOp,
    left: &Value,
    right: &Value,
) -> RuntimeError {
    RuntimeError::type_error(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op.symbol(),
        left.type_name(),
        right.type_name()
    ))
}

pub fn unary_op(
    op: UnOp,
    operand: &Value,
) -> RunResult<Value> {
    match op {
        UnOp::Not => Ok(Value::Bool(!operand.truthy())),
        UnOp::Neg => match operand {
            Value::Float(f) => Ok(Value::Float(-f)),
            other => match other.as_int() {
                Some(n) => n.checked_neg().map(Value::Int).ok_or_else(overflow),
                None => Err(bad_unary("-", other)),
            },
        },
        UnOp::Pos => match operand {
            Value::Float(f) => Ok(Value::Float(*f)),
            other => other
                .as_int()
                .map(Value::Int)
                .ok_or_else(|| bad_unary("+", other)),
        },
    }
}

fn bad_unary(
    symbol: &str,
    operand: &Value,
) -> RuntimeError {
    RuntimeError::type_error(format!(
        "bad operand type for unary {}: '{}'",
        symbol,
        operand.type_name()
    ))
}

pub fn binary_op(
    op: BinOp,
    left: &Value,
    right: &Value,
) -> RunResult<Value> {
    if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        return int_op(op, a, b);
    }
    if let (Some(a), Some(b)) = (left.as_float(), right.as_float()) {
        return float_op(op, a, b);
    }

    match (op, left, right) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => {
            let mut s = String::with_capacity(a.len() + b.len());
            s.push_str(a);
            s.push_str(b);
            Ok(Value::str(s))
        }
        (BinOp::Add, Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        (BinOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
            Ok(Value::tuple(a.iter().chain(b.iter()).cloned().collect()))
        }
        (BinOp::Mul, seq, count) | (BinOp::Mul, count, seq)
            if count.as_int().is_some() && matches!(seq, Value::Str(_) | Value::List(_) | Value::Tuple(_)) =>
        {
            repeat(seq, count.as_int().unwrap_or(0))
        }
        _ => Err(unsupported_operands(op, left, right)),
    }
}

fn int_op(
    op: BinOp,
    a: i64,
    b: i64,
) -> RunResult<Value> {
    let result = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Sub => a.checked_sub(b),
        BinOp::Mul => a.checked_mul(b),
        BinOp::Div => {
            if b == 0 {
                return Err(zero_division("division by zero"));
            }
            return Ok(Value::Float(a as f64 / b as f64));
        }
        BinOp::FloorDiv => {
            if b == 0 {
                return Err(zero_division("integer division or modulo by zero"));
            }
            a.checked_div(b).and_then(|q| {
                if a % b != 0 && ((a < 0) != (b < 0)) {
                    q.checked_sub(1)
                } else {
                    Some(q)
                }
            })
        }
        BinOp::Mod => {
            if b == 0 {
                return Err(zero_division("integer division or modulo by zero"));
            }
            a.checked_rem(b)
                .map(|r| if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r })
        }
        BinOp::Pow => {
            if b < 0 {
                return float_op(op, a as f64, b as f64);
            }
            u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp))
        }
    };
    result.map(Value::Int).ok_or_else(overflow)
}

fn float_op(
    op: BinOp,
    a: f64,
    b: f64,
) -> RunResult<Value> {
    let result = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => {
            if b == 0.0 {
                return Err(zero_division("float division by zero"));
            }
            a / b
        }
        BinOp::FloorDiv => {
            if b == 0.0 {
                return Err(zero_division("float floor division by zero"));
            }
            (a / b).floor()
        }
        BinOp::Mod => {
            if b == 0.0 {
                return Err(zero_division("float modulo"));
            }
            let r = a % b;
            if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                r + b
            } else {
                r
            }
        }
        BinOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(zero_division("0.0 cannot be raised to a negative power"));
            }
            a.powf(b)
        }
    };
    Ok(Value::Float(result))
}

fn repeat(
    seq: &Value,
    count: i64,
) -> RunResult<Value> {
    let count = usize::try_from(count).unwrap_or(0);
    let len = match seq {
        Value::Str(s) => s.len(),
        Value::List(items) => items.borrow().len(),
        Value::Tuple(items) => items.len(),
        _ => 0,
    };
    if len.saturating_mul(count) > MAX_SEQUENCE_LEN {
        return Err(RuntimeError::new(
            ErrorKind::OverflowError,
            "repeated sequence is too long",
        ));
    }
    Ok(match seq {
        Value::Str(s) => Value::str(s.repeat(count)),
        Value::List(items) => Value::list(repeat_items(&items.borrow(), count)),
        Value::Tuple(items) => Value::tuple(repeat_items(items, count)),
        other => other.clone(),
    })
}

fn repeat_items(
    items: &[Value],
    count: usize,
) -> Vec<Value> {
    (0..count).flat_map(|_| items.iter().cloned()).collect()
}

/// Evaluate one link of a comparison chain
pub fn compare_op(
    op: CmpOp,
    left: &Value,
    right: &Value,
) -> RunResult<bool> {
    let ordering = |expected: fn(Ordering) -> bool| -> RunResult<bool> {
        Ok(left
            .compare(right, op.symbol())?
            .map(expected)
            .unwrap_or(false))
    };
    match op {
        CmpOp::Eq => Ok(left.equals(right)),
        CmpOp::Ne => Ok(!left.equals(right)),
        CmpOp::Lt => ordering(|o| o == Ordering::Less),
        CmpOp::Le => ordering(|o| o != Ordering::Greater),
        CmpOp::Gt => ordering(|o| o == Ordering::Greater),
        CmpOp::Ge => ordering(|o| o != Ordering::Less),
        CmpOp::In => contains(right, left),
        CmpOp::NotIn => contains(right, left).map(|found| !found),
    }
}

/// `item in container`
pub fn contains(
    container: &Value,
    item: &Value,
) -> RunResult<bool> {
    match container {
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_ref())),
            other => Err(RuntimeError::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::List(items) => Ok(items.borrow().iter().any(|v| v.equals(item))),
        Value::Tuple(items) => Ok(items.iter().any(|v| v.equals(item))),
        Value::Dict(dict) => dict.borrow().contains(item),
        other => Err(RuntimeError::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

/// Resolve a possibly negative index against `len`
fn normalize_index(
    index: &Value,
    len: usize,
    container: &str,
) -> RunResult<usize> {
    let raw = index.as_int().ok_or_else(|| {
        RuntimeError::type_error(format!(
            "{} indices must be integers or slices, not {}",
            container,
            index.type_name()
        ))
    })?;
    let len = len as i64;
    let resolved = if raw < 0 { raw + len } else { raw };
    if resolved < 0 || resolved >= len {
        return Err(RuntimeError::new(
            ErrorKind::IndexError,
            format!("{} index out of range", container),
        ));
    }
    Ok(resolved as usize)
}

pub fn get_item(
    object: &Value,
    index: &Value,
) -> RunResult<Value> {
    match object {
        Value::List(items) => {
            let items = items.borrow();
            let i = normalize_index(index, items.len(), "list")?;
            Ok(items[i].clone())
        }
        Value::Tuple(items) => {
            let i = normalize_index(index, items.len(), "tuple")?;
            Ok(items[i].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let i = normalize_index(index, chars.len(), "string")?;
            Ok(Value::str(chars[i].to_string()))
        }
        Value::Dict(dict) => dict
            .borrow()
            .get(index)?
            .ok_or_else(|| RuntimeError::new(ErrorKind::KeyError, index.repr())),
        other => Err(RuntimeError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

pub fn set_item(
    object: &Value,
    index: Value,
    value: Value,
) -> RunResult<()> {
    match object {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let i = normalize_index(&index, items.len(), "list")?;
            items[i] = value;
            Ok(())
        }
        Value::Dict(dict) => dict.borrow_mut().insert(index, value),
        other => Err(RuntimeError::type_error(format!(
            "'{}' object does not support item assignment",
            other.type_name()
        ))),
    }
}

/// Clamp slice bounds the forgiving way slices do
fn slice_bounds(
    start: Option<&Value>,
    stop: Option<&Value>,
    len: usize,
) -> RunResult<(usize, usize)> {
    let len = len as i64;
    let resolve = |bound: Option<&Value>, default: i64| -> RunResult<i64> {
        match bound {
            None | Some(Value::None) => Ok(default),
            Some(v) => {
                let raw = v.as_int().ok_or_else(|| {
                    RuntimeError::type_error(
                        "slice indices must be integers or None",
                    )
                })?;
                let resolved = if raw < 0 { raw + len } else { raw };
                Ok(resolved.clamp(0, len))
            }
        }
    };
    let lo = resolve(start, 0)?;
    let hi = resolve(stop, len)?;
    Ok((lo as usize, hi.max(lo) as usize))
}

pub fn get_slice(
    object: &Value,
    start: Option<&Value>,
    stop: Option<&Value>,
) -> RunResult<Value> {
    match object {
        Value::List(items) => {
            let items = items.borrow();
            let (lo, hi) = slice_bounds(start, stop, items.len())?;
            Ok(Value::list(items[lo..hi].to_vec()))
        }
        Value::Tuple(items) => {
            let (lo, hi) = slice_bounds(start, stop, items.len())?;
            Ok(Value::tuple(items[lo..hi].to_vec()))
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (lo, hi) = slice_bounds(start, stop, chars.len())?;
            Ok(Value::str(chars[lo..hi].iter().collect::<String>()))
        }
        other => Err(RuntimeError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// `list += iterable` extends in place and keeps the list's identity
pub fn extend_in_place(
    list: &Rc<RefCell<Vec<Value>>>,
    iterable: &Value,
) -> RunResult<()> {
    let items = iterable.iterate()?;
    list.borrow_mut().extend(items);
    Ok(())
}

/// Stable sort with an optional precomputed key per item
///
/// The first comparison error aborts the sort and is returned; the input
/// order is left unspecified in that case.
pub fn sort_values(
    items: &mut [(Value, Value)],
    reverse: bool,
) -> RunResult<()> {
    let mut failure = None;
    items.sort_by(|(a, _), (b, _)| {
        if failure.is_some() {
            return Ordering::Equal;
        }
        match a.compare(b, "<") {
            Ok(ordering) => {
                let ordering = ordering.unwrap_or(Ordering::Equal);
                if reverse {
                    ordering.reverse()
                } else {
                    ordering
                }
            }
            Err(err) => {
                failure = Some(err);
                Ordering::Equal
            }
        }
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
