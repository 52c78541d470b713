//! Runtime values
//!
//! Containers are shared handles (`Rc<RefCell<..>>`) so that aliasing and
//! in-place mutation behave the way users of a dynamic language expect:
//! `a = []; b = a; b.append(1)` changes `a` too.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::Serialize;

use super::error::{RunResult, RuntimeError};
use super::interpreter::Interpreter;
use super::parser::FunctionDef;
use super::scope::Scope;
use super::stack;

/// Signature of host functions callable from scripts
pub type NativeFn = dyn Fn(&mut Interpreter, CallArgs) -> RunResult<Value>;

/// Dynamically typed value
#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Rc<RefCell<Vec<Value>>>),
    Tuple(Rc<[Value]>),
    Dict(Rc<RefCell<Dict>>),
    Function(Rc<Function>),
    Native(Rc<NativeFunction>),
    Method(Rc<BoundMethod>),
    Type(TypeKind),
    Object(Rc<Object>),
}

impl Value {
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Rc::from(s.as_ref()))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Rc::from(items))
    }

    pub fn dict(dict: Dict) -> Self {
        Value::Dict(Rc::new(RefCell::new(dict)))
    }

    /// Wrap a host closure as a callable value
    pub fn native(
        name: impl Into<String>,
        func: impl Fn(&mut Interpreter, CallArgs) -> RunResult<Value> + 'static,
    ) -> Self {
        Value::Native(Rc::new(NativeFunction {
            name: name.into(),
            func: Rc::new(func),
        }))
    }

    pub fn object(object: Object) -> Self {
        Value::Object(Rc::new(object))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Name reported by `type()` and in error messages
    pub fn type_name(&self) -> String {
        match self {
            Value::Object(obj) => obj.class.clone(),
            other => other.type_kind().name().to_string(),
        }
    }

    pub fn type_kind(&self) -> TypeKind {
        match self {
            Value::None => TypeKind::NoneType,
            Value::Bool(_) => TypeKind::Bool,
            Value::Int(_) => TypeKind::Int,
            Value::Float(_) => TypeKind::Float,
            Value::Str(_) => TypeKind::Str,
            Value::List(_) => TypeKind::List,
            Value::Tuple(_) => TypeKind::Tuple,
            Value::Dict(_) => TypeKind::Dict,
            Value::Function(_) => TypeKind::Function,
            Value::Native(_) | Value::Method(_) => TypeKind::BuiltinFunction,
            Value::Type(_) => TypeKind::Type,
            Value::Object(_) => TypeKind::Object,
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::Dict(dict) => !dict.borrow().is_empty(),
            _ => true,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Function(_) | Value::Native(_) | Value::Method(_) | Value::Type(_)
        )
    }

    /// Numeric view used by arithmetic; bools count as ints
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(*b as i64),
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(*b as i64 as f64),
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Snapshot of the items produced by iterating over this value
    pub fn iterate(&self) -> RunResult<Vec<Value>> {
        match self {
            Value::List(items) => Ok(items.borrow().clone()),
            Value::Tuple(items) => Ok(items.to_vec()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::str(c.to_string())).collect()),
            Value::Dict(dict) => Ok(dict.borrow().keys()),
            other => Err(RuntimeError::type_error(format!(
                "'{}' object is not iterable",
                other.type_name()
            ))),
        }
    }

    /// Identity for containers and callables, value equality otherwise
    pub fn is(
        &self,
        other: &Value,
    ) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b),
            (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Method(a), Value::Method(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            _ => false,
        }
    }

    /// `==` semantics
    pub fn equals(
        &self,
        other: &Value,
    ) -> bool {
        stack::guarded(|| self.equals_inner(other))
    }

    fn equals_inner(
        &self,
        other: &Value,
    ) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                Rc::ptr_eq(a, b) || sequence_equals(&a.borrow(), &b.borrow())
            }
            (Value::Tuple(a), Value::Tuple(b)) => sequence_equals(a, b),
            (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b) || a.borrow().equals(&b.borrow()),
            (Value::Method(a), Value::Method(b)) => a.name == b.name && a.receiver.is(&b.receiver),
            (a, b) => match (a.as_int(), b.as_int()) {
                (Some(x), Some(y)) => x == y,
                _ => match (a.as_float(), b.as_float()) {
                    (Some(x), Some(y)) => x == y,
                    _ => a.is(b),
                },
            },
        }
    }

    /// Ordering for `<`, `<=`, `>`, `>=`, `min`, `max` and `sorted`
    ///
    /// `Ok(None)` means the values are unordered (a NaN is involved).
    pub fn compare(
        &self,
        other: &Value,
        op: &str,
    ) -> RunResult<Option<Ordering>> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
            (Value::List(a), Value::List(b)) => compare_sequences(&a.borrow(), &b.borrow(), op),
            (Value::Tuple(a), Value::Tuple(b)) => compare_sequences(a, b, op),
            (a, b) => match (a.as_int(), b.as_int()) {
                (Some(x), Some(y)) => Ok(Some(x.cmp(&y))),
                _ => match (a.as_float(), b.as_float()) {
                    (Some(x), Some(y)) => Ok(x.partial_cmp(&y)),
                    _ => Err(RuntimeError::type_error(format!(
                        "'{}' not supported between instances of '{}' and '{}'",
                        op,
                        a.type_name(),
                        b.type_name()
                    ))),
                },
            },
        }
    }

    /// Developer representation, as shown by the REPL and `repr()`
    pub fn repr(&self) -> String {
        let mut out = String::new();
        self.write_repr(&mut out, &mut Vec::new());
        out
    }

    fn write_repr(
        &self,
        out: &mut String,
        seen: &mut Vec<*const ()>,
    ) {
        stack::guarded(|| self.write_repr_inner(out, seen))
    }

    fn write_repr_inner(
        &self,
        out: &mut String,
        seen: &mut Vec<*const ()>,
    ) {
        match self {
            Value::None => out.push_str("None"),
            Value::Bool(true) => out.push_str("True"),
            Value::Bool(false) => out.push_str("False"),
            Value::Int(n) => out.push_str(&n.to_string()),
            Value::Float(f) => out.push_str(&format_float(*f)),
            Value::Str(s) => out.push_str(&quote_str(s)),
            Value::List(items) => {
                let ptr = Rc::as_ptr(items) as *const ();
                if seen.contains(&ptr) {
                    out.push_str("[...]");
                    return;
                }
                seen.push(ptr);
                out.push('[');
                write_items(&items.borrow(), out, seen);
                out.push(']');
                seen.pop();
            }
            Value::Tuple(items) => {
                out.push('(');
                write_items(items, out, seen);
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Value::Dict(dict) => {
                let ptr = Rc::as_ptr(dict) as *const ();
                if seen.contains(&ptr) {
                    out.push_str("{...}");
                    return;
                }
                seen.push(ptr);
                out.push('{');
                for (i, (key, value)) in dict.borrow().items().into_iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    key.write_repr(out, seen);
                    out.push_str(": ");
                    value.write_repr(out, seen);
                }
                out.push('}');
                seen.pop();
            }
            Value::Function(func) => out.push_str(&format!("<function {}>", func.name())),
            Value::Native(native) => out.push_str(&format!("<built-in function {}>", native.name)),
            Value::Method(method) => out.push_str(&format!(
                "<built-in method {} of {} object>",
                method.name,
                method.receiver.type_name()
            )),
            Value::Type(kind) => out.push_str(&format!("<class '{}'>", kind.name())),
            Value::Object(obj) => out.push_str(&format!("<{} object>", obj.class)),
        }
    }

    /// Build a value from anything serde can serialize
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Value, serde_json::Error> {
        serde_json::to_value(value).map(Value::from_json)
    }

    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::None,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::str(s),
            serde_json::Value::Array(items) => {
                Value::list(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let mut dict = Dict::new();
                for (key, value) in map {
                    dict.insert_str(&key, Value::from_json(value));
                }
                Value::dict(dict)
            }
        }
    }

    /// Plain-data view of this value for hosts reading results back
    pub fn to_json(&self) -> RunResult<serde_json::Value> {
        use serde_json::Value as Json;
        Ok(match self {
            Value::None => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(n) => Json::from(*n),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .ok_or_else(|| RuntimeError::value_error("out of range float values are not JSON compliant"))?,
            Value::Str(s) => Json::String(s.to_string()),
            Value::List(items) => Json::Array(
                items
                    .borrow()
                    .iter()
                    .map(Value::to_json)
                    .collect::<RunResult<_>>()?,
            ),
            Value::Tuple(items) => Json::Array(items.iter().map(Value::to_json).collect::<RunResult<_>>()?),
            Value::Dict(dict) => {
                let mut map = serde_json::Map::new();
                for (key, value) in dict.borrow().items() {
                    let key = match key {
                        Value::Str(s) => s.to_string(),
                        other => other.repr(),
                    };
                    map.insert(key, value.to_json()?);
                }
                Json::Object(map)
            }
            other => {
                return Err(RuntimeError::type_error(format!(
                    "Object of type {} is not JSON serializable",
                    other.type_name()
                )))
            }
        })
    }
}

/// User-facing text: strings print raw, everything else prints its repr
impl fmt::Display for Value {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            other => f.write_str(&other.repr()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl PartialEq for Value {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.equals(other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

fn write_items(
    items: &[Value],
    out: &mut String,
    seen: &mut Vec<*const ()>,
) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.write_repr(out, seen);
    }
}

fn sequence_equals(
    a: &[Value],
    b: &[Value],
) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y))
}

fn compare_sequences(
    a: &[Value],
    b: &[Value],
    op: &str,
) -> RunResult<Option<Ordering>> {
    for (x, y) in a.iter().zip(b) {
        if !x.equals(y) {
            return x.compare(y, op);
        }
    }
    Ok(Some(a.len().cmp(&b.len())))
}

/// Shortest round-trip float text with a `.0` or exponent marker
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let abs = f.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        let text = format!("{:e}", f);
        return match text.split_once('e') {
            Some((mantissa, exp)) => {
                let exp: i32 = exp.parse().unwrap_or(0);
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exp.abs())
            }
            None => text,
        };
    }
    let text = f.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}

/// Quoted string literal, preferring single quotes
pub fn quote_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Hashable projection of a dict key
///
/// Numbers that compare equal hash equal: `True`, `1` and `1.0` are the
/// same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DictKey {
    None,
    Int(i64),
    Float(u64),
    Str(Rc<str>),
    Tuple(Vec<DictKey>),
}

impl DictKey {
    pub fn from_value(value: &Value) -> RunResult<DictKey> {
        match value {
            Value::None => Ok(DictKey::None),
            Value::Bool(b) => Ok(DictKey::Int(*b as i64)),
            Value::Int(n) => Ok(DictKey::Int(*n)),
            Value::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    Ok(DictKey::Int(*f as i64))
                } else {
                    Ok(DictKey::Float(f.to_bits()))
                }
            }
            Value::Str(s) => Ok(DictKey::Str(s.clone())),
            Value::Tuple(items) => items
                .iter()
                .map(DictKey::from_value)
                .collect::<RunResult<Vec<_>>>()
                .map(DictKey::Tuple),
            other => Err(RuntimeError::type_error(format!(
                "unhashable type: '{}'",
                other.type_name()
            ))),
        }
    }
}

/// Insertion-ordered mapping; each entry remembers the key as first inserted
#[derive(Clone, Default)]
pub struct Dict {
    entries: IndexMap<DictKey, (Value, Value)>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(
        &self,
        key: &Value,
    ) -> RunResult<Option<Value>> {
        let hashed = DictKey::from_value(key)?;
        Ok(self.entries.get(&hashed).map(|(_, v)| v.clone()))
    }

    pub fn contains(
        &self,
        key: &Value,
    ) -> RunResult<bool> {
        Ok(self.entries.contains_key(&DictKey::from_value(key)?))
    }

    pub fn insert(
        &mut self,
        key: Value,
        value: Value,
    ) -> RunResult<()> {
        let hashed = DictKey::from_value(&key)?;
        match self.entries.get_mut(&hashed) {
            Some(entry) => entry.1 = value,
            None => {
                self.entries.insert(hashed, (key, value));
            }
        }
        Ok(())
    }

    /// Insert under a string key, which is always hashable
    pub fn insert_str(
        &mut self,
        key: &str,
        value: Value,
    ) {
        let key: Rc<str> = Rc::from(key);
        self.entries
            .insert(DictKey::Str(key.clone()), (Value::Str(key), value));
    }

    pub fn remove(
        &mut self,
        key: &Value,
    ) -> RunResult<Option<Value>> {
        let hashed = DictKey::from_value(key)?;
        Ok(self.entries.shift_remove(&hashed).map(|(_, v)| v))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn keys(&self) -> Vec<Value> {
        self.entries.values().map(|(k, _)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.entries.values().map(|(_, v)| v.clone()).collect()
    }

    pub fn items(&self) -> Vec<(Value, Value)> {
        self.entries.values().cloned().collect()
    }

    fn equals(
        &self,
        other: &Dict,
    ) -> bool {
        self.len() == other.len()
            && self.entries.iter().all(|(key, (_, value))| {
                other
                    .entries
                    .get(key)
                    .map(|(_, v)| v.equals(value))
                    .unwrap_or(false)
            })
    }
}

/// Script-defined function together with the scopes it closes over
pub struct Function {
    pub def: Rc<FunctionDef>,
    /// Evaluated default for each parameter, aligned with `def.params`
    pub defaults: Vec<Option<Value>>,
    /// Lookup chain at the point of definition, innermost first
    pub env: Vec<Scope>,
}

impl Function {
    pub fn name(&self) -> &str {
        &self.def.name
    }
}

/// Host function exposed to scripts
pub struct NativeFunction {
    pub name: String,
    pub func: Rc<NativeFn>,
}

/// Builtin method bound to its receiver, e.g. `[].append`
pub struct BoundMethod {
    pub receiver: Value,
    pub name: String,
}

/// Host object: a class name plus mutable attributes
pub struct Object {
    pub class: String,
    attrs: RefCell<IndexMap<String, Value>>,
}

impl Object {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            attrs: RefCell::new(IndexMap::new()),
        }
    }

    pub fn with_attr(
        self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<Value> {
        self.attrs.borrow().get(name).cloned()
    }

    pub fn set(
        &self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) {
        self.attrs.borrow_mut().insert(name.into(), value.into());
    }

    pub fn attr_names(&self) -> Vec<String> {
        self.attrs.borrow().keys().cloned().collect()
    }
}

/// Built-in types; the callable ones double as conversion functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    NoneType,
    Bool,
    Int,
    Float,
    Str,
    List,
    Tuple,
    Dict,
    Function,
    BuiltinFunction,
    Type,
    Object,
}

impl TypeKind {
    pub fn name(self) -> &'static str {
        match self {
            TypeKind::NoneType => "NoneType",
            TypeKind::Bool => "bool",
            TypeKind::Int => "int",
            TypeKind::Float => "float",
            TypeKind::Str => "str",
            TypeKind::List => "list",
            TypeKind::Tuple => "tuple",
            TypeKind::Dict => "dict",
            TypeKind::Function => "function",
            TypeKind::BuiltinFunction => "builtin_function_or_method",
            TypeKind::Type => "type",
            TypeKind::Object => "object",
        }
    }
}

/// Arguments of a call to a native function
#[derive(Default)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub keywords: Vec<(String, Value)>,
}

impl CallArgs {
    pub fn new(positional: Vec<Value>) -> Self {
        Self {
            positional,
            keywords: Vec::new(),
        }
    }

    /// Check the positional count and reject keywords
    pub fn expect(
        &self,
        name: &str,
        min: usize,
        max: usize,
    ) -> RunResult<()> {
        self.expect_keywords(name, &[])?;
        let given = self.positional.len();
        if given >= min && given <= max {
            return Ok(());
        }
        let expected = if min == max {
            format!("exactly {}", min)
        } else if given < min {
            format!("at least {}", min)
        } else {
            format!("at most {}", max)
        };
        Err(RuntimeError::type_error(format!(
            "{}() takes {} argument{} ({} given)",
            name,
            expected,
            if min == max && min == 1 { "" } else { "s" },
            given
        )))
    }

    /// Reject keywords not in `allowed`
    pub fn expect_keywords(
        &self,
        name: &str,
        allowed: &[&str],
    ) -> RunResult<()> {
        match self.keywords.iter().find(|(k, _)| !allowed.contains(&k.as_str())) {
            Some((k, _)) => Err(RuntimeError::type_error(format!(
                "{}() got an unexpected keyword argument '{}'",
                name, k
            ))),
            None => Ok(()),
        }
    }

    pub fn keyword(
        &self,
        name: &str,
    ) -> Option<&Value> {
        self.keywords.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Positional argument, `None` when absent
    pub fn arg(
        &self,
        index: usize,
    ) -> Value {
        self.positional.get(index).cloned().unwrap_or(Value::None)
    }
}

