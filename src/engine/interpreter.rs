//! Tree-walking interpreter
//!
//! Runs parsed programs against a lookup chain of [`Scope`]s: bindings go to
//! the first scope, lookups walk the chain and end at the builtins.

use std::io::{self, Write};
use std::rc::Rc;

use super::builtins;
use super::error::{EngineResult, ErrorKind, RunResult, RuntimeError};
use super::members;
use super::ops;
use super::parser::{self, BinOp, Expr, Literal, LogicOp, Stmt, StmtKind, Target};
use super::scope::{Scope, ScopePair};
use super::stack;
use super::value::{CallArgs, Dict, Function, Value};

/// Nested call limit before `RecursionError`
pub const DEFAULT_RECURSION_LIMIT: usize = 200;

/// Frame name used for top-level code
pub const MODULE_FRAME: &str = "<module>";

/// How a statement finished
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// Script interpreter
pub struct Interpreter {
    builtins: Scope,
    output: Box<dyn Write>,
    depth: usize,
    recursion_limit: usize,
    /// Line of the statement being executed, for tracebacks
    line: usize,
    /// Innermost scope of the running code, for `dir()`
    locals: Option<Scope>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Interpreter printing to stdout
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Interpreter printing to `output`
    pub fn with_output(output: Box<dyn Write>) -> Self {
        Self {
            builtins: builtins::builtin_scope(),
            output,
            depth: 0,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            line: 1,
            locals: None,
        }
    }

    pub fn builtins(&self) -> &Scope {
        &self.builtins
    }

    pub fn set_recursion_limit(
        &mut self,
        limit: usize,
    ) {
        self.recursion_limit = limit;
    }

    /// Innermost scope of the code currently running
    pub fn locals(&self) -> Option<Scope> {
        self.locals.clone()
    }

    /// Write program output (used by `print`)
    pub fn write_output(
        &mut self,
        text: &str,
    ) -> RunResult<()> {
        self.output
            .write_all(text.as_bytes())
            .and_then(|_| self.output.flush())
            .map_err(|e| RuntimeError::new(ErrorKind::OSError, e.to_string()))
    }

    /// Evaluate a single expression
    pub fn eval_source(
        &mut self,
        source: &str,
        scopes: &ScopePair,
    ) -> EngineResult<Value> {
        let expr = parser::parse_expression(source)?;
        let env = scopes.chain();
        self.line = expr.span().line();
        let result = self.at_top_level(&env, |interp| interp.eval_expr(&expr, &env));
        Ok(result?)
    }

    /// Execute a sequence of statements
    pub fn exec_source(
        &mut self,
        source: &str,
        scopes: &ScopePair,
    ) -> EngineResult<()> {
        let program = parser::parse_program(source)?;
        let env = scopes.chain();
        self.at_top_level(&env, |interp| interp.exec_block(&program, &env).map(|_| ()))?;
        Ok(())
    }

    fn at_top_level<T>(
        &mut self,
        env: &[Scope],
        run: impl FnOnce(&mut Self) -> RunResult<T>,
    ) -> RunResult<T> {
        self.depth = 0;
        self.locals = env.first().cloned();
        let result = run(self);
        self.locals = None;
        result.map_err(|err| err.with_frame(MODULE_FRAME, self.line))
    }

    fn exec_block(
        &mut self,
        stmts: &[Stmt],
        env: &[Scope],
    ) -> RunResult<Flow> {
        stack::guarded(|| self.exec_stmts(stmts, env))
    }

    fn exec_stmts(
        &mut self,
        stmts: &[Stmt],
        env: &[Scope],
    ) -> RunResult<Flow> {
        for stmt in stmts {
            self.line = stmt.line;
            match self.exec_stmt(stmt, env)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(
        &mut self,
        stmt: &Stmt,
        env: &[Scope],
    ) -> RunResult<Flow> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.eval_expr(expr, env)?;
            }
            StmtKind::Assign { target, value } => {
                let value = self.eval_expr(value, env)?;
                self.assign(target, value, env)?;
            }
            StmtKind::AugAssign { target, op, value } => {
                self.aug_assign(target, *op, value, env)?;
            }
            StmtKind::Pass => {}
            StmtKind::Break => return Ok(Flow::Break),
            StmtKind::Continue => return Ok(Flow::Continue),
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::None,
                };
                return Ok(Flow::Return(value));
            }
            StmtKind::FunctionDef(def) => {
                let mut defaults = Vec::with_capacity(def.params.len());
                for param in &def.params {
                    defaults.push(match &param.default {
                        Some(expr) => Some(self.eval_expr(expr, env)?),
                        None => None,
                    });
                }
                let function = Function {
                    def: def.clone(),
                    defaults,
                    env: env.to_vec(),
                };
                bind(env, &def.name, Value::Function(Rc::new(function)));
            }
            StmtKind::If { branches, orelse } => {
                for (condition, body) in branches {
                    if self.eval_expr(condition, env)?.truthy() {
                        return self.exec_block(body, env);
                    }
                }
                if let Some(body) = orelse {
                    return self.exec_block(body, env);
                }
            }
            StmtKind::While { condition, body } => loop {
                self.line = stmt.line;
                if !self.eval_expr(condition, env)?.truthy() {
                    break;
                }
                match self.exec_block(body, env)? {
                    Flow::Break => break,
                    Flow::Return(value) => return Ok(Flow::Return(value)),
                    Flow::Normal | Flow::Continue => {}
                }
            },
            StmtKind::For {
                target,
                iterable,
                body,
            } => {
                let items = self.eval_expr(iterable, env)?.iterate()?;
                for item in items {
                    self.assign(target, item, env)?;
                    match self.exec_block(body, env)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
            }
        }
        Ok(Flow::Normal)
    }

    fn assign(
        &mut self,
        target: &Target,
        value: Value,
        env: &[Scope],
    ) -> RunResult<()> {
        match target {
            Target::Name(name) => {
                bind(env, name, value);
                Ok(())
            }
            Target::Attribute { object, name } => {
                let object = self.eval_expr(object, env)?;
                members::set_attribute(&object, name, value)
            }
            Target::Index { object, index } => {
                let object = self.eval_expr(object, env)?;
                let index = self.eval_expr(index, env)?;
                ops::set_item(&object, index, value)
            }
            Target::Unpack(targets) => {
                let items = value.iterate()?;
                if items.len() < targets.len() {
                    return Err(RuntimeError::value_error(format!(
                        "not enough values to unpack (expected {}, got {})",
                        targets.len(),
                        items.len()
                    )));
                }
                if items.len() > targets.len() {
                    return Err(RuntimeError::value_error(format!(
                        "too many values to unpack (expected {})",
                        targets.len()
                    )));
                }
                for (target, item) in targets.iter().zip(items) {
                    self.assign(target, item, env)?;
                }
                Ok(())
            }
        }
    }

    fn aug_assign(
        &mut self,
        target: &Target,
        op: BinOp,
        value: &Expr,
        env: &[Scope],
    ) -> RunResult<()> {
        match target {
            Target::Name(name) => {
                let current = self.lookup(name, env)?;
                let rhs = self.eval_expr(value, env)?;
                let updated = augmented(op, current, &rhs)?;
                bind(env, name, updated);
                Ok(())
            }
            Target::Attribute { object, name } => {
                let object = self.eval_expr(object, env)?;
                let current = members::get_attribute(&object, name)?;
                let rhs = self.eval_expr(value, env)?;
                let updated = augmented(op, current, &rhs)?;
                members::set_attribute(&object, name, updated)
            }
            Target::Index { object, index } => {
                let object = self.eval_expr(object, env)?;
                let index = self.eval_expr(index, env)?;
                let current = ops::get_item(&object, &index)?;
                let rhs = self.eval_expr(value, env)?;
                let updated = augmented(op, current, &rhs)?;
                ops::set_item(&object, index, updated)
            }
            Target::Unpack(_) => Err(RuntimeError::type_error(
                "illegal expression for augmented assignment",
            )),
        }
    }

    fn lookup(
        &self,
        name: &str,
        env: &[Scope],
    ) -> RunResult<Value> {
        env.iter()
            .chain(std::iter::once(&self.builtins))
            .find_map(|scope| scope.get(name))
            .ok_or_else(|| {
                RuntimeError::new(
                    ErrorKind::NameError,
                    format!("name '{}' is not defined", name),
                )
            })
    }

    fn eval_all(
        &mut self,
        exprs: &[Expr],
        env: &[Scope],
    ) -> RunResult<Vec<Value>> {
        exprs.iter().map(|e| self.eval_expr(e, env)).collect()
    }

    fn eval_expr(
        &mut self,
        expr: &Expr,
        env: &[Scope],
    ) -> RunResult<Value> {
        stack::guarded(|| self.eval_node(expr, env))
    }

    fn eval_node(
        &mut self,
        expr: &Expr,
        env: &[Scope],
    ) -> RunResult<Value> {
        match expr {
            Expr::Lit(literal, _) => Ok(match literal {
                Literal::None => Value::None,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Int(n) => Value::Int(*n),
                Literal::BigInt(_) => {
                    return Err(RuntimeError::new(
                        ErrorKind::OverflowError,
                        "int too large to convert to a 64-bit integer",
                    ))
                }
                Literal::Float(f) => Value::Float(*f),
                Literal::Str(s) => Value::str(s),
            }),
            Expr::Name(name, _) => self.lookup(name, env),
            Expr::List(items, _) => Ok(Value::list(self.eval_all(items, env)?)),
            Expr::Tuple(items, _) => Ok(Value::tuple(self.eval_all(items, env)?)),
            Expr::Dict(entries, _) => {
                let mut dict = Dict::new();
                for (key, value) in entries {
                    let key = self.eval_expr(key, env)?;
                    let value = self.eval_expr(value, env)?;
                    dict.insert(key, value)?;
                }
                Ok(Value::dict(dict))
            }
            Expr::UnOp { op, operand, .. } => {
                let operand = self.eval_expr(operand, env)?;
                ops::unary_op(*op, &operand)
            }
            Expr::BinOp {
                op, left, right, ..
            } => {
                let left = self.eval_expr(left, env)?;
                let right = self.eval_expr(right, env)?;
                ops::binary_op(*op, &left, &right)
            }
            Expr::Compare { left, ops: links, .. } => {
                let mut left = self.eval_expr(left, env)?;
                for (op, right) in links {
                    let right = self.eval_expr(right, env)?;
                    if !ops::compare_op(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::Logic {
                op, left, right, ..
            } => {
                let left = self.eval_expr(left, env)?;
                let short_circuit = match op {
                    LogicOp::And => !left.truthy(),
                    LogicOp::Or => left.truthy(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval_expr(right, env)
                }
            }
            Expr::Conditional {
                condition,
                then,
                otherwise,
                ..
            } => {
                if self.eval_expr(condition, env)?.truthy() {
                    self.eval_expr(then, env)
                } else {
                    self.eval_expr(otherwise, env)
                }
            }
            Expr::Call {
                func, args, kwargs, ..
            } => {
                let func = self.eval_expr(func, env)?;
                let positional = self.eval_all(args, env)?;
                let mut keywords = Vec::with_capacity(kwargs.len());
                for (name, value) in kwargs {
                    keywords.push((name.clone(), self.eval_expr(value, env)?));
                }
                self.call_value(&func, CallArgs { positional, keywords })
            }
            Expr::Attribute { object, name, .. } => {
                let object = self.eval_expr(object, env)?;
                members::get_attribute(&object, name)
            }
            Expr::Index { object, index, .. } => {
                let object = self.eval_expr(object, env)?;
                let index = self.eval_expr(index, env)?;
                ops::get_item(&object, &index)
            }
            Expr::Slice {
                object, start, stop, ..
            } => {
                let object = self.eval_expr(object, env)?;
                let start = match start {
                    Some(e) => Some(self.eval_expr(e, env)?),
                    None => None,
                };
                let stop = match stop {
                    Some(e) => Some(self.eval_expr(e, env)?),
                    None => None,
                };
                ops::get_slice(&object, start.as_ref(), stop.as_ref())
            }
        }
    }

    /// Call any callable value
    pub fn call_value(
        &mut self,
        func: &Value,
        args: CallArgs,
    ) -> RunResult<Value> {
        match func {
            Value::Function(function) => self.call_function(function, args),
            Value::Native(native) => (*native.func)(self, args),
            Value::Method(method) => members::call_method(self, &method.receiver, &method.name, args),
            Value::Type(kind) => builtins::construct(self, *kind, args),
            other => Err(RuntimeError::type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    fn call_function(
        &mut self,
        function: &Rc<Function>,
        args: CallArgs,
    ) -> RunResult<Value> {
        if self.depth >= self.recursion_limit {
            return Err(RuntimeError::new(
                ErrorKind::RecursionError,
                "maximum recursion depth exceeded",
            ));
        }
        let frame = bind_arguments(function, args)?;
        let mut env = Vec::with_capacity(function.env.len() + 1);
        env.push(frame.clone());
        env.extend(function.env.iter().cloned());

        let caller_line = self.line;
        let caller_locals = self.locals.replace(frame);
        self.depth += 1;
        let result = self.exec_block(&function.def.body, &env);
        self.depth -= 1;
        let callee_line = self.line;
        self.line = caller_line;
        self.locals = caller_locals;

        match result {
            Ok(Flow::Return(value)) => Ok(value),
            Ok(_) => Ok(Value::None),
            Err(err) => Err(err.with_frame(function.name(), callee_line)),
        }
    }

    /// Sort `items`, optionally through a key function
    pub fn sorted(
        &mut self,
        items: Vec<Value>,
        key: Option<&Value>,
        reverse: Option<&Value>,
    ) -> RunResult<Vec<Value>> {
        let mut keyed = Vec::with_capacity(items.len());
        for item in items {
            let sort_key = match key {
                Some(Value::None) | None => item.clone(),
                Some(func) => self.call_value(func, CallArgs::new(vec![item.clone()]))?,
            };
            keyed.push((sort_key, item));
        }
        let reverse = reverse.map(Value::truthy).unwrap_or(false);
        ops::sort_values(&mut keyed, reverse)?;
        Ok(keyed.into_iter().map(|(_, item)| item).collect())
    }
}

/// Bind in the innermost scope of the chain
fn bind(
    env: &[Scope],
    name: &str,
    value: Value,
) {
    if let Some(scope) = env.first() {
        scope.insert(name, value);
    }
}

/// Apply an augmented operator; `list += x` mutates the list in place
fn augmented(
    op: BinOp,
    current: Value,
    rhs: &Value,
) -> RunResult<Value> {
    if let (BinOp::Add, Value::List(list)) = (op, &current) {
        ops::extend_in_place(list, rhs)?;
        return Ok(current);
    }
    ops::binary_op(op, &current, rhs)
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Build the local frame of a call from its arguments
fn bind_arguments(
    function: &Function,
    args: CallArgs,
) -> RunResult<Scope> {
    let name = function.name();
    let params = &function.def.params;
    let given = args.positional.len();
    if given > params.len() {
        return Err(RuntimeError::type_error(format!(
            "{}() takes {} positional argument{} but {} {} given",
            name,
            params.len(),
            plural(params.len()),
            given,
            if given == 1 { "was" } else { "were" }
        )));
    }

    let frame = Scope::new();
    for (param, value) in params.iter().zip(args.positional) {
        frame.insert(param.name.clone(), value);
    }
    for (keyword, value) in args.keywords {
        if !params.iter().any(|p| p.name == keyword) {
            return Err(RuntimeError::type_error(format!(
                "{}() got an unexpected keyword argument '{}'",
                name, keyword
            )));
        }
        if frame.contains(&keyword) {
            return Err(RuntimeError::type_error(format!(
                "{}() got multiple values for argument '{}'",
                name, keyword
            )));
        }
        frame.insert(keyword, value);
    }

    let mut missing = Vec::new();
    for (param, default) in params.iter().zip(&function.defaults) {
        if frame.contains(&param.name) {
            continue;
        }
        match default {
            Some(value) => {
                frame.insert(param.name.clone(), value.clone());
            }
            None => missing.push(format!("'{}'", param.name)),
        }
    }
    if !missing.is_empty() {
        let listed = match missing.split_last() {
            Some((last, rest)) if !rest.is_empty() => format!("{} and {}", rest.join(", "), last),
            _ => missing.join(""),
        };
        return Err(RuntimeError::type_error(format!(
            "{}() missing {} required positional argument{}: {}",
            name,
            missing.len(),
            plural(missing.len()),
            listed
        )));
    }
    Ok(frame)
}
