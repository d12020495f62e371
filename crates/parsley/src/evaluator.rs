//! The recursive evaluator (spec §4.1): walks an [`Expr`] tree against an
//! [`Environment`], implementing every node-kind rule plus the collaborator
//! plumbing (DB connections, bindings, form stack, a `tokio` runtime for
//! the I/O suspension points) that the rest of the facade crate's modules
//! reach back into via `crate::evaluator::Evaluator`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use parsley_core::dbconn::DbConnectionHandle;
use parsley_core::environment::{AssetBundler, Environment, FragmentCacher, HostContext};
use parsley_core::value::function::{AstNode, Evaluate, Function};
use parsley_core::value::{Dict, Schema, Value};
use parsley_core::{EngineConfig, ErrorValue};

use parsley_query::bindings::Bindings;
use parsley_schema::{apply_array, apply_dict};
use parsley_template::formbind::FormStack;

use crate::ast::{not_callable_error, BinOp, Expr, TagNode, UnOp};
use crate::dsl;
use crate::io_ops;
use crate::methods;
use crate::stdlib_loader;
use crate::template_eval;

fn downcast(node: &dyn AstNode) -> Result<&Expr, ErrorValue> {
    node.as_any()
        .downcast_ref::<Expr>()
        .ok_or_else(|| ErrorValue::type_error("TYPE-0002", "AST node is not a parsley expression"))
}

/// Recursion guard (spec §4.1: exceeding `max_recursion_depth` is a `type`
/// error, not a stack overflow).
struct DepthGuard<'a>(&'a std::cell::Cell<usize>);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

pub struct Evaluator {
    host: Rc<HostContext>,
    runtime: tokio::runtime::Runtime,
    bindings: RefCell<HashMap<usize, Rc<RefCell<Bindings>>>>,
    form_stack: RefCell<FormStack>,
    depth: std::cell::Cell<usize>,
}

impl Evaluator {
    /// # Panics
    /// Panics if the current-thread `tokio` runtime cannot be built (out of
    /// file descriptors or similar host resource exhaustion).
    #[must_use]
    pub fn new(host: Rc<HostContext>) -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("failed to start the evaluator's I/O runtime");
        Self {
            host,
            runtime,
            bindings: RefCell::new(HashMap::new()),
            form_stack: RefCell::new(FormStack::new()),
            depth: std::cell::Cell::new(0),
        }
    }

    #[must_use]
    pub fn root_environment(&self) -> Environment {
        Environment::root(Rc::clone(&self.host))
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.host.config
    }

    #[must_use]
    pub fn asset_bundler(&self) -> Option<Rc<dyn AssetBundler>> {
        self.host.asset_bundler.clone()
    }

    #[must_use]
    pub fn fragment_cache(&self) -> Option<Rc<dyn FragmentCacher>> {
        self.host.fragment_cache.clone()
    }

    #[must_use]
    pub fn handler_path(&self) -> String {
        self.host.handler_path.clone()
    }

    #[must_use]
    pub fn form_stack(&self) -> &RefCell<FormStack> {
        &self.form_stack
    }

    /// Runs a `parsley-io`/`DbConnection` future to completion. The
    /// evaluator is synchronous from the script's perspective (spec §4.1:
    /// "Suspension occurs only at remote-write/fetch/SQL boundaries"); this
    /// is the single place that gap is bridged.
    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    pub fn resolve_connection(&self, conn: &Rc<Expr>, env: &Environment) -> Result<DbConnectionHandle, ErrorValue> {
        match self.eval(conn, env)? {
            Value::DbConnection(handle) => Ok(handle),
            other => Err(ErrorValue::type_error(
                "TYPE-0009",
                format!("expected a db connection, got {}", other.value_type().as_str()),
            )),
        }
    }

    /// One [`Bindings`] registry per connection identity (spec §4.6: "one
    /// registry per `DBConnection`"), created lazily on first `db.bind(...)`.
    #[must_use]
    pub fn bindings_for(&self, handle: &DbConnectionHandle) -> Rc<RefCell<Bindings>> {
        let key = Rc::as_ptr(&handle.inner) as *const () as usize;
        Rc::clone(
            self.bindings
                .borrow_mut()
                .entry(key)
                .or_insert_with(|| Rc::new(RefCell::new(Bindings::new()))),
        )
    }

    fn enter(&self) -> Result<DepthGuard<'_>, ErrorValue> {
        let depth = self.depth.get() + 1;
        if depth > self.host.config.max_recursion_depth {
            return Err(ErrorValue::type_error("TYPE-0003", "maximum recursion depth exceeded"));
        }
        self.depth.set(depth);
        Ok(DepthGuard(&self.depth))
    }

    fn eval_block(&self, exprs: &[Rc<Expr>], env: &Environment) -> Result<Value, ErrorValue> {
        let child = env.child();
        let mut result = Value::Null;
        for expr in exprs {
            result = self.eval(expr, &child)?;
        }
        Ok(result)
    }

    fn eval_args(&self, args: &[Rc<Expr>], env: &Environment) -> Result<Vec<Value>, ErrorValue> {
        args.iter().map(|a| self.eval(a, env)).collect()
    }

    fn eval_call(&self, callee: &Value, args: Vec<Value>) -> Result<Value, ErrorValue> {
        match callee {
            Value::Function(f) => self.call_function(f, &args),
            Value::Builtin(b) => b.call(&args),
            Value::Schema(schema) => self.apply_schema(schema, &args),
            Value::Null => Err(not_callable_error("null", true)),
            other => Err(not_callable_error(other.value_type().as_str(), false)),
        }
    }

    /// Schema-as-callable (spec §4.5, §9 Design Notes): a dict applies to a
    /// record, an array of dicts applies to a table.
    fn apply_schema(&self, schema: &Rc<Schema>, args: &[Value]) -> Result<Value, ErrorValue> {
        let [arg] = args else {
            return Err(ErrorValue::arity(format!("{} schema: wrong number of arguments (expected 1)", schema.name)));
        };
        match arg {
            Value::Dict(d) => Ok(Value::Record(apply_dict(Rc::clone(schema), d, self)?)),
            Value::Array(rows) => {
                let mut dicts = Vec::with_capacity(rows.len());
                for row in rows.iter() {
                    match row {
                        Value::Dict(d) => dicts.push(d.clone()),
                        Value::Record(r) => dicts.push(r.data().clone()),
                        other => return Err(ErrorValue::type_error("TYPE-0013", format!("cannot apply schema to array element of type {}", other.value_type().as_str()))),
                    }
                }
                Ok(Value::Table(apply_array(Rc::clone(schema), &dicts, self)?))
            }
            other => Err(ErrorValue::type_error("TYPE-0014", format!("cannot apply schema to {}", other.value_type().as_str()))),
        }
    }

    fn eval_index(&self, receiver: Value, index: Value) -> Result<Value, ErrorValue> {
        match (&receiver, &index) {
            (Value::Array(items), Value::Integer(i)) => {
                let idx = usize::try_from(*i).ok().filter(|idx| *idx < items.len());
                Ok(idx.map_or(Value::Null, |idx| items[idx].clone()))
            }
            (Value::Dict(d), Value::String(key)) => Ok(d.get(key, self)?.unwrap_or(Value::Null)),
            (Value::Table(t), Value::Integer(i)) => {
                let idx = usize::try_from(*i).ok();
                Ok(idx.and_then(|idx| t.row_record(idx)).map_or(Value::Null, Value::Record))
            }
            _ => Err(ErrorValue::type_error(
                "TYPE-0015",
                format!("cannot index {} with {}", receiver.value_type().as_str(), index.value_type().as_str()),
            )),
        }
    }

    fn eval_binary(&self, op: BinOp, left: &Rc<Expr>, right: &Rc<Expr>, env: &Environment) -> Result<Value, ErrorValue> {
        match op {
            BinOp::And => {
                let l = self.eval(left, env)?;
                if !l.truthy() {
                    return Ok(l);
                }
                self.eval(right, env)
            }
            BinOp::Or => {
                let l = self.eval(left, env)?;
                if l.truthy() {
                    return Ok(l);
                }
                self.eval(right, env)
            }
            BinOp::Nullish => {
                let l = self.eval(left, env)?;
                if matches!(l, Value::Null) {
                    self.eval(right, env)
                } else {
                    Ok(l)
                }
            }
            _ => {
                let l = self.eval(left, env)?;
                let r = self.eval(right, env)?;
                eval_scalar_binop(op, l, r)
            }
        }
    }

    pub fn eval(&self, expr: &Rc<Expr>, env: &Environment) -> Result<Value, ErrorValue> {
        let _guard = self.enter()?;
        match expr.as_ref() {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Identifier(name) => env.get(name),
            Expr::ArrayLit(items) => Ok(Value::array(self.eval_args(items, env)?)),
            Expr::DictLit(entries) => {
                let dict = Dict::new();
                for entry in entries {
                    dict.insert_thunk(entry.key.clone(), Rc::clone(&entry.value) as Rc<dyn AstNode>, env.clone());
                }
                Ok(Value::Dict(dict))
            }
            Expr::Let { name, value } => {
                let v = self.eval(value, env)?;
                env.declare(name.clone(), v);
                Ok(Value::Null)
            }
            Expr::LetDestructure { fields, value } => self.eval_destructure(fields, value, env),
            Expr::Assign { name, value } => {
                let v = self.eval(value, env)?;
                env.assign(name, v.clone())?;
                Ok(v)
            }
            Expr::If { cond, then_branch, else_branch } => {
                if self.eval(cond, env)?.truthy() {
                    self.eval(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.eval(else_branch, env)
                } else {
                    Ok(Value::Null)
                }
            }
            Expr::While { cond, body } => {
                while self.eval(cond, env)?.truthy() {
                    self.eval(body, env)?;
                }
                Ok(Value::Null)
            }
            Expr::ForIn { var, iterable, body } => self.eval_for_in(var, iterable, body, env),
            Expr::ForRange { var, start, end, inclusive, body } => self.eval_for_range(var, start, end, *inclusive, body, env),
            Expr::Block(exprs) => self.eval_block(exprs, env),
            Expr::FunctionLit { name, params, body } => {
                let function = Rc::new(Function {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::clone(body) as Rc<dyn AstNode>,
                    env: env.clone(),
                });
                let value = Value::Function(Rc::clone(&function));
                if let Some(n) = name {
                    env.declare(n.clone(), value.clone());
                }
                Ok(value)
            }
            Expr::Call { callee, args } => {
                let callee_value = self.eval(callee, env)?;
                let arg_values = self.eval_args(args, env)?;
                self.eval_call(&callee_value, arg_values)
            }
            Expr::MethodCall { receiver, method, args } => {
                let receiver_value = self.eval(receiver, env)?;
                let arg_values = self.eval_args(args, env)?;
                methods::dispatch(self, &receiver_value, method, &arg_values)
            }
            Expr::Index { receiver, index } => {
                let receiver_value = self.eval(receiver, env)?;
                let index_value = self.eval(index, env)?;
                self.eval_index(receiver_value, index_value)
            }
            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right, env),
            Expr::Unary { op, operand } => self.eval_unary(*op, operand, env),
            Expr::Tag(tag) => self.eval_tag(tag, env),
            Expr::Dsl(stmt) => dsl::execute(self, stmt, env),
            Expr::IoOp(op) => io_ops::execute(self, op, env),
            Expr::Import(path) => self.eval_import(path, env),
            Expr::Native(f) => f(&[], env, self),
        }
    }

    /// `import @std/<name>` (spec §4.7). `@std/api` is implemented in this
    /// crate (it needs to wrap handlers with a call back into the
    /// evaluator, which a host-provided `Loader` has no way to do), so it's
    /// special-cased ahead of the general `Loader` handoff.
    fn eval_import(&self, path: &str, env: &Environment) -> Result<Value, ErrorValue> {
        if path == "@std/api" {
            return Ok(stdlib_loader::std_api_exports(env));
        }
        match &self.host.loader {
            Some(loader) => loader.load(path),
            None => Err(ErrorValue::name_error(format!("no loader configured to resolve '{path}'")).with_hint("the host did not provide a Loader")),
        }
    }

    fn eval_tag(&self, tag: &TagNode, env: &Environment) -> Result<Value, ErrorValue> {
        template_eval::render_tag(self, tag, env)
    }

    fn eval_unary(&self, op: UnOp, operand: &Rc<Expr>, env: &Environment) -> Result<Value, ErrorValue> {
        let v = self.eval(operand, env)?;
        match (op, &v) {
            (UnOp::Neg, Value::Integer(n)) => Ok(Value::Integer(-n)),
            (UnOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
            (UnOp::Neg, other) => Err(ErrorValue::type_error("TYPE-0016", format!("cannot negate {}", other.value_type().as_str()))),
            (UnOp::Not, _) => Ok(Value::Boolean(!v.truthy())),
        }
    }

    fn eval_destructure(&self, fields: &[String], value: &Rc<Expr>, env: &Environment) -> Result<Value, ErrorValue> {
        let v = self.eval(value, env)?;
        let Value::Dict(d) = &v else {
            return Err(ErrorValue::type_error("TYPE-0012", format!("cannot destructure {}", v.value_type().as_str())));
        };
        if io_ops::is_destructurable_response(&v) {
            let projected = io_ops::project_response(d, self)?;
            for field in fields {
                let bound = match field.as_str() {
                    "data" => projected.data.clone(),
                    "error" => projected.error.clone(),
                    "status" => projected.status.clone(),
                    "headers" => projected.headers.clone(),
                    other => return Err(ErrorValue::name_error(format!("no destructurable field '{other}' on a response"))),
                };
                env.declare(field.clone(), bound);
            }
        } else {
            for field in fields {
                let bound = d.get(field, self)?.unwrap_or(Value::Null);
                env.declare(field.clone(), bound);
            }
        }
        Ok(Value::Null)
    }

    fn eval_for_in(&self, var: &str, iterable: &Rc<Expr>, body: &Rc<Expr>, env: &Environment) -> Result<Value, ErrorValue> {
        let iter_value = self.eval(iterable, env)?;
        match iter_value {
            Value::Array(items) => {
                for item in items.iter() {
                    let child = env.child();
                    child.declare(var.to_string(), item.clone());
                    self.eval(body, &child)?;
                }
            }
            Value::Dict(d) => {
                for key in d.keys() {
                    let child = env.child();
                    child.declare(var.to_string(), Value::string(key));
                    self.eval(body, &child)?;
                }
            }
            Value::Range(r) => {
                for i in r.iter() {
                    let child = env.child();
                    child.declare(var.to_string(), Value::Integer(i));
                    self.eval(body, &child)?;
                }
            }
            other => return Err(ErrorValue::type_error("TYPE-0017", format!("cannot iterate {}", other.value_type().as_str()))),
        }
        Ok(Value::Null)
    }

    #[allow(clippy::too_many_arguments)]
    fn eval_for_range(
        &self,
        var: &str,
        start: &Rc<Expr>,
        end: &Rc<Expr>,
        inclusive: bool,
        body: &Rc<Expr>,
        env: &Environment,
    ) -> Result<Value, ErrorValue> {
        let start = require_integer(self.eval(start, env)?)?;
        let end = require_integer(self.eval(end, env)?)?;
        let range = parsley_core::value::literal::Range::new(start, end, inclusive);
        for i in range.iter() {
            let child = env.child();
            child.declare(var.to_string(), Value::Integer(i));
            self.eval(body, &child)?;
        }
        Ok(Value::Null)
    }
}

fn require_integer(value: Value) -> Result<i64, ErrorValue> {
    match value {
        Value::Integer(n) => Ok(n),
        other => Err(ErrorValue::type_error("TYPE-0018", format!("range bound must be an integer, got {}", other.value_type().as_str()))),
    }
}

fn eval_scalar_binop(op: BinOp, l: Value, r: Value) -> Result<Value, ErrorValue> {
    if matches!(op, BinOp::Eq) {
        return Ok(Value::Boolean(l == r));
    }
    if matches!(op, BinOp::Ne) {
        return Ok(Value::Boolean(l != r));
    }
    match (op, &l, &r) {
        (_, Value::Integer(a), Value::Integer(b)) => eval_int_op(op, *a, *b),
        (_, Value::Float(_) | Value::Integer(_), Value::Float(_) | Value::Integer(_)) => eval_float_op(op, as_f64(&l), as_f64(&r)),
        (BinOp::Add, Value::String(a), Value::String(b)) => Ok(Value::string(format!("{a}{b}"))),
        (BinOp::Lt | BinOp::Lte | BinOp::Gt | BinOp::Gte, Value::String(a), Value::String(b)) => Ok(Value::Boolean(compare_strings(op, a, b))),
        _ => Err(ErrorValue::type_error(
            "TYPE-0019",
            format!("unsupported operands for binary operator: {} and {}", l.value_type().as_str(), r.value_type().as_str()),
        )),
    }
}

fn as_f64(v: &Value) -> f64 {
    match v {
        Value::Integer(n) => *n as f64,
        Value::Float(f) => *f,
        _ => unreachable!("as_f64 only called on numeric values"),
    }
}

fn compare_strings(op: BinOp, a: &str, b: &str) -> bool {
    match op {
        BinOp::Lt => a < b,
        BinOp::Lte => a <= b,
        BinOp::Gt => a > b,
        BinOp::Gte => a >= b,
        _ => unreachable!("compare_strings only called for ordering operators"),
    }
}

fn eval_int_op(op: BinOp, a: i64, b: i64) -> Result<Value, ErrorValue> {
    match op {
        BinOp::Add => Ok(Value::Integer(a + b)),
        BinOp::Sub => Ok(Value::Integer(a - b)),
        BinOp::Mul => Ok(Value::Integer(a * b)),
        BinOp::Div => {
            if b == 0 {
                Err(ErrorValue::type_error("TYPE-0020", "division by zero"))
            } else {
                Ok(Value::Integer(a / b))
            }
        }
        BinOp::Mod => {
            if b == 0 {
                Err(ErrorValue::type_error("TYPE-0020", "division by zero"))
            } else {
                Ok(Value::Integer(a % b))
            }
        }
        BinOp::Lt => Ok(Value::Boolean(a < b)),
        BinOp::Lte => Ok(Value::Boolean(a <= b)),
        BinOp::Gt => Ok(Value::Boolean(a > b)),
        BinOp::Gte => Ok(Value::Boolean(a >= b)),
        BinOp::Eq | BinOp::Ne | BinOp::And | BinOp::Or | BinOp::Nullish => {
            unreachable!("handled before reaching eval_int_op")
        }
    }
}

fn eval_float_op(op: BinOp, a: f64, b: f64) -> Result<Value, ErrorValue> {
    match op {
        BinOp::Add => Ok(Value::Float(a + b)),
        BinOp::Sub => Ok(Value::Float(a - b)),
        BinOp::Mul => Ok(Value::Float(a * b)),
        BinOp::Div => Ok(Value::Float(a / b)),
        BinOp::Mod => Ok(Value::Float(a % b)),
        BinOp::Lt => Ok(Value::Boolean(a < b)),
        BinOp::Lte => Ok(Value::Boolean(a <= b)),
        BinOp::Gt => Ok(Value::Boolean(a > b)),
        BinOp::Gte => Ok(Value::Boolean(a >= b)),
        BinOp::Eq | BinOp::Ne | BinOp::And | BinOp::Or | BinOp::Nullish => {
            unreachable!("handled before reaching eval_float_op")
        }
    }
}

impl Evaluate for Evaluator {
    fn eval_node(&self, node: &dyn AstNode, env: &Environment) -> Result<Value, ErrorValue> {
        let expr = downcast(node)?;
        self.eval(&Rc::new(clone_for_thunk(expr)), env)
    }

    fn call_function(&self, function: &Function, args: &[Value]) -> Result<Value, ErrorValue> {
        // `@std/api`-style native wrappers take their arguments directly
        // rather than through named, arity-checked parameters — the number
        // of arguments they accept is the wrapped handler's business, not
        // theirs.
        if let Ok(Expr::Native(f)) = downcast(function.body.as_ref()) {
            return f(args, &function.env, self);
        }
        if function.params.len() != args.len() {
            return Err(ErrorValue::arity(format!(
                "{}: wrong number of arguments (expected {}, got {})",
                function.name.as_deref().unwrap_or("<anonymous>"),
                function.params.len(),
                args.len()
            )));
        }
        let child = function.env.child();
        for (param, arg) in function.params.iter().zip(args) {
            child.declare(param.clone(), arg.clone());
        }
        let body = downcast(function.body.as_ref())?;
        self.eval(&Rc::new(clone_for_thunk(body)), &child)
    }
}

/// `Dict`'s lazy slots and `Function` bodies carry `Rc<dyn AstNode>`, not
/// `Rc<Expr>`; evaluating one means going through [`Evaluate::eval_node`],
/// which only gets a borrowed `&Expr` back from downcasting. `Expr` itself
/// only derives a hand-rolled `Debug`, not `Clone` (several variants box
/// closures), so thunk evaluation clones just the node shape it needs by
/// re-wrapping the same child `Rc`s — cheap, since every field is already
/// reference-counted.
fn clone_for_thunk(expr: &Expr) -> Expr {
    match expr {
        Expr::Literal(v) => Expr::Literal(v.clone()),
        Expr::Identifier(name) => Expr::Identifier(name.clone()),
        Expr::ArrayLit(items) => Expr::ArrayLit(items.clone()),
        Expr::DictLit(entries) => Expr::DictLit(entries.clone()),
        Expr::Let { name, value } => Expr::Let { name: name.clone(), value: Rc::clone(value) },
        Expr::LetDestructure { fields, value } => Expr::LetDestructure { fields: fields.clone(), value: Rc::clone(value) },
        Expr::Assign { name, value } => Expr::Assign { name: name.clone(), value: Rc::clone(value) },
        Expr::If { cond, then_branch, else_branch } => Expr::If {
            cond: Rc::clone(cond),
            then_branch: Rc::clone(then_branch),
            else_branch: else_branch.clone(),
        },
        Expr::While { cond, body } => Expr::While { cond: Rc::clone(cond), body: Rc::clone(body) },
        Expr::ForIn { var, iterable, body } => Expr::ForIn { var: var.clone(), iterable: Rc::clone(iterable), body: Rc::clone(body) },
        Expr::ForRange { var, start, end, inclusive, body } => Expr::ForRange {
            var: var.clone(),
            start: Rc::clone(start),
            end: Rc::clone(end),
            inclusive: *inclusive,
            body: Rc::clone(body),
        },
        Expr::Block(exprs) => Expr::Block(exprs.clone()),
        Expr::FunctionLit { name, params, body } => Expr::FunctionLit { name: name.clone(), params: params.clone(), body: Rc::clone(body) },
        Expr::Call { callee, args } => Expr::Call { callee: Rc::clone(callee), args: args.clone() },
        Expr::MethodCall { receiver, method, args } => Expr::MethodCall { receiver: Rc::clone(receiver), method: method.clone(), args: args.clone() },
        Expr::Index { receiver, index } => Expr::Index { receiver: Rc::clone(receiver), index: Rc::clone(index) },
        Expr::Binary { op, left, right } => Expr::Binary { op: *op, left: Rc::clone(left), right: Rc::clone(right) },
        Expr::Unary { op, operand } => Expr::Unary { op: *op, operand: Rc::clone(operand) },
        Expr::Tag(tag) => Expr::Tag(tag.clone()),
        Expr::Dsl(stmt) => Expr::Dsl(Rc::clone(stmt)),
        Expr::IoOp(op) => Expr::IoOp(op.clone()),
        Expr::Import(path) => Expr::Import(path.clone()),
        Expr::Native(f) => Expr::Native(Rc::clone(f)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator() -> (Evaluator, Environment) {
        let evaluator = Evaluator::new(Rc::new(HostContext::new(EngineConfig::default())));
        let env = evaluator.root_environment();
        (evaluator, env)
    }

    #[test]
    fn literal_evaluates_to_itself() {
        let (ev, env) = evaluator();
        let result = ev.eval(&Expr::literal(Value::Integer(42)), &env).unwrap();
        assert_eq!(result, Value::Integer(42));
    }

    #[test]
    fn let_binds_in_the_current_scope() {
        let (ev, env) = evaluator();
        ev.eval(&Expr::Let { name: "x".into(), value: Expr::literal(Value::Integer(7)) }.rc(), &env).unwrap();
        assert_eq!(env.get("x"), Ok(Value::Integer(7)));
    }

    #[test]
    fn if_short_circuits_the_untaken_branch() {
        let (ev, env) = evaluator();
        let expr = Expr::If {
            cond: Expr::literal(Value::Boolean(false)),
            then_branch: Expr::literal(Value::Integer(1)),
            else_branch: Some(Expr::literal(Value::Integer(2))),
        };
        assert_eq!(ev.eval(&expr.rc(), &env).unwrap(), Value::Integer(2));
    }

    #[test]
    fn int_plus_float_promotes_to_float() {
        let (ev, env) = evaluator();
        let expr = Expr::Binary { op: BinOp::Add, left: Expr::literal(Value::Integer(1)), right: Expr::literal(Value::Float(2.5)) };
        assert_eq!(ev.eval(&expr.rc(), &env).unwrap(), Value::Float(3.5));
    }

    #[test]
    fn calling_null_reports_the_null_hint() {
        let (ev, env) = evaluator();
        let expr = Expr::Call { callee: Expr::literal(Value::Null), args: vec![] };
        let err = ev.eval(&expr.rc(), &env).unwrap_err();
        assert_eq!(err.hints, vec!["null may not be exported".to_string()]);
    }

    #[test]
    fn for_range_declares_the_loop_variable_each_iteration() {
        let (ev, env) = evaluator();
        ev.eval(&Expr::Let { name: "total".into(), value: Expr::literal(Value::Integer(0)) }.rc(), &env).unwrap();
        let body = Expr::Assign {
            name: "total".into(),
            value: Expr::Binary { op: BinOp::Add, left: Expr::ident("total"), right: Expr::ident("i") },
        };
        let expr = Expr::ForRange {
            var: "i".into(),
            start: Expr::literal(Value::Integer(1)),
            end: Expr::literal(Value::Integer(3)),
            inclusive: true,
            body: body.rc(),
        };
        ev.eval(&expr.rc(), &env).unwrap();
        assert_eq!(env.get("total"), Ok(Value::Integer(6)));
    }

    #[test]
    fn recursion_depth_is_bounded() {
        let evaluator = Evaluator::new(Rc::new(HostContext::new(EngineConfig { max_recursion_depth: 3, ..EngineConfig::default() })));
        let env = evaluator.root_environment();
        let innermost = Expr::literal(Value::Integer(0));
        let wrapped = Expr::Unary { op: UnOp::Not, operand: Expr::Unary { op: UnOp::Not, operand: Expr::Unary { op: UnOp::Not, operand: innermost }.rc() }.rc() };
        assert!(evaluator.eval(&wrapped.rc(), &env).is_err());
    }

    #[test]
    fn import_std_api_resolves_without_a_host_loader() {
        let (ev, env) = evaluator();
        let result = ev.eval(&Expr::Import("@std/api".to_string()).rc(), &env).unwrap();
        let Value::Dict(exports) = result else { panic!("expected a dict of exports") };
        assert!(exports.peek("auth").is_some());
        assert!(exports.peek("notFound").is_some());
    }

    #[test]
    fn import_with_no_loader_and_unknown_path_is_a_name_error() {
        let (ev, env) = evaluator();
        let err = ev.eval(&Expr::Import("@std/markdown".to_string()).rc(), &env).unwrap_err();
        assert_eq!(err.kind, parsley_core::ErrorKind::Name);
    }
}
