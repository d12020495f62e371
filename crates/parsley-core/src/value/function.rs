//! Function values (spec §3: "Parameters, body node, captured environment").
//!
//! The evaluator's AST lives in the `parsley` facade crate, which depends on
//! `parsley-core`, not the reverse. To let a `Function` value hold a body node
//! without a dependency cycle, the body is an opaque [`AstNode`] trait object;
//! `parsley` implements the trait for its own expression/statement types.

use std::fmt;
use std::rc::Rc;

use crate::environment::Environment;
use crate::errorvalue::ErrorValue;
use crate::value::Value;

/// Marker implemented by the host crate's AST node types so they can be
/// carried inside a [`Value::Function`] or a lazy [`crate::value::dict::Dict`]
/// slot without `parsley-core` knowing their shape. `as_any` is what lets the
/// host crate's own `Evaluate` impl downcast back to its concrete node type;
/// without it a `&dyn AstNode` is inert everywhere except here.
pub trait AstNode: fmt::Debug {
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Callback back into the evaluator, needed to materialise lazy dict slots
/// and to invoke user-defined functions from builtin methods (e.g. `.map`).
pub trait Evaluate {
    fn eval_node(&self, node: &dyn AstNode, env: &Environment) -> Result<Value, ErrorValue>;

    fn call_function(&self, function: &Function, args: &[Value]) -> Result<Value, ErrorValue>;
}

#[derive(Clone)]
pub struct Function {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Rc<dyn AstNode>,
    pub env: Environment,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.body, &other.body) && self.params == other.params
    }
}

/// A native function exposed to programs (builtin method dispatch, §4.8).
#[derive(Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: Option<usize>,
    pub func: Rc<dyn Fn(&[Value]) -> Result<Value, ErrorValue>>,
}

impl Builtin {
    #[must_use]
    pub fn new(
        name: &'static str,
        arity: Option<usize>,
        func: impl Fn(&[Value]) -> Result<Value, ErrorValue> + 'static,
    ) -> Self {
        Self {
            name,
            arity,
            func: Rc::new(func),
        }
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, ErrorValue> {
        if let Some(arity) = self.arity {
            if args.len() != arity {
                return Err(ErrorValue::arity(format!(
                    "{}: wrong number of arguments (expected {arity}, got {})",
                    self.name,
                    args.len()
                )));
            }
        }
        (self.func)(args)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Rc::ptr_eq(&self.func, &other.func)
    }
}
