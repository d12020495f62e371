//! Lexically-scoped name -> value bindings with parent links; carries host
//! collaborators (spec §2 Environment, §6 External Interfaces).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::EngineConfig;
use crate::dbconn::DbConnectionHandle;
use crate::errorvalue::ErrorValue;
use crate::value::Value;

/// `AssetBundler`: `CSSUrl() string`, `JSUrl() string` (spec §6).
pub trait AssetBundler {
    fn css_url(&self) -> Option<String>;
    fn js_url(&self) -> Option<String>;
    fn basil_js_url(&self) -> Option<String> {
        None
    }
}

/// `FragmentCacher`: `Get(key) (string, bool)`, `Set(key, html, maxAge)`, `Invalidate(key)`.
pub trait FragmentCacher {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, html: &str, max_age_seconds: i64);
    fn invalidate(&self, key: &str);
}

/// `Loader`: `Load(name) (value, error)` for `@std/*` modules.
pub trait Loader {
    fn load(&self, name: &str) -> Result<Value, ErrorValue>;
}

/// `AuthContext`: exposes `user`, `roles[]`, `isAuthenticated` to wrapped handlers.
pub trait AuthContext {
    fn is_authenticated(&self) -> bool;
    fn user(&self) -> Option<Value>;
    fn roles(&self) -> Vec<String>;
}

/// A cooperative cancellation flag polled at I/O suspension points (spec §5).
#[derive(Clone, Default)]
pub struct CancellationToken(Rc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self(Rc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Collaborators and process-wide state shared by every environment in a
/// logical evaluation (spec §5: "may share only the host-provided DBConnection
/// pool and FragmentCache").
#[derive(Clone)]
pub struct HostContext {
    pub config: EngineConfig,
    pub db_connections: Rc<RefCell<HashMap<String, DbConnectionHandle>>>,
    pub asset_bundler: Option<Rc<dyn AssetBundler>>,
    pub fragment_cache: Option<Rc<dyn FragmentCacher>>,
    pub loader: Option<Rc<dyn Loader>>,
    pub auth: Option<Rc<dyn AuthContext>>,
    pub cancellation: CancellationToken,
    pub handler_path: String,
}

impl HostContext {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            db_connections: Rc::new(RefCell::new(HashMap::new())),
            asset_bundler: None,
            fragment_cache: None,
            loader: None,
            auth: None,
            cancellation: CancellationToken::new(),
            handler_path: String::new(),
        }
    }
}

struct Scope {
    bindings: HashMap<String, Value>,
    parent: Option<Environment>,
}

/// Cheaply-cloneable handle to a lexical scope (`Rc<RefCell<...>>`, the same
/// interior-mutability shape the teacher uses for shared connection pools).
#[derive(Clone)]
pub struct Environment {
    scope: Rc<RefCell<Scope>>,
    pub host: Rc<HostContext>,
}

impl Environment {
    #[must_use]
    pub fn root(host: Rc<HostContext>) -> Self {
        Self {
            scope: Rc::new(RefCell::new(Scope {
                bindings: HashMap::new(),
                parent: None,
            })),
            host,
        }
    }

    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            scope: Rc::new(RefCell::new(Scope {
                bindings: HashMap::new(),
                parent: Some(self.clone()),
            })),
            host: Rc::clone(&self.host),
        }
    }

    /// Binds in the innermost environment (`let`).
    pub fn declare(&self, name: impl Into<String>, value: Value) {
        self.scope.borrow_mut().bindings.insert(name.into(), value);
    }

    /// Resolves through the environment chain; missing name is a `name` error.
    pub fn get(&self, name: &str) -> Result<Value, ErrorValue> {
        if let Some(v) = self.scope.borrow().bindings.get(name) {
            return Ok(v.clone());
        }
        let parent = self.scope.borrow().parent.clone();
        match parent {
            Some(p) => p.get(name),
            None => Err(ErrorValue::name_error(format!("undefined identifier '{name}'"))),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// Mutates the defining scope (plain assign), walking up the parent
    /// chain until the binding is found.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), ErrorValue> {
        if self.scope.borrow().bindings.contains_key(name) {
            self.scope.borrow_mut().bindings.insert(name.to_string(), value);
            return Ok(());
        }
        let parent = self.scope.borrow().parent.clone();
        match parent {
            Some(p) => p.assign(name, value),
            None => Err(ErrorValue::name_error(format!(
                "cannot assign undefined identifier '{name}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_env() -> Environment {
        Environment::root(Rc::new(HostContext::new(EngineConfig::default())))
    }

    #[test]
    fn child_resolves_through_parent() {
        let root = root_env();
        root.declare("x", Value::Integer(1));
        let child = root.child();
        assert_eq!(child.get("x"), Ok(Value::Integer(1)));
    }

    #[test]
    fn declare_in_child_does_not_leak_to_parent() {
        let root = root_env();
        let child = root.child();
        child.declare("y", Value::Integer(2));
        assert!(root.get("y").is_err());
    }

    #[test]
    fn assign_mutates_defining_scope() {
        let root = root_env();
        root.declare("x", Value::Integer(1));
        let child = root.child();
        child.assign("x", Value::Integer(5)).unwrap();
        assert_eq!(root.get("x"), Ok(Value::Integer(5)));
    }

    #[test]
    fn assign_undefined_is_name_error() {
        let root = root_env();
        assert!(root.assign("nope", Value::Null).is_err());
    }
}
