//! Insertion-ordered dictionary with lazy slots (spec §3 Collections, §9
//! Design Notes: "Dict entries store *expressions* with their defining
//! environment, materialised on access").

use std::cell::RefCell;
use std::rc::Rc;

use crate::environment::Environment;
use crate::errorvalue::ErrorValue;
use crate::value::function::{AstNode, Evaluate};
use crate::value::Value;

#[derive(Clone)]
enum Slot {
    Value(Value),
    Thunk(Rc<dyn AstNode>, Environment),
}

struct Entry {
    key: Rc<str>,
    slot: RefCell<Slot>,
}

/// Cheaply cloneable (`Rc`-shared) insertion-ordered map from string keys to
/// values, some of which may still be unevaluated expressions.
#[derive(Clone)]
pub struct Dict {
    entries: Rc<RefCell<Vec<Entry>>>,
}

impl Dict {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(Vec::new())),
        }
    }

    #[must_use]
    pub fn from_values(pairs: Vec<(String, Value)>) -> Self {
        let dict = Self::new();
        for (k, v) in pairs {
            dict.insert(k, v);
        }
        dict
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.borrow().iter().position(|e| &*e.key == key)
    }

    /// Inserts (or overwrites) an already-evaluated value.
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        let key: Rc<str> = key.into().into();
        let mut entries = self.entries.borrow_mut();
        if let Some(idx) = entries.iter().position(|e| e.key == key) {
            entries[idx] = Entry {
                key,
                slot: RefCell::new(Slot::Value(value)),
            };
        } else {
            entries.push(Entry {
                key,
                slot: RefCell::new(Slot::Value(value)),
            });
        }
    }

    /// Inserts an unevaluated expression plus the environment it closes
    /// over; materialised the first time [`Dict::get`] is called for it.
    pub fn insert_thunk(&self, key: impl Into<String>, expr: Rc<dyn AstNode>, env: Environment) {
        let key: Rc<str> = key.into().into();
        let mut entries = self.entries.borrow_mut();
        let entry = Entry {
            key: key.clone(),
            slot: RefCell::new(Slot::Thunk(expr, env)),
        };
        if let Some(idx) = entries.iter().position(|e| e.key == key) {
            entries[idx] = entry;
        } else {
            entries.push(entry);
        }
    }

    /// Materialises and returns the value at `key`, evaluating a thunk via
    /// `evaluator` and caching the result in place.
    pub fn get(&self, key: &str, evaluator: &dyn Evaluate) -> Result<Option<Value>, ErrorValue> {
        let Some(idx) = self.position(key) else {
            return Ok(None);
        };
        let slot = self.entries.borrow()[idx].slot.clone();
        match slot {
            Slot::Value(v) => Ok(Some(v)),
            Slot::Thunk(expr, env) => {
                let value = evaluator.eval_node(expr.as_ref(), &env)?;
                *self.entries.borrow()[idx].slot.borrow_mut() = Slot::Value(value.clone());
                Ok(Some(value))
            }
        }
    }

    /// Returns the value at `key` only if it is already materialised,
    /// without forcing a thunk. Used by structural equality and contexts
    /// with no evaluator at hand.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<Value> {
        let idx = self.position(key)?;
        match &*self.entries.borrow()[idx].slot.borrow() {
            Slot::Value(v) => Some(v.clone()),
            Slot::Thunk(..) => None,
        }
    }

    pub fn remove(&self, key: &str) -> bool {
        let mut entries = self.entries.borrow_mut();
        if let Some(idx) = entries.iter().position(|e| &*e.key == key) {
            entries.remove(idx);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys in insertion order (spec invariant: preserved across `.keys()`,
    /// JSON encoding, iteration, and spread).
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.borrow().iter().map(|e| e.key.to_string()).collect()
    }

    /// Materialises every slot and returns `(key, value)` pairs in order.
    pub fn entries(&self, evaluator: &dyn Evaluate) -> Result<Vec<(String, Value)>, ErrorValue> {
        self.keys()
            .into_iter()
            .map(|k| {
                let v = self.get(&k, evaluator)?.expect("key came from keys()");
                Ok((k, v))
            })
            .collect()
    }

    /// `insertAfter(key, newKey, val)` (spec §4.8): error if `key` is not
    /// found, or `newKey` already exists.
    pub fn insert_after(&self, key: &str, new_key: &str, value: Value) -> Result<(), ErrorValue> {
        self.insert_relative(key, new_key, value, 1)
    }

    pub fn insert_before(&self, key: &str, new_key: &str, value: Value) -> Result<(), ErrorValue> {
        self.insert_relative(key, new_key, value, 0)
    }

    fn insert_relative(
        &self,
        key: &str,
        new_key: &str,
        value: Value,
        offset: usize,
    ) -> Result<(), ErrorValue> {
        if self.contains_key(new_key) {
            return Err(ErrorValue::type_error(
                "KEY-0001",
                format!("key '{new_key}' already exists"),
            ));
        }
        let mut entries = self.entries.borrow_mut();
        let Some(idx) = entries.iter().position(|e| &*e.key == key) else {
            return Err(ErrorValue::type_error(
                "KEY-0002",
                format!("key '{key}' not found"),
            ));
        };
        entries.insert(
            idx + offset,
            Entry {
                key: new_key.into(),
                slot: RefCell::new(Slot::Value(value)),
            },
        );
        Ok(())
    }

    /// Structural equality. A key whose slot is still an unmaterialised
    /// thunk on either side is treated as unequal — callers that need
    /// correct comparisons across lazily-defined dicts should force
    /// evaluation first via [`Dict::entries`].
    #[must_use]
    pub fn shallow_eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.entries, &other.entries) {
            return true;
        }
        let keys = self.keys();
        if keys != other.keys() {
            return false;
        }
        keys.iter().all(|k| match (self.peek(k), other.peek(k)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        })
    }
}

impl Clone for Slot {
    fn clone(&self) -> Self {
        match self {
            Self::Value(v) => Self::Value(v.clone()),
            Self::Thunk(e, env) => Self::Thunk(Rc::clone(e), env.clone()),
        }
    }
}

impl Default for Dict {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries.borrow().iter().map(|e| {
                let v = match &*e.slot.borrow() {
                    Slot::Value(v) => format!("{v:?}"),
                    Slot::Thunk(..) => "<thunk>".to_string(),
                };
                (e.key.to_string(), v)
            }))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let d = Dict::new();
        d.insert("b", Value::Integer(1));
        d.insert("a", Value::Integer(2));
        assert_eq!(d.keys(), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn overwrite_keeps_original_position() {
        let d = Dict::new();
        d.insert("a", Value::Integer(1));
        d.insert("b", Value::Integer(2));
        d.insert("a", Value::Integer(3));
        assert_eq!(d.keys(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(d.peek("a"), Some(Value::Integer(3)));
    }

    #[test]
    fn insert_after_rejects_duplicate_new_key() {
        let d = Dict::new();
        d.insert("a", Value::Integer(1));
        d.insert("b", Value::Integer(2));
        assert!(d.insert_after("a", "b", Value::Integer(9)).is_err());
    }

    #[test]
    fn insert_after_places_immediately_following() {
        let d = Dict::new();
        d.insert("a", Value::Integer(1));
        d.insert("c", Value::Integer(3));
        d.insert_after("a", "b", Value::Integer(2)).unwrap();
        assert_eq!(
            d.keys(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn shallow_eq_compares_materialised_values() {
        let a = Dict::from_values(vec![("x".into(), Value::Integer(1))]);
        let b = Dict::from_values(vec![("x".into(), Value::Integer(1))]);
        assert!(a.shallow_eq(&b));
    }
}
