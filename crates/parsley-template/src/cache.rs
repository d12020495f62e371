//! `<basil.cache.Cache key maxAge [enabled]>` fragment caching (spec §4.2):
//! wraps a render closure with a lookup against the host's `FragmentCacher`,
//! keyed on `"${handlerPath}:${key}"` so two handlers never collide on the
//! same literal cache key. Bypassed entirely in dev mode or when
//! `enabled=false`.
//!
//! Error codes follow the tag's own contract: `key` missing is CACHE-0001,
//! `key` wrong type is CACHE-0002, `maxAge` missing is CACHE-0003, `maxAge`
//! wrong type is CACHE-0004.

use parsley_core::environment::FragmentCacher;
use parsley_core::errorvalue::{ErrorKind, ErrorValue};
use parsley_core::value::datetime::Duration;
use parsley_core::value::Value;
use tracing::debug;

fn cache_error(code: &str, message: impl Into<String>) -> ErrorValue {
    ErrorValue::new(ErrorKind::Cache, code, message)
}

#[must_use]
pub fn composite_key(handler_path: &str, key: &str) -> String {
    format!("{handler_path}:{key}")
}

fn require_key(key: Option<&Value>) -> Result<&str, ErrorValue> {
    match key {
        None => Err(cache_error("CACHE-0001", "Cache tag requires a 'key' attribute")),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(cache_error("CACHE-0002", "Cache tag's 'key' attribute must be a string")),
    }
}

fn require_max_age(max_age: Option<&Value>) -> Result<Duration, ErrorValue> {
    match max_age {
        None => Err(cache_error("CACHE-0003", "Cache tag requires a 'maxAge' attribute")),
        Some(Value::Duration(d)) => Ok(*d),
        Some(_) => Err(cache_error("CACHE-0004", "Cache tag's 'maxAge' attribute must be a duration")),
    }
}

/// Renders a cached fragment. `render` is only invoked on a cache miss, in
/// dev mode, or when the tag is disabled — it is never called twice for the
/// same request.
pub fn render_fragment(
    cacher: Option<&dyn FragmentCacher>,
    handler_path: &str,
    key: Option<&Value>,
    max_age: Option<&Value>,
    enabled: Option<bool>,
    dev_mode: bool,
    render: impl FnOnce() -> Result<String, ErrorValue>,
) -> Result<String, ErrorValue> {
    let key = require_key(key)?;
    let max_age = require_max_age(max_age)?;

    if enabled == Some(false) {
        debug!(key, "cache tag disabled, rendering live");
        return render();
    }
    if dev_mode {
        debug!(key, "dev mode, bypassing fragment cache");
        return render();
    }

    let Some(cacher) = cacher else {
        return Err(cache_error("CACHE-0003", "Cache tag used but no fragment cacher is configured on the host"));
    };

    let full_key = composite_key(handler_path, key);
    if let Some(html) = cacher.get(&full_key) {
        debug!(key = %full_key, "fragment cache hit");
        return Ok(html);
    }

    debug!(key = %full_key, "fragment cache miss, rendering");
    let html = render()?;
    cacher.set(&full_key, &html, max_age.total_seconds());
    Ok(html)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;

    #[derive(Default)]
    struct FakeCacher {
        store: RefCell<HashMap<String, String>>,
    }

    impl FragmentCacher for FakeCacher {
        fn get(&self, key: &str) -> Option<String> {
            self.store.borrow().get(key).cloned()
        }
        fn set(&self, key: &str, html: &str, _max_age_seconds: i64) {
            self.store.borrow_mut().insert(key.to_string(), html.to_string());
        }
        fn invalidate(&self, key: &str) {
            self.store.borrow_mut().remove(key);
        }
    }

    #[test]
    fn missing_key_is_cache_0001() {
        let err = render_fragment(None, "/p", None, Some(&Value::Duration(Duration::from_seconds(60))), None, false, || Ok("x".into())).unwrap_err();
        assert_eq!(err.code, "CACHE-0001");
    }

    #[test]
    fn wrong_typed_key_is_cache_0002() {
        let err = render_fragment(
            None,
            "/p",
            Some(&Value::Integer(1)),
            Some(&Value::Duration(Duration::from_seconds(60))),
            None,
            false,
            || Ok("x".into()),
        )
        .unwrap_err();
        assert_eq!(err.code, "CACHE-0002");
    }

    #[test]
    fn missing_max_age_is_cache_0003() {
        let err = render_fragment(None, "/p", Some(&Value::string("k")), None, None, false, || Ok("x".into())).unwrap_err();
        assert_eq!(err.code, "CACHE-0003");
    }

    #[test]
    fn wrong_typed_max_age_is_cache_0004() {
        let err = render_fragment(None, "/p", Some(&Value::string("k")), Some(&Value::Integer(60)), None, false, || Ok("x".into())).unwrap_err();
        assert_eq!(err.code, "CACHE-0004");
    }

    #[test]
    fn dev_mode_bypasses_and_does_not_require_a_cacher() {
        let calls = RefCell::new(0);
        let html = render_fragment(
            None,
            "/p",
            Some(&Value::string("k")),
            Some(&Value::Duration(Duration::from_seconds(60))),
            None,
            true,
            || {
                *calls.borrow_mut() += 1;
                Ok("live".to_string())
            },
        )
        .unwrap();
        assert_eq!(html, "live");
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn second_call_with_same_key_is_served_from_cache() {
        let cacher = FakeCacher::default();
        let calls = RefCell::new(0);
        let render = || {
            *calls.borrow_mut() += 1;
            Ok::<_, ErrorValue>(format!("render #{}", *calls.borrow()))
        };
        let max_age = Value::Duration(Duration::from_seconds(60));
        let first = render_fragment(Some(&cacher), "/p", Some(&Value::string("k")), Some(&max_age), None, false, render).unwrap();
        let second = render_fragment(Some(&cacher), "/p", Some(&Value::string("k")), Some(&max_age), None, false, render).unwrap();
        assert_eq!(first, second);
        assert_eq!(*calls.borrow(), 1);
    }
}
