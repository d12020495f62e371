//! Engine configuration carried by the host embedding (ambient stack, no CLI
//! or environment-variable reads inside the crate itself).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default timeout, in milliseconds, applied to I/O suspension points
    /// (`=/=>`, `<=/=`, `<=!=>`, `<=?=>`, `<=??=>`) when the call site does
    /// not override it.
    pub default_timeout_ms: u64,
    /// Bypasses the fragment cache (`<basil.cache.Cache>` always renders
    /// children and never stores) — spec §4.2.
    pub dev_mode: bool,
    /// Dialect used by `@query`/`@insert`/`@update`/`@delete` when a binding
    /// does not name one explicitly.
    pub default_dialect: String,
    /// Upper bound on evaluator recursion depth; exceeding it is a `type`
    /// error rather than a stack overflow.
    pub max_recursion_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 30_000,
            dev_mode: false,
            default_dialect: "sqlite".to_string(),
            max_recursion_depth: 512,
        }
    }
}
