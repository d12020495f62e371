//! # parsley-query
//!
//! The symbolic query DSL compiler (spec §4.6): a small AST distinct from
//! the host language's own, lowered to a driver-agnostic `SqlPlan` and then
//! formatted for a target SQL dialect. Soft-delete and eager-load rewrites
//! happen during lowering, not formatting, so every backend sees the same
//! rewritten plan.

pub mod ast;
pub mod bindings;
pub mod compile;
pub mod dialect;
pub mod plan;

pub use bindings::{Binding, Bindings, Relation, RelationKind};
pub use compile::{compile_condition, compile_delete, compile_insert, compile_select, compile_update, pending_relations, value_to_sql};
pub use dialect::{Dialect, PostgresDialect, SqliteDialect};
pub use plan::{CompiledQuery, DeletePlan, InsertPlan, SqlPlan, UpdatePlan};
