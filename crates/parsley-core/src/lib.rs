//! # parsley-core
//!
//! The value model, lexical environment, and host-collaborator interfaces
//! shared by every other Parsley crate: primitive and domain-literal values,
//! the lazy [`value::Dict`], schema/record/table shapes, the `DBConnection`
//! trait, the typed-response shape, and the `error` runtime value.
//!
//! This crate has no dependency on the evaluator or parser: function bodies
//! and lazy dict slots are carried as opaque [`value::function::AstNode`]
//! trait objects, so the AST lives entirely in the `parsley` facade crate.

pub mod config;
pub mod dbconn;
pub mod environment;
pub mod error;
pub mod errorvalue;
pub mod response;
pub mod value;

pub use config::EngineConfig;
pub use environment::Environment;
pub use errorvalue::{ErrorKind, ErrorValue};
pub use value::{Value, ValueType};
